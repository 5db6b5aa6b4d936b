//! Terminal error types

/// Terminal error with code and message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalError {
    /// E01: Intake ring full, bytes dropped
    BufferOverflow,
    /// E02: Unrecognized byte or incomplete command
    MalformedCommand,
    /// E03: Index outside the addressed table
    AddressingError,
    /// E04: Divide by zero or square root of a negative value
    ArithmeticError,
    /// E05: Write to a read-only table
    ReadOnly,
    /// E06: Passthrough requested with no paired link
    LinkUnavailable,
}

impl TerminalError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::BufferOverflow => "E01",
            Self::MalformedCommand => "E02",
            Self::AddressingError => "E03",
            Self::ArithmeticError => "E04",
            Self::ReadOnly => "E05",
            Self::LinkUnavailable => "E06",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::BufferOverflow => "input overflow",
            Self::MalformedCommand => "malformed command",
            Self::AddressingError => "address out of range",
            Self::ArithmeticError => "arithmetic error",
            Self::ReadOnly => "read-only",
            Self::LinkUnavailable => "no link",
        }
    }

    /// Whether the terminal prints this error. Malformed input is dropped silently.
    pub fn is_reported(&self) -> bool {
        !matches!(self, Self::MalformedCommand)
    }
}

impl core::fmt::Display for TerminalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}
