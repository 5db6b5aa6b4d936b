//! Module: config
//!
//! Purpose: Terminal configuration for TripTerminal.
//!
//! Compile-time sizing lives in constants; operator-facing defaults live in
//! [`TerminalConfig`], which is plain data so it can sit in a `static` and be
//! handed to [`Terminal::new`](crate::terminal::Terminal::new).

/// Intake ring capacity in bytes.
pub const INTAKE_CAPACITY: usize = 120;

/// Fractional decimal digits carried by every [`Fixed`](crate::fixed::Fixed).
pub const FIXED_DECIMALS: u32 = 3;

/// Most decimal digits a single number entry accepts (fits in u64).
pub const MAX_DECIMAL_DIGITS: u8 = 19;

/// Most hexadecimal digits a single number entry accepts.
pub const MAX_HEX_DIGITS: u8 = 16;

/// Most decimal places `U` will print.
pub const MAX_OUTPUT_DECIMALS: u8 = 9;

/// Passthrough line capacity (bytes after `Y` up to the terminator).
pub const PASSTHROUGH_LINE_SIZE: usize = 64;

/// Synthetic button queue depth.
pub const BUTTON_QUEUE_SIZE: usize = 8;

/// Runtime terminal configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerminalConfig {
    /// Decimal places printed when a command gives no digit count.
    pub default_digits: u8,
    /// Field width when a command gives no window. Zero means "use the digit count".
    pub default_window: u8,
    /// Mirror display status lines to the terminal at startup.
    pub status_echo: bool,
    /// Mirror passthrough link responses to the terminal.
    pub link_echo: bool,
    /// Only left/center/right buttons exist (no up/down).
    pub legacy_buttons: bool,
    /// Digits kept per entered number; further digits are ignored.
    pub max_input_digits: u8,
}

impl TerminalConfig {
    /// Default configuration, usable in const context.
    pub const fn new() -> Self {
        Self {
            default_digits: FIXED_DECIMALS as u8,
            default_window: 0,
            status_echo: false,
            link_echo: true,
            legacy_buttons: false,
            max_input_digits: MAX_DECIMAL_DIGITS,
        }
    }

    /// Fractional digits printed when none were entered.
    #[inline]
    pub fn digits(&self) -> u8 {
        self.default_digits.min(MAX_OUTPUT_DECIMALS)
    }

    /// Window to use when none was entered.
    #[inline]
    pub fn window_for(&self, digits: u8) -> u8 {
        if self.default_window == 0 {
            digits
        } else {
            self.default_window
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self::new()
    }
}
