//! Persistent fixed-point math accumulator.

use crate::fixed::Fixed;

use super::TerminalError;

/// Accumulator operation selected by an operator byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MathOp {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    /// Integer square root in place, no operand.
    Sqrt,
}

impl MathOp {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'=' => Some(Self::Assign),
            b'+' => Some(Self::Add),
            b'-' => Some(Self::Subtract),
            b'*' => Some(Self::Multiply),
            b'/' => Some(Self::Divide),
            b'|' => Some(Self::Sqrt),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Assign => '=',
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
            Self::Sqrt => '|',
        }
    }

    #[inline]
    pub fn takes_operand(self) -> bool {
        !matches!(self, Self::Sqrt)
    }
}

/// One 64-bit fixed-point register that survives across commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MathAccumulator {
    value: Fixed,
}

impl MathAccumulator {
    pub const fn new() -> Self {
        Self { value: Fixed::ZERO }
    }

    #[inline]
    pub fn value(&self) -> Fixed {
        self.value
    }

    #[inline]
    pub fn set(&mut self, value: Fixed) {
        self.value = value;
    }

    /// Apply `op` with `operand`, returning the new value.
    ///
    /// On error the accumulator is left unchanged.
    pub fn apply(&mut self, op: MathOp, operand: Option<Fixed>) -> Result<Fixed, TerminalError> {
        let next = match (op, operand) {
            (MathOp::Sqrt, _) => self.value.checked_sqrt().ok_or(TerminalError::ArithmeticError)?,
            (_, None) => return Err(TerminalError::MalformedCommand),
            (MathOp::Assign, Some(rhs)) => rhs,
            (MathOp::Add, Some(rhs)) => self.value.saturating_add(rhs),
            (MathOp::Subtract, Some(rhs)) => self.value.saturating_sub(rhs),
            (MathOp::Multiply, Some(rhs)) => self.value.saturating_mul(rhs),
            (MathOp::Divide, Some(rhs)) => {
                self.value.checked_div(rhs).ok_or(TerminalError::ArithmeticError)?
            }
        };
        self.value = next;
        Ok(next)
    }
}
