//! Number/radix reader.
//!
//! Accumulates digit bytes into a 64-bit magnitude (`acc = acc * radix + digit`).
//! Digits past the radix's limit are ignored, so the entry saturates instead
//! of overflowing. Sign and decimal point are applied only on commit.

use crate::config::{FIXED_DECIMALS, MAX_DECIMAL_DIGITS, MAX_HEX_DIGITS};
use crate::fixed::Fixed;

use super::TerminalError;

/// Active input radix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Radix {
    Decimal,
    Hex,
}

impl Radix {
    #[inline]
    pub fn base(self) -> u64 {
        match self {
            Radix::Decimal => 10,
            Radix::Hex => 16,
        }
    }

    /// Most digits one entry holds in this radix.
    #[inline]
    pub fn max_digits(self) -> u8 {
        match self {
            Radix::Decimal => MAX_DECIMAL_DIGITS,
            Radix::Hex => MAX_HEX_DIGITS,
        }
    }

    /// Value of `byte` as a digit, if it is one. Hex digits are uppercase only.
    #[inline]
    pub fn digit_value(self, byte: u8) -> Option<u8> {
        match (self, byte) {
            (_, b'0'..=b'9') => Some(byte - b'0'),
            (Radix::Hex, b'A'..=b'F') => Some(byte - b'A' + 10),
            _ => None,
        }
    }
}

/// Transient parse context for one numeric token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumberEntry {
    magnitude: u64,
    negative: bool,
    signed: bool,
    digits: u8,
    max_digits: u8,
    radix: Radix,
    /// Digits seen after the decimal point, once one was entered.
    fraction: Option<u8>,
}

impl NumberEntry {
    /// Empty decimal entry.
    pub const fn new() -> Self {
        Self {
            magnitude: 0,
            negative: false,
            signed: false,
            digits: 0,
            max_digits: MAX_DECIMAL_DIGITS,
            radix: Radix::Decimal,
            fraction: None,
        }
    }

    /// Empty entry that keeps at most `max_digits` digits.
    pub fn with_max_digits(max_digits: u8) -> Self {
        Self { max_digits: max_digits.min(MAX_DECIMAL_DIGITS), ..Self::new() }
    }

    /// No digit entered yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.digits == 0
    }

    #[inline]
    pub fn digits(&self) -> u8 {
        self.digits
    }

    #[inline]
    pub fn radix(&self) -> Radix {
        self.radix
    }

    #[inline]
    pub fn magnitude(&self) -> u64 {
        self.magnitude
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Whether a sign byte would be accepted now.
    #[inline]
    pub fn accepts_sign(&self) -> bool {
        self.digits == 0 && !self.signed && self.fraction.is_none()
    }

    /// Whether `byte` is a digit in the active radix.
    #[inline]
    pub fn accepts(&self, byte: u8) -> bool {
        self.radix.digit_value(byte).is_some()
    }

    /// Switch to hexadecimal. Only legal before the first digit.
    pub fn set_hex(&mut self) -> Result<(), TerminalError> {
        if self.digits != 0 || self.fraction.is_some() || self.radix == Radix::Hex {
            return Err(TerminalError::MalformedCommand);
        }
        self.radix = Radix::Hex;
        self.max_digits = self.max_digits.min(MAX_HEX_DIGITS);
        Ok(())
    }

    /// Record a leading sign.
    pub fn set_sign(&mut self, negative: bool) -> Result<(), TerminalError> {
        if !self.accepts_sign() {
            return Err(TerminalError::MalformedCommand);
        }
        self.signed = true;
        self.negative = negative;
        Ok(())
    }

    /// Append one digit byte.
    pub fn push_digit(&mut self, byte: u8) -> Result<(), TerminalError> {
        let value = self.radix.digit_value(byte).ok_or(TerminalError::MalformedCommand)?;

        if self.digits >= self.max_digits {
            return Ok(());
        }

        self.magnitude = self
            .magnitude
            .saturating_mul(self.radix.base())
            .saturating_add(value as u64);
        self.digits += 1;
        if let Some(f) = self.fraction.as_mut() {
            *f += 1;
        }
        Ok(())
    }

    /// Mark the decimal point. Decimal radix only, at most once.
    pub fn mark_fraction(&mut self) -> Result<(), TerminalError> {
        if self.radix != Radix::Decimal || self.fraction.is_some() {
            return Err(TerminalError::MalformedCommand);
        }
        self.fraction = Some(0);
        Ok(())
    }

    /// Committed value as a raw 64-bit word (two's complement when negative).
    ///
    /// Fraction digits, if any, are dropped.
    pub fn to_word(&self) -> u64 {
        let whole = match self.fraction {
            Some(f) => self.magnitude / pow10(f as u32).unwrap_or(u64::MAX as u128) as u64,
            None => self.magnitude,
        };
        if self.negative {
            whole.wrapping_neg()
        } else {
            whole
        }
    }

    /// Committed value as an index, `None` if empty.
    pub fn to_index(&self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        Some(usize::try_from(self.to_word()).unwrap_or(usize::MAX))
    }

    /// Committed value as fixed point.
    ///
    /// `implied_decimals` shifts the decimal point further left, on top of
    /// any digits entered after an explicit `.`. Precision below the fixed
    /// scale is truncated.
    pub fn to_fixed(&self, implied_decimals: u32) -> Fixed {
        let decimals = self.fraction.unwrap_or(0) as u32 + implied_decimals;
        let scale_digits = FIXED_DECIMALS;
        let mag = self.magnitude as u128;

        let raw = if decimals <= scale_digits {
            mag * pow10(scale_digits - decimals).unwrap_or(1)
        } else {
            match pow10(decimals - scale_digits) {
                Some(div) => mag / div,
                None => 0,
            }
        };

        let raw = raw.min(i64::MAX as u128) as i64;
        Fixed::from_raw(if self.negative { -raw } else { raw })
    }
}

impl Default for NumberEntry {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn pow10(exp: u32) -> Option<u128> {
    10u128.checked_pow(exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &[u8]) -> NumberEntry {
        let mut e = NumberEntry::new();
        for &b in text {
            match b {
                b'$' => e.set_hex().unwrap(),
                b'.' => e.mark_fraction().unwrap(),
                b'-' | b'+' => e.set_sign(b == b'-').unwrap(),
                _ => e.push_digit(b).unwrap(),
            }
        }
        e
    }

    #[test]
    fn test_decimal_accumulation() {
        let e = entry(b"1234");
        assert_eq!(e.to_word(), 1234);
        assert_eq!(e.digits(), 4);
    }

    #[test]
    fn test_hex_accumulation() {
        let e = entry(b"$FF");
        assert_eq!(e.radix(), Radix::Hex);
        assert_eq!(e.to_word(), 255);
    }

    #[test]
    fn test_hex_letters_rejected_in_decimal() {
        let mut e = NumberEntry::new();
        assert!(!e.accepts(b'A'));
        assert_eq!(e.push_digit(b'A'), Err(TerminalError::MalformedCommand));
        assert!(e.is_empty());
    }

    #[test]
    fn test_hex_only_before_digits() {
        let mut e = entry(b"1");
        assert_eq!(e.set_hex(), Err(TerminalError::MalformedCommand));
    }

    #[test]
    fn test_digit_limit_saturates() {
        let mut e = NumberEntry::with_max_digits(3);
        for &b in b"98765" {
            e.push_digit(b).unwrap();
        }
        assert_eq!(e.digits(), 3);
        assert_eq!(e.to_word(), 987);
    }

    #[test]
    fn test_full_width_hex_does_not_overflow() {
        let e = entry(b"$FFFFFFFFFFFFFFFFFF");
        assert_eq!(e.digits(), 16);
        assert_eq!(e.to_word(), u64::MAX);
    }

    #[test]
    fn test_negative_word_is_twos_complement() {
        assert_eq!(entry(b"-1").to_word(), u64::MAX);
    }

    #[test]
    fn test_fraction_to_fixed() {
        assert_eq!(entry(b"3.5").to_fixed(0), Fixed::from_raw(3500));
        assert_eq!(entry(b"-0.25").to_fixed(0), Fixed::from_raw(-250));
        // Beyond the fixed scale is truncated
        assert_eq!(entry(b"1.23456").to_fixed(0), Fixed::from_raw(1234));
        assert_eq!(entry(b"7").to_fixed(0), Fixed::from_int(7));
    }

    #[test]
    fn test_implied_decimals() {
        assert_eq!(entry(b"314").to_fixed(2), Fixed::from_raw(3140));
        assert_eq!(entry(b"314").to_fixed(40), Fixed::ZERO);
    }

    #[test]
    fn test_second_point_rejected() {
        let mut e = entry(b"1.2");
        assert_eq!(e.mark_fraction(), Err(TerminalError::MalformedCommand));
    }

    #[test]
    fn test_sign_only_before_digits() {
        let mut e = entry(b"5");
        assert!(!e.accepts_sign());
        assert_eq!(e.set_sign(true), Err(TerminalError::MalformedCommand));
    }

    #[test]
    fn test_to_index() {
        assert_eq!(NumberEntry::new().to_index(), None);
        assert_eq!(entry(b"12").to_index(), Some(12));
    }
}
