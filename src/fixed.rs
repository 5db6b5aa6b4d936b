//! 64-bit signed fixed-point values.
//!
//! A [`Fixed`] is an `i64` with an implicit scale of `10^FIXED_DECIMALS`.
//! Arithmetic saturates at the `i64` bounds; division truncates toward zero.

use core::fmt::{self, Write};

use crate::config::{FIXED_DECIMALS, MAX_OUTPUT_DECIMALS};

/// Raw units per whole number.
pub const SCALE: i64 = 10i64.pow(FIXED_DECIMALS);

/// Signed fixed-point number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(i64);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const MAX: Fixed = Fixed(i64::MAX);
    pub const MIN: Fixed = Fixed(i64::MIN);

    /// Wrap a raw scaled value.
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Whole number, saturating.
    #[inline]
    pub const fn from_int(value: i64) -> Self {
        Self(value.saturating_mul(SCALE))
    }

    /// Raw scaled value.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Whole part, truncated toward zero.
    #[inline]
    pub const fn to_int(self) -> i64 {
        self.0 / SCALE
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn saturating_add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub fn saturating_sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.saturating_sub(rhs.0))
    }

    /// Product, rescaled with truncation and clamped to the `i64` range.
    pub fn saturating_mul(self, rhs: Fixed) -> Fixed {
        let wide = (self.0 as i128 * rhs.0 as i128) / SCALE as i128;
        Fixed(clamp_i128(wide))
    }

    /// Quotient truncated toward zero, `None` when `rhs` is zero.
    pub fn checked_div(self, rhs: Fixed) -> Option<Fixed> {
        if rhs.0 == 0 {
            return None;
        }
        let wide = (self.0 as i128 * SCALE as i128) / rhs.0 as i128;
        Some(Fixed(clamp_i128(wide)))
    }

    /// Integer square root at full fixed-point precision, `None` when negative.
    pub fn checked_sqrt(self) -> Option<Fixed> {
        if self.0 < 0 {
            return None;
        }
        let root = isqrt(self.0 as u128 * SCALE as u128);
        Some(Fixed(root as i64))
    }

    /// Write the value with `decimals` fractional digits, right-justified in `window`.
    ///
    /// Extra digits beyond the internal scale print as zeros, up to
    /// `MAX_OUTPUT_DECIMALS`. Digits dropped below it are truncated, or
    /// rounded half away from zero when `round`.
    pub fn format_into(self, out: &mut dyn Write, decimals: u8, window: u8, round: bool) -> fmt::Result {
        let decimals = decimals.min(MAX_OUTPUT_DECIMALS) as u32;
        let mut scaled = self.0.unsigned_abs() as u128;

        if decimals >= FIXED_DECIMALS {
            scaled *= 10u128.pow(decimals - FIXED_DECIMALS);
        } else {
            let div = 10u128.pow(FIXED_DECIMALS - decimals);
            let rem = scaled % div;
            scaled /= div;
            if round && rem * 2 >= div {
                scaled += 1;
            }
        }

        let unit = 10u128.pow(decimals);
        let whole = scaled / unit;
        let frac = scaled % unit;

        let mut text: heapless::String<64> = heapless::String::new();
        if self.0 < 0 && scaled != 0 {
            let _ = text.push('-');
        }
        let _ = write!(text, "{}", whole);
        if decimals > 0 {
            let _ = write!(text, ".{:0width$}", frac, width = decimals as usize);
        }

        write!(out, "{:>width$}", text.as_str(), width = window as usize)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.format_into(f, FIXED_DECIMALS as u8, 0, false)
    }
}

#[inline]
fn clamp_i128(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Floor square root (Newton iteration).
fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}
