//! Fixed-point decimal used for packed and zoned fields.

use std::{fmt, str::FromStr};

use crate::error::ValueError;

/// Largest number of decimal digits a [`Decimal`] can carry (`i128` range).
pub const MAX_DECIMAL_DIGITS: u32 = 38;

/// Exact decimal number `unscaled * 10^-scale`.
///
/// Packed and zoned fields are at most 31 digits long, so an `i128` mantissa
/// holds every value the host can send without rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    unscaled: i128,
    scale: u32,
}

impl Decimal {
    pub fn new(unscaled: i128, scale: u32) -> Self {
        Self { unscaled, scale }
    }

    pub fn unscaled(&self) -> i128 {
        self.unscaled
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Number of significant decimal digits in the mantissa (at least 1).
    pub fn digits(&self) -> u32 {
        let mut n = self.unscaled.unsigned_abs();
        let mut digits = 1;
        while n >= 10 {
            n /= 10;
            digits += 1;
        }
        digits
    }

    /// Re-express the value with `scale` fraction digits.
    ///
    /// Returns `None` when digits would be lost or the mantissa overflows.
    pub fn rescale(&self, scale: u32) -> Option<Self> {
        if scale >= self.scale {
            let factor = pow10(scale - self.scale)?;
            let unscaled = self.unscaled.checked_mul(factor)?;
            Some(Self { unscaled, scale })
        } else {
            let factor = pow10(self.scale - scale)?;
            if self.unscaled % factor != 0 {
                return None;
            }
            Some(Self {
                unscaled: self.unscaled / factor,
                scale,
            })
        }
    }

    /// Integer part, truncated toward zero.
    pub fn trunc(&self) -> i128 {
        match pow10(self.scale) {
            Some(factor) => self.unscaled / factor,
            None => 0,
        }
    }

    pub fn to_f64(&self) -> f64 {
        self.unscaled as f64 / 10f64.powi(self.scale as i32)
    }

    /// Build a decimal from a float through its shortest round-trip text.
    pub fn from_f64(value: f64) -> Result<Self, ValueError> {
        if !value.is_finite() {
            return Err(ValueError::NotANumber {
                value: value.to_string(),
            });
        }
        value.to_string().parse()
    }
}

pub(crate) fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::new(value as i128, 0)
    }
}

impl From<i32> for Decimal {
    fn from(value: i32) -> Self {
        Self::new(value as i128, 0)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.unscaled < 0 { "-" } else { "" };
        let abs = self.unscaled.unsigned_abs();
        if self.scale == 0 {
            return write!(f, "{sign}{abs}");
        }
        match 10u128.checked_pow(self.scale) {
            Some(factor) => write!(
                f,
                "{sign}{}.{:0width$}",
                abs / factor,
                abs % factor,
                width = self.scale as usize
            ),
            None => write!(f, "{sign}{abs}e-{}", self.scale),
        }
    }
}

impl FromStr for Decimal {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let not_a_number = || ValueError::NotANumber {
            value: s.to_string(),
        };
        let text = s.trim();
        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(not_a_number());
        }
        let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !digits_only(int_part) || !digits_only(frac_part) {
            return Err(not_a_number());
        }

        let significant = int_part.trim_start_matches('0').len() + frac_part.len();
        if significant > MAX_DECIMAL_DIGITS as usize {
            return Err(ValueError::OutOfRange {
                value: s.to_string(),
                expected: format!("decimal of at most {MAX_DECIMAL_DIGITS} digits"),
            });
        }

        let mut unscaled: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            unscaled = unscaled * 10 + (b - b'0') as i128;
        }
        if negative {
            unscaled = -unscaled;
        }
        Ok(Self::new(unscaled, frac_part.len() as u32))
    }
}
