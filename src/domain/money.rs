//! Exact currency amounts
//!
//! Amounts keep the decimal value written in the CSV, with no rounding, so
//! slab comparisons are exact equality and sums carry every digit.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Serialize, Serializer};

/// Largest magnitude accepted for a single amount.
///
/// Keeps every per-row value far below `Decimal::MAX`, so sums over any
/// realistic ledger stay exact.
const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// A currency amount in major units (rupees), exact to the input's precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Whole major units.
    pub const fn from_major(major: i64) -> Self {
        Self::with_scale(major, 0)
    }

    /// Minor units (paise).
    pub const fn from_minor(minor: i64) -> Self {
        Self::with_scale(minor, 2)
    }

    const fn with_scale(units: i64, scale: u32) -> Self {
        let abs = units.unsigned_abs();
        Self(Decimal::from_parts(
            abs as u32,
            (abs >> 32) as u32,
            0,
            units < 0,
            scale,
        ))
    }

    /// `None` when the magnitude exceeds the accepted range.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        if value.abs() > MAX_AMOUNT {
            return None;
        }
        if value.is_zero() {
            return Some(Self::ZERO);
        }
        Some(Self(value))
    }

    /// Parse a CSV amount field, coercing anything unparsable or out of range
    /// to zero.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::ZERO)
    }

    pub fn to_decimal(self) -> Decimal {
        self.0
    }

    /// Canonical text form used for storage: no exponent, no trailing zeros.
    pub fn to_storage(self) -> String {
        self.0.normalize().to_string()
    }

    pub fn as_f64(self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// `self` added `count` times.
    pub fn times(self, count: u64) -> Money {
        Money(self.0.saturating_mul(Decimal::from(count)))
    }
}

/// Error returned when a string is not a decimal amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid amount: {0:?}")]
pub struct ParseMoneyError(pub String);

/// Split a plain decimal literal (`[+-]digits[.digits][e[+-]digits]`) into
/// a mantissa `Decimal` can read and an optional exponent. Digit separators,
/// hex and special values are rejected.
fn split_literal(s: &str) -> Option<(String, Option<&str>)> {
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(at) => (&s[..at], Some(&s[at + 1..])),
        None => (s, None),
    };

    let (sign, unsigned) = match mantissa.as_bytes().first() {
        Some(b'-') => ("-", &mantissa[1..]),
        Some(b'+') => ("", &mantissa[1..]),
        _ => ("", mantissa),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    if let Some(exp) = exponent {
        let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if digits.is_empty() || !all_digits(digits) {
            return None;
        }
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let mut normalized = format!("{}{}", sign, int_part);
    if !frac_part.is_empty() {
        normalized.push('.');
        normalized.push_str(frac_part);
    }
    Some((normalized, exponent))
}

impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseMoneyError(s.to_string());
        let (mantissa, exponent) = split_literal(s.trim()).ok_or_else(invalid)?;

        let value = match exponent {
            None => Decimal::from_str_exact(&mantissa),
            Some(exp) => Decimal::from_scientific(&format!("{}e{}", mantissa, exp)),
        }
        .map_err(|_| invalid())?;

        Self::from_decimal(value).ok_or_else(invalid)
    }
}

/// Two decimals, midpoint away from zero.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        write!(f, "{:.2}", rounded)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

/// Serialized as a plain JSON number in major units.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}
