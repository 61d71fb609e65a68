//! Amount type for the monetary value of a ledger line.
//!
//! This module provides the `Amount` type which wraps `Decimal`. Parsing is deliberately strict:
//! a ledger cell either holds a plain number or it does not, and in the latter case the row is
//! dropped by the parser rather than guessed at.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents a monetary amount from the ledger.
///
/// Accepted text is an optional sign, digits with an optional `.` fraction, and an optional
/// exponent. Anything else is rejected, including surrounding whitespace, currency symbols,
/// thousands separators and a comma used as the decimal separator.
///
/// # Examples
///
/// ```
/// # use vendor_spend::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("12.34").unwrap();
/// assert_eq!(amount.to_string(), "12.34");
/// assert!(Amount::from_str("12,34").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Adds `other`, or returns `None` if the sum does not fit in a `Decimal`.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Formats with thousands separators and two decimals, e.g. `-60,000.00`.
    pub fn to_grouped_string(&self) -> String {
        let num = self.0.abs().to_f64().unwrap_or_default();
        let sign = if self.0.is_sign_negative() && !self.0.is_zero() {
            "-"
        } else {
            ""
        };
        format!("{sign}{}", format_num::format_num!(",.2", num))
    }
}

/// An error that can occur when parsing a ledger cell into an `Amount`.
pub enum AmountError {
    /// The text is not shaped like a plain number.
    Malformed(String),
    /// The text is shaped like a number but does not fit a `Decimal`.
    Decimal(rust_decimal::Error),
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Malformed(s) => write!(f, "'{s}' is not a plain decimal number"),
            AmountError::Decimal(e) => Display::fmt(e, f),
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AmountError::Malformed(_) => None,
            AmountError::Decimal(e) => Some(e),
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_plain_number(s) {
            return Err(AmountError::Malformed(s.to_string()));
        }
        let (sign, unsigned) = match s.as_bytes().first() {
            Some(b'-') => ("-", &s[1..]),
            Some(b'+') => ("", &s[1..]),
            _ => ("", s),
        };
        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(ix) => (&unsigned[..ix], Some(&unsigned[ix + 1..])),
            None => (unsigned, None),
        };
        // `.5` and `5.` are valid ledger numbers but not valid `Decimal` text.
        let mantissa = mantissa.strip_suffix('.').unwrap_or(mantissa);
        let lead = if mantissa.starts_with('.') { "0" } else { "" };
        let value = match exponent {
            Some(exp) => Decimal::from_scientific(&format!("{sign}{lead}{mantissa}e{exp}")),
            None => Decimal::from_str(&format!("{sign}{lead}{mantissa}")),
        }
        .map_err(AmountError::Decimal)?;
        Ok(Amount(value))
    }
}

/// Checks `s` against `[+-]? (digits [. digits?] | . digits) ([eE] [+-]? digits)?`.
fn is_plain_number(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;
    let mut frac_digits = 0;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = i - frac_start;
    }
    if int_digits + frac_digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Serialize for Amount {
    /// Serializes as a JSON number: whole amounts as integers, everything else as a float.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.0.fract().is_zero() {
            if let Some(n) = self.0.to_i64() {
                return serializer.serialize_i64(n);
            }
        }
        serializer.serialize_f64(self.0.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a string holding a plain decimal number")
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Amount, E> {
        Decimal::from_f64(v)
            .map(Amount)
            .ok_or_else(|| E::custom(format!("{v} cannot be represented as a decimal")))
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
