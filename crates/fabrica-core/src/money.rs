//! # Money Module
//!
//! Product prices are integer cents.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  Stock value = Σ price × quantity must add up to the cent, so the      │
//! │  price typed into the product form ("12.50") is parsed straight into   │
//! │  1250 cents and never touches a float.                                 │
//! │                                                                         │
//! │  Products and sums saturate at i64::MAX instead of overflowing.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use fabrica_core::money::Money;
//!
//! let price = Money::parse("12.5").unwrap();
//! assert_eq!(price.cents(), 1250);
//! assert_eq!(price.to_string(), "€12.50");
//! assert_eq!((price * 3).cents(), 3750);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Mul;

use crate::error::ValidationError;

/// A monetary value in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole units (euros), truncated toward zero.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// The cents part, always 0..=99.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Parses a decimal price as typed into a form.
    ///
    /// ## Rules
    /// - Digits with an optional `.` or `,` separator
    /// - At most two fraction digits
    /// - A leading `-` is accepted so the caller can report "negative"
    ///   rather than "malformed"
    ///
    /// ## Example
    /// ```rust
    /// use fabrica_core::money::Money;
    ///
    /// assert_eq!(Money::parse("10").unwrap().cents(), 1000);
    /// assert_eq!(Money::parse("10,99").unwrap().cents(), 1099);
    /// assert_eq!(Money::parse("-1.5").unwrap().cents(), -150);
    /// assert!(Money::parse("1.999").is_err());
    /// assert!(Money::parse("abc").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ValidationError::required("price"));
        }

        let invalid = || ValidationError::invalid_format("price", "must be a decimal number");

        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (whole, fraction) = match digits.split_once(['.', ',']) {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        if fraction.len() > 2 {
            return Err(ValidationError::invalid_format(
                "price",
                "at most two decimal places",
            ));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}€{}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Multiplication by a stock quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

/// Stock totals.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        Money(iter.fold(0i64, |acc, m| acc.saturating_add(m.0)))
    }
}
