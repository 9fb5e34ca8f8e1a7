//! # Domain Types
//!
//! User and product records.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │     Product     │   │  ProductInput   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  name           │       │
//! │  │  email          │   │  name           │   │  price_cents    │       │
//! │  │  password_hash  │   │  price_cents    │   │  quantity       │       │
//! │  └─────────────────┘   │  quantity       │   └─────────────────┘       │
//! │                        │  updated_at     │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ticket records live in [`crate::ticket`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{validate_price_cents, validate_product_name, validate_stock_quantity};
use crate::DISPLAY_DATE_FORMAT;

// =============================================================================
// User
// =============================================================================

/// A registered user.
///
/// The stored password is either an Argon2 PHC string or, for rows created
/// by the legacy system, the plaintext password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

// =============================================================================
// Product
// =============================================================================

/// A product in stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Database identifier.
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Units in stock.
    pub quantity: i64,

    /// Last insert/update, assigned by the data layer.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Products compare by identity, like rows.
impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Product {}

impl Product {
    /// Returns the price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Value of the units in stock (price × quantity).
    pub fn stock_value(&self) -> Money {
        self.price() * self.quantity
    }

    /// Whether at least one unit is in stock.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.quantity > 0
    }

    /// Modification date as `dd/MM/yyyy HH:mm`, empty when unknown.
    pub fn formatted_date(&self) -> String {
        self.updated_at
            .map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// Returns the editable fields of this product.
    pub fn to_input(&self) -> ProductInput {
        ProductInput {
            name: self.name.clone(),
            price_cents: self.price_cents,
            quantity: self.quantity,
        }
    }
}

/// Editable product fields, used for both create and full-replace update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub price_cents: i64,
    pub quantity: i64,
}

impl ProductInput {
    /// Creates an input with the name trimmed.
    pub fn new(name: impl Into<String>, price: Money, quantity: i64) -> Self {
        ProductInput {
            name: name.into().trim().to_string(),
            price_cents: price.cents(),
            quantity,
        }
    }

    /// Checks the product rules: name required, price and quantity ≥ 0.
    ///
    /// ## Example
    /// ```rust
    /// use fabrica_core::{Money, ProductInput};
    ///
    /// assert!(ProductInput::new("Atlas", Money::from_cents(0), 0).validate().is_ok());
    /// assert!(ProductInput::new("Atlas", Money::from_cents(-1), 0).validate().is_err());
    /// assert!(ProductInput::new("Atlas", Money::from_cents(100), -3).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_product_name(&self.name)?;
        validate_price_cents(self.price_cents)?;
        validate_stock_quantity(self.quantity)?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn product(quantity: i64) -> Product {
        Product {
            id: 1,
            name: "Don Quijote".to_string(),
            price_cents: 1999,
            quantity,
            updated_at: None,
        }
    }

    #[test]
    fn test_stock_value_and_availability() {
        let p = product(3);
        assert_eq!(p.stock_value().cents(), 5997);
        assert!(p.is_available());
        assert!(!product(0).is_available());
    }

    #[test]
    fn test_formatted_date() {
        let mut p = product(1);
        assert_eq!(p.formatted_date(), "");

        p.updated_at = Some(Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 0).unwrap());
        assert_eq!(p.formatted_date(), "09/03/2025 14:05");
    }

    #[test]
    fn test_equality_is_by_id() {
        let a = product(1);
        let mut b = product(50);
        b.name = "Otro".to_string();
        assert_eq!(a, b);
    }

    #[test]
    fn test_input_validation() {
        assert!(ProductInput::new("  ", Money::from_cents(100), 1)
            .validate()
            .is_err());
        assert!(ProductInput::new("Libro", Money::from_cents(100), 1)
            .validate()
            .is_ok());
        assert_eq!(ProductInput::new("  Libro ", Money::zero(), 0).name, "Libro");
    }
}
