//! # Validation Module
//!
//! Input rules for the login, product and ticket forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end (fabrica-cli)                                      │
//! │  ├── Parses raw text (prices, quantities, enum names)                  │
//! │  └── Calls THIS MODULE before touching the database                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (usuarios.correo, tickets.ticket_id)                       │
//! │  └── Foreign keys (mensaje_tickets → tickets, usuarios)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use fabrica_core::validation::{validate_email, validate_password};
//!
//! validate_email("ana@fabrica.es").unwrap();
//! assert!(validate_password("12345").is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_PRICE_CENTS, MAX_PRODUCT_NAME_LEN, MAX_STOCK_QUANTITY, MIN_PASSWORD_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Fails with `Required` when the trimmed value is empty.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty
/// - Exactly one `@` with a non-empty local part
/// - Domain contains a `.` that is neither first nor last
/// - No whitespace
///
/// ## Example
/// ```rust
/// use fabrica_core::validation::validate_email;
///
/// assert!(validate_email("cliente@correo.com").is_ok());
/// assert!(validate_email("cliente@correo").is_err());
/// assert!(validate_email("").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    validate_required("email", email)?;

    let invalid = || ValidationError::invalid_format("email", "must look like name@domain.tld");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    match domain.rfind('.') {
        Some(dot) if dot > 0 && dot < domain.len() - 1 && !domain.starts_with('.') => Ok(()),
        _ => Err(invalid()),
    }
}

/// Validates a new password.
///
/// ## Rules
/// - Must not be empty
/// - At least [`MIN_PASSWORD_LEN`] characters
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

/// Validates the registration form: email, password and its confirmation.
pub fn validate_registration(email: &str, password: &str, confirmation: &str) -> ValidationResult<()> {
    validate_email(email)?;
    validate_password(password)?;

    if password != confirmation {
        return Err(ValidationError::Mismatch {
            field: "password confirmation".to_string(),
        });
    }

    Ok(())
}

/// Validates the login form. Only presence is checked.
pub fn validate_login(email: &str, password: &str) -> ValidationResult<()> {
    validate_required("email", email)?;
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_PRODUCT_NAME_LEN`] characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();
    validate_required("name", name)?;

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a stock search term.
///
/// ## Returns
/// The trimmed term. Empty is allowed and matches every product.
pub fn validate_search_term(term: &str) -> ValidationResult<String> {
    let term = term.trim();

    if term.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(term.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents: `0..=MAX_PRICE_CENTS`.
///
/// ## Example
/// ```rust
/// use fabrica_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(10_000_000_000).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    validate_bounded("price", cents, MAX_PRICE_CENTS)
}

/// Validates a stock quantity: `0..=MAX_STOCK_QUANTITY`. Zero means sold out.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    validate_bounded("quantity", qty, MAX_STOCK_QUANTITY)
}

fn validate_bounded(field: &str, value: i64, max: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if value > max {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Parses a quantity typed into the product form.
pub fn parse_stock_quantity(input: &str) -> ValidationResult<i64> {
    let input = input.trim();
    validate_required("quantity", input)?;

    let qty: i64 = input
        .parse()
        .map_err(|_| ValidationError::invalid_format("quantity", "must be a whole number"))?;

    validate_stock_quantity(qty)?;
    Ok(qty)
}

// =============================================================================
// Chat
// =============================================================================

/// A chat message must contain something other than whitespace.
pub fn validate_chat_message(message: &str) -> ValidationResult<()> {
    validate_required("message", message)
}

// =============================================================================
// Unit Tests
// =============================================================================
