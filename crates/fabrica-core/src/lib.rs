//! # fabrica-core: Records and Business Rules
//!
//! Everything Fábrica de Libros knows about users, stock and support tickets
//! that does not require a database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Fábrica de Libros Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     fabrica-cli (front end)                     │   │
//! │  │    login ──► stock ──► tickets ──► chat                         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ fabrica-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌────────────┐     │   │
//! │  │   │  types   │  │  ticket  │  │   chat   │  │ validation │     │   │
//! │  │   │ Product  │  │ TicketId │  │ History  │  │   rules    │     │   │
//! │  │   │  User    │  │  Status  │  │ Message  │  │   checks   │     │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └────────────┘     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  fabrica-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - User and product records
//! - [`ticket`] - Ticket records, enums, public ids and the status machine
//! - [`chat`] - Chat history stored alongside a ticket
//! - [`money`] - Integer-cent prices
//! - [`error`] - Domain error types
//! - [`validation`] - Input rules for forms
//!
//! ## Example Usage
//!
//! ```rust
//! use fabrica_core::ticket::{TicketId, TicketStatus};
//!
//! let id = TicketId::sequential(2025, 7);
//! assert_eq!(id.as_str(), "TK-2025-007");
//!
//! let change = TicketStatus::Open.change_to(TicketStatus::Closed);
//! assert!(change.is_ok());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod chat;
pub mod error;
pub mod money;
pub mod ticket;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use chat::{ChatAuthor, ChatHistory, ChatMessage};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use ticket::{
    NewTicket, Rgb, StatusChange, TicketDetail, TicketId, TicketInfo, TicketPriority, TicketStatus,
    TicketType,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;

/// Highest accepted price in cents (99 999 999.99, a `DECIMAL(10,2)` column).
pub const MAX_PRICE_CENTS: i64 = 9_999_999_999;

/// Highest accepted stock quantity (a 32-bit `INT` column).
pub const MAX_STOCK_QUANTITY: i64 = i32::MAX as i64;

/// Display format for timestamps (`dd/MM/yyyy HH:mm`).
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";
