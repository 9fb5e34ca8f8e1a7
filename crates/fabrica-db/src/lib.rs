//! # fabrica-db: Database Layer for Fábrica de Libros
//!
//! This crate provides database access for users, stock and support tickets.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Fábrica de Libros Data Flow                         │
//! │                                                                         │
//! │  fabrica-cli command (fabrica product search atlas)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    fabrica-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ UserRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_init.sql │  │   │
//! │  │   │ acquire()     │    │ SupportRepo   │    │ 002_idx.sql  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/fabrica/fabrica.db (or FABRICA_DB_PATH)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Database location, pool and per-call connections
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`password`] - Argon2 hashing with legacy plaintext support
//! - [`repository`] - Repository implementations (user, product, support)
//! - [`seed`] - Development data
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fabrica_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("fabrica.db")).await?;
//!
//! let tickets = db.support().list_all().await?;
//! let stock = db.products().search("quijote").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod password;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::support::SupportRepository;
pub use repository::user::UserRepository;
