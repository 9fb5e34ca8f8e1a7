//! # Repository Module
//!
//! Database repository implementations for Fábrica de Libros.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CLI command                                                           │
//! │       │                                                                 │
//! │       │  db.products().search("atlas")                                 │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── list_all / get_by_id / search                                     │
//! │  └── create / update / delete                                          │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Registration and login
//! - [`ProductRepository`](product::ProductRepository) - Stock CRUD and search
//! - [`SupportRepository`](support::SupportRepository) - Tickets, status and chat

pub mod product;
pub mod support;
pub mod user;
