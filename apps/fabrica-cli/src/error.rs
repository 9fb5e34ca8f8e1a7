//! # CLI Error Type
//!
//! What the operator sees when a command fails.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in fabrica-cli                            │
//! │                                                                         │
//! │  Command                                                               │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Rule broken?        ── CoreError ─────────► specific message           │
//! │  Not found?          ── DbError::NotFound ─► "… no encontrado"          │
//! │  Anything else?      ── DbError::* ────────► tracing::error! (details)  │
//! │                                              + generic message          │
//! │                                                "Error al …             │
//! │                                                 Inténtelo nuevamente." │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  stderr: message            exit status: ErrorCode::exit_code()        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use fabrica_core::{CoreError, ValidationError};
use fabrica_db::DbError;

/// Generic message for database failures with no better context.
pub const GENERIC_DB_MESSAGE: &str = "Error en la base de datos. Inténtelo nuevamente.";

/// Error returned by every command.
#[derive(Debug, Clone, Serialize, Error)]
#[error("{message}")]
pub struct CliError {
    /// Machine-readable category
    pub code: ErrorCode,

    /// Human-readable message for display
    pub message: String,
}

/// Error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Record does not exist
    NotFound,

    /// Input failed validation
    ValidationError,

    /// Email/password rejected
    AuthFailed,

    /// Business rule refused the operation
    BusinessLogic,

    /// Database operation failed
    DatabaseError,

    /// Anything else
    Internal,
}

impl ErrorCode {
    /// Process exit status for this category.
    pub const fn exit_code(&self) -> u8 {
        match self {
            ErrorCode::Internal => 1,
            ErrorCode::ValidationError => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::AuthFailed => 4,
            ErrorCode::BusinessLogic => 5,
            ErrorCode::DatabaseError => 6,
        }
    }
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        CliError::new(
            ErrorCode::NotFound,
            format!("{} no encontrado: {}", spanish_entity(entity), id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    pub fn business(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::BusinessLogic, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Internal, message)
    }

    /// Converts a database error, replacing the text of unexpected failures
    /// with `generic`.
    ///
    /// Rule violations and "not found" keep their own messages.
    pub fn from_db(err: DbError, generic: &str) -> Self {
        match err {
            DbError::Rule(core) => core.into(),
            DbError::NotFound { entity, id } => CliError::not_found(&entity, &id),
            other => {
                tracing::error!(error = %other, "Database operation failed");
                CliError::new(ErrorCode::DatabaseError, generic)
            }
        }
    }
}

fn spanish_entity(entity: &str) -> &str {
    match entity {
        "Product" => "Producto",
        "Ticket" => "Ticket",
        "User" => "Usuario",
        "Record" => "Registro",
        other => other,
    }
}

impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        CliError::from_db(err, GENERIC_DB_MESSAGE)
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => CliError::not_found("Product", &id.to_string()),
            CoreError::TicketNotFound(id) => CliError::not_found("Ticket", &id),
            CoreError::StatusUnchanged(_) => {
                CliError::business("El ticket ya se encuentra en ese estado.")
            }
            CoreError::InvalidCredentials => {
                CliError::new(ErrorCode::AuthFailed, "Correo o contraseña incorrectos.")
            }
            CoreError::EmailTaken(email) => CliError::validation(format!(
                "El correo {} ya está registrado.",
                email
            )),
            CoreError::ChatHistory(e) => {
                tracing::error!(error = %e, "Stored chat history is unreadable");
                CliError::internal("No se pudo guardar la conversación.")
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::validation(format!("Datos no válidos: {}", err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(format!("No se pudo generar JSON: {}", err))
    }
}

/// Result type for command handlers.
pub type CliResult<T> = Result<T, CliError>;
