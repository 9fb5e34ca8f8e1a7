//! # Support Tickets
//!
//! Ticket records, the fixed priority/status/type enumerations, public ticket
//! ids, and the status transition rules.
//!
//! ## Storage Split
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 One ticket = two rows, written together                 │
//! │                                                                         │
//! │  tickets                         mensaje_tickets                        │
//! │  ───────────────────             ─────────────────────────────          │
//! │  ticket_id  TK-2025-007  ◄────── ticket_id                              │
//! │  contenido                        nombre_cliente, email_cliente         │
//! │  tipo                             asunto, descripcion                   │
//! │  fecha                            prioridad, estado                     │
//! │                                   fecha_creacion, usuario_id            │
//! │                                                                         │
//! │  TicketInfo   = the columns a list view needs                           │
//! │  TicketDetail = TicketInfo + descripcion + contenido + fecha            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Machine
//! ```text
//!        ┌──────────────────────────────────────────────┐
//!        ▼                                              │
//!     abierto ◄──► en_proceso ◄──► resuelto ◄──► cerrado
//!        ▲                                              │
//!        └──────────── any state to any other ──────────┘
//!
//!  Only rule: the target must differ from the current state.
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::chat::ChatHistory;
use crate::error::{CoreError, ValidationError};
use crate::validation::{validate_email, validate_required};
use crate::DISPLAY_DATE_FORMAT;

// =============================================================================
// Colors
// =============================================================================

/// An RGB color used by front ends to paint priority and status badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Neutral grey, also the fallback color.
    pub const GREY: Rgb = Rgb(108, 117, 125);
    pub const RED: Rgb = Rgb(220, 53, 69);
    pub const YELLOW: Rgb = Rgb(255, 193, 7);
    pub const BLUE: Rgb = Rgb(0, 123, 255);
    pub const GREEN: Rgb = Rgb(40, 167, 69);

    /// `#rrggbb`
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

// =============================================================================
// Priority
// =============================================================================

/// Ticket priority. Stored as the Spanish value in `mensaje_tickets.prioridad`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum TicketPriority {
    #[serde(rename = "baja")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "baja"))]
    Low,
    #[serde(rename = "media")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "media"))]
    Medium,
    #[serde(rename = "alta")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "alta"))]
    High,
    #[serde(rename = "urgente")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "urgente"))]
    Urgent,
}

impl TicketPriority {
    /// Every priority, lowest first.
    pub const ALL: [TicketPriority; 4] = [
        TicketPriority::Low,
        TicketPriority::Medium,
        TicketPriority::High,
        TicketPriority::Urgent,
    ];

    /// The stored value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "baja",
            TicketPriority::Medium => "media",
            TicketPriority::High => "alta",
            TicketPriority::Urgent => "urgente",
        }
    }

    /// Sort rank used by the ticket list: urgent = 1 … low = 4.
    pub const fn rank(&self) -> u8 {
        match self {
            TicketPriority::Urgent => 1,
            TicketPriority::High => 2,
            TicketPriority::Medium => 3,
            TicketPriority::Low => 4,
        }
    }

    pub const fn color(&self) -> Rgb {
        match self {
            TicketPriority::Urgent => Rgb::RED,
            TicketPriority::High => Rgb::YELLOW,
            TicketPriority::Medium => Rgb::BLUE,
            TicketPriority::Low => Rgb::GREEN,
        }
    }
}

impl Default for TicketPriority {
    fn default() -> Self {
        TicketPriority::Medium
    }
}

// =============================================================================
// Status
// =============================================================================

/// Ticket status. Stored as the Spanish value in `mensaje_tickets.estado`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum TicketStatus {
    #[serde(rename = "abierto")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "abierto"))]
    Open,
    #[serde(rename = "en_proceso")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "en_proceso"))]
    InProgress,
    #[serde(rename = "resuelto")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "resuelto"))]
    Resolved,
    #[serde(rename = "cerrado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cerrado"))]
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    /// The stored value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "abierto",
            TicketStatus::InProgress => "en_proceso",
            TicketStatus::Resolved => "resuelto",
            TicketStatus::Closed => "cerrado",
        }
    }

    /// Badge text: `en_proceso` → `EN PROCESO`.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }

    pub const fn color(&self) -> Rgb {
        match self {
            TicketStatus::Open => Rgb::GREEN,
            TicketStatus::InProgress => Rgb::YELLOW,
            TicketStatus::Resolved => Rgb::BLUE,
            TicketStatus::Closed => Rgb::GREY,
        }
    }

    /// Validates a transition to `next`.
    ///
    /// Any state may move to any other, reopening included. Choosing the
    /// current state is rejected with [`CoreError::StatusUnchanged`].
    ///
    /// ## Example
    /// ```rust
    /// use fabrica_core::ticket::TicketStatus;
    ///
    /// assert!(TicketStatus::Closed.change_to(TicketStatus::Open).is_ok());
    /// assert!(TicketStatus::Open.change_to(TicketStatus::Open).is_err());
    /// ```
    pub fn change_to(self, next: TicketStatus) -> Result<StatusChange, CoreError> {
        if self == next {
            return Err(CoreError::StatusUnchanged(self));
        }
        Ok(StatusChange {
            from: self,
            to: next,
        })
    }

    /// Transition to `Closed`; an already-closed ticket yields
    /// [`CoreError::StatusUnchanged`] so the caller can show a notice.
    pub fn close(self) -> Result<StatusChange, CoreError> {
        self.change_to(TicketStatus::Closed)
    }
}

impl Default for TicketStatus {
    fn default() -> Self {
        TicketStatus::Open
    }
}

/// An accepted status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: TicketStatus,
    pub to: TicketStatus,
}

impl StatusChange {
    /// System line appended to the chat history after the change.
    pub fn system_note(&self) -> String {
        match self.to {
            TicketStatus::Closed => "Ticket cerrado por el soporte".to_string(),
            to => format!("Estado cambiado a '{}'", to.label()),
        }
    }
}

// =============================================================================
// Type
// =============================================================================

/// Ticket category. Stored in `tickets.tipo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum TicketType {
    #[serde(rename = "consulta")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "consulta"))]
    Inquiry,
    #[serde(rename = "problema")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "problema"))]
    Problem,
    #[serde(rename = "sugerencia")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "sugerencia"))]
    Suggestion,
    #[serde(rename = "urgente")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "urgente"))]
    Urgent,
}

impl TicketType {
    pub const ALL: [TicketType; 4] = [
        TicketType::Inquiry,
        TicketType::Problem,
        TicketType::Suggestion,
        TicketType::Urgent,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            TicketType::Inquiry => "consulta",
            TicketType::Problem => "problema",
            TicketType::Suggestion => "sugerencia",
            TicketType::Urgent => "urgente",
        }
    }
}

impl Default for TicketType {
    fn default() -> Self {
        TicketType::Inquiry
    }
}

// =============================================================================
// Enum parsing / display
// =============================================================================

/// Implements `Display` (stored value) and `FromStr` (stored value or the
/// English variant name, case-insensitive) for the ticket enums.
macro_rules! stored_enum {
    ($ty:ident, $field:literal, [$($variant:ident => $english:literal),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_lowercase().replace(['-', ' '], "_");
                $(
                    if needle == $ty::$variant.as_str() || needle == $english {
                        return Ok($ty::$variant);
                    }
                )+
                Err(ValidationError::NotAllowed {
                    field: $field.to_string(),
                    allowed: $ty::ALL.iter().map(|v| v.as_str().to_string()).collect(),
                })
            }
        }
    };
}

stored_enum!(TicketPriority, "priority", [
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
]);

stored_enum!(TicketStatus, "status", [
    Open => "open",
    InProgress => "in_progress",
    Resolved => "resolved",
    Closed => "closed",
]);

stored_enum!(TicketType, "type", [
    Inquiry => "inquiry",
    Problem => "problem",
    Suggestion => "suggestion",
    Urgent => "urgent",
]);

// =============================================================================
// Ticket Id
// =============================================================================

/// Public ticket identifier: `TK-<year>-<sequence>`.
///
/// The sequence is zero-padded to three digits. When the sequence query
/// fails the data layer falls back to a millisecond timestamp, so longer
/// sequences are accepted when parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    const PREFIX: &'static str = "TK-";

    /// `TK-2025-007`
    pub fn sequential(year: i32, sequence: i64) -> Self {
        TicketId(format!("{}{}-{:03}", Self::PREFIX, year, sequence))
    }

    /// `TK-2025-1736951234567`
    pub fn fallback(year: i32, timestamp_millis: i64) -> Self {
        TicketId(format!("{}{}-{}", Self::PREFIX, year, timestamp_millis))
    }

    /// The prefix shared by every id issued in `year` (`TK-2025-`).
    pub fn year_prefix(year: i32) -> String {
        format!("{}{}-", Self::PREFIX, year)
    }

    /// Parses and validates an id typed by a user.
    ///
    /// ## Example
    /// ```rust
    /// use fabrica_core::ticket::TicketId;
    ///
    /// let id = TicketId::parse("tk-2025-012").unwrap();
    /// assert_eq!(id.as_str(), "TK-2025-012");
    /// assert_eq!(id.year(), 2025);
    /// assert_eq!(id.sequence(), 12);
    /// assert!(TicketId::parse("TK-25-1").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_uppercase();
        let invalid = || ValidationError::invalid_format("ticket id", "expected TK-YYYY-NNN");

        let rest = normalized.strip_prefix(Self::PREFIX).ok_or_else(invalid)?;
        let (year, sequence) = rest.split_once('-').ok_or_else(invalid)?;

        let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
        if year.len() != 4 || !digits(year) || sequence.len() < 3 || !digits(sequence) {
            return Err(invalid());
        }
        if sequence.parse::<i64>().is_err() {
            return Err(invalid());
        }

        Ok(TicketId(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Year component. Ids built by this type always have one.
    pub fn year(&self) -> i32 {
        self.0
            .get(3..7)
            .and_then(|y| y.parse().ok())
            .unwrap_or_default()
    }

    /// Sequence component.
    pub fn sequence(&self) -> i64 {
        self.0
            .get(8..)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TicketId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TicketId::parse(s)
    }
}

impl AsRef<str> for TicketId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Ticket Records
// =============================================================================

/// The columns shown in the ticket list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TicketInfo {
    /// Row id of the message record.
    pub id: i64,
    pub ticket_id: TicketId,
    pub requester_name: String,
    pub requester_email: String,
    pub subject: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub ticket_type: TicketType,
}

impl TicketInfo {
    /// Creation date as `dd/MM/yyyy HH:mm`, or `Sin fecha`.
    pub fn formatted_date(&self) -> String {
        self.created_at
            .map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
            .unwrap_or_else(|| "Sin fecha".to_string())
    }

    pub fn priority_color(&self) -> Rgb {
        self.priority.color()
    }

    pub fn status_color(&self) -> Rgb {
        self.status.color()
    }
}

/// Everything known about one ticket: list columns plus free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TicketDetail {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub info: TicketInfo,
    /// Message body; may hold a JSON chat history (see [`crate::chat`]).
    pub description: String,
    /// Summary stored on the ticket row.
    pub content: String,
    /// Date of the ticket row.
    pub ticket_date: Option<DateTime<Utc>>,
}

impl TicketDetail {
    /// Both description and content carry text.
    pub fn has_complete_information(&self) -> bool {
        !self.description.trim().is_empty() && !self.content.trim().is_empty()
    }

    /// The conversation stored in the description.
    pub fn chat_history(&self) -> ChatHistory {
        ChatHistory::from_description(&self.description, self.info.created_at)
    }

    /// `Ticket TK-2025-001 - Ana Pérez (ABIERTO)`
    pub fn summary(&self) -> String {
        format!(
            "Ticket {} - {} ({})",
            self.info.ticket_id,
            self.info.requester_name,
            self.info.status.as_str().to_uppercase()
        )
    }
}

// =============================================================================
// New Ticket
// =============================================================================

/// Form data for a new ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub requester_name: String,
    pub requester_email: String,
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
    pub ticket_type: TicketType,
    /// User that files the ticket.
    pub user_id: i64,
}

impl NewTicket {
    /// Checks the ticket form: name, subject and description required,
    /// email well formed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("requester name", &self.requester_name)?;
        validate_email(&self.requester_email)?;
        validate_required("subject", &self.subject)?;
        validate_required("description", &self.description)?;
        Ok(())
    }

    /// Text stored on the ticket row.
    pub fn content(&self) -> String {
        format!(
            "Asunto: {}\n\nDescripción: {}",
            self.subject.trim(),
            self.description.trim()
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
