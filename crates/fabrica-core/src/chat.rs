//! # Ticket Chat
//!
//! The conversation on a ticket is kept in `mensaje_tickets.descripcion`.
//!
//! ```text
//!   descripcion = "Faltan dos cajas"                    (never replied to)
//!
//!   descripcion = [                                     (after first reply)
//!     {"autor":"cliente","mensaje":"Faltan dos cajas","fecha":"2025-03-09 14:05:00"},
//!     {"autor":"soporte","mensaje":"Lo revisamos","fecha":"2025-03-09 15:00:00"}
//!   ]
//! ```
//!
//! Plain text is read as a single message from the client, dated at the
//! ticket's creation. Entries written by other tools are kept as they are:
//! an unknown `autor` survives a rewrite, a missing `mensaje` is empty and an
//! unreadable `fecha` is no date.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::validation::validate_chat_message;
use crate::DISPLAY_DATE_FORMAT;

/// Who wrote a chat line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatAuthor {
    #[default]
    #[serde(rename = "cliente")]
    Client,
    #[serde(rename = "soporte")]
    Support,
    #[serde(rename = "sistema")]
    System,
    /// Any other stored `autor`, written back unchanged.
    #[serde(untagged)]
    Other(String),
}

impl ChatAuthor {
    /// Name shown next to the message.
    pub fn display_name(&self) -> &str {
        match self {
            ChatAuthor::Client => "Cliente",
            ChatAuthor::Support => "Soporte",
            ChatAuthor::System => "SISTEMA",
            ChatAuthor::Other(name) => name,
        }
    }
}

/// One line of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "autor", default)]
    pub author: ChatAuthor,
    #[serde(rename = "mensaje", default)]
    pub text: String,
    #[serde(rename = "fecha", with = "stored_date", default)]
    pub sent_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    pub fn new(author: ChatAuthor, text: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        ChatMessage {
            author,
            text: text.into(),
            sent_at: Some(sent_at),
        }
    }

    /// `[09/03/2025 14:05] Soporte: Lo revisamos`
    pub fn render(&self) -> String {
        let when = self
            .sent_at
            .map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
            .unwrap_or_else(|| "Sin fecha".to_string());
        format!("[{}] {}: {}", when, self.author.display_name(), self.text)
    }
}

/// The full conversation of a ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    /// Reads the stored description for display.
    ///
    /// Same as [`ChatHistory::parse_stored`], except that a JSON array that
    /// cannot be decoded is shown as one client message.
    ///
    /// ## Example
    /// ```rust
    /// use fabrica_core::chat::{ChatAuthor, ChatHistory};
    ///
    /// let history = ChatHistory::from_description("Faltan dos cajas", None);
    /// assert_eq!(history.len(), 1);
    /// assert_eq!(history.messages()[0].author, ChatAuthor::Client);
    /// ```
    pub fn from_description(description: &str, created_at: Option<DateTime<Utc>>) -> Self {
        Self::parse_stored(description, created_at)
            .unwrap_or_else(|_| Self::plain(description, created_at))
    }

    /// Reads the stored description before it is rewritten.
    ///
    /// A JSON array of messages is decoded entry by entry. Any other
    /// non-empty text becomes one client message dated `created_at`, and
    /// empty text is an empty history.
    ///
    /// ## Errors
    /// `CoreError::ChatHistory` when the description is a JSON array whose
    /// entries are not messages. Writing over it would bury the stored
    /// conversation inside a single message.
    pub fn parse_stored(
        description: &str,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<Self, CoreError> {
        let trimmed = description.trim();
        if trimmed.is_empty() {
            return Ok(ChatHistory::default());
        }

        if trimmed.starts_with('[') {
            if let Ok(entries) = serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
                let messages = entries
                    .into_iter()
                    .map(serde_json::from_value::<ChatMessage>)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| CoreError::ChatHistory(e.to_string()))?;
                return Ok(ChatHistory { messages });
            }
        }

        Ok(Self::plain(description, created_at))
    }

    fn plain(description: &str, created_at: Option<DateTime<Utc>>) -> Self {
        ChatHistory {
            messages: vec![ChatMessage {
                author: ChatAuthor::Client,
                text: description.to_string(),
                sent_at: created_at,
            }],
        }
    }

    /// Appends a message typed by a client or support agent.
    pub fn push(&mut self, message: ChatMessage) -> Result<(), CoreError> {
        if message.author != ChatAuthor::System {
            validate_chat_message(&message.text)?;
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Encodes the history for storage. Non-ASCII text is kept as is.
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(&self.messages).map_err(|e| CoreError::ChatHistory(e.to_string()))
    }
}

/// `fecha` is written as `YYYY-MM-DD HH:MM:SS` (UTC). RFC 3339 is accepted
/// on read, and an unreadable date becomes `None`.
mod stored_date {
    use super::*;
    use serde::{Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&d.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(raw.as_str().and_then(parse))
    }

    fn parse(s: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(s.trim(), FORMAT)
            .map(|n| n.and_utc())
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(s.trim())
                    .map(|d| d.with_timezone(&Utc))
                    .ok()
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
