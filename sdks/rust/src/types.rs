//! Shared types for the SDK.
//!
//! These mirror the server's `/chat` wire contract and the client-side
//! display model.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// Wire Types
// =============================================================================

/// Body of a `POST /chat` request. Built fresh for every send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Caller-selected persona; opaque to the client.
    pub role: String,
    /// Trimmed question text.
    pub message: String,
}

/// Parsed `POST /chat` response body.
///
/// Only `answer` is read. A missing, null, empty or non-string `answer`
/// all load as `None`; other fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IncomingResponse {
    #[serde(default, deserialize_with = "non_empty_text")]
    pub answer: Option<String>,
}

fn non_empty_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) if !text.is_empty() => Some(text),
        _ => None,
    })
}

impl IncomingResponse {
    /// Parse a raw `/chat` response body.
    ///
    /// A body that is not JSON, or is `null`, has no fields to read and is an
    /// error. Any other JSON document is a response.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        match serde_json::from_slice::<serde_json::Value>(body)? {
            serde_json::Value::Null => Err(Error::NullBody),
            value => Ok(Self::from_value(value)),
        }
    }

    /// Interpret an arbitrary JSON document as a response.
    ///
    /// Anything that is not an object simply has no `answer`.
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

/// FAQ table statistics from `GET /api/faq/stats`.
#[derive(Debug, Clone, Deserialize)]
pub struct FaqStats {
    /// Number of rows being served.
    pub rows: usize,
    /// File the table was loaded from.
    pub source: Option<String>,
    /// RFC 3339 load timestamp.
    pub loaded_at: String,
}

// =============================================================================
// Display Types
// =============================================================================

/// Style tag of a displayed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MessageClass {
    /// Text the user sent.
    #[serde(rename = "user-message")]
    User,
    /// Text shown on behalf of the server, including fallbacks.
    #[default]
    #[serde(rename = "bot-message")]
    Bot,
}

impl MessageClass {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageClass::User => "user-message",
            MessageClass::Bot => "bot-message",
        }
    }
}

impl std::fmt::Display for MessageClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the visible conversation. Never changed once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedEntry {
    pub text: String,
    pub class: MessageClass,
}
