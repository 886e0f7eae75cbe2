//! Invite relay payloads and outgoing mail records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub const DEFAULT_INVITE_KIND: &str = "invite";

fn default_kind() -> String { DEFAULT_INVITE_KIND.to_string() }

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(d).map(Option::unwrap_or_default)
}

fn null_as_default_kind<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(d).map(|k| k.unwrap_or_else(default_kind))
}

/// Body of `POST /api/send-invite`. Absent and `null` fields decode to
/// their defaults so that a missing field is reported as a validation error
/// rather than a decode error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitePayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub link: String,
    #[serde(rename = "type", default = "default_kind", deserialize_with = "null_as_default_kind")]
    pub kind: String,
    #[serde(default)]
    pub from: Option<String>,
}

impl InvitePayload {
    pub fn new(email: impl Into<String>, link: impl Into<String>) -> Self {
        Self { email: email.into(), link: link.into(), kind: default_kind(), from: None }
    }

    pub fn has_required_fields(&self) -> bool {
        !self.email.trim().is_empty() && !self.link.trim().is_empty()
    }

    pub fn is_invite(&self) -> bool { self.kind == DEFAULT_INVITE_KIND }
}

/// Composed message handed to a mailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    pub id: Uuid,
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub queued_at: DateTime<Utc>,
}

/// One failed row of a bulk import; `row` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BulkInviteReport {
    pub total: usize,
    pub done: usize,
    pub sent: usize,
    pub errors: Vec<RowError>,
}
