use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Store-assigned identifier of a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(Uuid);

impl TodoId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TodoId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TodoId>,
    pub body: String,
    #[serde(default)]
    pub completed: bool,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Payload of `POST /todos`.
///
/// Every field is optional at the parse level so that a missing `body` or
/// `date` is reported by [`NewTodoRequest::validate`] instead of being
/// rejected as a malformed body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTodoRequest {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Todo body is required")]
    MissingBody,

    #[error("Todo date is required")]
    MissingDate,

    #[error("Invalid date format. Use YYYY-MM-DD")]
    InvalidDate,
}

impl NewTodoRequest {
    /// Checks are ordered; the first failure wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.body.is_empty() {
            return Err(ValidationError::MissingBody);
        }
        if self.date.is_empty() {
            return Err(ValidationError::MissingDate);
        }
        if !is_valid_date(&self.date) {
            return Err(ValidationError::InvalidDate);
        }
        Ok(())
    }

    /// Builds the document to insert. `created_at` and `updated_at` share `now`.
    pub fn into_todo(self, now: String) -> Todo {
        Todo {
            id: None,
            body: self.body,
            completed: self.completed,
            date: self.date,
            time: self.time.filter(|t| !t.is_empty()),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Payload of `PATCH /todos/{id}`. A missing `completed` means `false`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodoStatusRequest {
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `YYYY-MM-DD`, zero padded, and a real calendar day.
pub fn is_valid_date(s: &str) -> bool {
    // chrono tolerates a leading space or sign in numeric fields
    let bytes = s.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    shaped && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Current UTC time as RFC 3339 with second precision, e.g. `2024-03-20T10:00:00Z`.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
