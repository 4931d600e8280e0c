//! Chat message envelope as published by the chat backend.
//!
//! The backend serializes `timeStamp` from a naive local datetime, so it
//! usually arrives without an offset.

use crate::error::Result;
use crate::timestamp::Normalizer;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A message from a chat room topic
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub content: String,
    /// Raw timestamp text, absent on some legacy messages
    #[serde(rename = "timeStamp", default)]
    pub time_stamp: Option<String>,
}

impl ChatMessage {
    /// Parse one JSON object
    pub fn from_json(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// Display string for this message's timestamp
    pub fn display_time(&self, normalizer: &Normalizer, now: DateTime<Utc>) -> String {
        normalizer.render_at(self.time_stamp.as_deref(), now)
    }

    /// One-line rendering: `[<time>] <sender>: <content>`
    pub fn render_line(&self, normalizer: &Normalizer, now: DateTime<Utc>) -> String {
        let time = self.display_time(normalizer, now);
        if time.is_empty() {
            format!("{}: {}", self.sender, self.content)
        } else {
            format!("[{}] {}: {}", time, self.sender, self.content)
        }
    }
}
