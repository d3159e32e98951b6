// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Record types for the message log and the response cache.
//!
//! A [`ChatMessage`] is written for every accepted send. A [`ChatResponse`]
//! is a cached answer keyed by the verbatim query text; the two are related
//! only by string equality, never by a foreign key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-originated query as recorded in the message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Database-assigned identifier; increases with insertion order.
    pub id: i64,
    /// The text the user submitted.
    pub text: String,
    /// Creation time in milliseconds since Unix epoch.
    pub created_at: i64,
}

impl ChatMessage {
    /// Returns the creation time as a UTC datetime, if representable.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.created_at)
    }
}

/// A cached answer for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: i64,
    /// The query text this answer was produced for (exact-match key).
    pub query: String,
    /// The answer text.
    pub response: String,
    /// Creation time in milliseconds since Unix epoch.
    pub created_at: i64,
    /// Number of times this answer was served from the cache.
    pub usage_count: u64,
}

impl ChatResponse {
    /// Returns the creation time as a UTC datetime, if representable.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.created_at)
    }
}

/// A curated query/answer pair preloaded into the response cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSeed {
    pub query: String,
    pub response: String,
}

impl ResponseSeed {
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        ResponseSeed {
            query: query.into(),
            response: response.into(),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
