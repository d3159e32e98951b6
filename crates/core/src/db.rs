// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed database for the message log and response cache.
//!
//! The [`Database`] struct provides all data access operations for
//! messages and cached responses. Timestamps are stored as epoch
//! milliseconds so retention cutoffs are plain integer comparisons.

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::error::{Error, Result};
use crate::message::{ChatMessage, ChatResponse};

/// SQL schema for the chat database.
pub const SCHEMA: &str = r#"
-- Append-only log of submitted queries
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

-- Cached answers keyed by verbatim query text
CREATE TABLE IF NOT EXISTS responses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query TEXT NOT NULL UNIQUE,
    response TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    usage_count INTEGER NOT NULL DEFAULT 0 CHECK (usage_count >= 0)
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_messages_created ON messages(created_at);
CREATE INDEX IF NOT EXISTS idx_responses_created ON responses(created_at);
CREATE INDEX IF NOT EXISTS idx_responses_usage ON responses(usage_count DESC, created_at DESC);
"#;

const RESPONSE_COLUMNS: &str = "id, query, response, created_at, usage_count";

/// Row counts removed by a retention purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeCounts {
    pub messages: usize,
    pub responses: usize,
}

impl PurgeCounts {
    /// Total number of rows removed.
    pub fn total(&self) -> usize {
        self.messages + self.responses
    }
}

fn message_from_row(row: &Row<'_>) -> std::result::Result<ChatMessage, rusqlite::Error> {
    Ok(ChatMessage {
        id: row.get(0)?,
        text: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn response_from_row(row: &Row<'_>) -> std::result::Result<ChatResponse, rusqlite::Error> {
    let usage: i64 = row.get(4)?;
    let usage_count = u64::try_from(usage).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Integer,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{usage}' in column 'usage_count'"
            ))),
        )
    })?;

    Ok(ChatResponse {
        id: row.get(0)?,
        query: row.get(1)?,
        response: row.get(2)?,
        created_at: row.get(3)?,
        usage_count,
    })
}

/// Create the schema on a database connection. Safe to run on every open.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Cache keys must be non-empty; an empty key could never be looked up by a send.
fn validate_query(query: &str) -> Result<()> {
    if query.is_empty() {
        return Err(Error::InvalidInput("response query is empty".to_string()));
    }
    Ok(())
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// SQLite database connection with message log and response cache operations.
pub struct Database {
    /// The underlying SQLite connection.
    pub conn: Connection,
}

impl Database {
    /// Open a database connection at the given path, creating the schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL keeps readers off the writer's lock
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        let db = Database { conn };
        init_schema(&db.conn)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        init_schema(&db.conn)?;
        Ok(db)
    }

    /// Latest stored timestamp in `table`, raised to at least `now_ms`.
    ///
    /// Keeps timestamps non-decreasing in insertion order when the wall
    /// clock steps backwards.
    fn next_timestamp(&self, table: &str, now_ms: i64) -> Result<i64> {
        let sql = format!("SELECT MAX(created_at) FROM {table}");
        let latest: Option<i64> = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(latest.map_or(now_ms, |latest| latest.max(now_ms)))
    }

    // ---------------------------------------------------------------
    // Messages
    // ---------------------------------------------------------------

    /// Append a message to the log.
    pub fn insert_message(&self, text: &str, now_ms: i64) -> Result<ChatMessage> {
        let created_at = self.next_timestamp("messages", now_ms)?;
        self.conn.execute(
            "INSERT INTO messages (text, created_at) VALUES (?1, ?2)",
            params![text, created_at],
        )?;

        Ok(ChatMessage {
            id: self.conn.last_insert_rowid(),
            text: text.to_string(),
            created_at,
        })
    }

    /// Get all messages in insertion order.
    pub fn get_all_messages(&self) -> Result<Vec<ChatMessage>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, text, created_at FROM messages ORDER BY id")?;

        let messages = stmt
            .query_map([], message_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    /// Count stored messages.
    pub fn count_messages(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Delete messages created strictly before `cutoff_ms`.
    pub fn delete_messages_older_than(&self, cutoff_ms: i64) -> Result<usize> {
        let affected = self.conn.execute(
            "DELETE FROM messages WHERE created_at < ?1",
            params![cutoff_ms],
        )?;
        Ok(affected)
    }

    // ---------------------------------------------------------------
    // Responses
    // ---------------------------------------------------------------

    /// Store an answer for `query`, replacing any previous answer.
    ///
    /// The usage counter of an existing record is preserved; only the text
    /// and timestamp are refreshed.
    pub fn insert_response(&self, query: &str, response: &str, now_ms: i64) -> Result<ChatResponse> {
        validate_query(query)?;
        let created_at = self.next_timestamp("responses", now_ms)?;
        let sql = format!(
            "INSERT INTO responses (query, response, created_at, usage_count)
             VALUES (?1, ?2, ?3, 0)
             ON CONFLICT(query) DO UPDATE SET
                 response = excluded.response,
                 created_at = excluded.created_at
             RETURNING {RESPONSE_COLUMNS}"
        );
        let stored = self.conn.query_row(
            &sql,
            params![query, response, created_at],
            response_from_row,
        )?;
        Ok(stored)
    }

    /// Store an answer for `query` only if none exists yet.
    ///
    /// Returns true if a record was inserted.
    pub fn insert_response_if_absent(&self, query: &str, response: &str, now_ms: i64) -> Result<bool> {
        validate_query(query)?;
        let created_at = self.next_timestamp("responses", now_ms)?;
        let affected = self.conn.execute(
            "INSERT OR IGNORE INTO responses (query, response, created_at, usage_count)
             VALUES (?1, ?2, ?3, 0)",
            params![query, response, created_at],
        )?;
        Ok(affected > 0)
    }

    /// Get a cached response by ID.
    pub fn get_response(&self, id: i64) -> Result<ChatResponse> {
        let sql = format!("SELECT {RESPONSE_COLUMNS} FROM responses WHERE id = ?1");
        let response = self
            .conn
            .query_row(&sql, params![id], response_from_row)
            .optional()?;

        response.ok_or(Error::ResponseNotFound(id))
    }

    /// Find the cached response whose query text equals `query` exactly.
    pub fn find_response_for_query(&self, query: &str) -> Result<Option<ChatResponse>> {
        let sql = format!("SELECT {RESPONSE_COLUMNS} FROM responses WHERE query = ?1");
        let response = self
            .conn
            .query_row(&sql, params![query], response_from_row)
            .optional()?;
        Ok(response)
    }

    /// Get the most used responses, highest usage first, newest first on ties.
    pub fn get_most_used_responses(&self, limit: usize) -> Result<Vec<ChatResponse>> {
        let sql = format!(
            "SELECT {RESPONSE_COLUMNS} FROM responses
             ORDER BY usage_count DESC, created_at DESC, id DESC
             LIMIT ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let responses = stmt
            .query_map(params![limit_param(limit)], response_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(responses)
    }

    /// Atomically bump the usage counter of a response and return the new count.
    pub fn increment_usage(&self, id: i64) -> Result<u64> {
        let count: Option<i64> = self
            .conn
            .query_row(
                "UPDATE responses SET usage_count = usage_count + 1
                 WHERE id = ?1 RETURNING usage_count",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let count = count.ok_or(Error::ResponseNotFound(id))?;
        u64::try_from(count)
            .map_err(|_| Error::CorruptedData(format!("negative usage_count for response {id}")))
    }

    /// Count cached responses.
    pub fn count_responses(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Delete responses created strictly before `cutoff_ms`.
    pub fn delete_responses_older_than(&self, cutoff_ms: i64) -> Result<usize> {
        let affected = self.conn.execute(
            "DELETE FROM responses WHERE created_at < ?1",
            params![cutoff_ms],
        )?;
        Ok(affected)
    }

    /// Delete responses and messages older than `cutoff_ms` in one transaction.
    pub fn purge_older_than(&mut self, cutoff_ms: i64) -> Result<PurgeCounts> {
        let tx = self.conn.transaction()?;
        let responses = tx.execute(
            "DELETE FROM responses WHERE created_at < ?1",
            params![cutoff_ms],
        )?;
        let messages = tx.execute(
            "DELETE FROM messages WHERE created_at < ?1",
            params![cutoff_ms],
        )?;
        tx.commit()?;

        Ok(PurgeCounts { messages, responses })
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
