// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable store shared by the dispatcher and the retention sweeper.
//!
//! Wraps the synchronous [`Database`] for async callers. Every call runs on
//! the blocking pool so SQLite I/O never stalls a runtime worker.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::debug;

use chatline_core::{
    ChatMessage, ChatResponse, ClockSource, Database, Error, PurgeCounts, ResponseSeed, Result,
};

/// Snapshot of the message log published to observers.
pub type MessageSnapshot = Arc<Vec<ChatMessage>>;

/// Shared store state containing the database and the message feed.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    /// The database (protected by mutex; rusqlite connections are not Sync).
    db: Mutex<Database>,
    /// Source of record timestamps.
    clock: Arc<dyn ClockSource>,
    /// Latest message log, republished after every message write.
    messages_tx: watch::Sender<MessageSnapshot>,
}

impl Store {
    /// Wraps an open database, loading the current message log into the feed.
    pub fn new(db: Database, clock: Arc<dyn ClockSource>) -> Result<Self> {
        let initial = db.get_all_messages()?;
        let (messages_tx, _) = watch::channel(Arc::new(initial));

        Ok(Store {
            inner: Arc::new(StoreInner {
                db: Mutex::new(db),
                clock,
                messages_tx,
            }),
        })
    }

    /// Opens (creating if needed) the database file at `path`.
    pub async fn open(path: &Path, clock: Arc<dyn ClockSource>) -> Result<Self> {
        let path = path.to_path_buf();
        let db = tokio::task::spawn_blocking(move || Database::open(&path))
            .await
            .map_err(|e| Error::TaskFailed(e.to_string()))??;
        Store::new(db, clock)
    }

    /// Current time according to the store's clock.
    pub fn now_ms(&self) -> i64 {
        self.inner.clock.now_ms()
    }

    /// Runs `f` against the database on the blocking pool.
    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database, &watch::Sender<MessageSnapshot>) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut db = inner.db.lock().map_err(|_| Error::LockPoisoned)?;
            f(&mut *db, &inner.messages_tx)
        })
        .await
        .map_err(|e| Error::TaskFailed(e.to_string()))?
    }

    // ---------------------------------------------------------------
    // Messages
    // ---------------------------------------------------------------

    /// Appends a message and publishes the new log.
    pub async fn insert_message(&self, text: &str) -> Result<ChatMessage> {
        let text = text.to_string();
        let now = self.now_ms();
        self.with_db(move |db, tx| {
            let message = db.insert_message(&text, now)?;
            publish(db, tx)?;
            Ok(message)
        })
        .await
    }

    /// Returns a live view of the message log.
    pub fn all_messages(&self) -> MessageFeed {
        MessageFeed {
            rx: self.inner.messages_tx.subscribe(),
        }
    }

    /// Reads the message log directly from the database.
    pub async fn messages(&self) -> Result<Vec<ChatMessage>> {
        self.with_db(|db, _| db.get_all_messages()).await
    }

    pub async fn count_messages(&self) -> Result<usize> {
        self.with_db(|db, _| db.count_messages()).await
    }

    /// Deletes messages created strictly before `cutoff_ms`.
    pub async fn delete_messages_older_than(&self, cutoff_ms: i64) -> Result<usize> {
        self.with_db(move |db, tx| {
            let deleted = db.delete_messages_older_than(cutoff_ms)?;
            if deleted > 0 {
                publish(db, tx)?;
            }
            Ok(deleted)
        })
        .await
    }

    // ---------------------------------------------------------------
    // Responses
    // ---------------------------------------------------------------

    /// Stores an answer for `query`, overwriting any previous text.
    pub async fn insert_response(&self, query: &str, response: &str) -> Result<ChatResponse> {
        let query = query.to_string();
        let response = response.to_string();
        let now = self.now_ms();
        self.with_db(move |db, _| db.insert_response(&query, &response, now))
            .await
    }

    pub async fn find_response_for_query(&self, query: &str) -> Result<Option<ChatResponse>> {
        let query = query.to_string();
        self.with_db(move |db, _| db.find_response_for_query(&query))
            .await
    }

    /// Top `limit` responses by usage, most recent first on ties.
    pub async fn most_used(&self, limit: usize) -> Result<Vec<ChatResponse>> {
        self.with_db(move |db, _| db.get_most_used_responses(limit))
            .await
    }

    /// Bumps the usage counter and returns the new value.
    pub async fn increment_usage(&self, id: i64) -> Result<u64> {
        self.with_db(move |db, _| db.increment_usage(id)).await
    }

    pub async fn count_responses(&self) -> Result<usize> {
        self.with_db(|db, _| db.count_responses()).await
    }

    /// Deletes responses created strictly before `cutoff_ms`.
    pub async fn delete_responses_older_than(&self, cutoff_ms: i64) -> Result<usize> {
        self.with_db(move |db, _| db.delete_responses_older_than(cutoff_ms))
            .await
    }

    /// Inserts curated answers for queries that have no record yet.
    ///
    /// Returns how many seeds were inserted.
    pub async fn seed_responses(&self, seeds: &[ResponseSeed]) -> Result<usize> {
        let seeds = seeds.to_vec();
        let now = self.now_ms();
        self.with_db(move |db, _| {
            let mut inserted = 0;
            for seed in &seeds {
                if db.insert_response_if_absent(&seed.query, &seed.response, now)? {
                    inserted += 1;
                }
            }
            Ok(inserted)
        })
        .await
    }

    // ---------------------------------------------------------------
    // Retention
    // ---------------------------------------------------------------

    /// Deletes responses then messages older than `cutoff_ms` in one transaction.
    pub async fn purge_older_than(&self, cutoff_ms: i64) -> Result<PurgeCounts> {
        self.with_db(move |db, tx| {
            let counts = db.purge_older_than(cutoff_ms)?;
            if counts.messages > 0 {
                publish(db, tx)?;
            }
            debug!(
                cutoff_ms,
                messages = counts.messages,
                responses = counts.responses,
                "purged old records"
            );
            Ok(counts)
        })
        .await
    }
}

/// Republishes the message log while the database lock is still held, so
/// snapshots reach observers in write order.
fn publish(db: &Database, tx: &watch::Sender<MessageSnapshot>) -> Result<()> {
    let messages = db.get_all_messages()?;
    tx.send_replace(Arc::new(messages));
    Ok(())
}

/// Observable view of the message log.
#[derive(Clone)]
pub struct MessageFeed {
    rx: watch::Receiver<MessageSnapshot>,
}

impl MessageFeed {
    /// The most recently published log.
    pub fn current(&self) -> MessageSnapshot {
        self.rx.borrow().clone()
    }

    /// Waits for the next published log.
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<MessageSnapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
