// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for chatline-core operations.

use thiserror::Error;

/// All possible errors that can occur in chatline-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("response not found: {0}")]
    ResponseNotFound(i64),

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("storage task failed: {0}")]
    TaskFailed(String),
}

/// A specialized Result type for chatline-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
