// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! chatline-core: Shared storage layer for the chatline message dispatcher.
//!
//! This crate provides the record types, the clock abstraction and the
//! SQLite database that backs the message log and the response cache.

pub mod clock;
pub mod db;
pub mod error;
pub mod message;

pub use clock::{ClockSource, SystemClock};
pub use db::{Database, PurgeCounts};
pub use error::{Error, Result};
pub use message::{ChatMessage, ChatResponse, ResponseSeed};
