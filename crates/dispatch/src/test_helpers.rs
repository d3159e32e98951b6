// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for dispatch tests.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};

use chatline_core::{ClockSource, Database};

use crate::remote::{RemoteClient, RemoteError, RemoteResult};
use crate::store::Store;

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Clock pinned to a settable instant.
pub struct MockClock {
    now_ms: AtomicI64,
}

impl MockClock {
    pub fn new(now_ms: i64) -> Arc<Self> {
        Arc::new(MockClock {
            now_ms: AtomicI64::new(now_ms),
        })
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by_ms: i64) {
        self.now_ms.fetch_add(by_ms, Ordering::SeqCst);
    }
}

impl ClockSource for MockClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// In-memory store driven by `clock`.
pub fn memory_store(clock: Arc<MockClock>) -> Store {
    Store::new(Database::open_in_memory().unwrap(), clock).unwrap()
}

/// What a [`MockRemote`] does when called.
#[derive(Clone)]
pub enum Script {
    Reply(String),
    Fail(RemoteError),
    /// Sleep this long, then reply.
    Delay(Duration, String),
    /// Never resolve.
    Hang,
}

/// Scripted remote client recording every call.
pub struct MockRemote {
    script: Mutex<Script>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockRemote {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(MockRemote {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::new(Script::Reply(text.to_string()))
    }

    pub fn failing(err: RemoteError) -> Arc<Self> {
        Self::new(Script::Fail(err))
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    /// `(message, auth_token)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl RemoteClient for MockRemote {
    fn send<'a>(&'a self, message: &'a str, auth_token: &'a str) -> BoxFuture<'a, RemoteResult<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((message.to_string(), auth_token.to_string()));
        let script = self.script.lock().unwrap().clone();

        async move {
            match script {
                Script::Reply(text) => Ok(text),
                Script::Fail(err) => Err(err),
                Script::Delay(delay, text) => {
                    tokio::time::sleep(delay).await;
                    Ok(text)
                }
                Script::Hang => futures_util::future::pending().await,
            }
        }
        .boxed()
    }
}
