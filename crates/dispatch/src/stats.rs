// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// How a successful send was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Remote,
    Cache,
    Fallback,
    Error,
}

/// Running totals for a dispatcher, safe to update from any task.
#[derive(Debug, Default)]
pub struct DispatchStats {
    messages: AtomicU64,
    remote_replies: AtomicU64,
    cache_hits: AtomicU64,
    fallbacks: AtomicU64,
    errors: AtomicU64,
    remote_latency_ms: AtomicU64,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one finished send. `remote_latency` is only accumulated for
    /// remote replies.
    pub(crate) fn record(&self, outcome: Outcome, remote_latency: Option<Duration>) {
        self.messages.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            Outcome::Remote => &self.remote_replies,
            Outcome::Cache => &self.cache_hits,
            Outcome::Fallback => &self.fallbacks,
            Outcome::Error => &self.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let (Outcome::Remote, Some(latency)) = (outcome, remote_latency) {
            let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
            self.remote_latency_ms.fetch_add(ms, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            messages: self.messages.load(Ordering::Relaxed),
            remote_replies: self.remote_replies.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            remote_latency_ms: self.remote_latency_ms.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub messages: u64,
    pub remote_replies: u64,
    pub cache_hits: u64,
    pub fallbacks: u64,
    pub errors: u64,
    /// Total time spent waiting on successful remote replies.
    pub remote_latency_ms: u64,
}

impl StatsSnapshot {
    /// Mean remote reply time, or 0 when there have been no remote replies.
    pub fn average_response_ms(&self) -> u64 {
        self.remote_latency_ms
            .checked_div(self.remote_replies)
            .unwrap_or(0)
    }

    /// Fraction of sends answered from the cache (exact or fallback).
    pub fn cache_ratio(&self) -> f64 {
        if self.messages == 0 {
            return 0.0;
        }
        (self.cache_hits + self.fallbacks) as f64 / self.messages as f64
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
