// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic retention sweep.
//!
//! Runs [`Dispatcher::cleanup_old_data`] once at startup and then on a fixed
//! interval until shut down. A failed sweep is logged and retried on the next
//! tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::error::DispatchResult;

/// Result of one retention pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Records created strictly before this instant were removed.
    pub cutoff_ms: i64,
    pub messages: usize,
    pub responses: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.messages + self.responses
    }
}

/// Schedules retention sweeps for a dispatcher.
pub struct RetentionSweeper {
    dispatcher: Dispatcher,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(dispatcher: Dispatcher, interval: Duration) -> Self {
        RetentionSweeper {
            dispatcher,
            interval,
        }
    }

    /// Runs a single sweep now.
    pub async fn sweep_once(&self) -> DispatchResult<SweepReport> {
        self.dispatcher.cleanup_old_data().await
    }

    /// Starts the sweep loop on the Tokio runtime.
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let sweeps = Arc::new(AtomicU64::new(0));
        let completed = Arc::clone(&sweeps);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = self.interval.as_secs(), "retention sweeper started");

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        match self.sweep_once().await {
                            Ok(report) => {
                                completed.fetch_add(1, Ordering::Relaxed);
                                debug!(removed = report.total(), "retention sweep finished");
                            }
                            Err(e) => warn!("retention sweep failed: {e}"),
                        }
                    }
                }
            }

            info!("retention sweeper stopped");
        });

        SweeperHandle {
            shutdown_tx: Some(shutdown_tx),
            task,
            sweeps,
        }
    }
}

/// Controls a running [`RetentionSweeper`].
pub struct SweeperHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    sweeps: Arc<AtomicU64>,
}

impl SweeperHandle {
    /// Number of sweeps that completed successfully.
    pub fn sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::Relaxed)
    }

    /// Stops the loop and waits for it to exit. An in-flight sweep finishes first.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!("retention sweeper task failed: {e}");
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some() {
            self.task.abort();
        }
    }
}

#[cfg(test)]
#[path = "sweeper_tests.rs"]
mod tests;
