// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Message dispatch.
//!
//! Every accepted send is logged to the store first. The connectivity probe
//! then picks the route:
//!
//! - **online**: ask the remote service, cache the answer under the query text
//! - **offline**: serve an exact cached answer, else the most used cached
//!   answer, else fail with [`DispatchError::NoCachedResponse`]
//!
//! Each send produces exactly one outcome. Remote failures are never
//! retried and never fall back to the cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use chatline_core::SystemClock;

use crate::config::Config;
use crate::connectivity::{ConnectivityProbe, TcpProbe};
use crate::error::{DispatchError, DispatchResult, InitError};
use crate::remote::{HttpRemoteClient, RemoteClient, RemoteError};
use crate::stats::{DispatchStats, Outcome, StatsSnapshot};
use crate::store::{MessageFeed, Store};
use crate::sweeper::SweepReport;

/// Number of popular answers considered when offline without an exact match.
pub const FALLBACK_CANDIDATES: usize = 5;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETENTION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Dispatcher tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Upper bound on a single remote call.
    pub request_timeout: Duration,
    /// Records older than this are removed by [`Dispatcher::cleanup_old_data`].
    pub retention: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retention: DEFAULT_RETENTION,
        }
    }
}

impl From<&Config> for DispatchConfig {
    fn from(config: &Config) -> Self {
        DispatchConfig {
            request_timeout: config.request_timeout(),
            retention: config.retention(),
        }
    }
}

/// A successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

/// Where a reply's text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplySource {
    /// Answered by the remote service.
    Remote,
    /// Exact cached answer for the query.
    Cache { response_id: i64 },
    /// Most used cached answer, served for a query with no exact match.
    Fallback {
        /// Query the served answer was cached under.
        query: String,
        /// Queries of the other candidates, in rank order.
        alternatives: Vec<String>,
    },
}

impl ReplySource {
    fn outcome(&self) -> Outcome {
        match self {
            ReplySource::Remote => Outcome::Remote,
            ReplySource::Cache { .. } => Outcome::Cache,
            ReplySource::Fallback { .. } => Outcome::Fallback,
        }
    }
}

/// Completion callback for [`Dispatcher::send_message_with`].
///
/// Exactly one of the two methods is called, exactly once.
pub trait ChatCallback: Send + 'static {
    fn on_response(self, text: String);
    fn on_error(self, message: String);
}

impl<F> ChatCallback for F
where
    F: FnOnce(Result<String, String>) + Send + 'static,
{
    fn on_response(self, text: String) {
        self(Ok(text))
    }

    fn on_error(self, message: String) {
        self(Err(message))
    }
}

/// Holds a callback until it fires; dropping it unfired reports cancellation.
struct CallbackGuard<C: ChatCallback> {
    callback: Option<C>,
}

impl<C: ChatCallback> CallbackGuard<C> {
    fn respond(mut self, outcome: Result<String, String>) {
        if let Some(callback) = self.callback.take() {
            match outcome {
                Ok(text) => callback.on_response(text),
                Err(message) => callback.on_error(message),
            }
        }
    }
}

impl<C: ChatCallback> Drop for CallbackGuard<C> {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback.on_error(DispatchError::Cancelled.user_message());
        }
    }
}

/// Routes messages to the remote service or the response cache.
///
/// Cheap to clone; clones share the store, clients and counters.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    store: Store,
    remote: Arc<dyn RemoteClient>,
    probe: Arc<dyn ConnectivityProbe>,
    config: DispatchConfig,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(
        store: Store,
        remote: Arc<dyn RemoteClient>,
        probe: Arc<dyn ConnectivityProbe>,
        config: DispatchConfig,
    ) -> Self {
        Dispatcher {
            inner: Arc::new(DispatcherInner {
                store,
                remote,
                probe,
                config,
                stats: DispatchStats::new(),
            }),
        }
    }

    /// Builds a dispatcher from configuration: opens the database, seeds the
    /// response cache, and wires the HTTP client and TCP probe.
    pub async fn open(config: &Config) -> Result<Self, InitError> {
        config.validate()?;

        let store = Store::open(&config.database, Arc::new(SystemClock)).await?;
        let seeded = store.seed_responses(&config.seeds).await?;
        if seeded > 0 {
            info!(seeded, "seeded response cache");
        }

        let remote = HttpRemoteClient::new(config.remote.endpoint.clone(), config.request_timeout())?;
        let probe = TcpProbe::new(config.probe.address.clone(), config.probe_timeout());

        info!(
            database = %config.database.display(),
            endpoint = %config.remote.endpoint,
            "dispatcher ready"
        );

        Ok(Dispatcher::new(
            store,
            Arc::new(remote),
            Arc::new(probe),
            DispatchConfig::from(config),
        ))
    }

    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.inner.config
    }

    /// Sends `text` and resolves to its single outcome.
    ///
    /// Blank text is rejected before anything is stored. Otherwise the
    /// message is logged before connectivity is checked, so it is visible
    /// in [`Dispatcher::all_messages`] by the time this returns.
    pub async fn send_message(&self, text: &str, auth_token: &str) -> DispatchResult<Reply> {
        match self.dispatch(text, auth_token).await {
            Ok((reply, latency)) => {
                self.inner.stats.record(reply.source.outcome(), latency);
                Ok(reply)
            }
            Err(err) => {
                self.inner.stats.record(Outcome::Error, None);
                if err.is_remote() {
                    warn!("remote send failed: {err}");
                } else {
                    debug!("send failed: {err}");
                }
                Err(err)
            }
        }
    }

    /// Callback flavor of [`Dispatcher::send_message`].
    ///
    /// Runs the send on the Tokio runtime and invokes `callback` exactly once,
    /// with [`DispatchError::user_message`] text on failure. A send that
    /// panics or is dropped before finishing, including by runtime shutdown,
    /// reports the cancellation message.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn send_message_with<C: ChatCallback>(
        &self,
        text: impl Into<String>,
        auth_token: impl Into<String>,
        callback: C,
    ) {
        let dispatcher = self.clone();
        let text = text.into();
        let auth_token = auth_token.into();
        let guard = CallbackGuard {
            callback: Some(callback),
        };

        tokio::spawn(async move {
            let send = tokio::spawn(async move { dispatcher.send_message(&text, &auth_token).await });
            match send.await {
                Ok(Ok(reply)) => guard.respond(Ok(reply.text)),
                Ok(Err(err)) => guard.respond(Err(err.user_message())),
                Err(join_err) => {
                    warn!("send task ended abnormally: {join_err}");
                    guard.respond(Err(DispatchError::Cancelled.user_message()));
                }
            }
        });
    }

    /// Starts a send in the background and returns a handle to its outcome.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_send(&self, text: impl Into<String>, auth_token: impl Into<String>) -> DispatchHandle {
        let dispatcher = self.clone();
        let text = text.into();
        let auth_token = auth_token.into();
        let (tx, rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let result = dispatcher.send_message(&text, &auth_token).await;
            // Receiver may already be gone
            let _ = tx.send(result);
        });

        DispatchHandle { rx, task }
    }

    /// Live view of the message log.
    pub fn all_messages(&self) -> MessageFeed {
        self.inner.store.all_messages()
    }

    /// Removes messages and responses older than the retention window.
    ///
    /// One cutoff is computed and applied to both collections before returning.
    pub async fn cleanup_old_data(&self) -> DispatchResult<SweepReport> {
        let retention_ms = i64::try_from(self.inner.config.retention.as_millis()).unwrap_or(i64::MAX);
        let cutoff_ms = self.inner.store.now_ms().saturating_sub(retention_ms);

        let counts = self.inner.store.purge_older_than(cutoff_ms).await?;
        info!(
            cutoff_ms,
            messages = counts.messages,
            responses = counts.responses,
            "retention cleanup complete"
        );

        Ok(SweepReport {
            cutoff_ms,
            messages: counts.messages,
            responses: counts.responses,
        })
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    async fn dispatch(&self, text: &str, auth_token: &str) -> DispatchResult<(Reply, Option<Duration>)> {
        if text.trim().is_empty() {
            return Err(DispatchError::InvalidInput);
        }

        let message = self.inner.store.insert_message(text).await?;
        debug!(message_id = message.id, "message logged");

        if self.is_online().await {
            let (reply, latency) = self.answer_online(text, auth_token).await?;
            Ok((reply, Some(latency)))
        } else {
            debug!(message_id = message.id, "offline, answering from cache");
            Ok((self.answer_offline(text).await?, None))
        }
    }

    /// Runs the probe on the blocking pool. A probe that cannot run counts as offline.
    async fn is_online(&self) -> bool {
        let probe = Arc::clone(&self.inner.probe);
        match tokio::task::spawn_blocking(move || probe.is_online()).await {
            Ok(online) => online,
            Err(e) => {
                warn!("connectivity probe failed: {e}");
                false
            }
        }
    }

    async fn answer_online(&self, text: &str, auth_token: &str) -> DispatchResult<(Reply, Duration)> {
        let started = Instant::now();
        let answer = tokio::time::timeout(
            self.inner.config.request_timeout,
            self.inner.remote.send(text, auth_token),
        )
        .await
        .map_err(|_| DispatchError::Timeout)??;
        let latency = started.elapsed();

        if answer.trim().is_empty() {
            return Err(RemoteError::EmptyResponse.into());
        }

        let cached = self.inner.store.insert_response(text, &answer).await?;
        debug!(
            response_id = cached.id,
            latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            "remote reply cached"
        );

        Ok((
            Reply {
                text: answer,
                source: ReplySource::Remote,
            },
            latency,
        ))
    }

    async fn answer_offline(&self, text: &str) -> DispatchResult<Reply> {
        let store = &self.inner.store;

        if let Some(hit) = store.find_response_for_query(text).await? {
            match store.increment_usage(hit.id).await {
                Ok(usage_count) => debug!(response_id = hit.id, usage_count, "served cached response"),
                // Swept between lookup and update; the text is still good to serve
                Err(chatline_core::Error::ResponseNotFound(id)) => {
                    debug!(response_id = id, "cached response removed before usage update")
                }
                Err(e) => return Err(e.into()),
            }
            return Ok(Reply {
                text: hit.response,
                source: ReplySource::Cache { response_id: hit.id },
            });
        }

        let mut candidates = store.most_used(FALLBACK_CANDIDATES).await?.into_iter();
        let Some(best) = candidates.next() else {
            return Err(DispatchError::NoCachedResponse);
        };

        debug!(response_id = best.id, query = %best.query, "served fallback response");
        Ok(Reply {
            text: best.response,
            source: ReplySource::Fallback {
                query: best.query,
                alternatives: candidates.map(|c| c.query).collect(),
            },
        })
    }
}

/// Handle to a send started with [`Dispatcher::spawn_send`].
pub struct DispatchHandle {
    rx: oneshot::Receiver<DispatchResult<Reply>>,
    task: JoinHandle<()>,
}

impl DispatchHandle {
    /// Waits for the send's outcome. A cancelled send yields [`DispatchError::Cancelled`].
    pub async fn outcome(self) -> DispatchResult<Reply> {
        self.rx.await.unwrap_or_else(|_| Err(DispatchError::Cancelled))
    }

    /// Aborts the send. Work already committed to the store is kept.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
