// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! chatline - Message dispatch with an offline response cache.
//!
//! Messages are logged to a local SQLite store and answered by a remote
//! assistant when the network is reachable. Offline, answers come from the
//! cache of earlier replies and seeded answers.
//!
//! # Main Components
//!
//! - [`Dispatcher`] - Routes each message online or offline and reports one outcome
//! - [`Store`] - Async access to the message log and response cache
//! - [`RemoteClient`] / [`HttpRemoteClient`] - The remote assistant service
//! - [`ConnectivityProbe`] - Online/offline snapshot ([`TcpProbe`], [`ManualProbe`])
//! - [`RetentionSweeper`] - Periodic cleanup of old records
//! - [`Config`] - TOML configuration
//!
//! # Usage
//!
//! ```rust,ignore
//! use chatline::{Config, Dispatcher, RetentionSweeper};
//!
//! chatline::logging::init(None);
//! let config = Config::load(Path::new("chatline.toml"))?;
//! let dispatcher = Dispatcher::open(&config).await?;
//! let sweeper = RetentionSweeper::new(dispatcher.clone(), config.sweep_interval()).spawn();
//!
//! match dispatcher.send_message("what is the syllabus", &token).await {
//!     Ok(reply) => println!("{}", reply.text),
//!     Err(err) => eprintln!("{}", err.user_message()),
//! }
//!
//! sweeper.shutdown().await;
//! ```

pub mod config;
pub mod connectivity;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod remote;
pub mod stats;
pub mod store;
pub mod sweeper;

#[cfg(test)]
mod test_helpers;

pub use chatline_core::{ChatMessage, ChatResponse, ClockSource, ResponseSeed, SystemClock};
pub use config::{Config, ConfigError};
pub use connectivity::{ConnectivityProbe, ManualProbe, TcpProbe};
pub use dispatcher::{
    ChatCallback, DispatchConfig, DispatchHandle, Dispatcher, Reply, ReplySource,
    FALLBACK_CANDIDATES,
};
pub use error::{DispatchError, DispatchResult, InitError, NO_CACHED_RESPONSE_MESSAGE};
pub use remote::{HttpRemoteClient, RemoteClient, RemoteError, RemoteResult};
pub use stats::{DispatchStats, StatsSnapshot};
pub use store::{MessageFeed, MessageSnapshot, Store};
pub use sweeper::{RetentionSweeper, SweepReport, SweeperHandle};
