// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote assistant client.
//!
//! Provides a trait-based client layer that enables:
//! - An HTTP client for production
//! - Scripted clients for unit testing
//!
//! Clients never retry; a failed send is reported once, classified.

use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Error type for remote client operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The service could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The service did not answer in time.
    #[error("request timed out")]
    Timeout,

    /// The auth token was rejected.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The service answered without any text.
    #[error("remote returned an empty response")]
    EmptyResponse,

    /// Any other failure.
    #[error("{message}")]
    Generic {
        status: Option<u16>,
        message: String,
    },
}

/// Result type for remote client operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Client for the remote assistant service.
pub trait RemoteClient: Send + Sync {
    /// Send a message and resolve to the service's answer text.
    fn send<'a>(&'a self, message: &'a str, auth_token: &'a str) -> BoxFuture<'a, RemoteResult<String>>;
}

impl<C: RemoteClient + ?Sized> RemoteClient for std::sync::Arc<C> {
    fn send<'a>(&'a self, message: &'a str, auth_token: &'a str) -> BoxFuture<'a, RemoteResult<String>> {
        (**self).send(message, auth_token)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    response: Option<String>,
}

/// HTTP client posting `{"message": ...}` with a bearer token and reading
/// `{"response": ...}` back.
#[derive(Debug, Clone)]
pub struct HttpRemoteClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRemoteClient {
    /// Create a client for `endpoint` with a transport-level timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Generic {
                status: None,
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(HttpRemoteClient {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Create a client around a preconfigured reqwest client.
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        HttpRemoteClient {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, message: &str, auth_token: &str) -> RemoteResult<String> {
        debug!("posting message to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(auth_token)
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let reply: ChatReply = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout
            } else {
                RemoteError::Generic {
                    status: Some(status.as_u16()),
                    message: format!("malformed response body: {e}"),
                }
            }
        })?;

        match reply.response {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(RemoteError::EmptyResponse),
        }
    }
}

impl RemoteClient for HttpRemoteClient {
    fn send<'a>(&'a self, message: &'a str, auth_token: &'a str) -> BoxFuture<'a, RemoteResult<String>> {
        self.post(message, auth_token).boxed()
    }
}

/// Map a reqwest transport failure onto the remote taxonomy.
fn classify_transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout
    } else if err.is_connect() {
        RemoteError::Network(err.to_string())
    } else {
        RemoteError::Generic {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Map a non-success HTTP status onto the remote taxonomy.
fn classify_status(status: StatusCode, body: String) -> RemoteError {
    let detail = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.trim())
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Authentication(detail),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => RemoteError::Timeout,
        _ => RemoteError::Generic {
            status: Some(status.as_u16()),
            message: detail,
        },
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
