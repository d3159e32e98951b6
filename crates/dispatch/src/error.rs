// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for dispatch operations.
//!
//! Every [`DispatchError`] is terminal for the send that produced it. The
//! [`DispatchError::user_message`] text is what callback-style callers see.

use thiserror::Error;

use crate::config::ConfigError;
use crate::remote::RemoteError;

/// Message delivered when offline with nothing in the response cache.
///
/// Existing callers match on this exact text.
pub const NO_CACHED_RESPONSE_MESSAGE: &str = "No internet connection and no cached responses";

/// All possible outcomes of a failed send.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("message text is empty")]
    InvalidInput,

    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("request timed out")]
    Timeout,

    #[error("authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("No internet connection and no cached responses")]
    NoCachedResponse,

    #[error("remote failure: {0}")]
    GenericRemoteFailure(RemoteError),

    #[error("storage error: {0}")]
    Store(#[from] chatline_core::Error),

    #[error("dispatch cancelled before completion")]
    Cancelled,
}

impl DispatchError {
    /// Returns the text shown to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            DispatchError::InvalidInput => "Please provide a valid input.".to_string(),
            DispatchError::NetworkUnavailable(_) => {
                "Network error: Please check your internet connection and try again.".to_string()
            }
            DispatchError::Timeout => "Request timed out. Please try again.".to_string(),
            DispatchError::AuthenticationFailure(_) => {
                "Authentication error: Please contact support.".to_string()
            }
            DispatchError::NoCachedResponse => NO_CACHED_RESPONSE_MESSAGE.to_string(),
            DispatchError::GenericRemoteFailure(RemoteError::EmptyResponse) => {
                "AI model returned empty response.".to_string()
            }
            DispatchError::GenericRemoteFailure(err) => format!("Error: {err}"),
            DispatchError::Store(err) => format!("Storage error: {err}"),
            DispatchError::Cancelled => "Request cancelled.".to_string(),
        }
    }

    /// Returns true if the failure came from the remote service or the network.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            DispatchError::NetworkUnavailable(_)
                | DispatchError::Timeout
                | DispatchError::AuthenticationFailure(_)
                | DispatchError::GenericRemoteFailure(_)
        )
    }
}

impl From<RemoteError> for DispatchError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Network(detail) => DispatchError::NetworkUnavailable(detail),
            RemoteError::Timeout => DispatchError::Timeout,
            RemoteError::Authentication(detail) => DispatchError::AuthenticationFailure(detail),
            other => DispatchError::GenericRemoteFailure(other),
        }
    }
}

/// A specialized Result type for dispatch operations.
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// Errors raised while assembling a dispatcher from configuration.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open store: {0}")]
    Store(#[from] chatline_core::Error),

    #[error("failed to build remote client: {0}")]
    Remote(#[from] RemoteError),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
