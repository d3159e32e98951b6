// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network reachability probes.
//!
//! A probe answers one question per call: is the network reachable right
//! now? Results are never cached and a probe that cannot tell reports
//! offline.

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

/// Snapshot of current network reachability.
pub trait ConnectivityProbe: Send + Sync {
    /// Returns true if the network is reachable. Must not panic; any
    /// failure to determine the state is reported as offline.
    fn is_online(&self) -> bool;
}

impl<P: ConnectivityProbe + ?Sized> ConnectivityProbe for Arc<P> {
    fn is_online(&self) -> bool {
        (**self).is_online()
    }
}

/// Probe that opens a TCP connection to a well-known address on every call.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        TcpProbe {
            address: address.into(),
            timeout,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl ConnectivityProbe for TcpProbe {
    fn is_online(&self) -> bool {
        let addrs = match self.address.to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                debug!("probe address {} unresolvable: {}", self.address, e);
                return false;
            }
        };

        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(_) => return true,
                Err(e) => debug!("probe connect to {} failed: {}", addr, e),
            }
        }
        false
    }
}

/// Probe whose state is pushed in by the host platform's network callbacks.
#[derive(Debug)]
pub struct ManualProbe {
    online: AtomicBool,
}

impl ManualProbe {
    pub fn new(online: bool) -> Self {
        ManualProbe {
            online: AtomicBool::new(online),
        }
    }

    /// Records the latest reachability reported by the platform.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for ManualProbe {
    fn default() -> Self {
        ManualProbe::new(false)
    }
}

impl ConnectivityProbe for ManualProbe {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
