//! Outbound reachability of distribution endpoints.
//!
//! Each endpoint gets one short TCP handshake. Resolution failures,
//! refusals and timeouts all count as unreachable; the checker itself
//! never errors.

use crate::config::Endpoint;
use crate::requirements::status::{StatusSet, Tagged};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Unreachable endpoints collected by a connectivity run.
pub type ConnectivityStatus = StatusSet<Endpoint>;

impl Tagged for Endpoint {
    fn tag(&self) -> char {
        self.tag
    }

    fn label(&self) -> &str {
        &self.name
    }
}

/// A TCP reachability probe.
pub trait Reachability {
    /// Whether a handshake with `host:port` completes within `timeout`.
    fn is_reachable(&self, host: &str, port: u16, timeout: Duration) -> bool;
}

/// Probes with a real TCP connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpReachability;

impl Reachability for TcpReachability {
    fn is_reachable(&self, host: &str, port: u16, timeout: Duration) -> bool {
        let addrs = match (host, port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                tracing::debug!("Could not resolve {}: {}", host, e);
                return false;
            }
        };

        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(_) => return true,
                Err(e) => tracing::debug!("Connect to {} failed: {}", addr, e),
            }
        }
        false
    }
}

/// Checks a fixed list of endpoints.
pub struct ConnectivityChecker<'a> {
    probe: &'a dyn Reachability,
    timeout: Duration,
}

impl<'a> ConnectivityChecker<'a> {
    pub fn new(probe: &'a dyn Reachability, timeout: Duration) -> Self {
        Self { probe, timeout }
    }

    /// Probe every endpoint and collect the unreachable ones.
    pub fn check(&self, endpoints: &[Endpoint]) -> ConnectivityStatus {
        let mut status = ConnectivityStatus::new();
        for endpoint in endpoints {
            if self
                .probe
                .is_reachable(&endpoint.host, endpoint.port, self.timeout)
            {
                tracing::debug!("{} ({}:{}) reachable", endpoint.name, endpoint.host, endpoint.port);
            } else {
                tracing::warn!(
                    "{} ({}:{}) unreachable",
                    endpoint.name,
                    endpoint.host,
                    endpoint.port
                );
                status.insert(endpoint.clone());
            }
        }
        status
    }
}
