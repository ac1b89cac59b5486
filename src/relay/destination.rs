//! # Destinations
//!
//! Receiver addresses in `host[:port]` form.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::Deserialize;
use tokio::net::lookup_host;
use tracing::debug;

use crate::error::{RelayError, Result};

/// Port used when a destination omits one
pub const DEFAULT_PORT: u16 = 1234;

/// A receiver to relay frames to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Destination {
    pub host: String,
    pub port: u16,
}

impl Destination {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Resolve to a socket address
    ///
    /// Uses the first address the resolver returns.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDestination` if the host does not resolve
    pub async fn resolve(&self) -> Result<SocketAddr> {
        let mut addrs = lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| RelayError::InvalidDestination(format!("{}: {}", self, e)))?;

        let addr = addrs
            .next()
            .ok_or_else(|| RelayError::InvalidDestination(format!("{}: no address", self)))?;
        debug!("Resolved {} to {}", self, addr);
        Ok(addr)
    }
}

/// Resolve every destination, failing on the first that does not resolve.
pub async fn resolve_all(destinations: &[Destination]) -> Result<Vec<SocketAddr>> {
    let mut resolved = Vec::with_capacity(destinations.len());
    for dest in destinations {
        resolved.push(dest.resolve().await?);
    }
    Ok(resolved)
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Destination {
    type Err = RelayError;

    /// Parse `host`, `host:port`, `[v6]` or `[v6]:port`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RelayError::InvalidDestination("empty host".to_string()));
        }

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| RelayError::InvalidDestination(format!("unclosed '[' in {}", s)))?;
            let port = match tail {
                "" => None,
                t => Some(t.strip_prefix(':').ok_or_else(|| {
                    RelayError::InvalidDestination(format!("unexpected text after ']' in {}", s))
                })?),
            };
            (host, port)
        } else {
            match s.split_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (s, None),
            }
        };

        if host.is_empty() {
            return Err(RelayError::InvalidDestination(format!("missing host in {}", s)));
        }

        let port = match port {
            Some(p) => p
                .parse::<u16>()
                .map_err(|e| RelayError::InvalidDestination(format!("bad port in {}: {}", s, e)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self::new(host, port))
    }
}

impl TryFrom<String> for Destination {
    type Error = RelayError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}
