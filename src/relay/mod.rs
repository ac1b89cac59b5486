//! # Relay Module
//!
//! Fan-out of encoded frames to every configured receiver over one UDP socket.
//!
//! This module handles:
//! - Parsing `host[:port]` destinations
//! - Resolving destinations once at startup
//! - Best-effort, one-datagram-per-destination sending
//! - Ping probing against the same destinations ([`ping`])

pub mod destination;
pub mod ping;
pub mod transport;

use std::net::SocketAddr;

use tracing::debug;

use crate::frame::encoder::encode_frame;
use crate::frame::Frame;

pub use destination::{Destination, DEFAULT_PORT};
pub use transport::DatagramTransport;

/// Frame relay over a datagram transport
///
/// Owns the socket and the resolved destination list. The list is read-only
/// after construction.
pub struct Relay<T> {
    transport: T,
    destinations: Vec<SocketAddr>,
}

impl<T> std::fmt::Debug for Relay<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("destinations", &self.destinations)
            .finish_non_exhaustive()
    }
}

impl<T: DatagramTransport> Relay<T> {
    pub fn new(transport: T, destinations: Vec<SocketAddr>) -> Self {
        Self {
            transport,
            destinations,
        }
    }

    /// Send a frame to every destination
    ///
    /// Failures are logged at debug level and otherwise ignored; one
    /// unreachable receiver does not affect the others.
    ///
    /// # Returns
    ///
    /// * `usize` - Number of destinations the datagram was handed to
    pub async fn send_frame(&self, frame: &Frame) -> usize {
        let payload = encode_frame(frame);
        let mut sent = 0;

        for dest in &self.destinations {
            match self.transport.send_to(&payload, *dest).await {
                Ok(_) => sent += 1,
                Err(e) => debug!("Failed to send frame to {}: {}", dest, e),
            }
        }

        sent
    }

    pub fn destinations(&self) -> &[SocketAddr] {
        &self.destinations
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
