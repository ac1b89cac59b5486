//! # Ping Prober
//!
//! Liveness and latency probe against the relay destinations.
//!
//! Each round sends a probe frame (ButtonMask = ACK | IGNORE, a sequence
//! number in the keypad word, every other field zero) to each destination in
//! turn and waits a bounded time for its reply on the shared socket. A
//! receiver that simply echoes frames back is recognized by the IGNORE bit in
//! its reply.
//!
//! Only datagrams from the probed destination count as its reply. Echoes
//! carrying an earlier sequence number arrived too late for their own probe
//! and are dropped, so a slow peer is never credited with a short RTT.
//!
//! Probing is diagnostic only: no outcome is ever returned as an error.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use super::{DatagramTransport, Relay};
use crate::frame::decoder::decode_frame;
use crate::frame::encoder::encode_frame;
use crate::frame::Frame;

/// Largest reply read per probe
pub const PING_RECV_BUFFER: usize = 1024;

/// Default bound on the reply wait
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_millis(1000);

/// Upper bound on the number of ping rounds accepted from the command line
pub const MAX_PING_ROUNDS: u32 = 100_000;

/// Result of one probe to one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingOutcome {
    /// A well-formed frame came back from the destination
    Reply {
        rtt: Duration,
        /// The reply carries the IGNORE bit: our own probe looped back
        echoed: bool,
    },
    /// A datagram came back but is not a 40-byte frame
    Malformed { len: usize },
    /// Nothing came back from the destination within the bound
    Timeout,
    /// The probe could not be sent
    SendFailed(String),
    /// The socket reported an error while waiting for the reply
    ReceiveFailed(String),
}

impl PingOutcome {
    pub fn is_reply(&self) -> bool {
        matches!(self, PingOutcome::Reply { .. })
    }
}

/// One (round, destination) probe report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingReport {
    pub round: u32,
    pub destination: SocketAddr,
    pub outcome: PingOutcome,
}

impl fmt::Display for PingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            PingOutcome::Reply { rtt, echoed } => {
                write!(f, "Ping {} {} time {} ms", self.round, self.destination, rtt.as_millis())?;
                if *echoed {
                    write!(f, " (echo)")?;
                }
                Ok(())
            }
            PingOutcome::Malformed { len } => {
                write!(f, "Ping {} {} malformed reply ({} bytes)", self.round, self.destination, len)
            }
            PingOutcome::Timeout => write!(f, "Ping {} {} timed out", self.round, self.destination),
            PingOutcome::SendFailed(reason) => {
                write!(f, "Ping {} {} send failed: {}", self.round, self.destination, reason)
            }
            PingOutcome::ReceiveFailed(reason) => {
                write!(f, "Ping {} {} receive failed: {}", self.round, self.destination, reason)
            }
        }
    }
}

/// Probe every destination `count` times
///
/// Destinations are probed serially, one outstanding probe at a time.
///
/// # Arguments
///
/// * `relay` - Relay whose socket and destinations are probed
/// * `count` - Number of rounds
/// * `wait` - Bound on each reply wait
///
/// # Returns
///
/// * `Vec<PingReport>` - One report per (round, destination), in probe order
pub async fn ping<T: DatagramTransport>(relay: &Relay<T>, count: u32, wait: Duration) -> Vec<PingReport> {
    let mut reports = Vec::new();
    let mut sequence: u32 = 0;

    for round in 0..count {
        for &destination in relay.destinations() {
            let outcome = probe_once(relay.transport(), sequence, destination, wait).await;
            sequence = sequence.wrapping_add(1);

            let report = PingReport {
                round,
                destination,
                outcome,
            };

            if report.outcome.is_reply() {
                info!("{}", report);
            } else {
                warn!("{}", report);
            }
            reports.push(report);
        }
    }

    reports
}

async fn probe_once<T: DatagramTransport>(
    transport: &T,
    sequence: u32,
    destination: SocketAddr,
    wait: Duration,
) -> PingOutcome {
    let payload = encode_frame(&Frame::numbered_probe(sequence));
    let start = Instant::now();
    let deadline = start + wait;

    if let Err(e) = transport.send_to(&payload, destination).await {
        return PingOutcome::SendFailed(e.to_string());
    }

    let mut buf = [0u8; PING_RECV_BUFFER];
    loop {
        let (len, from) = match timeout_at(deadline, transport.recv_from(&mut buf)).await {
            Err(_) => return PingOutcome::Timeout,
            Ok(Err(e)) => return PingOutcome::ReceiveFailed(e.to_string()),
            Ok(Ok(received)) => received,
        };

        if from != destination {
            debug!("Ignoring {} bytes from {} while probing {}", len, from, destination);
            continue;
        }

        let reply = match decode_frame(&buf[..len]) {
            Ok(reply) => reply,
            Err(_) => return PingOutcome::Malformed { len },
        };

        let echoed = reply.buttons.is_probe();
        if echoed && reply.probe_sequence() != sequence {
            debug!(
                "Dropping late echo #{} from {} (waiting for #{})",
                reply.probe_sequence(),
                from,
                sequence
            );
            continue;
        }

        return PingOutcome::Reply {
            rtt: start.elapsed(),
            echoed,
        };
    }
}
