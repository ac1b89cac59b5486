//! # Frame Module
//!
//! Fixed-layout binary telemetry frame exchanged with remote receivers.
//!
//! This module handles:
//! - Frame field layout and reserved bit definitions
//! - Encoding ten u32 fields as a 40-byte big-endian payload
//! - Decoding received payloads (ping replies)

pub mod protocol;
pub mod encoder;
pub mod decoder;

pub use protocol::{ButtonMask, Frame, KeyMask};
