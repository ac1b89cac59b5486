//! # Frame Decoder
//!
//! Parses a received payload back into a [`Frame`]. Used by the ping prober
//! to interpret replies.

use bytes::Buf;

use super::protocol::*;
use crate::error::{RelayError, Result};

/// Decode a 40-byte payload
///
/// # Arguments
///
/// * `payload` - Received datagram contents
///
/// # Returns
///
/// * `Result<Frame>` - Decoded frame
///
/// # Errors
///
/// Returns `Protocol` error if the payload is not exactly 40 bytes.
pub fn decode_frame(payload: &[u8]) -> Result<Frame> {
    if payload.len() != FRAME_SIZE {
        return Err(RelayError::Protocol(format!(
            "Frame must be {} bytes, got {}",
            FRAME_SIZE,
            payload.len()
        )));
    }

    let mut buf = payload;
    let mut words = [0u32; FRAME_FIELD_COUNT];
    for word in words.iter_mut() {
        *word = buf.get_u32();
    }

    Ok(Frame::from_words(words))
}
