//! # Frame Encoder
//!
//! Packs a [`Frame`] into its 40-byte wire representation.

use bytes::{BufMut, Bytes, BytesMut};

use super::protocol::*;

/// Encode a frame as ten consecutive big-endian u32 fields
///
/// # Arguments
///
/// * `frame` - Telemetry or probe frame
///
/// # Returns
///
/// * `Bytes` - 40-byte payload, ready to hand to the relay
///
/// # Examples
///
/// ```
/// use joystick_relay::frame::encoder::encode_frame;
/// use joystick_relay::frame::Frame;
///
/// let payload = encode_frame(&Frame::probe());
/// assert_eq!(payload.len(), 40);
/// assert_eq!(&payload[32..36], &[0x00, 0x00, 0xC0, 0x00]);
/// ```
pub fn encode_frame(frame: &Frame) -> Bytes {
    let mut buf = BytesMut::with_capacity(FRAME_SIZE);
    for word in frame.to_words() {
        buf.put_u32(word);
    }
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_length() {
        let frame = Frame::telemetry([500; 4], [DEFAULT_CENTER; 4], ButtonMask::NONE, KeyMask::NONE);
        assert_eq!(encode_frame(&frame).len(), FRAME_SIZE);
    }

    #[test]
    fn test_encode_frame_is_big_endian() {
        let frame = Frame::telemetry(
            [0x0102_0304, 0, 0, 1000],
            [500, 500, 500, 500],
            ButtonMask(BUTTON_TRIGGER_0),
            KeyMask(0x4000),
        );
        let payload = encode_frame(&frame);

        assert_eq!(&payload[0..4], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&payload[12..16], &[0x00, 0x00, 0x03, 0xE8]);
        assert_eq!(&payload[16..20], &[0x00, 0x00, 0x01, 0xF4]);
        assert_eq!(&payload[32..36], &[0x00, 0x00, 0x00, 0x01]);
        assert_eq!(&payload[36..40], &[0x00, 0x00, 0x40, 0x00]);
    }

    #[test]
    fn test_encode_probe_is_zero_except_buttons() {
        let payload = encode_frame(&Frame::probe());

        assert!(payload[..32].iter().all(|&b| b == 0));
        assert_eq!(&payload[32..36], &[0x00, 0x00, 0xC0, 0x00]);
        assert!(payload[36..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_encode_different_frames_differ() {
        let a = Frame::telemetry([1, 2, 3, 4], [500; 4], ButtonMask::NONE, KeyMask::NONE);
        let b = Frame::telemetry([1, 2, 3, 4], [500; 4], ButtonMask::NONE, KeyMask(1));
        assert_ne!(encode_frame(&a), encode_frame(&b));
    }
}
