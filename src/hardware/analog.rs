//! # Analog Reader
//!
//! Converts raw ADC counts into axis samples.
//!
//! ## Normalization
//!
//! The raw count is clamped into `0..=max_val` and inverted:
//!
//! `sample = floor((max_val - clamped) * 1000 / max_val)`
//!
//! A full-scale reading (`raw >= max_val`) maps to 0 and a zero reading maps
//! to 1000, so (0,0) is the reference corner of each stick.
//!
//! ## Usage
//!
//! ```
//! use joystick_relay::hardware::analog::normalize;
//!
//! assert_eq!(normalize(26560, 26560), 0);
//! assert_eq!(normalize(0, 26560), 1000);
//! assert_eq!(normalize(13280, 26560), 500);
//! ```

use super::AnalogSource;
use crate::error::Result;
use crate::frame::protocol::SAMPLE_MAX;

/// Default clamp ceiling (≈3.3 V at the ±4.096 V gain setting)
pub const DEFAULT_MAX_VAL: i32 = 26560;

/// Analog axes and their converter channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Stick 1 horizontal (channel 0)
    X1 = 0,
    /// Stick 1 vertical (channel 1)
    Y1 = 1,
    /// Stick 2 horizontal (channel 2)
    X2 = 2,
    /// Stick 2 vertical (channel 3)
    Y2 = 3,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::X1, Axis::Y1, Axis::X2, Axis::Y2];

    pub const fn channel(self) -> u8 {
        self as u8
    }
}

/// Clamp and invert a raw count into a 0-1000 sample.
///
/// `max_val` must be positive; non-positive ceilings are treated as 1.
pub fn normalize(raw: i32, max_val: i32) -> u32 {
    let max_val = i64::from(max_val.max(1));
    let clamped = i64::from(raw).clamp(0, max_val);
    ((max_val - clamped) * i64::from(SAMPLE_MAX) / max_val) as u32
}

/// Normalizing wrapper around an [`AnalogSource`].
#[derive(Debug)]
pub struct AnalogReader<A> {
    source: A,
    max_val: i32,
}

impl<A: AnalogSource> AnalogReader<A> {
    #[must_use]
    pub fn new(source: A, max_val: i32) -> Self {
        Self { source, max_val }
    }

    /// Read one axis
    ///
    /// Performs a single-shot conversion on the axis channel and normalizes it.
    ///
    /// # Errors
    ///
    /// Propagates the collaborator's `Hardware` error.
    pub fn read_sample(&mut self, axis: Axis) -> Result<u32> {
        let raw = self.source.read_raw(axis.channel())?;
        Ok(normalize(raw, self.max_val))
    }
}

impl<A> AnalogReader<A> {
    /// Returns the configured clamp ceiling.
    pub fn max_val(&self) -> i32 {
        self.max_val
    }
}
