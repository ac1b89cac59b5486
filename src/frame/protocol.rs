//! # Frame Protocol Constants and Types
//!
//! Wire layout shared by the telemetry and ping paths.
//!
//! ```text
//! offset  field
//!  0      X1         (stick 1, 0-1000)
//!  4      Y1
//!  8      X2         (stick 2, 0-1000)
//! 12      Y2
//! 16      CenterX1   (calibration reference)
//! 20      CenterY1
//! 24      CenterX2
//! 28      CenterY2
//! 32      ButtonMask
//! 36      KeyMask
//! ```
//!
//! Every field is an unsigned 32-bit big-endian integer. There is no length
//! prefix, checksum or version tag.

use std::fmt;

/// Number of u32 fields in a frame
pub const FRAME_FIELD_COUNT: usize = 10;

/// Encoded frame size in bytes
pub const FRAME_SIZE: usize = FRAME_FIELD_COUNT * 4;

/// Upper bound of a normalized axis sample
pub const SAMPLE_MAX: u32 = 1000;

/// Default at-rest center for every axis
pub const DEFAULT_CENTER: u32 = 500;

/// Trigger 0 pressed
pub const BUTTON_TRIGGER_0: u32 = 0x0001;
/// Trigger 1 pressed
pub const BUTTON_TRIGGER_1: u32 = 0x0002;
/// Probe marker so a sender can recognize its own echoed probe
pub const BUTTON_IGNORE: u32 = 0x4000;
/// Acknowledgment marker
pub const BUTTON_ACK: u32 = 0x8000;

/// Bits reserved for the ping protocol; never set from device state
pub const BUTTON_RESERVED_MASK: u32 = BUTTON_IGNORE | BUTTON_ACK;

/// Key identities on the matrix keypad, in wire bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Zero,
    Hash,
    Star,
    S,
    P,
    R,
}

impl Key {
    /// All keys, ordered by their bit position
    pub const ALL: [Key; 15] = [
        Key::One,
        Key::Two,
        Key::Three,
        Key::Four,
        Key::Five,
        Key::Six,
        Key::Seven,
        Key::Eight,
        Key::Nine,
        Key::Zero,
        Key::Hash,
        Key::Star,
        Key::S,
        Key::P,
        Key::R,
    ];

    /// Bit assigned to this key in the KeyMask field.
    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Printable label for the key.
    pub const fn label(self) -> char {
        match self {
            Key::One => '1',
            Key::Two => '2',
            Key::Three => '3',
            Key::Four => '4',
            Key::Five => '5',
            Key::Six => '6',
            Key::Seven => '7',
            Key::Eight => '8',
            Key::Nine => '9',
            Key::Zero => '0',
            Key::Hash => '#',
            Key::Star => '*',
            Key::S => 'S',
            Key::P => 'P',
            Key::R => 'R',
        }
    }
}

/// Set of pressed keypad keys. Chords set several bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyMask(pub u32);

impl KeyMask {
    /// No key pressed
    pub const NONE: KeyMask = KeyMask(0);

    /// Add a key to the set.
    pub fn insert(&mut self, key: Key) {
        self.0 |= key.bit();
    }

    /// Check whether a key is pressed.
    pub fn contains(&self, key: Key) -> bool {
        self.0 & key.bit() != 0
    }

    /// Iterate over pressed keys in bit order.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        Key::ALL.into_iter().filter(move |k| self.contains(*k))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn bits(&self) -> u32 {
        self.0
    }
}

impl fmt::UpperHex for KeyMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

/// Trigger state plus the ping protocol's reserved bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonMask(pub u32);

impl ButtonMask {
    /// No trigger pressed
    pub const NONE: ButtonMask = ButtonMask(0);

    /// Probe marker carried by ping frames
    pub const PROBE: ButtonMask = ButtonMask(BUTTON_ACK | BUTTON_IGNORE);

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// True when the ignore bit marks this as a probe (possibly our own echo).
    pub fn is_probe(&self) -> bool {
        self.0 & BUTTON_IGNORE != 0
    }

    pub fn is_ack(&self) -> bool {
        self.0 & BUTTON_ACK != 0
    }
}

impl fmt::UpperHex for ButtonMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

/// Calibration centers for X1, Y1, X2, Y2.
pub type Centers = [u32; 4];

/// One telemetry or probe frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Live samples: X1, Y1, X2, Y2
    pub axes: [u32; 4],
    /// Calibration centers: CenterX1, CenterY1, CenterX2, CenterY2
    pub centers: Centers,
    pub buttons: ButtonMask,
    pub keys: KeyMask,
}

impl Frame {
    /// Build a telemetry frame from live samples and the current centers.
    pub fn telemetry(axes: [u32; 4], centers: Centers, buttons: ButtonMask, keys: KeyMask) -> Self {
        Self {
            axes,
            centers,
            buttons,
            keys,
        }
    }

    /// Build the ping probe: every field zero except the ACK | IGNORE buttons.
    pub fn probe() -> Self {
        Self {
            axes: [0; 4],
            centers: [0; 4],
            buttons: ButtonMask::PROBE,
            keys: KeyMask::NONE,
        }
    }

    /// Probe carrying `sequence` in the keypad word.
    ///
    /// Receivers skip IGNORE-marked frames, so the word is free to identify
    /// which probe an echo belongs to. Sequence 0 is the plain probe.
    pub fn numbered_probe(sequence: u32) -> Self {
        Self {
            keys: KeyMask(sequence),
            ..Self::probe()
        }
    }

    /// Sequence number carried by a probe or its echo.
    pub fn probe_sequence(&self) -> u32 {
        self.keys.0
    }

    /// Fields in wire order.
    pub fn to_words(&self) -> [u32; FRAME_FIELD_COUNT] {
        let [x1, y1, x2, y2] = self.axes;
        let [cx1, cy1, cx2, cy2] = self.centers;
        [x1, y1, x2, y2, cx1, cy1, cx2, cy2, self.buttons.0, self.keys.0]
    }

    /// Rebuild a frame from fields in wire order.
    pub fn from_words(words: [u32; FRAME_FIELD_COUNT]) -> Self {
        Self {
            axes: [words[0], words[1], words[2], words[3]],
            centers: [words[4], words[5], words[6], words[7]],
            buttons: ButtonMask(words[8]),
            keys: KeyMask(words[9]),
        }
    }
}
