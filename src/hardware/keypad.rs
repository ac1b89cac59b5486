//! # Matrix Keypad Decoder
//!
//! Scans the 4-strobe × 4-sense diode matrix.
//!
//! ## Wiring (BCM numbering)
//!
//! | strobe \ sense | K0 (20) | K321S (19) | K654P (16) | K987R (26) |
//! |----------------|---------|------------|------------|------------|
//! | K369 (23)      | `#`     | `3`        | `6`        | `9`        |
//! | K147 (24)      | `*`     | `1`        | `4`        | `7`        |
//! | K0258 (25)     | `0`     | `2`        | `5`        | `8`        |
//! | KSPR (4)       | -       | `S`        | `P`        | `R`        |
//!
//! Strobes rest as high-impedance inputs. To scan a column, its strobe is
//! switched to output and driven low; every sense line (pulled up) that reads
//! low is connected through a pressed key. The strobe goes back to
//! high-impedance before the next column, so at most one strobe is driven at
//! any instant. No debouncing is done here.

use tracing::trace;

use super::{GpioLines, Level, PinMode};
use crate::error::Result;
use crate::frame::protocol::{Key, KeyMask};

/// Strobe: `3`, `6`, `9`, `#`
pub const K369: u8 = 23;
/// Strobe: `1`, `4`, `7`, `*`
pub const K147: u8 = 24;
/// Strobe: `0`, `2`, `5`, `8`
pub const K0258: u8 = 25;
/// Strobe: `S`, `P`, `R`
pub const KSPR: u8 = 4;

/// Sense: top row (`3`, `2`, `1`, `S`)
pub const K321S: u8 = 19;
/// Sense: second row (`6`, `5`, `4`, `P`)
pub const K654P: u8 = 16;
/// Sense: third row (`9`, `8`, `7`, `R`)
pub const K987R: u8 = 26;
/// Sense: bottom row (`#`, `0`, `*`)
pub const K0: u8 = 20;

/// All strobe lines in scan order
pub const STROBES: [u8; 4] = [K369, K147, K0258, KSPR];

/// All sense lines
pub const SENSES: [u8; 4] = [K321S, K654P, K987R, K0];

/// One strobe and the keys reachable through each of its sense lines.
#[derive(Debug, Clone, Copy)]
struct Column {
    strobe: u8,
    keys: &'static [(u8, Key)],
}

const COLUMNS: [Column; 4] = [
    Column {
        strobe: K369,
        keys: &[(K0, Key::Hash), (K321S, Key::Three), (K654P, Key::Six), (K987R, Key::Nine)],
    },
    Column {
        strobe: K147,
        keys: &[(K0, Key::Star), (K321S, Key::One), (K654P, Key::Four), (K987R, Key::Seven)],
    },
    Column {
        strobe: K0258,
        keys: &[(K0, Key::Zero), (K321S, Key::Two), (K654P, Key::Five), (K987R, Key::Eight)],
    },
    Column {
        strobe: KSPR,
        keys: &[(K321S, Key::S), (K654P, Key::P), (K987R, Key::R)],
    },
];

/// Keypad matrix scanner.
#[derive(Debug, Clone, Default)]
pub struct MatrixKeypad;

impl MatrixKeypad {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Put every strobe in high-impedance and every sense line in pull-up input.
    pub fn setup<G: GpioLines>(&self, gpio: &mut G) -> Result<()> {
        for strobe in STROBES {
            gpio.configure(strobe, PinMode::HighImpedance)?;
        }
        for sense in SENSES {
            gpio.configure(sense, PinMode::PullUpInput)?;
        }
        Ok(())
    }

    /// Scan all four columns and return the pressed keys
    ///
    /// # Errors
    ///
    /// Returns the first GPIO error. The strobe being scanned is restored to
    /// high-impedance before the error is returned.
    pub fn scan<G: GpioLines>(&self, gpio: &mut G) -> Result<KeyMask> {
        let mut keys = KeyMask::NONE;
        for column in &COLUMNS {
            keys.0 |= scan_column(gpio, column)?.0;
        }
        if !keys.is_empty() {
            trace!("Keypad mask 0x{:04X}", keys.bits());
        }
        Ok(keys)
    }
}

/// Drive one strobe low, read its sense lines, release the strobe.
fn scan_column<G: GpioLines>(gpio: &mut G, column: &Column) -> Result<KeyMask> {
    gpio.configure(column.strobe, PinMode::Output)?;

    let sensed = gpio
        .drive(column.strobe, Level::Low)
        .and_then(|()| read_senses(gpio, column));

    // Always release, even when a read failed
    let released = gpio.configure(column.strobe, PinMode::HighImpedance);

    let keys = sensed?;
    released?;
    Ok(keys)
}

fn read_senses<G: GpioLines>(gpio: &mut G, column: &Column) -> Result<KeyMask> {
    let mut keys = KeyMask::NONE;
    for &(sense, key) in column.keys {
        if gpio.read(sense)? == Level::Low {
            keys.insert(key);
        }
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mocks::FakeMatrix;
    use crate::hardware::MockGpioLines;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn ready_matrix() -> FakeMatrix {
        let mut gpio = FakeMatrix::new();
        MatrixKeypad::new().setup(&mut gpio).unwrap();
        gpio
    }

    #[test]
    fn test_no_keys_pressed() {
        let mut gpio = ready_matrix();
        let keys = MatrixKeypad::new().scan(&mut gpio).unwrap();
        assert_eq!(keys, KeyMask::NONE);
    }

    #[test]
    fn test_single_key_sets_single_bit() {
        let mut gpio = ready_matrix();
        gpio.press(K369, K987R);

        let keys = MatrixKeypad::new().scan(&mut gpio).unwrap();
        assert_eq!(keys.bits(), Key::Nine.bit());
    }

    #[test]
    fn test_every_intersection_is_isolated() {
        let expected = [
            (K369, K0, Key::Hash),
            (K369, K321S, Key::Three),
            (K369, K654P, Key::Six),
            (K369, K987R, Key::Nine),
            (K147, K0, Key::Star),
            (K147, K321S, Key::One),
            (K147, K654P, Key::Four),
            (K147, K987R, Key::Seven),
            (K0258, K0, Key::Zero),
            (K0258, K321S, Key::Two),
            (K0258, K654P, Key::Five),
            (K0258, K987R, Key::Eight),
            (KSPR, K321S, Key::S),
            (KSPR, K654P, Key::P),
            (KSPR, K987R, Key::R),
        ];

        for (strobe, sense, key) in expected {
            let mut gpio = ready_matrix();
            gpio.press(strobe, sense);

            let keys = MatrixKeypad::new().scan(&mut gpio).unwrap();
            assert_eq!(keys.bits(), key.bit(), "strobe {} sense {}", strobe, sense);
        }
    }

    #[test]
    fn test_kspr_ignores_bottom_sense_line() {
        let mut gpio = ready_matrix();
        gpio.press(KSPR, K0);

        let keys = MatrixKeypad::new().scan(&mut gpio).unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn test_chord() {
        let mut gpio = ready_matrix();
        gpio.press(K147, K0);
        gpio.press(K0258, K654P);
        gpio.press(KSPR, K987R);

        let keys = MatrixKeypad::new().scan(&mut gpio).unwrap();
        assert_eq!(keys.bits(), Key::Star.bit() | Key::Five.bit() | Key::R.bit());
    }

    #[test]
    fn test_only_one_strobe_driven_during_reads() {
        let mut gpio = ready_matrix();
        gpio.press(K369, K321S);
        gpio.press(K147, K321S);
        gpio.press(K0258, K321S);
        gpio.press(KSPR, K321S);

        MatrixKeypad::new().scan(&mut gpio).unwrap();

        assert_eq!(*gpio.max_driven_at_read.lock().unwrap(), 1);
        assert_eq!(*gpio.reads.lock().unwrap(), 15);
    }

    #[test]
    fn test_strobes_released_after_scan() {
        let mut gpio = ready_matrix();
        gpio.press(K0258, K0);
        MatrixKeypad::new().scan(&mut gpio).unwrap();

        for strobe in STROBES {
            assert_eq!(gpio.mode(strobe), Some(PinMode::HighImpedance));
        }
    }

    #[test]
    fn test_strobe_released_when_read_fails() {
        let mut gpio = ready_matrix();
        *gpio.failing_strobe.lock().unwrap() = Some(K147);

        let result = MatrixKeypad::new().scan(&mut gpio);

        assert!(result.is_err());
        assert_eq!(gpio.mode(K147), Some(PinMode::HighImpedance));
        // Scan stops at the failing column
        assert_eq!(*gpio.reads.lock().unwrap(), 5);
    }

    #[test]
    fn test_setup_modes() {
        let gpio = ready_matrix();
        for strobe in STROBES {
            assert_eq!(gpio.mode(strobe), Some(PinMode::HighImpedance));
        }
        for sense in SENSES {
            assert_eq!(gpio.mode(sense), Some(PinMode::PullUpInput));
        }
    }

    #[test]
    fn test_strobe_sequence_per_column() {
        let mut gpio = MockGpioLines::new();
        let mut seq = Sequence::new();

        for column in &COLUMNS {
            gpio.expect_configure()
                .with(eq(column.strobe), eq(PinMode::Output))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
            gpio.expect_drive()
                .with(eq(column.strobe), eq(Level::Low))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
            gpio.expect_read()
                .times(column.keys.len())
                .in_sequence(&mut seq)
                .returning(|_| Ok(Level::High));
            gpio.expect_configure()
                .with(eq(column.strobe), eq(PinMode::HighImpedance))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }

        let keys = MatrixKeypad::new().scan(&mut gpio).unwrap();
        assert!(keys.is_empty());
    }
}
