//! # Button Reader
//!
//! Two trigger buttons on dedicated pull-up lines, active-low.

use super::{GpioLines, Level, PinMode};
use crate::error::Result;
use crate::frame::protocol::{ButtonMask, BUTTON_TRIGGER_0, BUTTON_TRIGGER_1};

/// Trigger 0 line (BCM)
pub const TRIG0: u8 = 5;
/// Trigger 1 line (BCM)
pub const TRIG1: u8 = 6;

const TRIGGERS: [(u8, u32); 2] = [(TRIG0, BUTTON_TRIGGER_0), (TRIG1, BUTTON_TRIGGER_1)];

/// Reads the trigger lines into a [`ButtonMask`].
#[derive(Debug, Clone, Default)]
pub struct ButtonReader;

impl ButtonReader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub fn setup<G: GpioLines>(&self, gpio: &mut G) -> Result<()> {
        for (pin, _) in TRIGGERS {
            gpio.configure(pin, PinMode::PullUpInput)?;
        }
        Ok(())
    }

    /// Poll both triggers. A low line means pressed.
    pub fn poll<G: GpioLines>(&self, gpio: &mut G) -> Result<ButtonMask> {
        let mut buttons = 0;
        for (pin, bit) in TRIGGERS {
            if gpio.read(pin)? == Level::Low {
                buttons |= bit;
            }
        }
        Ok(ButtonMask(buttons))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::MockGpioLines;
    use mockall::predicate::eq;

    fn gpio_with(trig0: Level, trig1: Level) -> MockGpioLines {
        let mut gpio = MockGpioLines::new();
        gpio.expect_read().with(eq(TRIG0)).returning(move |_| Ok(trig0));
        gpio.expect_read().with(eq(TRIG1)).returning(move |_| Ok(trig1));
        gpio
    }

    #[test]
    fn test_released() {
        let mut gpio = gpio_with(Level::High, Level::High);
        assert_eq!(ButtonReader::new().poll(&mut gpio).unwrap(), ButtonMask::NONE);
    }

    #[test]
    fn test_trigger_0() {
        let mut gpio = gpio_with(Level::Low, Level::High);
        assert_eq!(ButtonReader::new().poll(&mut gpio).unwrap().bits(), 0b01);
    }

    #[test]
    fn test_both_triggers() {
        let mut gpio = gpio_with(Level::Low, Level::Low);
        let buttons = ButtonReader::new().poll(&mut gpio).unwrap();
        assert_eq!(buttons.bits(), 0b11);
        assert!(!buttons.is_probe());
        assert!(!buttons.is_ack());
    }

    #[test]
    fn test_setup_enables_pull_ups() {
        let mut gpio = MockGpioLines::new();
        gpio.expect_configure()
            .with(eq(TRIG0), eq(PinMode::PullUpInput))
            .times(1)
            .returning(|_, _| Ok(()));
        gpio.expect_configure()
            .with(eq(TRIG1), eq(PinMode::PullUpInput))
            .times(1)
            .returning(|_, _| Ok(()));

        ButtonReader::new().setup(&mut gpio).unwrap();
    }

    #[test]
    fn test_read_error_propagates() {
        let mut gpio = MockGpioLines::new();
        gpio.expect_read()
            .returning(|pin| Err(crate::error::RelayError::Hardware(format!("pin {}", pin))));

        assert!(ButtonReader::new().poll(&mut gpio).is_err());
    }
}
