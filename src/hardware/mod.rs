//! # Hardware Module
//!
//! Controller input sampling on top of two collaborator traits.
//!
//! This module handles:
//! - Normalizing ADC counts into 0-1000 axis samples
//! - Scanning the 4×4 diode-matrix keypad
//! - Reading the two trigger buttons
//! - Bundling the above into one [`InputSnapshot`] per cycle
//!
//! The ADC driver and the GPIO abstraction are external. They are consumed
//! only through [`AnalogSource`] and [`GpioLines`]; the `rpi` feature provides
//! implementations for a Raspberry Pi with an ADS1115.

pub mod ads1115;
pub mod analog;
pub mod buttons;
pub mod keypad;
#[cfg(feature = "rpi")]
pub mod rpi;

use crate::error::Result;
use crate::frame::{ButtonMask, KeyMask};

use analog::{AnalogReader, Axis};
use buttons::ButtonReader;
use keypad::MatrixKeypad;

/// Electrical mode of a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinMode {
    /// Floating input; an undriven strobe line rests here
    HighImpedance,
    /// Input biased high by the internal pull-up
    PullUpInput,
    /// Driven output
    Output,
}

/// Logic level on a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

/// Source of raw ADC counts.
///
/// One call performs a complete single-shot conversion: select the channel,
/// start, wait for ready, read the count.
#[cfg_attr(test, mockall::automock)]
pub trait AnalogSource {
    /// Raw signed conversion result for `channel` (0-3).
    fn read_raw(&mut self, channel: u8) -> Result<i32>;
}

/// GPIO lines addressed by pin number.
#[cfg_attr(test, mockall::automock)]
pub trait GpioLines {
    /// Switch a pin's mode (direction and bias).
    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<()>;

    /// Read a pin's logic level.
    fn read(&mut self, pin: u8) -> Result<Level>;

    /// Set the level of a pin in [`PinMode::Output`].
    fn drive(&mut self, pin: u8, level: Level) -> Result<()>;
}

/// Current values of every live field in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSnapshot {
    /// X1, Y1, X2, Y2
    pub axes: [u32; 4],
    pub buttons: ButtonMask,
    pub keys: KeyMask,
}

/// The physical controller: two sticks on the ADC, triggers and keypad on GPIO.
pub struct ControllerDevice<A, G> {
    analog: AnalogReader<A>,
    gpio: G,
    keypad: MatrixKeypad,
    buttons: ButtonReader,
}

impl<A, G> std::fmt::Debug for ControllerDevice<A, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerDevice")
            .field("max_val", &self.analog.max_val())
            .finish_non_exhaustive()
    }
}

impl<A: AnalogSource, G: GpioLines> ControllerDevice<A, G> {
    /// Configure the GPIO lines and wrap the collaborators
    ///
    /// # Arguments
    ///
    /// * `source` - ADC collaborator
    /// * `gpio` - GPIO collaborator
    /// * `max_val` - Raw count that maps to sample 0
    ///
    /// # Errors
    ///
    /// Returns `Hardware` error if a pin cannot be configured
    pub fn new(source: A, mut gpio: G, max_val: i32) -> Result<Self> {
        let keypad = MatrixKeypad::new();
        let buttons = ButtonReader::new();
        keypad.setup(&mut gpio)?;
        buttons.setup(&mut gpio)?;

        Ok(Self {
            analog: AnalogReader::new(source, max_val),
            gpio,
            keypad,
            buttons,
        })
    }

    /// Read one normalized axis sample.
    pub fn read_sample(&mut self, axis: Axis) -> Result<u32> {
        self.analog.read_sample(axis)
    }

    pub fn poll_buttons(&mut self) -> Result<ButtonMask> {
        self.buttons.poll(&mut self.gpio)
    }

    pub fn poll_keypad(&mut self) -> Result<KeyMask> {
        self.keypad.scan(&mut self.gpio)
    }

    /// Sample all live fields in frame order: axes, buttons, keypad.
    pub fn read_inputs(&mut self) -> Result<InputSnapshot> {
        let axes = [
            self.read_sample(Axis::X1)?,
            self.read_sample(Axis::Y1)?,
            self.read_sample(Axis::X2)?,
            self.read_sample(Axis::Y2)?,
        ];
        let buttons = self.poll_buttons()?;
        let keys = self.poll_keypad()?;

        Ok(InputSnapshot {
            axes,
            buttons,
            keys,
        })
    }
}

#[cfg(test)]
pub mod mocks {
    //! Test doubles shared by the hardware and sampler tests.

    use super::*;
    use crate::error::RelayError;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    /// ADC fake returning the per-channel raw value currently stored.
    #[derive(Clone, Default)]
    pub struct FakeAnalog {
        pub raw: Arc<Mutex<[i32; 4]>>,
    }

    impl FakeAnalog {
        pub fn new(raw: [i32; 4]) -> Self {
            Self {
                raw: Arc::new(Mutex::new(raw)),
            }
        }

        pub fn set(&self, raw: [i32; 4]) {
            *self.raw.lock().unwrap() = raw;
        }
    }

    impl AnalogSource for FakeAnalog {
        fn read_raw(&mut self, channel: u8) -> Result<i32> {
            Ok(self.raw.lock().unwrap()[channel as usize])
        }
    }

    /// Electrical model of the keypad matrix and trigger lines.
    ///
    /// A sense line reads low when a pressed key connects it to a strobe that
    /// is currently in output mode and driven low. A trigger line reads low
    /// while held. Tracks how many strobes were driven at each read.
    #[derive(Clone, Default)]
    pub struct FakeMatrix {
        pub modes: Arc<Mutex<HashMap<u8, PinMode>>>,
        pub driven: Arc<Mutex<HashMap<u8, Level>>>,
        /// Pressed (strobe, sense) intersections
        pub pressed: Arc<Mutex<HashSet<(u8, u8)>>>,
        /// Trigger pins currently held
        pub held: Arc<Mutex<HashSet<u8>>>,
        /// Reads fail while this strobe is driven
        pub failing_strobe: Arc<Mutex<Option<u8>>>,
        pub max_driven_at_read: Arc<Mutex<usize>>,
        pub reads: Arc<Mutex<usize>>,
    }

    impl FakeMatrix {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn press(&self, strobe: u8, sense: u8) {
            self.pressed.lock().unwrap().insert((strobe, sense));
        }

        pub fn release_all(&self) {
            self.pressed.lock().unwrap().clear();
        }

        pub fn hold(&self, trigger: u8) {
            self.held.lock().unwrap().insert(trigger);
        }

        pub fn mode(&self, pin: u8) -> Option<PinMode> {
            self.modes.lock().unwrap().get(&pin).copied()
        }

        fn driven_strobes(&self) -> Vec<u8> {
            let modes = self.modes.lock().unwrap();
            let driven = self.driven.lock().unwrap();
            modes
                .iter()
                .filter(|(pin, mode)| {
                    **mode == PinMode::Output && driven.get(*pin) == Some(&Level::Low)
                })
                .map(|(pin, _)| *pin)
                .collect()
        }
    }

    impl GpioLines for FakeMatrix {
        fn configure(&mut self, pin: u8, mode: PinMode) -> Result<()> {
            self.modes.lock().unwrap().insert(pin, mode);
            if mode != PinMode::Output {
                self.driven.lock().unwrap().remove(&pin);
            }
            Ok(())
        }

        fn read(&mut self, pin: u8) -> Result<Level> {
            let strobes = self.driven_strobes();
            *self.reads.lock().unwrap() += 1;
            {
                let mut max = self.max_driven_at_read.lock().unwrap();
                *max = (*max).max(strobes.len());
            }

            if let Some(failing) = *self.failing_strobe.lock().unwrap() {
                if strobes.contains(&failing) {
                    return Err(RelayError::Hardware(format!("read of pin {} failed", pin)));
                }
            }

            if self.held.lock().unwrap().contains(&pin) {
                return Ok(Level::Low);
            }

            let pressed = self.pressed.lock().unwrap();
            let connected = strobes.iter().any(|s| pressed.contains(&(*s, pin)));
            Ok(if connected { Level::Low } else { Level::High })
        }

        fn drive(&mut self, pin: u8, level: Level) -> Result<()> {
            if self.mode(pin) != Some(PinMode::Output) {
                return Err(RelayError::Hardware(format!("pin {} is not an output", pin)));
            }
            self.driven.lock().unwrap().insert(pin, level);
            Ok(())
        }
    }
}
