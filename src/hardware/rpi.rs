//! # Raspberry Pi Backend
//!
//! [`GpioLines`] over BCM pins and [`AnalogSource`] over an ADS1115 on the
//! I2C bus, both using `rppal`.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use rppal::gpio::{Gpio, IoPin, Mode, PullUpDown};
use rppal::i2c::I2c;
use tracing::{info, trace};

use super::ads1115::{conversion_ready, single_shot_config, REG_CONFIG, REG_CONVERSION};
use super::{AnalogSource, GpioLines, Level, PinMode};
use crate::error::{RelayError, Result};

/// Config register polls before a conversion is declared stuck
const MAX_READY_POLLS: u32 = 100;

/// Delay between config register polls (one conversion at 128 SPS ≈ 7.8 ms)
const READY_POLL_INTERVAL: Duration = Duration::from_micros(500);

/// BCM GPIO pins opened on first use.
pub struct RpiGpio {
    gpio: Gpio,
    pins: HashMap<u8, IoPin>,
}

impl std::fmt::Debug for RpiGpio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpiGpio")
            .field("pins", &self.pins.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl RpiGpio {
    /// Open the GPIO peripheral
    ///
    /// # Errors
    ///
    /// Returns `Hardware` error if `/dev/gpiomem` cannot be opened
    pub fn open() -> Result<Self> {
        let gpio = Gpio::new()?;
        info!("Opened GPIO peripheral");
        Ok(Self {
            gpio,
            pins: HashMap::new(),
        })
    }

    fn pin(&mut self, pin: u8) -> Result<&mut IoPin> {
        if !self.pins.contains_key(&pin) {
            let io = self.gpio.get(pin)?.into_io(Mode::Input);
            self.pins.insert(pin, io);
        }
        self.pins
            .get_mut(&pin)
            .ok_or_else(|| RelayError::Hardware(format!("GPIO {} unavailable", pin)))
    }
}

impl GpioLines for RpiGpio {
    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<()> {
        let io = self.pin(pin)?;
        match mode {
            PinMode::HighImpedance => {
                io.set_mode(Mode::Input);
                io.set_pullupdown(PullUpDown::Off);
            }
            PinMode::PullUpInput => {
                io.set_mode(Mode::Input);
                io.set_pullupdown(PullUpDown::PullUp);
            }
            PinMode::Output => io.set_mode(Mode::Output),
        }
        Ok(())
    }

    fn read(&mut self, pin: u8) -> Result<Level> {
        let io = self.pin(pin)?;
        Ok(if io.is_low() { Level::Low } else { Level::High })
    }

    fn drive(&mut self, pin: u8, level: Level) -> Result<()> {
        let io = self.pin(pin)?;
        match level {
            Level::Low => io.set_low(),
            Level::High => io.set_high(),
        }
        Ok(())
    }
}

/// ADS1115 on a Linux I2C bus.
pub struct Ads1115 {
    i2c: I2c,
    address: u16,
}

impl std::fmt::Debug for Ads1115 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ads1115")
            .field("address", &format_args!("0x{:02X}", self.address))
            .finish_non_exhaustive()
    }
}

impl Ads1115 {
    /// Open the converter at `address` on I2C bus `bus`
    ///
    /// # Errors
    ///
    /// Returns `Hardware` error if the bus cannot be opened
    pub fn open(bus: u8, address: u16) -> Result<Self> {
        let mut i2c = I2c::with_bus(bus)?;
        i2c.set_slave_address(address)?;
        info!("Opened ADS1115 at 0x{:02X} on I2C bus {}", address, bus);
        Ok(Self { i2c, address })
    }

    fn read_register(&mut self, register: u8) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.i2c.write_read(&[register], &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write_register(&mut self, register: u8, value: u16) -> Result<()> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c.write(&[register, hi, lo])?;
        Ok(())
    }

    fn wait_ready(&mut self) -> Result<()> {
        for _ in 0..MAX_READY_POLLS {
            if conversion_ready(self.read_register(REG_CONFIG)?) {
                return Ok(());
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
        Err(RelayError::Hardware(format!(
            "ADS1115 at 0x{:02X}: conversion not ready after {} polls",
            self.address, MAX_READY_POLLS
        )))
    }
}

impl AnalogSource for Ads1115 {
    fn read_raw(&mut self, channel: u8) -> Result<i32> {
        self.write_register(REG_CONFIG, single_shot_config(channel))?;
        self.wait_ready()?;
        let raw = self.read_register(REG_CONVERSION)? as i16;
        trace!("ADS1115 channel {} raw {}", channel, raw);
        Ok(i32::from(raw))
    }
}
