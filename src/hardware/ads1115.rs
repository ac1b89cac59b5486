//! # ADS1115 Register Layout
//!
//! Config-register encoding for the ADS1115 16-bit ADC. The I2C transport
//! lives in the `rpi` backend; this module only builds the words it writes.
//!
//! **Config register** (0x01), MSB first:
//!
//! ```text
//! 15    OS         write 1: start single conversion / read 1: idle (ready)
//! 14:12 MUX        100..111 = AIN0..AIN3 vs GND
//! 11:9  PGA        001 = ±4.096 V
//! 8     MODE       1 = single-shot
//! 7:5   DR         100 = 128 SPS
//! 4     COMP_MODE  0 = traditional
//! 3     COMP_POL   0 = active low
//! 2     COMP_LAT   0 = non-latching
//! 1:0   COMP_QUE   11 = comparator disabled
//! ```

/// Conversion result register
pub const REG_CONVERSION: u8 = 0x00;
/// Config register
pub const REG_CONFIG: u8 = 0x01;

/// Default I2C address (ADDR tied to GND)
pub const DEFAULT_ADDRESS: u16 = 0x48;

/// Start a conversion (write) / conversion finished (read)
pub const OS: u16 = 0x8000;
/// Single-ended inputs, AIN0..AIN3 against GND
pub const MUX_SINGLE: [u16; 4] = [0x4000, 0x5000, 0x6000, 0x7000];
/// ±4.096 V full-scale range
pub const PGA_4_096V: u16 = 0x0200;
/// Single-shot mode
pub const MODE_SINGLE: u16 = 0x0100;
/// 128 samples per second
pub const DATA_RATE_128: u16 = 0x0080;
/// Comparator disabled, ALERT/RDY pin high-impedance
pub const COMP_QUE_DISABLE: u16 = 0x0003;

/// Config word starting a single-shot conversion on `channel`.
///
/// Channels above 3 fall back to AIN0.
///
/// ```
/// use joystick_relay::hardware::ads1115::single_shot_config;
///
/// assert_eq!(single_shot_config(0), 0xC383);
/// assert_eq!(single_shot_config(3), 0xF383);
/// ```
pub fn single_shot_config(channel: u8) -> u16 {
    let mux = MUX_SINGLE.get(channel as usize).copied().unwrap_or(MUX_SINGLE[0]);
    OS | mux | PGA_4_096V | MODE_SINGLE | DATA_RATE_128 | COMP_QUE_DISABLE
}

/// True when a config register readback reports the conversion finished.
pub fn conversion_ready(config: u16) -> bool {
    config & OS != 0
}
