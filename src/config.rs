//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and key is optional; missing values take the defaults below.
//!
//! ```toml
//! [relay]
//! destinations = ["192.168.1.20:1234"]
//! bind_address = "0.0.0.0:0"
//!
//! [adc]
//! i2c_bus = 1
//! address = 0x48
//! max_val = 26560
//!
//! [sampling]
//! cycle_interval_ms = 0
//! centers = [500, 500, 500, 500]
//!
//! [ping]
//! timeout_ms = 1000
//! ```

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{RelayError, Result};
use crate::frame::protocol::{Centers, DEFAULT_CENTER, SAMPLE_MAX};
use crate::hardware::ads1115::DEFAULT_ADDRESS;
use crate::hardware::analog::DEFAULT_MAX_VAL;
use crate::relay::Destination;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub adc: AdcConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub ping: PingConfig,
}

/// Relay configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    #[serde(default)]
    pub destinations: Vec<Destination>,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// ADC configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AdcConfig {
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: u8,

    #[serde(default = "default_adc_address")]
    pub address: u16,

    #[serde(default = "default_max_val")]
    pub max_val: i32,
}

/// Sampling loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SamplingConfig {
    #[serde(default)]
    pub cycle_interval_ms: u64,

    #[serde(default = "default_centers")]
    pub centers: Centers,
}

/// Ping configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PingConfig {
    #[serde(default = "default_ping_timeout_ms")]
    pub timeout_ms: u64,
}

// Default value functions
fn default_bind_address() -> String { "0.0.0.0:0".to_string() }

fn default_i2c_bus() -> u8 { 1 }
fn default_adc_address() -> u16 { DEFAULT_ADDRESS }
fn default_max_val() -> i32 { DEFAULT_MAX_VAL }

fn default_centers() -> Centers { [DEFAULT_CENTER; 4] }

fn default_ping_timeout_ms() -> u64 { 1000 }

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            destinations: Vec::new(),
            bind_address: default_bind_address(),
        }
    }
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            i2c_bus: default_i2c_bus(),
            address: default_adc_address(),
            max_val: default_max_val(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: 0,
            centers: default_centers(),
        }
    }
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_ping_timeout_ms(),
        }
    }
}

impl SamplingConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }
}

impl PingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn invalid(msg: impl std::fmt::Display) -> RelayError {
    RelayError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails (including unparseable destinations)
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joystick_relay::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.relay.bind_address.parse::<SocketAddr>().is_err() {
            return Err(invalid(format!(
                "bind_address '{}' must be an IP:port socket address",
                self.relay.bind_address
            )));
        }

        if !(0x48..=0x4B).contains(&self.adc.address) {
            return Err(invalid("adc address must be between 0x48 and 0x4B"));
        }

        if self.adc.max_val < 1 || self.adc.max_val > i32::from(i16::MAX) {
            return Err(invalid("max_val must be between 1 and 32767"));
        }

        if self.sampling.cycle_interval_ms > 1000 {
            return Err(invalid("cycle_interval_ms must be between 0 and 1000"));
        }

        for (axis, center) in ["x1", "y1", "x2", "y2"].iter().zip(self.sampling.centers) {
            if center > SAMPLE_MAX {
                return Err(invalid(format!("center {} must be between 0 and {}", axis, SAMPLE_MAX)));
            }
        }

        if self.ping.timeout_ms == 0 || self.ping.timeout_ms > 60000 {
            return Err(invalid("ping timeout_ms must be between 1 and 60000"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.relay.destinations.is_empty());
        assert_eq!(config.adc.i2c_bus, 1);
        assert_eq!(config.adc.address, 0x48);
        assert_eq!(config.adc.max_val, 26560);
        assert_eq!(config.sampling.centers, [500; 4]);
        assert_eq!(config.sampling.cycle_interval(), Duration::ZERO);
        assert_eq!(config.ping.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let file = write_config("");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.relay.bind_address, "0.0.0.0:0");
        assert_eq!(config.adc.max_val, DEFAULT_MAX_VAL);
    }

    #[test]
    fn test_load_config_from_file() {
        let file = write_config(
            r#"
[relay]
destinations = ["192.168.1.20", "rover.local:4000", "[::1]:5000"]
bind_address = "0.0.0.0:9000"

[adc]
i2c_bus = 0
address = 0x49
max_val = 20000

[sampling]
cycle_interval_ms = 5
centers = [480, 500, 510, 500]

[ping]
timeout_ms = 250
"#,
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(
            config.relay.destinations,
            vec![
                Destination::new("192.168.1.20", 1234),
                Destination::new("rover.local", 4000),
                Destination::new("::1", 5000),
            ]
        );
        assert_eq!(config.adc.address, 0x49);
        assert_eq!(config.adc.i2c_bus, 0);
        assert_eq!(config.adc.max_val, 20000);
        assert_eq!(config.sampling.cycle_interval(), Duration::from_millis(5));
        assert_eq!(config.sampling.centers, [480, 500, 510, 500]);
        assert_eq!(config.ping.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_load_bad_destination() {
        let file = write_config("[relay]\ndestinations = [\"host:notaport\"]\n");
        match Config::load(file.path()) {
            Err(RelayError::Config(e)) => assert!(e.to_string().contains("bad port")),
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/joystick-relay.toml");
        assert!(matches!(result, Err(RelayError::Io(_))));
    }

    #[test]
    fn test_invalid_bind_address() {
        let mut config = Config::default();
        config.relay.bind_address = "localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_adc_address_range() {
        let mut config = Config::default();
        config.adc.address = 0x4B;
        assert!(config.validate().is_ok());
        config.adc.address = 0x47;
        assert!(config.validate().is_err());
        config.adc.address = 0x4C;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_val_range() {
        let mut config = Config::default();
        config.adc.max_val = 0;
        assert!(config.validate().is_err());
        config.adc.max_val = 32768;
        assert!(config.validate().is_err());
        config.adc.max_val = 32767;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cycle_interval_too_high() {
        let mut config = Config::default();
        config.sampling.cycle_interval_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_center_out_of_range() {
        let mut config = Config::default();
        config.sampling.centers = [500, 500, 1001, 500];
        match config.validate() {
            Err(RelayError::Config(e)) => assert!(e.to_string().contains("x2")),
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    #[test]
    fn test_ping_timeout_range() {
        let mut config = Config::default();
        config.ping.timeout_ms = 0;
        assert!(config.validate().is_err());
        config.ping.timeout_ms = 60001;
        assert!(config.validate().is_err());
    }
}
