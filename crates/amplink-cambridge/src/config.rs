//! Typed amplifier configuration.
//!
//! [`AmplifierConfig`] is the file-level description of one amplifier,
//! loadable from TOML. Every field but `serial_port` has a default.
//!
//! ```toml
//! serial_port = "/dev/ttyUSB0"
//! name = "Living Room"
//! timeout = 0.5        # seconds to wait for a reply
//! write_timeout = 0.5  # seconds to wait for a write
//! min_volume = -90     # dB at volume level 0.0
//! max_volume = 10      # dB at volume level 1.0
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use amplink_core::error::{Error, Result};

use crate::builder::CambridgeBuilder;
use crate::models::CambridgeModel;

pub const DEFAULT_TIMEOUT_SECS: f64 = 0.5;
pub const DEFAULT_WRITE_TIMEOUT_SECS: f64 = 0.5;
pub const DEFAULT_MIN_VOLUME: i32 = -90;
pub const DEFAULT_MAX_VOLUME: i32 = 10;
pub const DEFAULT_NAME: &str = "Cambridge Audio CXR 200";

fn default_timeout() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_write_timeout() -> f64 {
    DEFAULT_WRITE_TIMEOUT_SECS
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_min_volume() -> i32 {
    DEFAULT_MIN_VOLUME
}

fn default_max_volume() -> i32 {
    DEFAULT_MAX_VOLUME
}

/// Configuration for one Cambridge Audio amplifier.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AmplifierConfig {
    /// Serial port path (required).
    pub serial_port: String,
    /// Reply timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    /// Write timeout in seconds.
    #[serde(default = "default_write_timeout")]
    pub write_timeout: f64,
    /// Device name shown to the host.
    #[serde(default = "default_name")]
    pub name: String,
    /// Decibels at volume level 0.0.
    #[serde(default = "default_min_volume")]
    pub min_volume: i32,
    /// Decibels at volume level 1.0.
    #[serde(default = "default_max_volume")]
    pub max_volume: i32,
}

impl AmplifierConfig {
    /// A configuration for `serial_port` with every other field defaulted.
    pub fn new(serial_port: &str) -> Self {
        AmplifierConfig {
            serial_port: serial_port.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            write_timeout: DEFAULT_WRITE_TIMEOUT_SECS,
            name: default_name(),
            min_volume: DEFAULT_MIN_VOLUME,
            max_volume: DEFAULT_MAX_VOLUME,
        }
    }

    /// Parse a configuration from TOML text. Does not validate.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| Error::InvalidParameter(format!("invalid amplifier configuration: {e}")))
    }

    /// Parse and validate in one call.
    pub fn from_toml_validated(text: &str) -> Result<Self> {
        let config = Self::from_toml_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration.
    ///
    /// Rejects an empty port, non-positive or non-finite timeouts, and a
    /// volume range where `min_volume >= max_volume`.
    pub fn validate(&self) -> Result<()> {
        if self.serial_port.trim().is_empty() {
            return Err(Error::InvalidParameter("serial_port must not be empty".into()));
        }
        seconds("timeout", self.timeout)?;
        seconds("write_timeout", self.write_timeout)?;
        if self.min_volume >= self.max_volume {
            return Err(Error::InvalidParameter(format!(
                "min_volume ({}) must be below max_volume ({})",
                self.min_volume, self.max_volume
            )));
        }
        Ok(())
    }

    /// Reply timeout as a [`Duration`].
    pub fn timeout(&self) -> Result<Duration> {
        seconds("timeout", self.timeout)
    }

    /// Write timeout as a [`Duration`].
    pub fn write_timeout(&self) -> Result<Duration> {
        seconds("write_timeout", self.write_timeout)
    }

    /// Validate and turn this configuration into a builder for `model`.
    pub fn into_builder(self, model: CambridgeModel) -> Result<CambridgeBuilder> {
        self.validate()?;
        Ok(CambridgeBuilder::new(model)
            .serial_port(&self.serial_port)
            .name(&self.name)
            .command_timeout(self.timeout()?)
            .write_timeout(self.write_timeout()?)
            .volume_range(self.min_volume, self.max_volume))
    }
}

fn seconds(field: &str, value: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(value) {
        Ok(d) if !d.is_zero() => Ok(d),
        _ => Err(Error::InvalidParameter(format!(
            "{field} must be a positive number of seconds, got {value}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cxr200;
    use amplink_core::MediaPlayer;
    use amplink_test_harness::MockTransport;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = AmplifierConfig::from_toml_str(r#"serial_port = "/dev/ttyS0""#).unwrap();
        assert_eq!(config, AmplifierConfig::new("/dev/ttyS0"));
        assert_eq!(config.name, "Cambridge Audio CXR 200");
        assert_eq!(config.timeout().unwrap(), Duration::from_millis(500));
        assert_eq!(config.min_volume, -90);
        assert_eq!(config.max_volume, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_toml() {
        let text = r#"
            serial_port = "COM3"
            name = "Den"
            timeout = 1.5
            write_timeout = 0.25
            min_volume = -70
            max_volume = 0
        "#;
        let config = AmplifierConfig::from_toml_validated(text).unwrap();
        assert_eq!(config.serial_port, "COM3");
        assert_eq!(config.name, "Den");
        assert_eq!(config.timeout().unwrap(), Duration::from_millis(1500));
        assert_eq!(config.write_timeout().unwrap(), Duration::from_millis(250));
        assert_eq!(config.min_volume, -70);
    }

    #[test]
    fn missing_port_is_error() {
        assert!(matches!(
            AmplifierConfig::from_toml_str("name = \"x\""),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn unknown_field_is_error() {
        let text = "serial_port = \"/dev/ttyS0\"\nbaud = 19200";
        assert!(AmplifierConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn validate_rejects_empty_port() {
        assert!(AmplifierConfig::new("  ").validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_timeouts() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut config = AmplifierConfig::new("/dev/ttyS0");
            config.timeout = bad;
            assert!(config.validate().is_err(), "timeout {bad}");

            let mut config = AmplifierConfig::new("/dev/ttyS0");
            config.write_timeout = bad;
            assert!(config.validate().is_err(), "write_timeout {bad}");
        }
    }

    #[test]
    fn validate_rejects_inverted_volume_range() {
        let mut config = AmplifierConfig::new("/dev/ttyS0");
        config.min_volume = 10;
        config.max_volume = 10;
        assert!(matches!(config.validate(), Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn into_builder_carries_settings() {
        let mut config = AmplifierConfig::new("/dev/ttyS0");
        config.name = "Kitchen".into();
        config.min_volume = -60;
        config.max_volume = -10;

        let amp = config
            .into_builder(cxr200())
            .unwrap()
            .initial_refresh(false)
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();

        assert_eq!(amp.info().name, "Kitchen");
        assert_eq!(amp.volume_range().min_db, -60);
        assert_eq!(amp.volume_range().max_db, -10);
    }

    #[test]
    fn into_builder_validates() {
        let mut config = AmplifierConfig::new("/dev/ttyS0");
        config.max_volume = -100;
        assert!(config.into_builder(cxr200()).is_err());
    }

    #[tokio::test]
    async fn extreme_volume_range_reads_volume() {
        let mut config = AmplifierConfig::new("/dev/ttyS0");
        config.min_volume = -2_000_000_000;
        config.max_volume = 2_000_000_000;

        let mock = MockTransport::new();
        mock.expect(b"#1,05\r", b"#6,05,0\r");
        let amp = config
            .into_builder(cxr200())
            .unwrap()
            .initial_refresh(false)
            .build_with_transport(Box::new(mock))
            .await
            .unwrap();

        let level = amp.volume_level().await.unwrap().unwrap();
        assert!((level - 0.5).abs() < 1e-6);
    }
}
