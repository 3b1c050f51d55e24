//! CambridgeBuilder -- fluent builder for constructing [`CambridgeAmp`]
//! instances.
//!
//! Separates configuration from construction so that callers can set the
//! serial port, timeouts, device name and volume range before the port is
//! opened.
//!
//! # Example
//!
//! ```no_run
//! use amplink_cambridge::builder::CambridgeBuilder;
//! use amplink_cambridge::models::cxr200;
//! use std::time::Duration;
//!
//! # async fn example() -> amplink_core::Result<()> {
//! let amp = CambridgeBuilder::new(cxr200())
//!     .serial_port("/dev/ttyUSB0")
//!     .name("Living Room")
//!     .command_timeout(Duration::from_millis(300))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use amplink_core::error::{Error, Result};
use amplink_core::player::MediaPlayer;
use amplink_core::transport::Transport;
use amplink_core::types::VolumeRange;
use amplink_transport::{SerialConfig, SerialTransport};

use crate::amp::CambridgeAmp;
use crate::models::CambridgeModel;
use crate::sources::SourceTable;

/// Fluent builder for [`CambridgeAmp`].
///
/// All configuration has defaults derived from the [`CambridgeModel`], so
/// the simplest usage is:
///
/// ```ignore
/// let amp = CambridgeBuilder::new(cxr200())
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// ```
pub struct CambridgeBuilder {
    model: CambridgeModel,
    serial_port: Option<String>,
    name: Option<String>,
    command_timeout: Duration,
    write_timeout: Duration,
    volume_range: Option<(i32, i32)>,
    initial_refresh: bool,
}

impl CambridgeBuilder {
    /// Create a new builder for the given model.
    pub fn new(model: CambridgeModel) -> Self {
        CambridgeBuilder {
            model,
            serial_port: None,
            name: None,
            command_timeout: Duration::from_millis(500),
            write_timeout: amplink_transport::DEFAULT_WRITE_TIMEOUT,
            volume_range: None,
            initial_refresh: true,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Set the device name reported in [`PlayerInfo`](amplink_core::PlayerInfo)
    /// (default: the model's default name).
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the read timeout for a single command's reply (default: 500ms).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the serial write timeout (default: 500ms).
    ///
    /// Only used by [`build()`](Self::build); a caller-provided transport
    /// carries its own.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Override the model's decibel range. Validated at build time.
    pub fn volume_range(mut self, min_db: i32, max_db: i32) -> Self {
        self.volume_range = Some((min_db, max_db));
        self
    }

    /// Poll the amplifier once during build (default: `true`).
    pub fn initial_refresh(mut self, enabled: bool) -> Self {
        self.initial_refresh = enabled;
        self
    }

    /// Build a [`CambridgeAmp`] with a caller-provided transport.
    ///
    /// This is the primary entry point for testing (pass a `MockTransport`
    /// from `amplink-test-harness`). If the initial refresh fails on a link
    /// error, the amplifier is dropped along with its transport.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<CambridgeAmp> {
        if self.command_timeout.is_zero() {
            return Err(Error::InvalidParameter(
                "command_timeout must be positive".into(),
            ));
        }

        let volume_range = match self.volume_range {
            Some((min_db, max_db)) => VolumeRange::new(min_db, max_db)?,
            None => self.model.default_volume_range,
        };
        let sources = SourceTable::from_defs(self.model.sources)?;
        let name = self
            .name
            .unwrap_or_else(|| self.model.default_name.to_string());

        tracing::debug!(
            model = self.model.name,
            name = %name,
            range = %volume_range,
            sources = sources.len(),
            "Building Cambridge Audio driver"
        );

        let amp = CambridgeAmp::new(
            transport,
            self.model,
            name,
            volume_range,
            sources,
            self.command_timeout,
        );

        if self.initial_refresh {
            amp.refresh().await?;
        }
        Ok(amp)
    }

    /// Build a [`CambridgeAmp`] using a serial transport.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    /// The port is opened at the model's fixed baud rate, 8N1.
    pub async fn build(self) -> Result<CambridgeAmp> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;

        let config = SerialConfig {
            baud_rate: self.model.default_baud_rate,
            write_timeout: self.write_timeout,
            ..SerialConfig::default()
        };
        let transport = SerialTransport::open(port, config).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}
