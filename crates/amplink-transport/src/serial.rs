//! Serial port transport for amplifier communication.
//!
//! This module provides [`SerialTransport`], which implements the [`Transport`]
//! trait for RS-232 connections (physical ports or USB adapters).
//!
//! Cambridge Audio amplifiers use a fixed link: 9600 baud, 8 data bits, no
//! parity, 1 stop bit, no flow control. [`SerialConfig::default()`] matches it.
//!
//! # Example
//!
//! ```no_run
//! use amplink_transport::{SerialConfig, SerialTransport};
//! use amplink_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> amplink_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", SerialConfig::default()).await?;
//!
//! // Power query
//! transport.clear_buffers().await?;
//! transport.send(b"#1,01\r").await?;
//!
//! let mut buf = [0u8; 64];
//! let n = transport.receive(&mut buf, Duration::from_millis(500)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use amplink_core::error::{Error, Result};
use amplink_core::transport::Transport;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};

pub use tokio_serial::{DataBits, FlowControl, Parity, StopBits};

/// Default write timeout, matching the amplifier's documented 0.5 s.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Serial port configuration.
///
/// Immutable once the port is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
    /// Upper bound on a single write, including flush.
    pub write_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl SerialConfig {
    /// Default 9600 8N1 framing with a custom write timeout.
    pub fn with_write_timeout(write_timeout: Duration) -> Self {
        Self {
            write_timeout,
            ..Default::default()
        }
    }
}

/// Serial port transport for amplifier communication.
pub struct SerialTransport {
    port: Option<SerialStream>,
    port_name: String,
    write_timeout: Duration,
}

impl SerialTransport {
    /// Open a serial port.
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0" on Linux, "COM3" on Windows)
    /// * `config` - Framing and write timeout
    ///
    /// Fails with [`Error::Transport`] if the port cannot be opened or
    /// configured.
    pub async fn open(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(
            port = %port,
            baud_rate = config.baud_rate,
            data_bits = ?config.data_bits,
            stop_bits = ?config.stop_bits,
            parity = ?config.parity,
            flow_control = ?config.flow_control,
            write_timeout_ms = config.write_timeout.as_millis(),
            "Opening serial port"
        );

        let serial_stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(config.data_bits)
            .stop_bits(config.stop_bits)
            .parity(config.parity)
            .flow_control(config.flow_control)
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "Failed to open serial port");
                Error::Transport(format!("failed to open serial port {port}: {e}"))
            })?;

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened");

        Ok(Self {
            port: Some(serial_stream),
            port_name: port.to_string(),
            write_timeout: config.write_timeout,
        })
    }

    /// Get the name of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

fn map_io_error(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::NotConnected => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            bytes = data.len(),
            data = ?data,
            "Sending data"
        );

        let write = async {
            port.write_all(data).await?;
            port.flush().await
        };

        match tokio::time::timeout(self.write_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Failed to send data");
                Err(map_io_error(e))
            }
            Err(_) => {
                tracing::warn!(
                    port = %self.port_name,
                    timeout_ms = self.write_timeout.as_millis(),
                    "Write timed out"
                );
                Err(Error::Timeout)
            }
        }
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            buf_len = buf.len(),
            timeout_ms = timeout.as_millis(),
            "Waiting for data"
        );

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(n)) => {
                tracing::trace!(
                    port = %self.port_name,
                    bytes = n,
                    data = ?&buf[..n],
                    "Received data"
                );
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Failed to receive data");
                Err(map_io_error(e))
            }
            Err(_) => {
                tracing::trace!(
                    port = %self.port_name,
                    timeout_ms = timeout.as_millis(),
                    "Timeout waiting for data"
                );
                Err(Error::Timeout)
            }
        }
    }

    async fn clear_buffers(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.clear(ClearBuffer::All).map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to clear buffers");
            Error::Io(e.into())
        })
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            tracing::debug!(port = %self.port_name, "Closing serial port");

            if let Err(e) = port.flush().await {
                tracing::warn!(
                    port = %self.port_name,
                    error = %e,
                    "Failed to flush before closing (continuing anyway)"
                );
            }

            tracing::info!(port = %self.port_name, "Serial port closed");
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.port.is_some() {
            tracing::debug!(port = %self.port_name, "SerialTransport dropped, closing port");
        }
    }
}
