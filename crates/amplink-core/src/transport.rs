//! Transport trait for amplifier communication.
//!
//! The [`Transport`] trait abstracts over the physical link to an amplifier.
//! `amplink-transport` provides the serial implementation and
//! `amplink-test-harness` provides `MockTransport` for deterministic tests.
//!
//! Protocol drivers operate on a `Transport` rather than directly on a
//! serial port, so the same command/reply code runs against real hardware
//! and against scripted exchanges.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to an amplifier.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the amplifier.
    ///
    /// Completes once all bytes have been handed to the link. Returns
    /// [`Error::Timeout`](crate::error::Error::Timeout) if the write cannot
    /// finish within the transport's write timeout.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the amplifier into the provided buffer.
    ///
    /// Returns the number of bytes read. Waits up to `timeout`; returns
    /// [`Error::Timeout`](crate::error::Error::Timeout) if nothing arrives
    /// before the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Discard any pending input and output bytes on the link.
    ///
    /// Called before every command so the next bytes read belong to that
    /// command's reply and not to an earlier exchange.
    async fn clear_buffers(&mut self) -> Result<()>;

    /// Close the transport connection.
    ///
    /// After `close()`, `send()` and `receive()` return
    /// [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
