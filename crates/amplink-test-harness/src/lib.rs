//! amplink-test-harness: Test utilities and mock transports for amplink.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! amplifier drivers without requiring real hardware.

pub mod mock_serial;

pub use mock_serial::MockTransport;
