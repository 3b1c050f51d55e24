//! Transport implementations for amplink.
//!
//! This crate provides concrete implementations of the
//! [`Transport`](amplink_core::Transport) trait from `amplink-core`:
//!
//! - [`SerialTransport`]: RS-232 serial connections, physical or via USB
//!   adapter

pub mod serial;

pub use serial::{
    DEFAULT_WRITE_TIMEOUT, DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits,
};
