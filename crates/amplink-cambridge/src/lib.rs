//! Cambridge Audio RS-232 protocol backend for amplink.
//!
//! This crate implements the carriage-return delimited ASCII protocol used
//! on the serial control port of Cambridge Audio amplifiers. It provides:
//!
//! - **Protocol codec** ([`protocol`]) -- encode commands, decode reply
//!   lines, and classify the four device error replies.
//! - **Command builders** ([`commands`]) -- frames for power, mute, volume
//!   and source operations, and parsers for their replies.
//! - **Model definitions** ([`models`]) -- static data for supported
//!   amplifiers (CXR200), including the input source list.
//! - **Source table** ([`sources`]) -- name <-> code lookup in both
//!   directions.
//! - **Driver** ([`amp`]) -- the [`MediaPlayer`](amplink_core::MediaPlayer)
//!   implementation with serialized exchanges and event emission.
//! - **Builder** ([`builder`]) and **configuration** ([`config`]) -- fluent
//!   construction and a TOML-loadable settings struct.
//!
//! # Example
//!
//! ```
//! use amplink_cambridge::protocol::{decode_reply, DecodeResult};
//! use amplink_cambridge::commands::{cmd_read_power, parse_power_reply};
//! use amplink_core::PowerState;
//!
//! // Build a "read power state" command
//! assert_eq!(cmd_read_power(), b"#1,01\r");
//!
//! // Simulate the amplifier's reply
//! if let DecodeResult::Line { payload, .. } = decode_reply(b"#2,01,1\r") {
//!     assert_eq!(parse_power_reply(&payload).unwrap(), PowerState::On);
//! }
//! ```

pub mod amp;
pub mod builder;
pub mod commands;
pub mod config;
pub mod models;
pub mod protocol;
pub mod sources;

// Re-export the primary types for ergonomic `use amplink_cambridge::*`.
pub use amp::CambridgeAmp;
pub use builder::CambridgeBuilder;
pub use config::AmplifierConfig;
pub use models::{CambridgeModel, all_cambridge_models, cxr200};
pub use protocol::{DeviceError, Reply};
