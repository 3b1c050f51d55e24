//! amplink-core: Core traits, types, and error definitions for amplink.
//!
//! This crate defines the manufacturer-agnostic abstractions that amplink
//! backends implement. Home-automation hosts depend on these types without
//! pulling in any specific amplifier driver.
//!
//! # Key types
//!
//! - [`MediaPlayer`] -- the unified trait for controlling an amplifier
//! - [`Transport`] -- byte-level communication channel
//! - [`PlayerEvent`] -- asynchronous state change notifications
//! - [`VolumeRange`] -- decibel <-> normalized volume conversion
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod events;
pub mod player;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use amplink_core::*`.
pub use error::{Error, Result};
pub use events::PlayerEvent;
pub use player::MediaPlayer;
pub use transport::Transport;
pub use types::*;
