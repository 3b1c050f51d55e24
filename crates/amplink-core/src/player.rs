//! The `MediaPlayer` trait -- the interface a home-automation host drives.
//!
//! A host registers a player, calls [`refresh()`](MediaPlayer::refresh) on
//! its own polling schedule, renders the cached [`PlayerState`], and forwards
//! user actions to the command methods. Each backend (currently only
//! `amplink-cambridge`) provides a concrete type implementing this trait.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::{Error, Result};
use crate::events::PlayerEvent;
use crate::types::*;

/// Unified asynchronous interface for controlling an amplifier.
///
/// Methods that talk to the device are `async` and return [`Result`]. Methods
/// that only read cached or static data are cheap; the cached getters still
/// take the state lock, so they are `async` as well.
///
/// Command methods return `Ok(())` once the command has been written and its
/// reply consumed. A device-reported error (e.g. "not available right now")
/// is logged by the driver but does not fail the call; the next
/// [`refresh()`](MediaPlayer::refresh) shows what actually took effect.
#[async_trait]
pub trait MediaPlayer: Send + Sync {
    /// Return static information about the player (manufacturer, model, name).
    fn info(&self) -> &PlayerInfo;

    /// Return the operations this player supports.
    fn capabilities(&self) -> &PlayerCapabilities;

    /// Subscribe to state change events.
    ///
    /// Returns a broadcast receiver. The channel is bounded; if the consumer
    /// falls behind, older events will be dropped (lagged).
    fn subscribe(&self) -> Result<broadcast::Receiver<PlayerEvent>>;

    /// Names of the selectable input sources, in display order.
    fn source_list(&self) -> Vec<String>;

    /// Poll the amplifier and update the cached state.
    ///
    /// Always queries power. Source and mute are only queried while the
    /// amplifier is on; while it is off they keep their previous values.
    async fn refresh(&self) -> Result<()>;

    /// Snapshot of the cached state as of the last poll.
    async fn state(&self) -> PlayerState;

    /// Cached power state.
    async fn power_state(&self) -> PowerState {
        self.state().await.power
    }

    /// Cached mute state.
    async fn is_muted(&self) -> bool {
        self.state().await.muted
    }

    /// Cached source name, or `None` if unknown.
    async fn source(&self) -> Option<String> {
        self.state().await.source
    }

    /// Query the current volume as a level in `0.0..=1.0`.
    ///
    /// Returns `Ok(None)` when the amplifier gave no usable reply.
    async fn volume_level(&self) -> Result<Option<f32>>;

    /// Switch the amplifier on.
    async fn turn_on(&self) -> Result<()>;

    /// Switch the amplifier to standby.
    async fn turn_off(&self) -> Result<()>;

    /// Mute (`true`) or unmute (`false`).
    async fn set_mute(&self, muted: bool) -> Result<()>;

    /// Set the volume from a level in `0.0..=1.0`.
    ///
    /// Levels outside that interval fail with
    /// [`Error::InvalidParameter`](crate::error::Error::InvalidParameter).
    async fn set_volume_level(&self, level: f32) -> Result<()>;

    /// Step the volume up by one device increment.
    async fn volume_up(&self) -> Result<()>;

    /// Step the volume down by one device increment.
    async fn volume_down(&self) -> Result<()>;

    /// Select an input source by name (one of [`source_list()`](MediaPlayer::source_list)).
    async fn select_source(&self, source: &str) -> Result<()>;

    /// Current sound mode. No supported model reports one.
    fn sound_mode(&self) -> Option<String> {
        None
    }

    /// Available sound modes.
    fn sound_mode_list(&self) -> Vec<String> {
        Vec::new()
    }

    /// Select a sound mode.
    async fn select_sound_mode(&self, _mode: &str) -> Result<()> {
        Err(Error::Unsupported("sound mode selection not supported".into()))
    }
}
