//! Player event types.
//!
//! Drivers emit events through a [`tokio::sync::broadcast`] channel when a
//! poll observes a change. Hosts subscribe to update their UI without
//! diffing state snapshots themselves.

use crate::types::PowerState;

/// An event emitted by a player driver when its state changes.
///
/// Subscribe via [`crate::player::MediaPlayer::subscribe()`]. Delivery is
/// best-effort over a bounded channel; a slow consumer may miss events.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The amplifier switched between on and standby.
    PowerChanged { state: PowerState },

    /// Mute was switched on or off.
    MuteChanged { muted: bool },

    /// The selected input changed. `None` means the amplifier reported a
    /// source code with no known name.
    SourceChanged { source: Option<String> },

    /// A volume query returned a different level.
    VolumeChanged { level: f32 },
}
