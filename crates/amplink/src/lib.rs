//! # amplink -- Serial Amplifier Control for Home Automation
//!
//! `amplink` is an asynchronous Rust library for controlling hi-fi
//! amplifiers over their RS-232 control port. It is designed for
//! home-automation hosts that poll device state on a schedule and forward
//! user actions (power, volume, mute, input selection).
//!
//! ## Quick Start
//!
//! ```no_run
//! use amplink::MediaPlayer;
//! use amplink::cambridge::{CambridgeBuilder, cxr200};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let amp = CambridgeBuilder::new(cxr200())
//!         .serial_port("/dev/ttyUSB0")
//!         .build()
//!         .await?;
//!
//!     amp.select_source("Spotify").await?;
//!     amp.set_volume_level(0.4).await?;
//!
//!     amp.refresh().await?;
//!     println!("{:?}", amp.state().await);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate                  | Purpose                                          |
//! |------------------------|--------------------------------------------------|
//! | `amplink-core`         | [`MediaPlayer`] trait, [`Transport`], types, errors |
//! | `amplink-transport`    | Serial transport (tokio-serial)                  |
//! | `amplink-cambridge`    | Cambridge Audio RS-232 protocol driver           |
//! | **`amplink`**          | This facade crate -- re-exports everything       |
//!
//! ## Feature Flags
//!
//! | Feature     | Enables                              | Default |
//! |-------------|--------------------------------------|---------|
//! | `cambridge` | [`cambridge`] module (CXR series)    | yes     |
//!
//! ## Event Subscription
//!
//! Drivers emit [`PlayerEvent`]s when a poll observes a change:
//!
//! ```no_run
//! use amplink::{MediaPlayer, PlayerEvent};
//! # async fn example(amp: &dyn MediaPlayer) -> amplink::Result<()> {
//! let mut events = amp.subscribe()?;
//! amp.refresh().await?;
//! while let Ok(event) = events.try_recv() {
//!     match event {
//!         PlayerEvent::SourceChanged { source } => println!("source: {source:?}"),
//!         other => println!("{other:?}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub use amplink_core::*;

/// Serial transport.
pub mod transport {
    pub use amplink_transport::*;
}

/// Cambridge Audio RS-232 backend.
///
/// Provides [`CambridgeAmp`](cambridge::CambridgeAmp),
/// [`CambridgeBuilder`](cambridge::CambridgeBuilder) and
/// [`AmplifierConfig`](cambridge::AmplifierConfig).
#[cfg(feature = "cambridge")]
pub mod cambridge {
    pub use amplink_cambridge::*;
}

/// Returns a flat list of all supported amplifier models across all enabled
/// backends.
///
/// # Example
///
/// ```
/// for model in amplink::supported_players() {
///     println!("{} {} ({} baud)", model.manufacturer, model.model_name, model.default_baud_rate);
/// }
/// ```
pub fn supported_players() -> Vec<PlayerDefinition> {
    let mut players = Vec::new();

    #[cfg(feature = "cambridge")]
    {
        players.extend(
            cambridge::all_cambridge_models()
                .iter()
                .map(PlayerDefinition::from),
        );
    }

    players
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "cambridge")]
    #[test]
    fn supported_players_lists_cxr200() {
        let players = supported_players();
        assert!(
            players
                .iter()
                .any(|p| p.manufacturer == Manufacturer::CambridgeAudio && p.model_name == "CXR200")
        );
    }
}
