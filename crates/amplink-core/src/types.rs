//! Core types used throughout amplink.
//!
//! These types describe a player independently of the wire protocol used to
//! reach it: power state, cached state snapshots, capability flags, and the
//! decibel range that maps device volume onto a normalized 0..1 level.

use std::fmt;

use crate::error::{Error, Result};

/// Power state of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PowerState {
    /// Powered on and answering state queries.
    On,
    /// In standby. The amplifier does not report source or mute while off.
    #[default]
    Off,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::On => write!(f, "on"),
            PowerState::Off => write!(f, "off"),
        }
    }
}

/// Supported amplifier manufacturers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Manufacturer {
    CambridgeAudio,
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Manufacturer::CambridgeAudio => write!(f, "Cambridge Audio"),
        }
    }
}

/// Static information about a connected player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub manufacturer: Manufacturer,
    /// User-facing device name (e.g. "Living Room Amp").
    pub name: String,
    /// Model name (e.g. "CXR200").
    pub model_name: String,
    /// Machine-readable model identifier.
    pub model_id: String,
}

/// Which player operations a model supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerCapabilities {
    pub turn_on: bool,
    pub turn_off: bool,
    /// Absolute volume via [`set_volume_level`](crate::MediaPlayer::set_volume_level).
    pub volume_set: bool,
    /// Relative volume via `volume_up` / `volume_down`.
    pub volume_step: bool,
    pub volume_mute: bool,
    pub select_source: bool,
    pub select_sound_mode: bool,
}

/// A supported model, as listed by the facade crate.
#[derive(Debug, Clone)]
pub struct PlayerDefinition {
    pub manufacturer: Manufacturer,
    pub model_name: &'static str,
    pub default_baud_rate: u32,
    pub volume_range: VolumeRange,
    pub capabilities: PlayerCapabilities,
}

/// Snapshot of the last known player state.
///
/// Fields are only as fresh as the most recent successful poll. `source` is
/// `None` when the amplifier never reported one or reported a code with no
/// mapping; `volume_level` is `None` until volume has been queried.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerState {
    pub power: PowerState,
    pub muted: bool,
    pub source: Option<String>,
    pub volume_level: Option<f32>,
}

/// Decibel range of a device, mapped linearly onto a 0..1 volume level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeRange {
    pub min_db: i32,
    pub max_db: i32,
}

impl VolumeRange {
    /// Create a range, rejecting `min_db >= max_db`.
    pub fn new(min_db: i32, max_db: i32) -> Result<Self> {
        if min_db >= max_db {
            return Err(Error::InvalidParameter(format!(
                "volume range minimum ({min_db} dB) must be below maximum ({max_db} dB)"
            )));
        }
        Ok(VolumeRange { min_db, max_db })
    }

    /// Width of the range in decibels.
    pub fn span(&self) -> u32 {
        self.min_db.abs_diff(self.max_db)
    }

    /// Convert a device decibel value to a volume level.
    ///
    /// `|min_db - decibel| / |min_db - max_db|`, so `min_db` maps to 0.0 and
    /// `max_db` maps to 1.0. Fails if the range is empty.
    pub fn volume_to_normalized(&self, decibel: i32) -> Result<f32> {
        let span = self.span();
        if span == 0 {
            return Err(Error::InvalidParameter(format!(
                "empty volume range ({} dB to {} dB)",
                self.min_db, self.max_db
            )));
        }
        Ok((f64::from(self.min_db.abs_diff(decibel)) / f64::from(span)) as f32)
    }

    /// Convert a volume level in `0.0..=1.0` to a device decibel value.
    ///
    /// `min_db + round(|min_db - max_db| * level)`. Levels outside the unit
    /// interval (and NaN) are rejected rather than clamped.
    pub fn normalized_to_volume(&self, level: f32) -> Result<i32> {
        if !(0.0..=1.0).contains(&level) {
            return Err(Error::InvalidParameter(format!(
                "volume level {level} outside 0.0..=1.0"
            )));
        }
        let offset = (f64::from(self.span()) * f64::from(level)).round() as i64;
        i32::try_from(i64::from(self.min_db) + offset).map_err(|_| {
            Error::InvalidParameter(format!("volume level {level} does not map into {self}"))
        })
    }
}

impl fmt::Display for VolumeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dB .. {} dB", self.min_db, self.max_db)
    }
}
