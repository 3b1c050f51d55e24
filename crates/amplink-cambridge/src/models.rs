//! Cambridge Audio model definitions.
//!
//! Each supported amplifier is described by a [`CambridgeModel`] that
//! captures its serial baud rate, default decibel range, capabilities, and
//! the input sources it exposes over RS-232.
//!
//! Models are defined as factory functions (e.g. [`cxr200()`]) that return
//! a fully populated [`CambridgeModel`]. The following models are supported:
//!
//! | Model  | Baud | Volume range   | Sources |
//! |--------|------|----------------|---------|
//! | CXR200 | 9600 | -90 dB..+10 dB | 15      |

use amplink_core::{Manufacturer, PlayerCapabilities, PlayerDefinition, VolumeRange};

/// One selectable input source.
///
/// The amplifier uses the same two-digit index in both directions: the
/// selection command is `#3,04,<nn>` and the current-source reply is
/// `#4,01,<nn>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDef {
    /// Display name (e.g. "FM").
    pub name: &'static str,
    /// Complete selection command, sent with no parameter.
    pub select_code: &'static str,
    /// Reply line reported while this source is active.
    pub reply_code: &'static str,
}

/// Static model definition for a Cambridge Audio amplifier.
#[derive(Debug, Clone)]
pub struct CambridgeModel {
    /// Human-readable model name (e.g. "CXR200").
    pub name: &'static str,
    /// Machine-readable model identifier.
    pub model_id: &'static str,
    /// Default device name shown to the host.
    pub default_name: &'static str,
    /// Serial baud rate. Fixed by the amplifier, not user-configurable.
    pub default_baud_rate: u32,
    /// Decibel range used when the configuration does not override it.
    pub default_volume_range: VolumeRange,
    pub capabilities: PlayerCapabilities,
    /// Input sources in display order.
    pub sources: &'static [SourceDef],
}

impl From<&CambridgeModel> for PlayerDefinition {
    fn from(model: &CambridgeModel) -> Self {
        PlayerDefinition {
            manufacturer: Manufacturer::CambridgeAudio,
            model_name: model.name,
            default_baud_rate: model.default_baud_rate,
            volume_range: model.default_volume_range,
            capabilities: model.capabilities,
        }
    }
}

macro_rules! source {
    ($name:literal, $nn:literal) => {
        SourceDef {
            name: $name,
            select_code: concat!("#3,04,", $nn),
            reply_code: concat!("#4,01,", $nn),
        }
    };
}

static CXR200_SOURCES: &[SourceDef] = &[
    source!("Source 1", "00"),
    source!("Source 2", "01"),
    source!("Source 3", "02"),
    source!("Source 4", "03"),
    source!("Source 5", "04"),
    source!("Source 6", "05"),
    source!("Source 7", "06"),
    source!("Source 8", "07"),
    source!("TV ARC", "08"),
    source!("Stream Magic", "09"),
    source!("MP3", "10"),
    source!("FM", "11"),
    source!("AM", "12"),
    source!("Spotify", "13"),
    source!("Bluetooth", "14"),
];

/// Capabilities shared by the CXR series: everything except sound modes.
fn cxr_capabilities() -> PlayerCapabilities {
    PlayerCapabilities {
        turn_on: true,
        turn_off: true,
        volume_set: true,
        volume_step: true,
        volume_mute: true,
        select_source: true,
        select_sound_mode: false,
    }
}

/// CXR200 model definition.
///
/// The CXR200 is a 7.2-channel AV receiver with an RS-232 control port on
/// the rear panel. Volume is reported in whole decibels.
pub fn cxr200() -> CambridgeModel {
    CambridgeModel {
        name: "CXR200",
        model_id: "CXR200",
        default_name: "Cambridge Audio CXR 200",
        default_baud_rate: 9600,
        default_volume_range: VolumeRange {
            min_db: -90,
            max_db: 10,
        },
        capabilities: cxr_capabilities(),
        sources: CXR200_SOURCES,
    }
}

/// Returns a list of all supported Cambridge Audio model definitions.
pub fn all_cambridge_models() -> Vec<CambridgeModel> {
    vec![cxr200()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cxr200_basic_properties() {
        let model = cxr200();
        assert_eq!(model.name, "CXR200");
        assert_eq!(model.default_baud_rate, 9600);
        assert_eq!(model.default_name, "Cambridge Audio CXR 200");
        assert_eq!(model.default_volume_range.min_db, -90);
        assert_eq!(model.default_volume_range.max_db, 10);
    }

    #[test]
    fn cxr200_default_range_is_valid() {
        let range = cxr200().default_volume_range;
        assert!(VolumeRange::new(range.min_db, range.max_db).is_ok());
    }

    #[test]
    fn cxr200_capabilities() {
        let caps = cxr200().capabilities;
        assert!(caps.turn_on && caps.turn_off);
        assert!(caps.volume_set && caps.volume_step && caps.volume_mute);
        assert!(caps.select_source);
        assert!(!caps.select_sound_mode);
    }

    #[test]
    fn cxr200_source_codes() {
        let sources = cxr200().sources;
        assert_eq!(sources.len(), 15);

        let fm = sources.iter().find(|s| s.name == "FM").unwrap();
        assert_eq!(fm.select_code, "#3,04,11");
        assert_eq!(fm.reply_code, "#4,01,11");

        assert_eq!(sources[0].name, "Source 1");
        assert_eq!(sources[0].select_code, "#3,04,00");
        assert_eq!(sources[14].name, "Bluetooth");
        assert_eq!(sources[14].reply_code, "#4,01,14");
    }

    #[test]
    fn cxr200_source_indices_match_both_directions() {
        for source in cxr200().sources {
            let select_nn = source.select_code.rsplit(',').next();
            let reply_nn = source.reply_code.rsplit(',').next();
            assert_eq!(select_nn, reply_nn, "{}", source.name);
        }
    }

    #[test]
    fn all_models_have_unique_names() {
        let models = all_cambridge_models();
        let mut names: Vec<&str> = models.iter().map(|m| m.name).collect();
        let count_before = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), count_before, "duplicate model names found");
    }

    #[test]
    fn player_definition_from_model() {
        let def = PlayerDefinition::from(&cxr200());
        assert_eq!(def.manufacturer, Manufacturer::CambridgeAudio);
        assert_eq!(def.model_name, "CXR200");
        assert_eq!(def.default_baud_rate, 9600);
        assert!(def.capabilities.select_source);
    }
}
