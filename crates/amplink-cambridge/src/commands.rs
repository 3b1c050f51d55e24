//! Cambridge Audio command builders and reply parsers.
//!
//! This module provides functions to construct command frames for the
//! amplifier operations (power, mute, volume, source) and to parse the
//! corresponding replies.
//!
//! All functions are pure -- they produce or consume byte vectors / string
//! slices without performing any I/O. The caller is responsible for sending
//! the bytes over a transport and feeding the reply back into the parsers.
//!
//! # Command reference
//!
//! Based on the CXR200 RS-232 protocol. Group `1` controls the amplifier,
//! group `3` the input source. Source selection frames carry the full source
//! code (e.g. `#3,04,11`) and come from the model's source table.

use amplink_core::{Error, PowerState, Result};

use crate::protocol::{encode_command, parse_triplet};

// ---------------------------------------------------------------
// Mnemonics
// ---------------------------------------------------------------

pub const GET_POWER: &str = "#1,01";
pub const SET_POWER: &str = "#1,02";
pub const GET_MUTE: &str = "#1,03";
pub const SET_MUTE: &str = "#1,04";
pub const GET_VOLUME: &str = "#1,05";
pub const VOLUME_UP: &str = "#1,06";
pub const VOLUME_DOWN: &str = "#1,07";
pub const SET_VOLUME: &str = "#1,08";
pub const GET_SOURCE: &str = "#3,01";

/// Reply group for amplifier state (answers group 1 queries).
const REPLY_GROUP_AMP: u8 = 2;
const REPLY_NUMBER_POWER: u8 = 1;
const REPLY_NUMBER_MUTE: u8 = 3;

fn on_off(on: bool) -> &'static str {
    if on { "1" } else { "0" }
}

// ---------------------------------------------------------------
// Command builders
// ---------------------------------------------------------------

/// Build a "read power state" command (`#1,01`).
pub fn cmd_read_power() -> Vec<u8> {
    encode_command(GET_POWER, None)
}

/// Build a "set power" command (`#1,02,1` on, `#1,02,0` standby).
pub fn cmd_set_power(on: bool) -> Vec<u8> {
    encode_command(SET_POWER, Some(on_off(on)))
}

/// Build a "read mute state" command (`#1,03`).
pub fn cmd_read_mute() -> Vec<u8> {
    encode_command(GET_MUTE, None)
}

/// Build a "set mute" command (`#1,04,1` muted, `#1,04,0` unmuted).
pub fn cmd_set_mute(muted: bool) -> Vec<u8> {
    encode_command(SET_MUTE, Some(on_off(muted)))
}

/// Build a "read volume" command (`#1,05`).
pub fn cmd_read_volume() -> Vec<u8> {
    encode_command(GET_VOLUME, None)
}

/// Build a "volume step up" command (`#1,06`).
pub fn cmd_volume_up() -> Vec<u8> {
    encode_command(VOLUME_UP, None)
}

/// Build a "volume step down" command (`#1,07`).
pub fn cmd_volume_down() -> Vec<u8> {
    encode_command(VOLUME_DOWN, None)
}

/// Build a "set volume" command (`#1,08,<db>`).
///
/// `decibel` is sent as a signed decimal (e.g. `#1,08,-40`).
pub fn cmd_set_volume(decibel: i32) -> Vec<u8> {
    encode_command(SET_VOLUME, Some(&decibel.to_string()))
}

/// Build a "read current source" command (`#3,01`).
pub fn cmd_read_source() -> Vec<u8> {
    encode_command(GET_SOURCE, None)
}

/// Build a "select source" command from a full source code (e.g. `#3,04,11`).
pub fn cmd_select_source(select_code: &str) -> Vec<u8> {
    encode_command(select_code, None)
}

// ---------------------------------------------------------------
// Reply parsers
// ---------------------------------------------------------------

fn parse_flag(payload: &str, number: u8, what: &str) -> Result<bool> {
    let triplet = parse_triplet(payload)
        .ok_or_else(|| Error::Protocol(format!("malformed {what} reply: {payload:?}")))?;

    if triplet.group != REPLY_GROUP_AMP || triplet.number != number {
        return Err(Error::Protocol(format!(
            "unexpected reply to {what} query: {payload:?}"
        )));
    }

    match triplet.value {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(Error::Protocol(format!("invalid {what} value: {other:?}"))),
    }
}

/// Parse a power state reply (`#2,01,1` or `#2,01,0`).
pub fn parse_power_reply(payload: &str) -> Result<PowerState> {
    parse_flag(payload, REPLY_NUMBER_POWER, "power").map(|on| {
        if on {
            PowerState::On
        } else {
            PowerState::Off
        }
    })
}

/// Parse a mute state reply (`#2,03,1` or `#2,03,0`). Returns `true` if muted.
pub fn parse_mute_reply(payload: &str) -> Result<bool> {
    parse_flag(payload, REPLY_NUMBER_MUTE, "mute")
}

/// Parse a volume reply. The third field is the volume in decibels.
pub fn parse_volume_reply(payload: &str) -> Result<i32> {
    let triplet = parse_triplet(payload)
        .ok_or_else(|| Error::Protocol(format!("malformed volume reply: {payload:?}")))?;

    triplet
        .value
        .parse::<i32>()
        .map_err(|e| Error::Protocol(format!("invalid volume value {:?}: {e}", triplet.value)))
}
