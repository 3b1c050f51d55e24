//! CambridgeAmp -- the [`MediaPlayer`] implementation for Cambridge Audio
//! amplifiers.
//!
//! This module ties the text protocol engine ([`protocol`], [`commands`]) to
//! a [`Transport`]. Every command is one exchange: clear the link buffers,
//! write the frame, read one `\r`-terminated line or give up at the command
//! timeout. The transport mutex is held for the whole exchange, so replies
//! can never be attributed to the wrong command.
//!
//! The amplifier does not push state changes. Hosts call
//! [`refresh()`](MediaPlayer::refresh) on their own schedule and render the
//! cached [`PlayerState`] in between.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};
use tokio::time::Instant;
use tracing::{debug, error, trace, warn};

use amplink_core::error::{Error, Result};
use amplink_core::events::PlayerEvent;
use amplink_core::player::MediaPlayer;
use amplink_core::transport::Transport;
use amplink_core::types::*;

use crate::commands;
use crate::models::CambridgeModel;
use crate::protocol::{self, DecodeResult, Reply};
use crate::sources::SourceTable;

/// Longest reply we accumulate before giving up on finding a terminator.
const MAX_REPLY_LEN: usize = 256;

/// Last values read from the amplifier.
#[derive(Debug, Clone, Default)]
struct CachedState {
    power: PowerState,
    muted: bool,
    source: Option<String>,
    volume_level: Option<f32>,
}

impl From<&CachedState> for PlayerState {
    fn from(cached: &CachedState) -> Self {
        PlayerState {
            power: cached.power,
            muted: cached.muted,
            source: cached.source.clone(),
            volume_level: cached.volume_level,
        }
    }
}

/// A connected Cambridge Audio amplifier controlled over RS-232.
///
/// Constructed via [`CambridgeBuilder`](crate::builder::CambridgeBuilder).
/// All amplifier communication goes through the [`Transport`] provided at
/// build time; dropping the `CambridgeAmp` releases it.
pub struct CambridgeAmp {
    transport: Mutex<Box<dyn Transport>>,
    model: CambridgeModel,
    info: PlayerInfo,
    volume_range: VolumeRange,
    sources: SourceTable,
    command_timeout: Duration,
    state: Mutex<CachedState>,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl CambridgeAmp {
    /// Create a new `CambridgeAmp` from its constituent parts.
    ///
    /// This is called by [`CambridgeBuilder`](crate::builder::CambridgeBuilder);
    /// callers should use the builder API instead.
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        model: CambridgeModel,
        name: String,
        volume_range: VolumeRange,
        sources: SourceTable,
        command_timeout: Duration,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        let info = PlayerInfo {
            manufacturer: Manufacturer::CambridgeAudio,
            name,
            model_name: model.name.to_string(),
            model_id: model.model_id.to_string(),
        };
        CambridgeAmp {
            transport: Mutex::new(transport),
            model,
            info,
            volume_range,
            sources,
            command_timeout,
            state: Mutex::new(CachedState::default()),
            event_tx,
        }
    }

    /// The model definition this driver was built for.
    pub fn model(&self) -> &CambridgeModel {
        &self.model
    }

    /// The decibel range used for volume conversion.
    pub fn volume_range(&self) -> VolumeRange {
        self.volume_range
    }

    /// Send one command and read its reply.
    ///
    /// `mnemonic` is the `#<group>,<number>` part; `param`, if given, is
    /// appended after a comma. Device-reported errors and read timeouts are
    /// returned as [`Reply`] values. Only link failures (I/O error, write
    /// timeout, closed port, non-ASCII garbage) are `Err`.
    pub async fn send_command(&self, mnemonic: &str, param: Option<&str>) -> Result<Reply> {
        self.exchange(&protocol::encode_command(mnemonic, param))
            .await
    }

    /// Close the underlying transport. Later commands fail with
    /// [`Error::NotConnected`].
    pub async fn close(&self) -> Result<()> {
        self.transport.lock().await.close().await
    }

    async fn exchange(&self, frame: &[u8]) -> Result<Reply> {
        let command = String::from_utf8_lossy(frame);
        let command = command.trim_end_matches('\r');

        let mut transport = self.transport.lock().await;

        transport.clear_buffers().await?;
        debug!(command = %command, "Sending command");
        transport.send(frame).await?;

        let deadline = Instant::now() + self.command_timeout;
        let mut buf = [0u8; 64];
        let mut reply_buf: Vec<u8> = Vec::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            match transport.receive(&mut buf, remaining).await {
                Ok(0) => break,
                Ok(n) => {
                    reply_buf.extend_from_slice(&buf[..n]);
                    match protocol::decode_reply(&reply_buf) {
                        DecodeResult::Line { payload, consumed } => {
                            if consumed < reply_buf.len() {
                                trace!(
                                    extra = reply_buf.len() - consumed,
                                    "Discarding bytes after reply line"
                                );
                            }
                            return Ok(self.classify(command, payload));
                        }
                        DecodeResult::Invalid(_) => {
                            error!(command = %command, data = ?reply_buf, "Reply is not ASCII");
                            return Err(Error::Protocol(format!(
                                "non-ASCII reply to {command}: {reply_buf:02X?}"
                            )));
                        }
                        DecodeResult::Incomplete if reply_buf.len() > MAX_REPLY_LEN => {
                            return Err(Error::Protocol(format!(
                                "reply to {command} exceeded {MAX_REPLY_LEN} bytes without terminator"
                            )));
                        }
                        DecodeResult::Incomplete => {}
                    }
                }
                Err(Error::Timeout) => break,
                Err(e) => return Err(e),
            }
        }

        if reply_buf.is_empty() {
            warn!(command = %command, "No reply before timeout");
        } else {
            warn!(
                command = %command,
                partial = %String::from_utf8_lossy(&reply_buf),
                "Unterminated reply before timeout"
            );
        }
        Ok(Reply::NoReply)
    }

    fn classify(&self, command: &str, payload: String) -> Reply {
        let reply = Reply::classify(payload);
        match &reply {
            Reply::Payload(p) => debug!(command = %command, reply = %p, "Received reply"),
            Reply::DeviceError(err) => {
                error!(command = %command, code = err.code(), "{err}")
            }
            Reply::NoReply => warn!(command = %command, "Empty reply"),
        }
        reply
    }

    /// Send a command whose reply carries no information we need.
    async fn execute_set_command(&self, frame: &[u8]) -> Result<()> {
        let _ = self.exchange(frame).await?;
        Ok(())
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.event_tx.send(event);
    }
}

#[async_trait]
impl MediaPlayer for CambridgeAmp {
    fn info(&self) -> &PlayerInfo {
        &self.info
    }

    fn capabilities(&self) -> &PlayerCapabilities {
        &self.model.capabilities
    }

    fn subscribe(&self) -> Result<broadcast::Receiver<PlayerEvent>> {
        Ok(self.event_tx.subscribe())
    }

    fn source_list(&self) -> Vec<String> {
        self.sources.names().iter().map(|s| s.to_string()).collect()
    }

    async fn refresh(&self) -> Result<()> {
        let reply = self.exchange(&commands::cmd_read_power()).await?;
        let power = match reply.payload().map(commands::parse_power_reply) {
            Some(Ok(power)) => power,
            Some(Err(e)) => {
                warn!(error = %e, "Unusable power reply, keeping previous state");
                return Ok(());
            }
            None => {
                debug!("No power state, keeping previous state");
                return Ok(());
            }
        };

        {
            let mut state = self.state.lock().await;
            if state.power != power {
                state.power = power;
                self.emit(PlayerEvent::PowerChanged { state: power });
            }
        }

        // Source and mute are only meaningful while the amplifier is on.
        let mut source = None;
        let mut muted = None;
        if power == PowerState::On {
            if let Some(code) = self
                .exchange(&commands::cmd_read_source())
                .await?
                .into_payload()
            {
                let name = self.sources.name_for_reply(&code);
                if name.is_none() {
                    warn!(reply = %code, "Unknown source code");
                }
                source = Some(name.map(str::to_string));
            }

            if let Some(payload) = self.exchange(&commands::cmd_read_mute()).await?.into_payload() {
                match commands::parse_mute_reply(&payload) {
                    Ok(m) => muted = Some(m),
                    Err(e) => warn!(error = %e, "Unusable mute reply"),
                }
            }
        }

        let mut state = self.state.lock().await;
        if let Some(source) = source {
            if state.source != source {
                state.source = source.clone();
                self.emit(PlayerEvent::SourceChanged { source });
            }
        }
        if let Some(muted) = muted {
            if state.muted != muted {
                state.muted = muted;
                self.emit(PlayerEvent::MuteChanged { muted });
            }
        }

        debug!(
            power = %state.power,
            muted = state.muted,
            source = ?state.source,
            "State refreshed"
        );
        Ok(())
    }

    async fn state(&self) -> PlayerState {
        PlayerState::from(&*self.state.lock().await)
    }

    async fn volume_level(&self) -> Result<Option<f32>> {
        let Some(payload) = self
            .exchange(&commands::cmd_read_volume())
            .await?
            .into_payload()
        else {
            return Ok(None);
        };

        let decibel = commands::parse_volume_reply(&payload)?;
        let range = self.volume_range;
        let clamped = decibel.clamp(range.min_db, range.max_db);
        if clamped != decibel {
            debug!(decibel, range = %range, "Volume outside configured range, clamping");
        }
        let level = range.volume_to_normalized(clamped)?;

        let mut state = self.state.lock().await;
        if state.volume_level != Some(level) {
            state.volume_level = Some(level);
            self.emit(PlayerEvent::VolumeChanged { level });
        }
        Ok(Some(level))
    }

    async fn turn_on(&self) -> Result<()> {
        self.execute_set_command(&commands::cmd_set_power(true))
            .await
    }

    async fn turn_off(&self) -> Result<()> {
        self.execute_set_command(&commands::cmd_set_power(false))
            .await
    }

    async fn set_mute(&self, muted: bool) -> Result<()> {
        self.execute_set_command(&commands::cmd_set_mute(muted))
            .await
    }

    async fn set_volume_level(&self, level: f32) -> Result<()> {
        let decibel = self.volume_range.normalized_to_volume(level)?;
        debug!(level, decibel, "Setting volume");
        self.execute_set_command(&commands::cmd_set_volume(decibel))
            .await
    }

    async fn volume_up(&self) -> Result<()> {
        self.execute_set_command(&commands::cmd_volume_up()).await
    }

    async fn volume_down(&self) -> Result<()> {
        self.execute_set_command(&commands::cmd_volume_down())
            .await
    }

    async fn select_source(&self, source: &str) -> Result<()> {
        let code = self.sources.select_code(source)?;
        self.execute_set_command(&commands::cmd_select_source(code))
            .await
    }
}
