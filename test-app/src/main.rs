// amplink test application -- CLI tool for exercising the Cambridge Audio
// backend against a real amplifier or a scripted mock transport.
//
// Usage:
//   amplink-test-app --port /dev/ttyUSB0 status
//   amplink-test-app --config living-room.toml volume set 0.35
//   amplink-test-app --port /dev/ttyUSB0 source set Spotify
//   amplink-test-app --port /dev/ttyUSB0 raw '#1,05'
//   amplink-test-app --port /dev/ttyUSB0 monitor --interval 2 --duration 60
//   amplink-test-app --mock status
//   amplink-test-app list

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use amplink::cambridge::commands;
use amplink::cambridge::protocol::encode_command;
use amplink::cambridge::{AmplifierConfig, CambridgeAmp, CambridgeModel, Reply, cxr200};
use amplink::{MediaPlayer, PlayerEvent, VolumeRange};
use amplink_test_harness::MockTransport;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// amplink test application -- controls a Cambridge Audio amplifier from the
/// command line.
#[derive(Parser)]
#[command(name = "amplink-test-app", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3). Overrides the config file.
    #[arg(long)]
    port: Option<String>,

    /// TOML file with amplifier settings (serial_port, name, timeout,
    /// write_timeout, min_volume, max_volume).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use a scripted mock transport instead of a real serial port.
    #[arg(long)]
    mock: bool,

    /// Device name.
    #[arg(long)]
    name: Option<String>,

    /// Decibels at volume level 0.0.
    #[arg(long, allow_negative_numbers = true)]
    min_db: Option<i32>,

    /// Decibels at volume level 1.0.
    #[arg(long, allow_negative_numbers = true)]
    max_db: Option<i32>,

    /// Reply timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print amplifier info and capabilities.
    Info,

    /// List supported models. Does not open a port.
    List,

    /// Poll and print power, mute, source and volume.
    Status,

    /// Power on or standby.
    Power {
        #[command(subcommand)]
        action: OnOff,
    },

    /// Mute on or off.
    Mute {
        #[command(subcommand)]
        action: OnOff,
    },

    /// Volume operations.
    Volume {
        #[command(subcommand)]
        action: VolumeAction,
    },

    /// Input source operations.
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },

    /// Send a raw command and print the classified reply.
    Raw {
        /// Command mnemonic (e.g. '#1,05').
        mnemonic: String,
        /// Optional parameter, appended after a comma.
        #[arg(allow_hyphen_values = true)]
        param: Option<String>,
    },

    /// Poll on an interval and print state change events.
    Monitor {
        /// Seconds between polls.
        #[arg(long, default_value_t = 2)]
        interval: u64,

        /// Duration in seconds (0 = run until Ctrl-C).
        #[arg(long, default_value_t = 0)]
        duration: u64,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum OnOff {
    On,
    Off,
}

impl OnOff {
    fn is_on(self) -> bool {
        matches!(self, OnOff::On)
    }
}

#[derive(Subcommand)]
enum VolumeAction {
    /// Read the current volume level.
    Get,
    /// Set the volume level (0.0 to 1.0).
    Set { level: f32 },
    /// One step up.
    Up,
    /// One step down.
    Down,
}

#[derive(Subcommand)]
enum SourceAction {
    /// List selectable sources.
    List,
    /// Print the current source.
    Get,
    /// Select a source by name.
    Set { name: String },
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Merge the config file (if any) with command-line overrides.
fn load_config(cli: &Cli) -> Result<AmplifierConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            AmplifierConfig::from_toml_str(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => AmplifierConfig::new(""),
    };

    if let Some(port) = &cli.port {
        config.serial_port = port.clone();
    }
    if let Some(name) = &cli.name {
        config.name = name.clone();
    }
    if let Some(min_db) = cli.min_db {
        config.min_volume = min_db;
    }
    if let Some(max_db) = cli.max_db {
        config.max_volume = max_db;
    }
    if let Some(ms) = cli.timeout_ms {
        config.timeout = ms as f64 / 1000.0;
    }
    if cli.mock && config.serial_port.trim().is_empty() {
        config.serial_port = "mock".into();
    }

    if config.serial_port.trim().is_empty() {
        bail!("--port or --config is required when not using --mock");
    }
    config.validate().context("invalid amplifier configuration")?;
    tracing::debug!(?config, "resolved amplifier configuration");
    Ok(config)
}

async fn create_amp(cli: &Cli) -> Result<CambridgeAmp> {
    let config = load_config(cli)?;
    let port = config.serial_port.clone();
    let range = VolumeRange::new(config.min_volume, config.max_volume)?;
    let model = cxr200();
    let builder = config.into_builder(model.clone())?;

    if cli.mock {
        let mock = MockTransport::new();
        script_mock(&cli.command, &mock, &model, range)?;
        let amp = builder
            .initial_refresh(false)
            .build_with_transport(Box::new(mock))
            .await
            .context("failed to build CambridgeAmp with mock transport")?;
        println!("Connected (mock transport) -- Cambridge Audio {}", model.name);
        Ok(amp)
    } else {
        let amp = builder
            .build()
            .await
            .with_context(|| format!("failed to connect to amplifier on {port}"))?;
        println!("Connected to {port} -- Cambridge Audio {}", model.name);
        Ok(amp)
    }
}

/// Pre-load the replies a healthy CXR200 would give for `command`.
fn script_mock(
    command: &Command,
    mock: &MockTransport,
    model: &CambridgeModel,
    range: VolumeRange,
) -> Result<()> {
    let refresh = |mock: &MockTransport| {
        mock.expect(&commands::cmd_read_power(), b"#2,01,1\r");
        mock.expect(&commands::cmd_read_source(), b"#4,01,13\r");
        mock.expect(&commands::cmd_read_mute(), b"#2,03,0\r");
    };

    match command {
        Command::Info | Command::List => {}
        Command::Status => {
            refresh(mock);
            mock.expect(&commands::cmd_read_volume(), b"#6,05,-40\r");
        }
        Command::Power { action } => {
            let reply: &[u8] = if action.is_on() { b"#2,01,1\r" } else { b"#2,01,0\r" };
            mock.expect(&commands::cmd_set_power(action.is_on()), reply);
        }
        Command::Mute { action } => {
            let reply: &[u8] = if action.is_on() { b"#2,03,1\r" } else { b"#2,03,0\r" };
            mock.expect(&commands::cmd_set_mute(action.is_on()), reply);
        }
        Command::Volume { action } => match action {
            VolumeAction::Get => mock.expect(&commands::cmd_read_volume(), b"#6,05,-40\r"),
            VolumeAction::Set { level } => {
                if let Ok(db) = range.normalized_to_volume(*level) {
                    let reply = format!("#6,05,{db}\r");
                    mock.expect(&commands::cmd_set_volume(db), reply.as_bytes());
                }
            }
            VolumeAction::Up => mock.expect(&commands::cmd_volume_up(), b"#6,05,-39\r"),
            VolumeAction::Down => mock.expect(&commands::cmd_volume_down(), b"#6,05,-41\r"),
        },
        Command::Source { action } => match action {
            SourceAction::List => {}
            SourceAction::Get => refresh(mock),
            SourceAction::Set { name } => {
                if let Some(def) = model.sources.iter().find(|s| s.name == name.as_str()) {
                    let reply = format!("{}\r", def.reply_code);
                    mock.expect(&commands::cmd_select_source(def.select_code), reply.as_bytes());
                }
            }
        },
        Command::Raw { mnemonic, param } => {
            mock.expect_no_reply(&encode_command(mnemonic, param.as_deref()));
        }
        Command::Monitor { .. } => bail!("monitor needs a real amplifier; drop --mock"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_list() -> Result<()> {
    let players = amplink::supported_players();
    if players.is_empty() {
        println!("No models found.");
        return Ok(());
    }

    println!("{:<16}  {:<8}  {:>6}  Volume range", "Manufacturer", "Model", "Baud");
    println!("{:<16}  {:<8}  {:>6}  ------------", "-".repeat(16), "--------", "------");
    for p in &players {
        println!(
            "{:<16}  {:<8}  {:>6}  {}",
            p.manufacturer.to_string(),
            p.model_name,
            p.default_baud_rate,
            p.volume_range
        );
    }
    println!();
    println!("{} models total.", players.len());
    Ok(())
}

fn cmd_info(amp: &CambridgeAmp) -> Result<()> {
    let info = amp.info();
    let caps = amp.capabilities();

    println!("Amplifier Information");
    println!("  Manufacturer:   {}", info.manufacturer);
    println!("  Model:          {}", info.model_name);
    println!("  Name:           {}", info.name);
    println!("  Volume range:   {}", amp.volume_range());
    println!();
    println!("Capabilities");
    println!("  Power on/off:   {}", caps.turn_on && caps.turn_off);
    println!("  Volume set:     {}", caps.volume_set);
    println!("  Volume step:    {}", caps.volume_step);
    println!("  Mute:           {}", caps.volume_mute);
    println!("  Select source:  {}", caps.select_source);
    println!("  Sound modes:    {}", caps.select_sound_mode);
    println!("  Sources:        {}", amp.source_list().join(", "));
    Ok(())
}

async fn cmd_status(amp: &CambridgeAmp) -> Result<()> {
    amp.refresh().await.context("refresh failed")?;
    let volume = amp.volume_level().await.context("volume query failed")?;
    let state = amp.state().await;

    println!("Power:   {}", state.power);
    println!("Muted:   {}", state.muted);
    println!("Source:  {}", state.source.as_deref().unwrap_or("unknown"));
    match volume {
        Some(level) => println!("Volume:  {:.2} ({} dB)", level, level_to_db(amp, level)),
        None => println!("Volume:  unavailable"),
    }
    Ok(())
}

async fn cmd_power(amp: &CambridgeAmp, action: OnOff) -> Result<()> {
    if action.is_on() {
        amp.turn_on().await.context("power on failed")?;
        println!("Power on");
    } else {
        amp.turn_off().await.context("standby failed")?;
        println!("Standby");
    }
    Ok(())
}

async fn cmd_mute(amp: &CambridgeAmp, action: OnOff) -> Result<()> {
    amp.set_mute(action.is_on())
        .await
        .context("mute command failed")?;
    println!("Muted: {}", action.is_on());
    Ok(())
}

fn level_to_db(amp: &CambridgeAmp, level: f32) -> String {
    amp.volume_range()
        .normalized_to_volume(level)
        .map(|db| db.to_string())
        .unwrap_or_else(|_| "?".into())
}

async fn cmd_volume(amp: &CambridgeAmp, action: &VolumeAction) -> Result<()> {
    match action {
        VolumeAction::Get => match amp.volume_level().await? {
            Some(level) => println!("Volume: {:.2} ({} dB)", level, level_to_db(amp, level)),
            None => println!("Volume: unavailable"),
        },
        VolumeAction::Set { level } => {
            amp.set_volume_level(*level)
                .await
                .with_context(|| format!("failed to set volume to {level}"))?;
            println!("Volume set to {level:.2}");
        }
        VolumeAction::Up => {
            amp.volume_up().await?;
            println!("Volume stepped up");
        }
        VolumeAction::Down => {
            amp.volume_down().await?;
            println!("Volume stepped down");
        }
    }
    Ok(())
}

async fn cmd_source(amp: &CambridgeAmp, action: &SourceAction) -> Result<()> {
    match action {
        SourceAction::List => {
            for name in amp.source_list() {
                println!("{name}");
            }
        }
        SourceAction::Get => {
            amp.refresh().await?;
            match amp.source().await {
                Some(name) => println!("Source: {name}"),
                None => println!("Source: unknown"),
            }
        }
        SourceAction::Set { name } => {
            amp.select_source(name)
                .await
                .with_context(|| format!("failed to select source {name:?}"))?;
            println!("Selected {name}");
        }
    }
    Ok(())
}

async fn cmd_raw(amp: &CambridgeAmp, mnemonic: &str, param: Option<&str>) -> Result<()> {
    match amp.send_command(mnemonic, param).await? {
        Reply::Payload(p) => println!("Reply: {p}"),
        Reply::DeviceError(e) => println!("Device error {}: {e}", e.code()),
        Reply::NoReply => println!("No reply"),
    }
    Ok(())
}

async fn cmd_monitor(amp: &CambridgeAmp, interval_secs: u64, duration_secs: u64) -> Result<()> {
    if interval_secs == 0 {
        bail!("--interval must be at least 1 second");
    }
    let mut event_rx = amp.subscribe()?;
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    let deadline = (duration_secs > 0)
        .then(|| tokio::time::Instant::now() + Duration::from_secs(duration_secs));

    println!("Monitoring amplifier state (Ctrl-C to stop)...");

    loop {
        if deadline.is_some_and(|dl| tokio::time::Instant::now() >= dl) {
            println!("Monitor duration elapsed.");
            break;
        }
        ticker.tick().await;

        if let Err(e) = amp.refresh().await {
            println!("[warning] refresh failed: {e}");
            continue;
        }
        if let Err(e) = amp.volume_level().await {
            println!("[warning] volume query failed: {e}");
        }

        loop {
            match event_rx.try_recv() {
                Ok(event) => print_event(&event),
                Err(tokio::sync::broadcast::error::TryRecvError::Lagged(n)) => {
                    println!("[warning] missed {n} events (consumer too slow)");
                }
                Err(_) => break,
            }
        }
    }
    Ok(())
}

fn print_event(event: &PlayerEvent) {
    match event {
        PlayerEvent::PowerChanged { state } => println!("[event] power {state}"),
        PlayerEvent::MuteChanged { muted } => println!("[event] muted {muted}"),
        PlayerEvent::SourceChanged { source } => {
            println!("[event] source {}", source.as_deref().unwrap_or("unknown"))
        }
        PlayerEvent::VolumeChanged { level } => println!("[event] volume {level:.2}"),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // The `list` command does not require an amplifier connection.
    if matches!(cli.command, Command::List) {
        return cmd_list();
    }

    let amp = create_amp(&cli).await?;

    let result = match &cli.command {
        Command::Info => cmd_info(&amp),
        Command::Status => cmd_status(&amp).await,
        Command::Power { action } => cmd_power(&amp, *action).await,
        Command::Mute { action } => cmd_mute(&amp, *action).await,
        Command::Volume { action } => cmd_volume(&amp, action).await,
        Command::Source { action } => cmd_source(&amp, action).await,
        Command::Raw { mnemonic, param } => cmd_raw(&amp, mnemonic, param.as_deref()).await,
        Command::Monitor { interval, duration } => cmd_monitor(&amp, *interval, *duration).await,
        Command::List => unreachable!("list handled above"),
    };

    amp.close().await.ok();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_decibel_overrides_parse() {
        let cli = Cli::try_parse_from([
            "amplink-test-app",
            "--mock",
            "--min-db",
            "-80",
            "--max-db",
            "-5",
            "status",
        ])
        .unwrap();
        assert_eq!(cli.min_db, Some(-80));
        assert_eq!(cli.max_db, Some(-5));
    }

    #[test]
    fn load_config_requires_port_without_mock() {
        let cli = Cli::try_parse_from(["amplink-test-app", "status"]).unwrap();
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn load_config_applies_overrides() {
        let cli = Cli::try_parse_from([
            "amplink-test-app",
            "--port",
            "/dev/ttyS1",
            "--name",
            "Den",
            "--timeout-ms",
            "250",
            "info",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.serial_port, "/dev/ttyS1");
        assert_eq!(config.name, "Den");
        assert_eq!(config.timeout().unwrap(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn mock_status_runs_end_to_end() {
        let cli = Cli::try_parse_from(["amplink-test-app", "--mock", "status"]).unwrap();
        let amp = create_amp(&cli).await.unwrap();
        cmd_status(&amp).await.unwrap();
        assert_eq!(amp.source().await.as_deref(), Some("Spotify"));
    }

    #[tokio::test]
    async fn mock_source_set_runs_end_to_end() {
        let cli =
            Cli::try_parse_from(["amplink-test-app", "--mock", "source", "set", "FM"]).unwrap();
        let amp = create_amp(&cli).await.unwrap();
        cmd_source(&amp, &SourceAction::Set { name: "FM".into() })
            .await
            .unwrap();
    }
}
