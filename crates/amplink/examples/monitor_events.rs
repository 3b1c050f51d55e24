//! Monitor amplifier state changes.
//!
//! Polls the amplifier every two seconds for a minute and prints each
//! [`PlayerEvent`] a poll produces. Change the input or mute from the front
//! panel or the remote to see events.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p amplink --example monitor_events -- /dev/ttyUSB0
//! ```

use std::time::Duration;

use amplink::cambridge::{CambridgeBuilder, cxr200};
use amplink::{MediaPlayer, PlayerEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let serial_port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    let amp = CambridgeBuilder::new(cxr200())
        .serial_port(&serial_port)
        .initial_refresh(false)
        .build()
        .await?;

    let mut events = amp.subscribe()?;
    println!("Monitoring {} for 60 seconds...\n", amp.info().name);

    let start = tokio::time::Instant::now();
    let mut interval = tokio::time::interval(Duration::from_secs(2));

    while start.elapsed() < Duration::from_secs(60) {
        interval.tick().await;

        if let Err(e) = amp.refresh().await {
            eprintln!("refresh failed: {e}");
            continue;
        }
        if let Err(e) = amp.volume_level().await {
            eprintln!("volume query failed: {e}");
        }

        while let Ok(event) = events.try_recv() {
            let elapsed = start.elapsed();
            let timestamp = format!("{:>4}.{:03}s", elapsed.as_secs(), elapsed.subsec_millis());
            match event {
                PlayerEvent::PowerChanged { state } => println!("{timestamp} power {state}"),
                PlayerEvent::MuteChanged { muted } => println!("{timestamp} muted {muted}"),
                PlayerEvent::SourceChanged { source } => {
                    println!("{timestamp} source {}", source.as_deref().unwrap_or("unknown"))
                }
                PlayerEvent::VolumeChanged { level } => {
                    println!("{timestamp} volume {:.0}%", level * 100.0)
                }
            }
        }
    }

    Ok(())
}
