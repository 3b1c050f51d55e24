//! Poll an amplifier and print its state.
//!
//! Opens the serial port, refreshes once, queries the volume and prints
//! everything the host would render.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p amplink --example poll_state -- /dev/ttyUSB0
//! ```

use amplink::MediaPlayer;
use amplink::cambridge::{CambridgeBuilder, cxr200};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let serial_port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    println!("Connecting to CXR200 on {serial_port}...");

    let amp = CambridgeBuilder::new(cxr200())
        .serial_port(&serial_port)
        .build()
        .await?;

    let info = amp.info();
    println!("Connected: {} {} ({})", info.manufacturer, info.model_name, info.name);

    let state = amp.state().await;
    println!("Power:  {}", state.power);
    println!("Muted:  {}", state.muted);
    println!("Source: {}", state.source.as_deref().unwrap_or("unknown"));

    match amp.volume_level().await? {
        Some(level) => println!("Volume: {:.0}%", level * 100.0),
        None => println!("Volume: unavailable"),
    }

    println!("\nSources:");
    for name in amp.source_list() {
        println!("  {name}");
    }

    Ok(())
}
