//! Status polling example.
//!
//! Reads one aggregated status snapshot from an amplifier and prints it
//! the way a control surface would consume it: every field may be absent,
//! and absent means "unknown", not "off".
//!
//! # Usage
//!
//! ```sh
//! cargo run -p amplib --example poll_status -- 192.168.100.8
//! ```

use amplib::canali::CanaliBuilder;
use amplib::format_gain_db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "192.168.100.8".to_string());

    println!("Polling amplifier at {host}...\n");

    let amp = CanaliBuilder::new(&host).max_channels(4).build().await?;

    // Identity first; a timeout here usually means the host/port is wrong.
    match amp.read_info().await {
        Ok(identity) => {
            println!(
                "{} {} {} (S/N: {})",
                identity.manufacturer, identity.family, identity.model, identity.serial
            );
        }
        Err(e) => println!("Identity unavailable: {e}"),
    }

    let status = amp.poll_status().await;

    match status.power {
        Some(true) => println!("Power: operative"),
        Some(false) => println!("Power: standby"),
        None => println!("Power: unknown"),
    }
    match status.fault {
        Some(true) => println!("Fault: ALARM ACTIVE"),
        Some(false) => println!("Fault: none"),
        None => println!("Fault: unknown"),
    }

    for (i, ch) in status.channels.iter().enumerate() {
        let mute = match ch.mute {
            Some(true) => "MUTE",
            Some(false) => "unmuted",
            None => "mute unknown",
        };
        let gain = match ch.gain_db {
            Some(db) => format_gain_db(db),
            None => "gain unknown".to_string(),
        };
        println!("  CH{}: {mute}, {gain}", i + 1);
    }

    Ok(())
}
