//! LAN discovery example.
//!
//! Broadcasts a PING frame on the Canali-DSP device port and lists every
//! amplifier that answers within the window.
//!
//! # Requirements
//!
//! - Amplifiers on the same broadcast domain
//! - UDP port 1234 not blocked by a firewall
//!
//! # Usage
//!
//! ```sh
//! cargo run -p amplib --example discover
//! ```

use std::time::Duration;

use amplib::canali::probe;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Searching for Canali-DSP amplifiers on the LAN (2 seconds)...\n");

    let replies = probe::probe(Duration::from_secs(2)).await?;

    if replies.is_empty() {
        println!("No amplifiers answered.");
        println!("\nTroubleshooting:");
        println!("  - Verify the amplifiers are powered and on the same subnet");
        println!("  - Check that UDP port 1234 is not blocked by a firewall");
        println!("  - Some networks drop broadcast traffic; try the test app");
        println!("    with an explicit host instead");
        return Ok(());
    }

    println!("Found {} amplifier(s):\n", replies.len());
    for (i, reply) in replies.iter().enumerate() {
        println!("  [{}] {}", i + 1, reply.source.ip());
    }

    Ok(())
}
