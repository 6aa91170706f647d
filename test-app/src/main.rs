// amplib test application -- CLI tool for exercising the Canali-DSP UDP
// protocol against real amplifiers (or a mock device on loopback).
//
// Usage:
//   amplib-test-app --host 192.168.100.8 status
//   amplib-test-app --host 192.168.100.8 info
//   amplib-test-app --host 192.168.100.8 --channels 8 gains
//   amplib-test-app --host 192.168.100.8 power on
//   amplib-test-app --host 192.168.100.8 mute 0 on
//   amplib-test-app --host 192.168.100.8 alarms
//   amplib-test-app probe --window-ms 2000
//
// Frame-level diagnostics go through `tracing`; run with
// RUST_LOG=amplib_canali=debug to watch the exchanges.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use amplib::canali::{probe, CanaliAmp, CanaliBuilder};
use amplib::canali::{describe_channel_alarms, describe_global_alarms};
use amplib::format_gain_db;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// amplib test application -- exercises the amplifier UDP protocol from
/// the command line.
#[derive(Parser)]
#[command(name = "amplib-test-app", version, about)]
struct Cli {
    /// Amplifier IP address or host name.
    /// Required for all commands except `probe`.
    #[arg(long)]
    host: Option<String>,

    /// Amplifier UDP port.
    #[arg(long, default_value_t = 1234)]
    port: u16,

    /// Channel count of the amplifier (2, 4, or 8).
    #[arg(long, default_value_t = 4)]
    channels: usize,

    /// Reply deadline per exchange, in milliseconds.
    #[arg(long, default_value_t = 800)]
    timeout_ms: u64,

    /// Send 0 in the answer-port field instead of the bound local port.
    #[arg(long)]
    ap0: bool,

    /// Use the general computed CRC on STANDBY requests instead of the
    /// forced zero some firmware requires.
    #[arg(long)]
    gencrc: bool,

    /// Verify the CRC of inbound frames and discard mismatches.
    #[arg(long)]
    verify_crc: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a PING and report whether the amplifier answered.
    Ping,

    /// Print the device identity block (manufacturer, family, model,
    /// serial).
    Info,

    /// Read one aggregated status snapshot (power, fault, channels).
    Status,

    /// Read per-channel gains and mutes.
    Gains,

    /// Read the alarm bitmaps and explain every set bit.
    Alarms {
        /// Use the deprecated single-byte alarm read instead.
        #[arg(long)]
        legacy: bool,
    },

    /// Standby operations.
    Power {
        #[command(subcommand)]
        action: PowerAction,
    },

    /// Mute or unmute one output channel.
    Mute {
        /// Channel index, 0-based.
        channel: u8,

        /// Desired state: "on" mutes, "off" unmutes.
        state: String,
    },

    /// Broadcast a PING and list every amplifier that answers.
    /// Does not require --host.
    Probe {
        /// Listen window in milliseconds.
        #[arg(long, default_value_t = 2000)]
        window_ms: u64,
    },
}

#[derive(Subcommand)]
enum PowerAction {
    /// Read the current standby state.
    Read,
    /// Wake the amplifier into the operative state.
    On,
    /// Put the amplifier into standby.
    Off,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Probe is host-less; everything else needs a client.
    if let Command::Probe { window_ms } = &cli.command {
        return run_probe(cli.port, Duration::from_millis(*window_ms)).await;
    }

    let amp = build_amp(&cli).await?;

    match cli.command {
        Command::Ping => run_ping(&amp).await,
        Command::Info => run_info(&amp).await,
        Command::Status => run_status(&amp).await,
        Command::Gains => run_gains(&amp).await,
        Command::Alarms { legacy } => run_alarms(&amp, legacy).await,
        Command::Power { action } => run_power(&amp, action).await,
        Command::Mute { channel, state } => run_mute(&amp, channel, &state).await,
        Command::Probe { .. } => unreachable!("handled above"),
    }
}

async fn build_amp(cli: &Cli) -> Result<CanaliAmp> {
    let host = cli
        .host
        .as_deref()
        .context("--host is required for this command")?;

    CanaliBuilder::new(host)
        .device_port(cli.port)
        .max_channels(cli.channels)
        .timeout(Duration::from_millis(cli.timeout_ms))
        .answer_port_zero(cli.ap0)
        .standby_computed_crc(cli.gencrc)
        .verify_checksums(cli.verify_crc)
        .build()
        .await
        .context("failed to set up amplifier client")
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn run_ping(amp: &CanaliAmp) -> Result<()> {
    amp.ping().await.context("no answer to PING")?;
    println!("Amplifier at {} answered.", amp.device_addr());
    Ok(())
}

async fn run_info(amp: &CanaliAmp) -> Result<()> {
    let identity = amp.read_info().await.context("INFO read failed")?;
    println!("Manufacturer: {}", identity.manufacturer);
    println!("Family:       {}", identity.family);
    println!("Model:        {}", identity.model);
    println!("Serial:       {}", identity.serial);
    Ok(())
}

async fn run_status(amp: &CanaliAmp) -> Result<()> {
    let status = amp.poll_status().await;

    if status.is_empty() {
        println!("No field could be read -- device unreachable or wrong port.");
        return Ok(());
    }

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
            None => "unknown",
        };
        let gain = match ch.gain_db {
            Some(db) => format_gain_db(db),
            None => "unknown".to_string(),
        };
        println!("  CH{}: {mute} | {gain}", i + 1);
    }
    Ok(())
}

async fn run_gains(amp: &CanaliAmp) -> Result<()> {
    let reply = amp.read_gain_mute().await.context("READGM failed")?;

    if !reply.ok {
        println!("Warning: device did not acknowledge the read.");
    }
    println!("Device reports {} channel(s).", reply.reported_channels);

    for (i, ch) in reply.channels.iter().enumerate() {
        let fmt_gain = |g: Option<f32>| match g {
            Some(db) => format_gain_db(db),
            None => "n/a".to_string(),
        };
        let fmt_mute = |m: Option<bool>| match m {
            Some(true) => "MUTE",
            Some(false) => "unmuted",
            None => "n/a",
        };
        println!(
            "  CH{}: IN {} {} | OUT {} {}",
            i + 1,
            fmt_gain(ch.in_gain_db),
            fmt_mute(ch.in_mute),
            fmt_gain(ch.out_gain_db),
            fmt_mute(ch.out_mute),
        );
    }
    Ok(())
}

async fn run_alarms(amp: &CanaliAmp, legacy: bool) -> Result<()> {
    if legacy {
        let report = amp
            .read_alarms_legacy()
            .await
            .context("legacy alarm read failed")?;
        match report.bitmap {
            Some(bitmap) => println!("Alarm bitmap: {bitmap:#010b} (ack: {})", report.ok),
            None => println!("Reply too short to carry a bitmap."),
        }
        return Ok(());
    }

    let report = amp.read_alarms().await.context("alarm read failed")?;
    if !report.ok {
        println!("Warning: device did not acknowledge the read.");
    }

    match report.fault() {
        Some(false) => println!("No alarms."),
        None => println!("Reply too short to judge fault state."),
        Some(true) => {
            println!("ALARMS ACTIVE");
            if let Some(gpio) = report.gpio {
                if gpio != 0 {
                    println!("  GPIO bitmap: {gpio:#010b}");
                }
            }
            if let Some(global) = report.global {
                for note in describe_global_alarms(global) {
                    println!("  global: {note}");
                }
            }
            for (i, &word) in report.channels.iter().enumerate() {
                for note in describe_channel_alarms(word) {
                    println!("  CH{}: {note}", i + 1);
                }
            }
        }
    }
    Ok(())
}

async fn run_power(amp: &CanaliAmp, action: PowerAction) -> Result<()> {
    let reply = match action {
        PowerAction::Read => amp.read_power().await,
        PowerAction::On => amp.set_power(true).await,
        PowerAction::Off => amp.set_power(false).await,
    }
    .context("STANDBY exchange failed")?;

    if !reply.ok {
        println!("Warning: device did not acknowledge the request.");
    }
    match reply.power {
        Some(true) => println!("State: operative"),
        Some(false) => println!("State: standby"),
        None => println!("State: unknown (raw code {:?})", reply.raw_code),
    }
    Ok(())
}

async fn run_mute(amp: &CanaliAmp, channel: u8, state: &str) -> Result<()> {
    let mute = match state {
        "on" => true,
        "off" => false,
        other => bail!("invalid mute state '{other}', expected 'on' or 'off'"),
    };

    let ack = amp
        .set_out_mute(channel, mute)
        .await
        .context("WRITEOUTMUTE failed")?;

    if !ack.ok {
        println!("Warning: device did not acknowledge the write.");
    }
    println!(
        "CH{} output is now {}.",
        ack.channel + 1,
        if ack.muted { "MUTED" } else { "unmuted" }
    );
    Ok(())
}

async fn run_probe(port: u16, window: Duration) -> Result<()> {
    println!(
        "Broadcasting PING on port {port}, listening for {} ms...",
        window.as_millis()
    );

    let replies = probe::probe_port(port, window).await?;

    if replies.is_empty() {
        println!("No amplifiers answered.");
        return Ok(());
    }

    println!("Found {} amplifier(s):", replies.len());
    for reply in &replies {
        println!("  {}", reply.source.ip());
    }
    Ok(())
}
