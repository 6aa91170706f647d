//! High-level Canali-DSP amplifier client.
//!
//! [`CanaliAmp`] wraps the exchange layer with typed operations for every
//! protocol command, plus [`poll_status`](CanaliAmp::poll_status), the
//! aggregated read that control surfaces call once per poll cycle.
//!
//! The client holds configuration only -- no socket, no cached state. Every
//! operation is a self-contained exchange on its own ephemeral socket, and
//! every poll produces a fresh snapshot.

use std::net::SocketAddr;
use std::time::Duration;

use tracing::debug;

use amplib_core::{AmpStatus, DeviceIdentity, Error, Result};

use crate::alarms::{parse_alarms2, parse_alarms_legacy, AlarmReport, LegacyAlarmReport};
use crate::commands::{
    parse_gain_mute, parse_info, parse_mute_ack, parse_standby, standby_payload,
    write_out_mute_payload, GainMuteReply, MuteAck, StandbyMode, StandbyReply,
};
use crate::exchange::{request, ExchangeConfig};
use crate::frame::{ChecksumPolicy, Command};

/// UDP port Canali-DSP amplifiers listen on.
pub const DEFAULT_DEVICE_PORT: u16 = 1234;

/// Default reply deadline for one exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(800);

/// Default channel count (Quattrocanali). Duecanali owners configure 2,
/// Ottocanali owners 8.
pub const DEFAULT_MAX_CHANNELS: usize = 4;

/// Resolved client configuration, produced by the builder.
#[derive(Debug, Clone)]
pub(crate) struct AmpConfig {
    pub device_addr: SocketAddr,
    pub max_channels: usize,
    pub timeout: Duration,
    pub answer_port_zero: bool,
    pub standby_computed_crc: bool,
    pub verify_checksums: bool,
}

/// Client for one Canali-DSP amplifier.
///
/// Construct via [`CanaliBuilder`](crate::builder::CanaliBuilder). The
/// client is cheap to clone and safe to share; operations never hold
/// state between calls.
#[derive(Debug, Clone)]
pub struct CanaliAmp {
    config: AmpConfig,
}

impl CanaliAmp {
    pub(crate) fn new(config: AmpConfig) -> Self {
        CanaliAmp { config }
    }

    /// The device address this client talks to.
    pub fn device_addr(&self) -> SocketAddr {
        self.config.device_addr
    }

    /// The configured channel count.
    pub fn max_channels(&self) -> usize {
        self.config.max_channels
    }

    fn exchange_config(&self) -> ExchangeConfig {
        ExchangeConfig {
            device_addr: self.config.device_addr,
            timeout: self.config.timeout,
            answer_port_zero: self.config.answer_port_zero,
            verify_checksums: self.config.verify_checksums,
        }
    }

    /// Checksum policy for STANDBY requests, honoring the firmware-quirk
    /// override.
    fn standby_policy(&self) -> ChecksumPolicy {
        if self.config.standby_computed_crc {
            ChecksumPolicy::Computed
        } else {
            Command::Standby.checksum_policy()
        }
    }

    /// Liveness check: send PING and wait for the echo reply.
    pub async fn ping(&self) -> Result<()> {
        request(
            &self.exchange_config(),
            Command::Ping,
            &[],
            Command::Ping.checksum_policy(),
        )
        .await?;
        Ok(())
    }

    /// Read the standby state without changing it.
    pub async fn read_power(&self) -> Result<StandbyReply> {
        let frame = request(
            &self.exchange_config(),
            Command::Standby,
            &standby_payload(StandbyMode::Read),
            self.standby_policy(),
        )
        .await?;
        Ok(parse_standby(&frame.payload))
    }

    /// Switch the amplifier between operative and standby.
    ///
    /// `on == true` wakes the device, `on == false` puts it into standby.
    /// Returns the state the firmware reports after the switch.
    pub async fn set_power(&self, on: bool) -> Result<StandbyReply> {
        let mode = if on {
            StandbyMode::ExitStandby
        } else {
            StandbyMode::EnterStandby
        };
        let frame = request(
            &self.exchange_config(),
            Command::Standby,
            &standby_payload(mode),
            self.standby_policy(),
        )
        .await?;
        Ok(parse_standby(&frame.payload))
    }

    /// Read per-channel gains and mutes.
    pub async fn read_gain_mute(&self) -> Result<GainMuteReply> {
        let frame = request(
            &self.exchange_config(),
            Command::ReadGainMute,
            &[],
            Command::ReadGainMute.checksum_policy(),
        )
        .await?;
        Ok(parse_gain_mute(&frame.payload, self.config.max_channels))
    }

    /// Read the full alarm bitmap set.
    pub async fn read_alarms(&self) -> Result<AlarmReport> {
        let frame = request(
            &self.exchange_config(),
            Command::ReadAllAlarms2,
            &[],
            Command::ReadAllAlarms2.checksum_policy(),
        )
        .await?;
        Ok(parse_alarms2(&frame.payload))
    }

    /// Read the deprecated single-byte alarm bitmap.
    ///
    /// Kept for firmware that predates the full alarm read; only the raw
    /// bitmap is exposed.
    pub async fn read_alarms_legacy(&self) -> Result<LegacyAlarmReport> {
        let frame = request(
            &self.exchange_config(),
            Command::ReadAllAlarms,
            &[],
            Command::ReadAllAlarms.checksum_policy(),
        )
        .await?;
        Ok(parse_alarms_legacy(&frame.payload))
    }

    /// Read the device identity block.
    pub async fn read_info(&self) -> Result<DeviceIdentity> {
        let frame = request(
            &self.exchange_config(),
            Command::Info,
            &[],
            Command::Info.checksum_policy(),
        )
        .await?;
        parse_info(&frame.payload)
    }

    /// Mute or unmute one output channel.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] when `channel` is outside the
    /// configured channel count; [`Error::UnexpectedLength`] when the
    /// acknowledgement payload is malformed.
    pub async fn set_out_mute(&self, channel: u8, mute: bool) -> Result<MuteAck> {
        if usize::from(channel) >= self.config.max_channels {
            return Err(Error::InvalidParameter(format!(
                "channel {channel} out of range, device has {} channels",
                self.config.max_channels
            )));
        }

        let frame = request(
            &self.exchange_config(),
            Command::WriteOutMute,
            &write_out_mute_payload(channel, mute),
            Command::WriteOutMute.checksum_policy(),
        )
        .await?;

        parse_mute_ack(&frame.payload).ok_or(Error::UnexpectedLength {
            expected: 3,
            got: frame.payload.len(),
        })
    }

    /// Read one aggregated status snapshot.
    ///
    /// Issues three independent reads -- standby, gains/mutes, alarms --
    /// each with its own deadline. A failure on any one read leaves the
    /// corresponding snapshot fields absent without aborting the others,
    /// so this never fails as a whole: the worst outcome is an all-absent
    /// snapshot the caller surfaces as unknown/stale.
    ///
    /// Merge rules: power only from an acknowledged standby reply;
    /// per-channel mute prefers the output mute, falling back to input;
    /// gain prefers output over input; fault only from an acknowledged
    /// alarm reply.
    pub async fn poll_status(&self) -> AmpStatus {
        let mut status = AmpStatus::empty(self.config.max_channels);

        match self.read_power().await {
            Ok(reply) if reply.ok => status.power = reply.power,
            Ok(reply) => debug!(raw_code = ?reply.raw_code, "standby read not acknowledged"),
            Err(e) => debug!(error = %e, "standby read failed"),
        }

        match self.read_gain_mute().await {
            Ok(reply) if reply.ok => {
                for (slot, decoded) in status.channels.iter_mut().zip(&reply.channels) {
                    slot.mute = decoded.out_mute.or(decoded.in_mute);
                    slot.gain_db = decoded.out_gain_db.or(decoded.in_gain_db);
                }
            }
            Ok(_) => debug!("gain/mute read not acknowledged"),
            Err(e) => debug!(error = %e, "gain/mute read failed"),
        }

        match self.read_alarms().await {
            Ok(report) if report.ok => status.fault = report.fault(),
            Ok(_) => debug!("alarm read not acknowledged"),
            Err(e) => debug!(error = %e, "alarm read failed"),
        }

        status
    }
}

/// One-shot convenience: resolve `host`, poll once, return the snapshot.
///
/// This is the single entry point an external polling loop needs -- one
/// call per poll cycle, no client to keep around. Name resolution or
/// client-setup failures are the only errors; the poll itself degrades to
/// absent fields instead of failing.
pub async fn poll_status(
    host: &str,
    device_port: u16,
    max_channels: usize,
    answer_port_zero: bool,
    timeout: Duration,
) -> Result<AmpStatus> {
    let amp = crate::builder::CanaliBuilder::new(host)
        .device_port(device_port)
        .max_channels(max_channels)
        .answer_port_zero(answer_port_zero)
        .timeout(timeout)
        .build()
        .await?;
    Ok(amp.poll_status().await)
}
