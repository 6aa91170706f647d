//! amplib-canali: Powersoft Canali-DSP binary UDP protocol driver.
//!
//! Implements the amplifiers' "second API": a fixed-envelope binary frame
//! per UDP datagram, CRC-16 protected, correlated by a cookie echoed in
//! the reply and a complemented command byte. The driver is layered the
//! same way the protocol is:
//!
//! - [`crc`] -- the CRC-16/IBM checksum engine
//! - [`frame`] -- frame encoding/decoding and the per-command checksum
//!   policy table
//! - [`commands`] / [`alarms`] -- pure payload builders and decoders
//! - [`exchange`] -- one request/response exchange with timeout and
//!   cookie correlation
//! - [`amp`] / [`builder`] -- the high-level [`CanaliAmp`] client and its
//!   aggregated status poll
//! - [`probe`] -- broadcast discovery of amplifiers on the local segment
//!
//! # Quick start
//!
//! ```no_run
//! use amplib_canali::builder::CanaliBuilder;
//!
//! # async fn example() -> amplib_core::Result<()> {
//! let amp = CanaliBuilder::new("192.168.100.8").max_channels(4).build().await?;
//!
//! let status = amp.poll_status().await;
//! if let Some(power) = status.power {
//!     println!("amplifier is {}", if power { "operative" } else { "in standby" });
//! }
//! # Ok(())
//! # }
//! ```

pub mod alarms;
pub mod amp;
pub mod builder;
pub mod commands;
pub mod crc;
pub mod exchange;
pub mod frame;
pub mod probe;

pub use alarms::{describe_channel_alarms, describe_global_alarms, AlarmReport, LegacyAlarmReport};
pub use amp::{
    poll_status, CanaliAmp, DEFAULT_DEVICE_PORT, DEFAULT_MAX_CHANNELS, DEFAULT_TIMEOUT,
};
pub use builder::CanaliBuilder;
pub use commands::{
    ChannelGainMute, GainMuteReply, MuteAck, StandbyMode, StandbyReply,
};
pub use frame::{ChecksumPolicy, Command, Frame};
pub use probe::{ProbeReply, MAX_PROBE_REPLIES};
