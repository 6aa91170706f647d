//! CanaliBuilder -- fluent builder for constructing [`CanaliAmp`] clients.
//!
//! Separates configuration from construction so that callers can set up
//! the device port, channel count, reply deadline, and the firmware-quirk
//! toggles before resolving the device address.
//!
//! # Example
//!
//! ```no_run
//! use amplib_canali::builder::CanaliBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> amplib_core::Result<()> {
//! let amp = CanaliBuilder::new("192.168.100.8")
//!     .max_channels(4)
//!     .timeout(Duration::from_millis(800))
//!     .build()
//!     .await?;
//! let status = amp.poll_status().await;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use amplib_core::error::{Error, Result};

use crate::amp::{
    AmpConfig, CanaliAmp, DEFAULT_DEVICE_PORT, DEFAULT_MAX_CHANNELS, DEFAULT_TIMEOUT,
};

/// Fluent builder for [`CanaliAmp`].
///
/// All settings have defaults matching a stock Quattrocanali on a local
/// network, so the simplest usage is:
///
/// ```ignore
/// let amp = CanaliBuilder::new("192.168.100.8").build().await?;
/// ```
pub struct CanaliBuilder {
    host: String,
    device_port: u16,
    max_channels: usize,
    timeout: Duration,
    answer_port_zero: bool,
    standby_computed_crc: bool,
    verify_checksums: bool,
}

impl CanaliBuilder {
    /// Create a new builder for the amplifier at `host` (IP address or
    /// resolvable name).
    pub fn new(host: &str) -> Self {
        CanaliBuilder {
            host: host.to_string(),
            device_port: DEFAULT_DEVICE_PORT,
            max_channels: DEFAULT_MAX_CHANNELS,
            timeout: DEFAULT_TIMEOUT,
            answer_port_zero: false,
            standby_computed_crc: false,
            verify_checksums: false,
        }
    }

    /// Override the device UDP port (default: 1234).
    pub fn device_port(mut self, port: u16) -> Self {
        self.device_port = port;
        self
    }

    /// Set the amplifier's channel count (default: 4).
    ///
    /// Status snapshots always carry exactly this many channel slots.
    pub fn max_channels(mut self, channels: usize) -> Self {
        self.max_channels = channels;
        self
    }

    /// Set the reply deadline for a single exchange (default: 800ms).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send 0 in the answer-port field instead of the bound local port
    /// (default: false).
    ///
    /// Some firmware revisions ignore the field and answer to the
    /// datagram's source port regardless; 0 is the documented "no
    /// preference" sentinel for them.
    pub fn answer_port_zero(mut self, enabled: bool) -> Self {
        self.answer_port_zero = enabled;
        self
    }

    /// Use the general computed CRC on STANDBY requests instead of the
    /// forced zero (default: false).
    ///
    /// The forced zero is what most fielded firmware expects; this toggle
    /// exists for revisions observed to want the regular checksum.
    pub fn standby_computed_crc(mut self, enabled: bool) -> Self {
        self.standby_computed_crc = enabled;
        self
    }

    /// Recompute and check the CRC of inbound frames, discarding
    /// mismatches (default: false).
    pub fn verify_checksums(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    /// Build a [`CanaliAmp`] with an already-resolved socket address.
    ///
    /// This is the primary entry point for testing (point it at a
    /// `MockAmp` from `amplib-test-harness`) and for callers that manage
    /// name resolution themselves. The host set in [`new`](Self::new) is
    /// ignored.
    pub fn build_with_addr(self, device_addr: SocketAddr) -> Result<CanaliAmp> {
        if self.max_channels == 0 {
            return Err(Error::InvalidParameter(
                "max_channels must be at least 1".into(),
            ));
        }

        Ok(CanaliAmp::new(AmpConfig {
            device_addr,
            max_channels: self.max_channels,
            timeout: self.timeout,
            answer_port_zero: self.answer_port_zero,
            standby_computed_crc: self.standby_computed_crc,
            verify_checksums: self.verify_checksums,
        }))
    }

    /// Build a [`CanaliAmp`], resolving the host name.
    ///
    /// Takes the first address the resolver returns.
    pub async fn build(self) -> Result<CanaliAmp> {
        let target = format!("{}:{}", self.host, self.device_port);
        let device_addr = tokio::net::lookup_host(&target)
            .await
            .map_err(|e| Error::Transport(format!("resolve {target}: {e}")))?
            .next()
            .ok_or_else(|| Error::Transport(format!("resolve {target}: no addresses")))?;

        self.build_with_addr(device_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let addr: SocketAddr = "127.0.0.1:1234".parse().unwrap();
        let amp = CanaliBuilder::new("127.0.0.1").build_with_addr(addr).unwrap();

        assert_eq!(amp.device_addr(), addr);
        assert_eq!(amp.max_channels(), DEFAULT_MAX_CHANNELS);
    }

    #[test]
    fn builder_fluent_chain() {
        let addr: SocketAddr = "127.0.0.1:5678".parse().unwrap();
        let amp = CanaliBuilder::new("127.0.0.1")
            .device_port(5678)
            .max_channels(8)
            .timeout(Duration::from_millis(250))
            .answer_port_zero(true)
            .standby_computed_crc(true)
            .verify_checksums(true)
            .build_with_addr(addr)
            .unwrap();

        assert_eq!(amp.max_channels(), 8);
    }

    #[test]
    fn builder_rejects_zero_channels() {
        let addr: SocketAddr = "127.0.0.1:1234".parse().unwrap();
        let result = CanaliBuilder::new("127.0.0.1")
            .max_channels(0)
            .build_with_addr(addr);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn build_resolves_literal_address() {
        let amp = CanaliBuilder::new("127.0.0.1")
            .device_port(4321)
            .build()
            .await
            .unwrap();
        assert_eq!(amp.device_addr(), "127.0.0.1:4321".parse().unwrap());
    }

    #[tokio::test]
    async fn build_rejects_unresolvable_host() {
        let result = CanaliBuilder::new("definitely-not-a-real-host.invalid")
            .build()
            .await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
