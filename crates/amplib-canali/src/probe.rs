//! Broadcast discovery probe.
//!
//! Canali-DSP amplifiers answer PING on their device port, so broadcasting
//! one PING frame and listening for a fixed window finds every amplifier
//! on the local segment. [`probe`] performs exactly one such scoped listen
//! and returns the replies as a bounded collection -- callers get
//! everything that arrived in the window, nothing accumulates anywhere
//! else.
//!
//! # Usage
//!
//! ```no_run
//! use amplib_canali::probe;
//! use std::time::Duration;
//!
//! # async fn example() -> amplib_core::Result<()> {
//! let replies = probe::probe(Duration::from_secs(2)).await?;
//! for reply in &replies {
//!     println!("amplifier at {}", reply.source);
//! }
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use tracing::debug;

use amplib_core::Result;
use amplib_transport::UdpTransport;

use crate::amp::DEFAULT_DEVICE_PORT;
use crate::frame::{decode_frame, encode_frame, ChecksumPolicy, Command, Frame};

/// Upper bound on collected replies per probe window. Generous for any
/// real installation; keeps a misbehaving network from growing the
/// collection without limit.
pub const MAX_PROBE_REPLIES: usize = 64;

/// One amplifier's answer to a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReply {
    /// Address the reply came from. The IP identifies the amplifier.
    pub source: SocketAddr,
    /// The decoded reply frame.
    pub frame: Frame,
}

/// Broadcast a PING on the default device port and collect replies for
/// `window`.
pub async fn probe(window: Duration) -> Result<Vec<ProbeReply>> {
    probe_port(DEFAULT_DEVICE_PORT, window).await
}

/// Broadcast a PING on a specific device port and collect replies for
/// `window`.
pub async fn probe_port(device_port: u16, window: Duration) -> Result<Vec<ProbeReply>> {
    let transport = UdpTransport::ephemeral().await?;
    transport.set_broadcast(true)?;
    let target = SocketAddr::from(([255, 255, 255, 255], device_port));
    collect_replies(&transport, target, window).await
}

/// Send a PING to one specific address and collect replies for `window`.
///
/// This variant lets tests drive the probe against a mock device over
/// loopback, where broadcast delivery is not reliable.
pub async fn probe_target(target: SocketAddr, window: Duration) -> Result<Vec<ProbeReply>> {
    let transport = UdpTransport::ephemeral().await?;
    collect_replies(&transport, target, window).await
}

async fn collect_replies(
    transport: &UdpTransport,
    target: SocketAddr,
    window: Duration,
) -> Result<Vec<ProbeReply>> {
    let cookie: u16 = rand::random();
    let request = encode_frame(
        Command::Ping,
        cookie,
        transport.local_port(),
        &[],
        ChecksumPolicy::Computed,
    );

    debug!(%target, cookie, "sending probe");
    transport.send_to(&request, target).await?;

    let mut replies: Vec<ProbeReply> = Vec::new();
    let mut buf = [0u8; 2048];
    let deadline = tokio::time::Instant::now() + window;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }

        let (n, source) = match transport.recv_from(&mut buf, remaining).await {
            Ok(received) => received,
            Err(amplib_core::Error::Timeout) => break,
            Err(e) => return Err(e),
        };

        let frame = match decode_frame(&buf[..n]) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(remote = %source, error = %e, "ignoring undecodable probe reply");
                continue;
            }
        };

        if !frame.is_reply_to(Command::Ping, cookie) {
            debug!(remote = %source, "ignoring unrelated datagram during probe");
            continue;
        }

        replies.push(ProbeReply { source, frame });
        if replies.len() >= MAX_PROBE_REPLIES {
            debug!(
                cap = MAX_PROBE_REPLIES,
                "probe reply cap reached, closing window early"
            );
            break;
        }
    }

    debug!(count = replies.len(), "probe window closed");
    Ok(replies)
}
