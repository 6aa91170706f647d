//! One request/response exchange over a connectionless socket.
//!
//! The Canali-DSP protocol has no session concept: a logical request is
//! one datagram out and one matching datagram back. [`request`] owns the
//! whole lifecycle of one such exchange:
//!
//! 1. bind a fresh ephemeral socket (exclusively owned by this exchange),
//! 2. generate a random correlation cookie,
//! 3. send the encoded frame,
//! 4. wait for a reply whose command byte is the complement of the sent
//!    command **and** whose cookie matches,
//! 5. give up with [`Error::Timeout`] when the deadline passes.
//!
//! Anything that arrives in between -- frames that fail to decode, replies
//! to other exchanges, stale duplicates -- is logged at debug level and
//! silently discarded; the wait continues until a real match or the
//! deadline. Because every exchange binds its own socket, callers are free
//! to run several exchanges concurrently without demultiplexing.

use std::net::SocketAddr;
use std::time::Duration;

use tracing::debug;

use amplib_core::error::{Error, Result};
use amplib_transport::UdpTransport;

use crate::frame::{decode_frame, encode_frame, ChecksumPolicy, Command, Frame};

/// Largest datagram an amplifier is expected to send. Alarm and gain
/// replies for 8-channel devices stay well below this.
const RECV_BUF_LEN: usize = 2048;

/// Settings for a single request/response exchange.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Device address (host + device port, typically port 1234).
    pub device_addr: SocketAddr,
    /// How long to wait for a matching reply.
    pub timeout: Duration,
    /// Put 0 into the answer-port field instead of our bound port.
    /// Some firmware revisions answer to the datagram source port and
    /// ignore the field entirely; 0 is the documented "no preference"
    /// sentinel.
    pub answer_port_zero: bool,
    /// Recompute and check the CRC of inbound frames, discarding
    /// mismatches. Off by default: local devices are trusted and several
    /// commands legitimately reply with a zero checksum.
    pub verify_checksums: bool,
}

/// Perform one request/response exchange and return the matching reply.
///
/// `policy` controls the request's checksum field; pass
/// [`Command::checksum_policy`] for the firmware-standard behavior.
///
/// # Errors
///
/// [`Error::Timeout`] when no matching reply arrives in time, or a
/// transport error from binding/sending.
pub async fn request(
    config: &ExchangeConfig,
    command: Command,
    payload: &[u8],
    policy: ChecksumPolicy,
) -> Result<Frame> {
    let transport = UdpTransport::ephemeral().await?;
    let cookie: u16 = rand::random();

    let answer_port = if config.answer_port_zero {
        0
    } else {
        transport.local_port()
    };

    let bytes = encode_frame(command, cookie, answer_port, payload, policy);

    debug!(
        %command,
        cookie,
        answer_port,
        remote = %config.device_addr,
        bytes = bytes.len(),
        "sending request"
    );
    transport.send_to(&bytes, config.device_addr).await?;

    let deadline = tokio::time::Instant::now() + config.timeout;
    let mut buf = [0u8; RECV_BUF_LEN];

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            debug!(%command, cookie, "no matching reply before deadline");
            return Err(Error::Timeout);
        }

        let (n, src) = match transport.recv_from(&mut buf, remaining).await {
            Ok(received) => received,
            Err(Error::Timeout) => {
                debug!(%command, cookie, "no matching reply before deadline");
                return Err(Error::Timeout);
            }
            Err(e) => return Err(e),
        };

        let frame = match decode_frame(&buf[..n]) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(remote = %src, error = %e, "discarding undecodable datagram");
                continue;
            }
        };

        if !frame.is_reply_to(command, cookie) {
            // Stale duplicate or a reply to some other exchange; keep
            // waiting for ours.
            debug!(
                remote = %src,
                reply_command = frame.command,
                reply_cookie = frame.cookie,
                expected_cookie = cookie,
                "discarding non-matching reply"
            );
            continue;
        }

        if config.verify_checksums {
            if let Err(e) = frame.verify_checksum() {
                debug!(remote = %src, error = %e, "discarding reply with bad checksum");
                continue;
            }
        }

        debug!(
            %command,
            cookie,
            payload_len = frame.payload.len(),
            "matched reply"
        );
        return Ok(frame);
    }
}
