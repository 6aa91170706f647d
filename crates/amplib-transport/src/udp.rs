//! UDP transport for amplifier communication.
//!
//! This module provides [`UdpTransport`], a datagram socket wrapper used by
//! the Canali-DSP protocol driver. The protocol has no connection concept:
//! each request/response exchange binds its own ephemeral socket, sends one
//! frame, and waits for one reply, so the API here is deliberately
//! datagram-shaped (`send_to`/`recv_from` with a deadline) rather than
//! stream-shaped.
//!
//! # Example
//!
//! ```no_run
//! use amplib_transport::UdpTransport;
//! use std::time::Duration;
//!
//! # async fn example() -> amplib_core::Result<()> {
//! // Bind an ephemeral port for one request/response exchange.
//! let transport = UdpTransport::ephemeral().await?;
//!
//! let device_addr = "192.168.100.8:1234".parse().unwrap();
//! transport.send_to(&[0x02, 0x00], device_addr).await?;
//!
//! let mut buf = [0u8; 1500];
//! let (n, src) = transport.recv_from(&mut buf, Duration::from_millis(800)).await?;
//! println!("{} bytes from {}", n, src);
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

use amplib_core::error::{Error, Result};

/// Datagram transport for amplifier communication.
///
/// Wraps a [`tokio::net::UdpSocket`] with error mapping consistent with the
/// rest of the library. One instance serves one request/response exchange
/// (or one broadcast probe window); the amplifier addresses its reply to
/// the source port of the request, so the bound port doubles as the
/// reply-routing key.
#[derive(Debug)]
pub struct UdpTransport {
    /// The underlying UDP socket.
    socket: UdpSocket,
    /// The local address the socket is bound to.
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Bind to a local address.
    ///
    /// Use [`ephemeral()`](Self::ephemeral) for the common per-exchange
    /// case; this variant exists for binding a well-known port (e.g. a
    /// fixed answer port that a firewall rule allows).
    pub async fn bind(addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await.map_err(|e| {
            tracing::error!(addr = %addr, error = %e, "failed to bind UDP socket");
            Error::Transport(format!("bind {addr}: {e}"))
        })?;

        let local_addr = socket
            .local_addr()
            .map_err(|e| Error::Transport(format!("local_addr: {e}")))?;

        tracing::debug!(local = %local_addr, "UDP socket bound");

        Ok(Self { socket, local_addr })
    }

    /// Bind an ephemeral port on all interfaces.
    ///
    /// The OS picks a free port; [`local_port()`](Self::local_port) reports
    /// it so the caller can put it into a frame's answer-port field.
    pub async fn ephemeral() -> Result<Self> {
        Self::bind("0.0.0.0:0").await
    }

    /// The local address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The local port this socket is bound to.
    ///
    /// This is the port the amplifier will answer to unless the request
    /// frame asks for a different one.
    pub fn local_port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Send one datagram to the given address.
    ///
    /// The whole slice goes out as a single datagram; UDP delivers it in
    /// full or not at all.
    pub async fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<()> {
        tracing::trace!(
            local = %self.local_addr,
            remote = %addr,
            bytes = data.len(),
            "sending datagram"
        );

        self.socket.send_to(data, addr).await.map_err(|e| {
            tracing::error!(remote = %addr, error = %e, "failed to send datagram");
            Error::Transport(format!("send to {addr}: {e}"))
        })?;

        Ok(())
    }

    /// Receive one datagram with a deadline. Returns `(bytes_read, source)`.
    ///
    /// The buffer should be large enough for a whole datagram; excess bytes
    /// are silently dropped (standard UDP behavior). Canali frames fit
    /// comfortably in 1500 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if nothing arrives within `timeout`.
    pub async fn recv_from(&self, buf: &mut [u8], timeout: Duration) -> Result<(usize, SocketAddr)> {
        match tokio::time::timeout(timeout, self.socket.recv_from(buf)).await {
            Ok(Ok((n, src))) => {
                tracing::trace!(
                    local = %self.local_addr,
                    remote = %src,
                    bytes = n,
                    "received datagram"
                );
                Ok((n, src))
            }
            Ok(Err(e)) => {
                tracing::error!(local = %self.local_addr, error = %e, "failed to receive datagram");
                Err(Error::Io(e))
            }
            Err(_) => {
                tracing::trace!(
                    local = %self.local_addr,
                    timeout_ms = timeout.as_millis(),
                    "timeout waiting for datagram"
                );
                Err(Error::Timeout)
            }
        }
    }

    /// Enable or disable broadcast on this socket.
    ///
    /// Must be enabled before sending to `255.255.255.255`, which the
    /// discovery probe uses to reach every amplifier on the segment.
    pub fn set_broadcast(&self, enable: bool) -> Result<()> {
        tracing::debug!(local = %self.local_addr, enable, "setting broadcast");

        self.socket
            .set_broadcast(enable)
            .map_err(|e| Error::Transport(format!("set_broadcast: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ephemeral_gets_nonzero_port() {
        let transport = UdpTransport::ephemeral().await.unwrap();
        assert_ne!(transport.local_port(), 0, "OS should assign a real port");
    }

    #[tokio::test]
    async fn bind_and_local_addr() {
        let transport = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        assert_eq!(transport.local_addr().ip(), std::net::Ipv4Addr::LOCALHOST);
    }

    #[tokio::test]
    async fn send_recv_loopback() {
        let sender = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let receiver = UdpTransport::bind("127.0.0.1:0").await.unwrap();

        let data = [0x02u8, 0x0E, 0x34, 0x12, 0x00, 0x00, 0x00, 0x00];
        sender.send_to(&data, receiver.local_addr()).await.unwrap();

        let mut buf = [0u8; 256];
        let (n, src) = receiver
            .recv_from(&mut buf, Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(&buf[..n], &data);
        assert_eq!(src, sender.local_addr());
    }

    #[tokio::test]
    async fn recv_timeout() {
        let transport = UdpTransport::bind("127.0.0.1:0").await.unwrap();

        let mut buf = [0u8; 256];
        let result = transport.recv_from(&mut buf, Duration::from_millis(50)).await;

        assert!(
            matches!(result, Err(Error::Timeout)),
            "expected Timeout, got: {:?}",
            result
        );
    }

    #[tokio::test]
    async fn distinct_ephemeral_ports() {
        // Two concurrent exchanges must not share a port, or replies
        // would cross-talk.
        let a = UdpTransport::ephemeral().await.unwrap();
        let b = UdpTransport::ephemeral().await.unwrap();
        assert_ne!(a.local_port(), b.local_port());
    }

    #[tokio::test]
    async fn set_broadcast_succeeds() {
        let transport = UdpTransport::bind("0.0.0.0:0").await.unwrap();
        transport.set_broadcast(true).unwrap();
        transport.set_broadcast(false).unwrap();
    }

    #[tokio::test]
    async fn multiple_datagrams_preserved() {
        let sender = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let receiver = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let dest = receiver.local_addr();

        let messages: &[&[u8]] = &[&[0x01], &[0x02, 0x03], &[0x04, 0x05, 0x06]];
        for msg in messages {
            sender.send_to(msg, dest).await.unwrap();
        }

        // Small delay to let all datagrams arrive.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut buf = [0u8; 256];
        for expected in messages {
            let (n, _) = receiver
                .recv_from(&mut buf, Duration::from_secs(2))
                .await
                .unwrap();
            assert_eq!(&buf[..n], *expected);
        }
    }
}
