//! Mock amplifier for deterministic testing of the UDP protocol engine.
//!
//! [`MockAmp`] binds a loopback UDP socket and answers every incoming
//! datagram through a caller-supplied handler. The handler sees the raw
//! request bytes and returns zero or more raw reply datagrams, so tests
//! control exactly what goes back on the wire: well-formed replies, stale
//! cookies, corrupted envelopes, or nothing at all (to exercise timeouts).
//!
//! The harness is deliberately protocol-agnostic -- it never interprets the
//! bytes. Tests build and parse frames with the protocol crate's own
//! codec, which keeps the mock honest: it cannot accidentally share codec
//! bugs with the code under test.
//!
//! # Example
//!
//! ```no_run
//! use amplib_test_harness::MockAmp;
//!
//! # async fn example() {
//! // Echo every request back verbatim.
//! let mock = MockAmp::start(|datagram| vec![datagram.to_vec()]).await;
//! println!("mock amplifier listening on {}", mock.addr());
//! # }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Largest request datagram the mock accepts.
const RECV_BUF_LEN: usize = 2048;

/// A scripted UDP amplifier simulator.
///
/// Runs as a background task until dropped or shut down. Each received
/// datagram is passed to the handler; every returned buffer is sent back
/// to the requester as its own datagram, in order.
pub struct MockAmp {
    addr: SocketAddr,
    cancel: CancellationToken,
    /// Taken by [`shutdown`](Self::shutdown); `Drop` only cancels.
    task: Option<JoinHandle<()>>,
}

impl MockAmp {
    /// Bind a loopback socket and start answering with `handler`.
    ///
    /// # Panics
    ///
    /// Panics if the loopback socket cannot be bound -- acceptable in the
    /// test environments this crate is for.
    pub async fn start<F>(handler: F) -> MockAmp
    where
        F: Fn(&[u8]) -> Vec<Vec<u8>> + Send + Sync + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("bind mock amplifier socket on loopback");
        let addr = socket
            .local_addr()
            .expect("read mock amplifier socket address");

        let socket = Arc::new(socket);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(serve(socket, cancel.clone(), handler));

        debug!(%addr, "mock amplifier started");
        MockAmp {
            addr,
            cancel,
            task: Some(task),
        }
    }

    /// Start a mock that never answers. Useful for timeout tests.
    pub async fn start_silent() -> MockAmp {
        Self::start(|_| Vec::new()).await
    }

    /// The loopback address the mock is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop the responder task and wait for it to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for MockAmp {
    fn drop(&mut self) {
        // Dropping without shutdown() still stops the task; the join
        // handle is detached and the select loop exits on cancellation.
        self.cancel.cancel();
    }
}

async fn serve<F>(socket: Arc<UdpSocket>, cancel: CancellationToken, handler: F)
where
    F: Fn(&[u8]) -> Vec<Vec<u8>> + Send + Sync + 'static,
{
    let mut buf = [0u8; RECV_BUF_LEN];

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("mock amplifier cancelled");
                break;
            }

            received = socket.recv_from(&mut buf) => {
                let (n, src) = match received {
                    Ok(pair) => pair,
                    Err(e) => {
                        debug!(error = %e, "mock amplifier receive failed, exiting");
                        break;
                    }
                };

                trace!(remote = %src, bytes = n, "mock amplifier received request");
                for reply in handler(&buf[..n]) {
                    if let Err(e) = socket.send_to(&reply, src).await {
                        debug!(error = %e, "mock amplifier failed to send reply");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn client() -> UdpSocket {
        UdpSocket::bind("127.0.0.1:0").await.unwrap()
    }

    async fn recv_with_deadline(socket: &UdpSocket, buf: &mut [u8]) -> usize {
        let (n, _src) = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(buf))
            .await
            .expect("reply within deadline")
            .unwrap();
        n
    }

    #[tokio::test]
    async fn echoes_through_handler() {
        let mock = MockAmp::start(|datagram| vec![datagram.to_vec()]).await;

        let socket = client().await;
        socket.send_to(&[0xDE, 0xAD], mock.addr()).await.unwrap();

        let mut buf = [0u8; 64];
        let n = recv_with_deadline(&socket, &mut buf).await;
        assert_eq!(&buf[..n], &[0xDE, 0xAD]);

        mock.shutdown().await;
    }

    #[tokio::test]
    async fn multiple_replies_per_request() {
        let mock = MockAmp::start(|_| vec![vec![1], vec![2], vec![3]]).await;

        let socket = client().await;
        socket.send_to(&[0x00], mock.addr()).await.unwrap();

        let mut buf = [0u8; 64];
        for expected in [1u8, 2, 3] {
            let n = recv_with_deadline(&socket, &mut buf).await;
            assert_eq!(&buf[..n], &[expected]);
        }

        mock.shutdown().await;
    }

    #[tokio::test]
    async fn silent_mock_never_replies() {
        let mock = MockAmp::start_silent().await;

        let socket = client().await;
        socket.send_to(&[0x00], mock.addr()).await.unwrap();

        let mut buf = [0u8; 64];
        let result =
            tokio::time::timeout(Duration::from_millis(100), socket.recv_from(&mut buf)).await;
        assert!(result.is_err(), "silent mock must not answer");

        mock.shutdown().await;
    }

    #[tokio::test]
    async fn handler_sees_request_bytes() {
        let mock = MockAmp::start(|datagram| {
            // Reply with the request length so the test can observe what
            // the handler saw.
            vec![vec![datagram.len() as u8]]
        })
        .await;

        let socket = client().await;
        socket.send_to(&[9u8; 17], mock.addr()).await.unwrap();

        let mut buf = [0u8; 64];
        let n = recv_with_deadline(&socket, &mut buf).await;
        assert_eq!(&buf[..n], &[17]);

        mock.shutdown().await;
    }

    #[tokio::test]
    async fn serves_multiple_requests() {
        let mock = MockAmp::start(|datagram| vec![datagram.to_vec()]).await;

        let socket = client().await;
        let mut buf = [0u8; 64];

        for i in 0..5u8 {
            socket.send_to(&[i], mock.addr()).await.unwrap();
            let n = recv_with_deadline(&socket, &mut buf).await;
            assert_eq!(&buf[..n], &[i]);
        }

        mock.shutdown().await;
    }

    #[tokio::test]
    async fn drop_stops_the_task() {
        let mock = MockAmp::start(|datagram| vec![datagram.to_vec()]).await;
        let addr = mock.addr();
        drop(mock);

        // Give the task a moment to observe cancellation.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let socket = client().await;
        socket.send_to(&[0x01], addr).await.unwrap();

        let mut buf = [0u8; 64];
        let result =
            tokio::time::timeout(Duration::from_millis(100), socket.recv_from(&mut buf)).await;
        assert!(result.is_err(), "dropped mock must stop answering");
    }
}
