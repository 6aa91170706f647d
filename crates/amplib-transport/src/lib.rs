//! amplib-transport: Datagram transport for amplib.
//!
//! The Canali-DSP second API is a connectionless request/response protocol:
//! every exchange is one datagram out and (hopefully) one datagram back.
//! [`UdpTransport`] wraps a [`tokio::net::UdpSocket`] with the timeout and
//! error-mapping conventions used throughout amplib.

pub mod udp;

pub use udp::UdpTransport;
