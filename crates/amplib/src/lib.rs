//! # amplib -- Power Amplifier Control over UDP
//!
//! `amplib` is an asynchronous Rust library for monitoring and commanding
//! Powersoft Canali-DSP power amplifiers (Duecanali, Quattrocanali,
//! Ottocanali) over their binary UDP protocol. It is designed for
//! control-surface integrations and venue monitoring where a poll cycle
//! must never hang and a half-dead amplifier must degrade gracefully to
//! "unknown" rather than crash the controller.
//!
//! ## Quick Start
//!
//! Add `amplib` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! amplib = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Poll an amplifier's status:
//!
//! ```no_run
//! use amplib::canali::CanaliBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let amp = CanaliBuilder::new("192.168.100.8")
//!         .max_channels(4)
//!         .build()
//!         .await?;
//!
//!     let status = amp.poll_status().await;
//!     println!("power: {:?}, fault: {:?}", status.power, status.fault);
//!     for (i, ch) in status.channels.iter().enumerate() {
//!         println!("  CH{}: mute {:?}, gain {:?} dB", i + 1, ch.mute, ch.gain_db);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                 | Purpose                                      |
//! |-----------------------|----------------------------------------------|
//! | `amplib-core`         | Status types, errors, gain helpers           |
//! | `amplib-transport`    | UDP datagram transport                       |
//! | `amplib-canali`       | Canali-DSP frame codec, CRC, exchange, client|
//! | `amplib-test-harness` | Mock UDP amplifier for protocol tests        |
//! | **`amplib`**          | This facade crate -- re-exports everything   |
//!
//! ## Status polling model
//!
//! [`poll_status`](canali::CanaliAmp::poll_status) issues three
//! independent reads (standby, gains/mutes, alarms) and merges them into
//! one [`AmpStatus`]. Every field is optional: a timed-out or malformed
//! sub-read leaves its fields absent instead of failing the poll, so the
//! worst case is a snapshot of `None`s that the caller shows as
//! stale/unknown.

pub use amplib_core::*;

/// Canali-DSP binary UDP protocol backend.
///
/// Provides [`CanaliAmp`](canali::CanaliAmp) and
/// [`CanaliBuilder`](canali::CanaliBuilder) for amplifier monitoring and
/// control, plus [`probe`](canali::probe) for broadcast discovery.
pub mod canali {
    pub use amplib_canali::*;
}

/// Datagram transport layer.
///
/// Most applications never touch this directly -- the protocol driver
/// binds its own sockets -- but it is exposed for diagnostic tooling.
pub mod transport {
    pub use amplib_transport::*;
}
