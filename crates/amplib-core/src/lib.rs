//! amplib-core: Core types, errors, and helpers for amplib.
//!
//! This crate defines the protocol-agnostic pieces that the rest of the
//! workspace builds on. Control surfaces and polling layers depend on these
//! types without pulling in the UDP driver itself.
//!
//! # Key types
//!
//! - [`AmpStatus`] -- one read-only amplifier status snapshot
//! - [`DeviceIdentity`] -- identity strings from the INFO command
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod helpers;
pub mod status;

// Re-export key types at crate root for ergonomic `use amplib_core::*`.
pub use error::{Error, Result};
pub use helpers::{centidb_from_db, db_from_centidb, format_gain_db};
pub use status::{AmpStatus, ChannelStatus, DeviceIdentity};
