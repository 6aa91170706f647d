//! amplib-test-harness: Test utilities for amplib.
//!
//! This crate provides [`MockAmp`], a scripted UDP responder that stands in
//! for a real amplifier on loopback, enabling deterministic end-to-end
//! protocol tests without hardware.

pub mod mock_amp;

pub use mock_amp::MockAmp;
