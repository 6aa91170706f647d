//! Error types for amplib.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Socket-layer, frame-layer, and
//! payload-layer errors are all captured here.

/// The error type for all amplib operations.
///
/// Variants cover the failure modes of talking to a DSP amplifier over an
/// unreliable datagram transport: socket failures, malformed frames,
/// short payloads, and reply timeouts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Timed out waiting for a matching reply datagram.
    ///
    /// This typically indicates the amplifier is unreachable, powered
    /// down hard (mains off), or the device port is wrong. Recoverable:
    /// the next poll cycle simply retries.
    #[error("timeout waiting for reply")]
    Timeout,

    /// A frame failed its envelope checks: wrong start/end marker or a
    /// command-complement trailer that does not match the command byte.
    #[error("bad frame envelope: {0}")]
    BadEnvelope(String),

    /// A buffer is too short to hold the frame it declares.
    #[error("truncated frame: need {needed} bytes, got {got}")]
    Truncated {
        /// Minimum number of bytes the frame requires.
        needed: usize,
        /// Number of bytes actually available.
        got: usize,
    },

    /// A frame's checksum field does not match the recomputed CRC.
    ///
    /// Only raised when inbound checksum verification is enabled; frames
    /// from trusted local devices are accepted unverified by default.
    #[error("checksum mismatch: frame says {expected:#06X}, computed {computed:#06X}")]
    ChecksumMismatch {
        /// Checksum carried in the frame.
        expected: u16,
        /// Checksum recomputed over the frame contents.
        computed: u16,
    },

    /// A fixed-size payload had the wrong length.
    #[error("unexpected payload length: expected {expected} bytes, got {got}")]
    UnexpectedLength {
        /// Required payload size in bytes.
        expected: usize,
        /// Size actually received.
        got: usize,
    },

    /// An invalid parameter was passed to a command builder.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A socket-level error with context (bind, send, address resolution).
    #[error("transport error: {0}")]
    Transport(String),

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
