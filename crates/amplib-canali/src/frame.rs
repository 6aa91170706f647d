//! Canali-DSP frame encoder/decoder.
//!
//! The Canali-DSP second API exchanges fixed-envelope binary frames over
//! UDP, one frame per datagram. This module handles the pure byte-level
//! encoding and decoding of frames, independent of per-command payload
//! semantics.
//!
//! # Frame format
//!
//! All multi-byte integers are little-endian:
//!
//! ```text
//! 0x02 <cmd> <cookie u16> <count u16> <answer_port u16> [<data>...] <crc16 u16> <~cmd> 0x03
//! ```
//!
//! - Start marker: one `0x02` byte (STX)
//! - `cmd`: command byte; a reply carries the bitwise complement of the
//!   request command
//! - `cookie`: correlation token, echoed verbatim in the reply
//! - `count`: payload length N
//! - `answer_port`: UDP port the reply should go to; 0 means "no specific
//!   port requested" (the device answers to the datagram's source port)
//! - `data`: N payload bytes
//! - `crc16`: checksum over bytes `[0 .. 8+N)`, with per-command
//!   forced-zero quirks (see [`ChecksumPolicy`])
//! - `~cmd`: bitwise complement of `cmd`, a lightweight integrity echo
//! - End marker: one `0x03` byte (ETX)
//!
//! Total frame length is therefore `12 + N`.

use bytes::{BufMut, BytesMut};

use amplib_core::{Error, Result};

use crate::crc::crc16;

/// Start-of-frame marker (STX).
pub const STX: u8 = 0x02;

/// End-of-frame marker (ETX).
pub const ETX: u8 = 0x03;

/// Fixed header size: STX + cmd + cookie + count + answer_port.
pub const HEADER_LEN: usize = 8;

/// Fixed trailer size: crc16 + complement + ETX.
pub const TRAILER_LEN: usize = 4;

/// Smallest possible frame (empty payload).
pub const MIN_FRAME_LEN: usize = HEADER_LEN + TRAILER_LEN;

/// Commands of the Canali-DSP second API.
///
/// Only the read-only telemetry commands plus the two write commands the
/// amplifiers accept on this port. The deprecated alarm command is kept
/// because fielded firmware still answers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Liveness check / discovery (0x00). Empty payload both ways.
    Ping,
    /// Read per-channel gains and mutes (0x01).
    ReadGainMute,
    /// Write one channel's output mute (0x03).
    WriteOutMute,
    /// Read device identity strings (0x0B).
    Info,
    /// Read or switch the standby state (0x0E).
    Standby,
    /// Read the legacy single-byte alarm bitmap (0x0F, deprecated).
    ReadAllAlarms,
    /// Read the full alarm bitmap set (0x19).
    ReadAllAlarms2,
}

impl Command {
    /// The wire command code.
    pub fn code(self) -> u8 {
        match self {
            Command::Ping => 0x00,
            Command::ReadGainMute => 0x01,
            Command::WriteOutMute => 0x03,
            Command::Info => 0x0B,
            Command::Standby => 0x0E,
            Command::ReadAllAlarms => 0x0F,
            Command::ReadAllAlarms2 => 0x19,
        }
    }

    /// Look up a command by wire code.
    pub fn from_code(code: u8) -> Option<Command> {
        match code {
            0x00 => Some(Command::Ping),
            0x01 => Some(Command::ReadGainMute),
            0x03 => Some(Command::WriteOutMute),
            0x0B => Some(Command::Info),
            0x0E => Some(Command::Standby),
            0x0F => Some(Command::ReadAllAlarms),
            0x19 => Some(Command::ReadAllAlarms2),
            _ => None,
        }
    }

    /// The complement byte a reply to this command carries in its command
    /// field (and that a request carries in its trailer).
    pub fn complement(self) -> u8 {
        !self.code()
    }

    /// The default checksum policy when encoding a request for this
    /// command.
    ///
    /// STANDBY requires a zero checksum regardless of payload -- a firmware
    /// quirk documented by the vendor. Everything else gets the computed
    /// CRC. Callers with firmware that wants the general CRC on STANDBY
    /// can override with [`ChecksumPolicy::Computed`].
    pub fn checksum_policy(self) -> ChecksumPolicy {
        match self {
            Command::Standby => ChecksumPolicy::ForceZero,
            _ => ChecksumPolicy::Computed,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::Ping => "PING",
            Command::ReadGainMute => "READGM",
            Command::WriteOutMute => "WRITEOUTMUTE",
            Command::Info => "INFO",
            Command::Standby => "STANDBY",
            Command::ReadAllAlarms => "READALLALARMS",
            Command::ReadAllAlarms2 => "READALLALARMS2",
        };
        f.write_str(name)
    }
}

/// How the checksum field of an encoded frame is filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// CRC-16 over bytes `[0 .. 8+N)` when the payload is non-empty,
    /// 0 otherwise.
    Computed,
    /// Always 0, regardless of payload. Required for STANDBY requests on
    /// most firmware revisions.
    ForceZero,
    /// A caller-supplied value, emitted verbatim.
    Explicit(u16),
}

/// A decoded Canali-DSP frame.
///
/// `command` is the raw wire byte: for a request it is the command code,
/// for a reply it is the complement of the request's code. Use
/// [`is_reply_to`](Frame::is_reply_to) to correlate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw command byte.
    pub command: u8,
    /// Correlation token.
    pub cookie: u16,
    /// Requested reply port (0 = answer to the source port).
    pub answer_port: u16,
    /// Payload bytes (may be empty).
    pub payload: Vec<u8>,
    /// Checksum field as carried on the wire. Not validated by
    /// [`decode_frame`]; see [`verify_checksum`](Frame::verify_checksum).
    pub checksum: u16,
}

impl Frame {
    /// Returns `true` if this frame is the reply to a request with the
    /// given command and cookie: the command byte must be the request
    /// command's complement and the cookie must match.
    pub fn is_reply_to(&self, command: Command, cookie: u16) -> bool {
        (self.command ^ 0xFF) == command.code() && self.cookie == cookie
    }

    /// The checksum this frame should carry under the general computed
    /// policy: CRC-16 over the reconstructed header plus payload, or 0
    /// for an empty payload.
    pub fn expected_checksum(&self) -> u16 {
        if self.payload.is_empty() {
            return 0;
        }
        let mut prefix = BytesMut::with_capacity(HEADER_LEN + self.payload.len());
        prefix.put_u8(STX);
        prefix.put_u8(self.command);
        prefix.put_u16_le(self.cookie);
        prefix.put_u16_le(self.payload.len() as u16);
        prefix.put_u16_le(self.answer_port);
        prefix.put_slice(&self.payload);
        crc16(&prefix)
    }

    /// Recompute the checksum and compare it with the wire value.
    ///
    /// Decoding deliberately skips this so that callers talking to trusted
    /// local devices can accept frames unverified; anything stricter calls
    /// this afterwards. A zero wire checksum is also accepted, since
    /// several commands legitimately carry one.
    pub fn verify_checksum(&self) -> Result<()> {
        if self.checksum == 0 {
            return Ok(());
        }
        let computed = self.expected_checksum();
        if self.checksum == computed {
            Ok(())
        } else {
            Err(Error::ChecksumMismatch {
                expected: self.checksum,
                computed,
            })
        }
    }
}

/// Encode a frame ready for transmission.
///
/// Lays out the full wire format including markers and trailer. The
/// complement trailer byte is always derived from `command`; only the
/// checksum field is policy-controlled.
///
/// # Example
///
/// ```
/// use amplib_canali::frame::{encode_frame, ChecksumPolicy, Command};
///
/// // PING request: empty payload, computed checksum (0 when empty).
/// let bytes = encode_frame(Command::Ping, 0x1234, 0, &[], ChecksumPolicy::Computed);
/// assert_eq!(
///     bytes,
///     vec![0x02, 0x00, 0x34, 0x12, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x03]
/// );
/// ```
pub fn encode_frame(
    command: Command,
    cookie: u16,
    answer_port: u16,
    payload: &[u8],
    policy: ChecksumPolicy,
) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(MIN_FRAME_LEN + payload.len());
    buf.put_u8(STX);
    buf.put_u8(command.code());
    buf.put_u16_le(cookie);
    buf.put_u16_le(payload.len() as u16);
    buf.put_u16_le(answer_port);
    buf.put_slice(payload);

    let checksum = match policy {
        ChecksumPolicy::ForceZero => 0,
        ChecksumPolicy::Explicit(value) => value,
        ChecksumPolicy::Computed => {
            if payload.is_empty() {
                0
            } else {
                crc16(&buf)
            }
        }
    };

    buf.put_u16_le(checksum);
    buf.put_u8(command.complement());
    buf.put_u8(ETX);
    buf.to_vec()
}

/// Encode the frame a device sends in response to a request.
///
/// A reply carries the complement of the request command in its command
/// field (so its own trailer is the plain command code), echoes the
/// request cookie, and leaves the answer-port field at 0. Used by device
/// simulators and by tests; the amplifiers themselves compute the general
/// CRC on replies.
pub fn encode_reply_frame(command: Command, cookie: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(MIN_FRAME_LEN + payload.len());
    buf.put_u8(STX);
    buf.put_u8(command.complement());
    buf.put_u16_le(cookie);
    buf.put_u16_le(payload.len() as u16);
    buf.put_u16_le(0);
    buf.put_slice(payload);
    let checksum = if payload.is_empty() { 0 } else { crc16(&buf) };
    buf.put_u16_le(checksum);
    buf.put_u8(command.code());
    buf.put_u8(ETX);
    buf.to_vec()
}

/// Decode one frame from a received datagram.
///
/// Validates the envelope (markers, declared length, complement trailer)
/// but not the checksum -- checksum verification is the caller's choice via
/// [`Frame::verify_checksum`]. Bytes beyond the declared frame length are
/// ignored.
///
/// # Errors
///
/// - [`Error::Truncated`] if the buffer is shorter than the fixed envelope
///   or than the declared payload requires
/// - [`Error::BadEnvelope`] if a marker or the complement trailer is wrong
pub fn decode_frame(buf: &[u8]) -> Result<Frame> {
    if buf.len() < MIN_FRAME_LEN {
        return Err(Error::Truncated {
            needed: MIN_FRAME_LEN,
            got: buf.len(),
        });
    }

    let count = usize::from(u16::from_le_bytes([buf[4], buf[5]]));
    let total = MIN_FRAME_LEN + count;
    if buf.len() < total {
        return Err(Error::Truncated {
            needed: total,
            got: buf.len(),
        });
    }

    if buf[0] != STX {
        return Err(Error::BadEnvelope(format!(
            "start marker {:#04X}, expected {STX:#04X}",
            buf[0]
        )));
    }
    if buf[total - 1] != ETX {
        return Err(Error::BadEnvelope(format!(
            "end marker {:#04X}, expected {ETX:#04X}",
            buf[total - 1]
        )));
    }

    let command = buf[1];
    let complement = buf[HEADER_LEN + count + 2];
    if complement != !command {
        return Err(Error::BadEnvelope(format!(
            "complement {complement:#04X} does not match command {command:#04X}"
        )));
    }

    let cookie = u16::from_le_bytes([buf[2], buf[3]]);
    let answer_port = u16::from_le_bytes([buf[6], buf[7]]);
    let payload = buf[HEADER_LEN..HEADER_LEN + count].to_vec();
    let checksum = u16::from_le_bytes([buf[HEADER_LEN + count], buf[HEADER_LEN + count + 1]]);

    Ok(Frame {
        command,
        cookie,
        answer_port,
        payload,
        checksum,
    })
}
