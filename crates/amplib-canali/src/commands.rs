//! Request payload builders and response payload decoders.
//!
//! All functions are pure -- they produce or consume byte slices without
//! performing any I/O. The exchange layer sends the bytes and feeds reply
//! payloads back into the decoders here.
//!
//! Firmware responses vary in length between models and revisions, so the
//! response decoders are tolerant: a short buffer yields a partial result
//! with absent (`None`) fields instead of an error. The one exception is
//! the fixed-size INFO block, where a wrong length is reported explicitly.

use amplib_core::{db_from_centidb, DeviceIdentity, Error, Result};

/// Length of the fixed INFO response payload.
pub const INFO_PAYLOAD_LEN: usize = 128;

/// Width of each identity string field inside the INFO payload.
const INFO_FIELD_LEN: usize = 32;

// ---------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------

/// Mode byte of a STANDBY request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandbyMode {
    /// Read the current state without changing it.
    Read,
    /// Switch the amplifier into standby (audio off).
    EnterStandby,
    /// Wake the amplifier into the operative state.
    ExitStandby,
}

impl StandbyMode {
    /// The wire code for this mode.
    pub fn code(self) -> u8 {
        match self {
            StandbyMode::Read => 0,
            StandbyMode::EnterStandby => 1,
            StandbyMode::ExitStandby => 2,
        }
    }
}

/// Build the 4-byte STANDBY request payload: `[mode, 0, 0, 0]`.
pub fn standby_payload(mode: StandbyMode) -> [u8; 4] {
    [mode.code(), 0x00, 0x00, 0x00]
}

/// Build the 4-byte WRITEOUTMUTE request payload:
/// `[channel, mute, 0, 0]` with 1 = mute, 0 = unmute.
pub fn write_out_mute_payload(channel: u8, mute: bool) -> [u8; 4] {
    [channel, u8::from(mute), 0x00, 0x00]
}

// ---------------------------------------------------------------
// STANDBY response
// ---------------------------------------------------------------

/// Decoded STANDBY response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandbyReply {
    /// Whether the device acknowledged the request (first payload byte).
    pub ok: bool,
    /// `Some(true)` operative, `Some(false)` standby, `None` when the
    /// raw code is unknown or the payload was too short.
    pub power: Option<bool>,
    /// The raw on/off code as reported, for diagnostics.
    pub raw_code: Option<u8>,
}

/// Decode a STANDBY response payload.
///
/// Expects at least 2 bytes: ack flag, then the on/off code. Code 2 means
/// the device is operative, code 1 means standby; anything else leaves the
/// power flag absent. An unacknowledged reply (`ok == false`) still
/// decodes, but callers should treat it with suspicion.
pub fn parse_standby(data: &[u8]) -> StandbyReply {
    if data.len() < 2 {
        return StandbyReply {
            ok: false,
            power: None,
            raw_code: None,
        };
    }
    let raw = data[1];
    StandbyReply {
        ok: data[0] == 1,
        power: match raw {
            2 => Some(true),
            1 => Some(false),
            _ => None,
        },
        raw_code: Some(raw),
    }
}

// ---------------------------------------------------------------
// READGM response
// ---------------------------------------------------------------

/// Gain and mute state of one channel, as far as the reply covered it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelGainMute {
    /// Input gain in dB.
    pub in_gain_db: Option<f32>,
    /// Output gain in dB.
    pub out_gain_db: Option<f32>,
    /// Input mute flag.
    pub in_mute: Option<bool>,
    /// Output mute flag.
    pub out_mute: Option<bool>,
}

/// Decoded READGM response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GainMuteReply {
    /// Whether the device acknowledged the read.
    pub ok: bool,
    /// Channel count the firmware claimed to report.
    pub reported_channels: u8,
    /// Decoded channels, at most `min(reported, max_channels)` entries.
    pub channels: Vec<ChannelGainMute>,
}

/// Decode a READGM response payload.
///
/// Layout: ack flag, reported channel count N, then four arrays
/// back-to-back, each fully consumed before the next starts:
/// N × i16 LE input gains (centi-dB), N × i16 LE output gains (centi-dB),
/// N × u8 input mutes, N × u8 output mutes.
///
/// At most `max_channels` channels are kept. If the buffer runs out
/// mid-array, decoding stops there: fields already decoded stay valid and
/// the rest remain absent.
pub fn parse_gain_mute(data: &[u8], max_channels: usize) -> GainMuteReply {
    let mut reply = GainMuteReply::default();
    if data.len() < 2 {
        return reply;
    }
    reply.ok = data[0] == 1;
    reply.reported_channels = data[1];

    let n = usize::from(data[1]);
    let keep = n.min(max_channels);
    reply.channels = vec![ChannelGainMute::default(); keep];

    let mut off = 2;

    for i in 0..n {
        if off + 2 > data.len() {
            return reply;
        }
        let raw = i16::from_le_bytes([data[off], data[off + 1]]);
        off += 2;
        if i < keep {
            reply.channels[i].in_gain_db = Some(db_from_centidb(raw));
        }
    }
    for i in 0..n {
        if off + 2 > data.len() {
            return reply;
        }
        let raw = i16::from_le_bytes([data[off], data[off + 1]]);
        off += 2;
        if i < keep {
            reply.channels[i].out_gain_db = Some(db_from_centidb(raw));
        }
    }
    for i in 0..n {
        if off >= data.len() {
            return reply;
        }
        let raw = data[off];
        off += 1;
        if i < keep {
            reply.channels[i].in_mute = Some(raw == 1);
        }
    }
    for i in 0..n {
        if off >= data.len() {
            return reply;
        }
        let raw = data[off];
        off += 1;
        if i < keep {
            reply.channels[i].out_mute = Some(raw == 1);
        }
    }

    reply
}

// ---------------------------------------------------------------
// WRITEOUTMUTE response
// ---------------------------------------------------------------

/// Decoded WRITEOUTMUTE acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuteAck {
    /// Whether the device acknowledged the write.
    pub ok: bool,
    /// The channel the write applied to.
    pub channel: u8,
    /// The mute state after the write.
    pub muted: bool,
}

/// Decode a WRITEOUTMUTE response payload: `[ack, channel, mute, ...]`.
///
/// Returns `None` when the payload is shorter than the 3 required bytes.
pub fn parse_mute_ack(data: &[u8]) -> Option<MuteAck> {
    if data.len() < 3 {
        return None;
    }
    Some(MuteAck {
        ok: data[0] == 1,
        channel: data[1],
        muted: data[2] == 1,
    })
}

// ---------------------------------------------------------------
// INFO response
// ---------------------------------------------------------------

/// Decode the fixed 128-byte INFO response payload.
///
/// Four consecutive 32-byte fields: manufacturer, family, model, serial.
/// Each is ASCII up to the first NUL (or the full 32 bytes when no NUL is
/// present), with surrounding whitespace trimmed.
///
/// # Errors
///
/// [`Error::UnexpectedLength`] when the payload is shorter than 128
/// bytes -- the INFO block is fixed-size, so a short one is malformed
/// rather than partial. Extra trailing bytes are ignored.
pub fn parse_info(data: &[u8]) -> Result<DeviceIdentity> {
    if data.len() < INFO_PAYLOAD_LEN {
        return Err(Error::UnexpectedLength {
            expected: INFO_PAYLOAD_LEN,
            got: data.len(),
        });
    }

    let field = |index: usize| -> String {
        let start = index * INFO_FIELD_LEN;
        let raw = &data[start..start + INFO_FIELD_LEN];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..end]).trim().to_string()
    };

    Ok(DeviceIdentity {
        manufacturer: field(0),
        family: field(1),
        model: field(2),
        serial: field(3),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------------------------------------------------------------
    // Request payloads
    // ---------------------------------------------------------------

    #[test]
    fn standby_payload_modes() {
        assert_eq!(standby_payload(StandbyMode::Read), [0, 0, 0, 0]);
        assert_eq!(standby_payload(StandbyMode::EnterStandby), [1, 0, 0, 0]);
        assert_eq!(standby_payload(StandbyMode::ExitStandby), [2, 0, 0, 0]);
    }

    #[test]
    fn write_out_mute_payload_layout() {
        assert_eq!(write_out_mute_payload(0, true), [0, 1, 0, 0]);
        assert_eq!(write_out_mute_payload(3, false), [3, 0, 0, 0]);
    }

    // ---------------------------------------------------------------
    // STANDBY
    // ---------------------------------------------------------------

    #[test]
    fn standby_operative() {
        let reply = parse_standby(&[1, 2, 0, 0]);
        assert!(reply.ok);
        assert_eq!(reply.power, Some(true));
        assert_eq!(reply.raw_code, Some(2));
    }

    #[test]
    fn standby_in_standby() {
        let reply = parse_standby(&[1, 1, 0, 0]);
        assert!(reply.ok);
        assert_eq!(reply.power, Some(false));
    }

    #[test]
    fn standby_unknown_code() {
        let reply = parse_standby(&[1, 7, 0, 0]);
        assert!(reply.ok);
        assert_eq!(reply.power, None);
        assert_eq!(reply.raw_code, Some(7));
    }

    #[test]
    fn standby_unacknowledged_still_decodes() {
        let reply = parse_standby(&[0, 2, 0, 0]);
        assert!(!reply.ok);
        assert_eq!(reply.power, Some(true));
    }

    #[test]
    fn standby_short_payload() {
        let reply = parse_standby(&[1]);
        assert!(!reply.ok);
        assert_eq!(reply.power, None);
        assert_eq!(reply.raw_code, None);
    }

    // ---------------------------------------------------------------
    // READGM
    // ---------------------------------------------------------------

    #[test]
    fn gain_mute_two_channels() {
        // ack=1, n=2, in gains 100/-10 cdB, out gains 50/0 cdB,
        // in mutes [1,0], out mutes [0,1].
        let data = [
            1, 2, 0x64, 0x00, 0xF6, 0xFF, 0x32, 0x00, 0x00, 0x00, 1, 0, 0, 1,
        ];
        let reply = parse_gain_mute(&data, 4);

        assert!(reply.ok);
        assert_eq!(reply.reported_channels, 2);
        assert_eq!(reply.channels.len(), 2);

        let ch0 = reply.channels[0];
        assert_eq!(ch0.in_gain_db, Some(1.0));
        assert_eq!(ch0.out_gain_db, Some(0.5));
        assert_eq!(ch0.in_mute, Some(true));
        assert_eq!(ch0.out_mute, Some(false));

        let ch1 = reply.channels[1];
        assert_eq!(ch1.in_gain_db, Some(-0.1));
        assert_eq!(ch1.out_gain_db, Some(0.0));
        assert_eq!(ch1.in_mute, Some(false));
        assert_eq!(ch1.out_mute, Some(true));
    }

    #[test]
    fn gain_mute_caps_at_max_channels() {
        let data = [
            1, 2, 0x64, 0x00, 0xF6, 0xFF, 0x32, 0x00, 0x00, 0x00, 1, 0, 0, 1,
        ];
        let reply = parse_gain_mute(&data, 1);

        assert_eq!(reply.channels.len(), 1);
        // Channel 0 still decodes from the correct (aligned) offsets even
        // though channel 1's entries are skipped rather than kept.
        assert_eq!(reply.channels[0].in_gain_db, Some(1.0));
        assert_eq!(reply.channels[0].out_gain_db, Some(0.5));
        assert_eq!(reply.channels[0].out_mute, Some(false));
    }

    #[test]
    fn gain_mute_exhausted_mid_array_keeps_decoded_fields() {
        // Buffer ends after the input-gain array: gains for both channels
        // are present, everything after is absent.
        let data = [1, 2, 0x64, 0x00, 0xF6, 0xFF];
        let reply = parse_gain_mute(&data, 4);

        assert!(reply.ok);
        assert_eq!(reply.channels.len(), 2);
        assert_eq!(reply.channels[0].in_gain_db, Some(1.0));
        assert_eq!(reply.channels[1].in_gain_db, Some(-0.1));
        assert_eq!(reply.channels[0].out_gain_db, None);
        assert_eq!(reply.channels[0].in_mute, None);
        assert_eq!(reply.channels[1].out_mute, None);
    }

    #[test]
    fn gain_mute_cut_inside_an_entry() {
        // One byte of the second input gain is missing; only the first
        // channel's input gain survives.
        let data = [1, 2, 0x64, 0x00, 0xF6];
        let reply = parse_gain_mute(&data, 4);

        assert_eq!(reply.channels[0].in_gain_db, Some(1.0));
        assert_eq!(reply.channels[1].in_gain_db, None);
    }

    #[test]
    fn gain_mute_empty_and_header_only() {
        assert!(!parse_gain_mute(&[], 4).ok);
        assert!(parse_gain_mute(&[], 4).channels.is_empty());

        let reply = parse_gain_mute(&[1, 3], 4);
        assert!(reply.ok);
        assert_eq!(reply.channels.len(), 3);
        assert_eq!(reply.channels[0], ChannelGainMute::default());
    }

    #[test]
    fn gain_mute_zero_channels() {
        let reply = parse_gain_mute(&[1, 0], 4);
        assert!(reply.ok);
        assert!(reply.channels.is_empty());
    }

    #[test]
    fn gain_mute_nack() {
        let data = [0, 1, 0x00, 0x00, 0x00, 0x00, 0, 0];
        let reply = parse_gain_mute(&data, 4);
        assert!(!reply.ok);
        // Fields still decode; the caller decides what a NACK means.
        assert_eq!(reply.channels.len(), 1);
        assert_eq!(reply.channels[0].in_gain_db, Some(0.0));
    }

    // ---------------------------------------------------------------
    // WRITEOUTMUTE
    // ---------------------------------------------------------------

    #[test]
    fn mute_ack_decodes() {
        let ack = parse_mute_ack(&[1, 2, 1, 0]).unwrap();
        assert!(ack.ok);
        assert_eq!(ack.channel, 2);
        assert!(ack.muted);
    }

    #[test]
    fn mute_ack_unmute() {
        let ack = parse_mute_ack(&[1, 0, 0, 0]).unwrap();
        assert!(ack.ok);
        assert_eq!(ack.channel, 0);
        assert!(!ack.muted);
    }

    #[test]
    fn mute_ack_too_short() {
        assert!(parse_mute_ack(&[1, 2]).is_none());
        assert!(parse_mute_ack(&[]).is_none());
    }

    // ---------------------------------------------------------------
    // INFO
    // ---------------------------------------------------------------

    fn info_payload(
        manufacturer: &str,
        family: &str,
        model: &str,
        serial: &str,
    ) -> Vec<u8> {
        let mut data = vec![0u8; INFO_PAYLOAD_LEN];
        for (i, s) in [manufacturer, family, model, serial].iter().enumerate() {
            let bytes = s.as_bytes();
            data[i * 32..i * 32 + bytes.len()].copy_from_slice(bytes);
        }
        data
    }

    #[test]
    fn info_decodes_fields() {
        let data = info_payload("Powersoft", "Canali DSP", "Quattrocanali 4804", "QC123456");
        let identity = parse_info(&data).unwrap();
        assert_eq!(identity.manufacturer, "Powersoft");
        assert_eq!(identity.family, "Canali DSP");
        assert_eq!(identity.model, "Quattrocanali 4804");
        assert_eq!(identity.serial, "QC123456");
    }

    #[test]
    fn info_trims_whitespace() {
        let data = info_payload(" Powersoft ", "Canali", "Duecanali", "S1");
        let identity = parse_info(&data).unwrap();
        assert_eq!(identity.manufacturer, "Powersoft");
    }

    #[test]
    fn info_field_without_nul_uses_all_32_bytes() {
        let full = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"; // exactly 32 bytes
        let data = info_payload(full, "", "", "");
        let identity = parse_info(&data).unwrap();
        assert_eq!(identity.manufacturer, full);
        assert_eq!(identity.family, "");
    }

    #[test]
    fn info_short_payload_is_an_error() {
        let result = parse_info(&[0u8; 64]);
        assert!(matches!(
            result,
            Err(Error::UnexpectedLength {
                expected: 128,
                got: 64
            })
        ));
    }

    #[test]
    fn info_extra_bytes_ignored() {
        let mut data = info_payload("Powersoft", "Canali", "Ottocanali", "S2");
        data.extend_from_slice(&[0xAB; 16]);
        let identity = parse_info(&data).unwrap();
        assert_eq!(identity.model, "Ottocanali");
    }
}
