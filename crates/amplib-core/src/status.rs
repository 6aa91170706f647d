//! Read-only amplifier status types.
//!
//! [`AmpStatus`] is the snapshot produced by one status poll. Every field
//! that depends on a device reply is an `Option`: `None` means the
//! corresponding read failed or the firmware omitted the field, which is
//! deliberately distinguishable from a `false`/zero value. Consumers (a
//! polling loop, a control-surface UI) must not conflate the two.

/// Per-channel status within an [`AmpStatus`] snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelStatus {
    /// Whether the channel is muted. `None` when the gain/mute read failed
    /// or did not cover this channel.
    pub mute: Option<bool>,
    /// Channel gain in dB. `None` when unavailable.
    pub gain_db: Option<f32>,
}

/// One complete amplifier status snapshot.
///
/// Produced fresh on every poll; absent fields are never filled in from a
/// previous snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct AmpStatus {
    /// `Some(true)` when the amplifier reported itself operative,
    /// `Some(false)` when in standby, `None` when the standby read failed.
    pub power: Option<bool>,
    /// `Some(true)` when any alarm bit (global or per-channel) is set,
    /// `Some(false)` when the alarm read succeeded with all bits clear,
    /// `None` when the alarm read failed.
    pub fault: Option<bool>,
    /// Per-channel status, always exactly as long as the configured
    /// channel count.
    pub channels: Vec<ChannelStatus>,
}

impl AmpStatus {
    /// Create an empty snapshot with `channel_count` all-absent channels.
    pub fn empty(channel_count: usize) -> Self {
        AmpStatus {
            power: None,
            fault: None,
            channels: vec![ChannelStatus::default(); channel_count],
        }
    }

    /// Returns `true` if every field in the snapshot is absent.
    ///
    /// The polling layer uses this to surface a stale/unknown status
    /// instead of a sequence of meaningless `None`s.
    pub fn is_empty(&self) -> bool {
        self.power.is_none()
            && self.fault.is_none()
            && self
                .channels
                .iter()
                .all(|ch| ch.mute.is_none() && ch.gain_db.is_none())
    }
}

/// Identity strings reported by the amplifier's INFO command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Manufacturer name (e.g. "Powersoft").
    pub manufacturer: String,
    /// Product family (e.g. "Canali DSP").
    pub family: String,
    /// Model name (e.g. "Quattrocanali 4804").
    pub model: String,
    /// Device serial number.
    pub serial: String,
}
