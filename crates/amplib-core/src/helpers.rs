//! Conversion and formatting helpers for amplifier gain values.
//!
//! Canali-DSP firmware reports gains as signed integers in centi-dB
//! (hundredths of a decibel). These helpers convert between the wire
//! representation and the dB values shown to users.

/// Convert a raw centi-dB integer to dB.
///
/// # Example
///
/// ```
/// use amplib_core::db_from_centidb;
///
/// assert_eq!(db_from_centidb(100), 1.0);
/// assert_eq!(db_from_centidb(-10), -0.1);
/// assert_eq!(db_from_centidb(0), 0.0);
/// ```
pub fn db_from_centidb(centidb: i16) -> f32 {
    f32::from(centidb) / 100.0
}

/// Convert a dB value to the nearest centi-dB integer, saturating at the
/// i16 range the wire format can carry.
///
/// # Example
///
/// ```
/// use amplib_core::centidb_from_db;
///
/// assert_eq!(centidb_from_db(1.0), 100);
/// assert_eq!(centidb_from_db(-0.105), -11);
/// ```
pub fn centidb_from_db(db: f32) -> i16 {
    (db * 100.0).round().clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

/// Format a gain for display, two decimal places with an explicit sign.
///
/// # Example
///
/// ```
/// use amplib_core::format_gain_db;
///
/// assert_eq!(format_gain_db(0.5), "+0.50 dB");
/// assert_eq!(format_gain_db(-6.0), "-6.00 dB");
/// ```
pub fn format_gain_db(db: f32) -> String {
    format!("{db:+.2} dB")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centidb_to_db() {
        assert_eq!(db_from_centidb(100), 1.0);
        assert_eq!(db_from_centidb(50), 0.5);
        assert_eq!(db_from_centidb(-10), -0.1);
        assert_eq!(db_from_centidb(0), 0.0);
    }

    #[test]
    fn centidb_extremes() {
        assert_eq!(db_from_centidb(i16::MAX), 327.67);
        assert_eq!(db_from_centidb(i16::MIN), -327.68);
    }

    #[test]
    fn db_to_centidb_rounds() {
        assert_eq!(centidb_from_db(0.004), 0);
        assert_eq!(centidb_from_db(0.005), 1);
        assert_eq!(centidb_from_db(-0.105), -11);
    }

    #[test]
    fn db_to_centidb_saturates() {
        assert_eq!(centidb_from_db(1000.0), i16::MAX);
        assert_eq!(centidb_from_db(-1000.0), i16::MIN);
    }

    #[test]
    fn round_trip_representable_values() {
        for raw in [-32768i16, -601, -1, 0, 1, 50, 100, 32767] {
            assert_eq!(centidb_from_db(db_from_centidb(raw)), raw);
        }
    }

    #[test]
    fn format_positive_and_negative() {
        assert_eq!(format_gain_db(0.0), "+0.00 dB");
        assert_eq!(format_gain_db(1.0), "+1.00 dB");
        assert_eq!(format_gain_db(-0.1), "-0.10 dB");
    }
}
