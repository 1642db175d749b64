//! Field-level parsing helpers for NMEA sentences
//!
//! Void fixes legitimately transmit empty value fields, so the numeric
//! helpers come in a required and an empty-tolerant flavour: an empty
//! field reads as zero, non-empty garbage is an error.

use crate::decoder::NmeaError;
use crate::fix::{UtcDate, UtcTime};

/// Conversion factor for RMC speed over ground.
pub const KNOTS_TO_KMH: f32 = 1.852;

/// XOR checksum over a sentence body (the bytes between `$` and `*`).
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Parse one hex digit (either case).
pub fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

/// Parse an f32 field, treating an empty field as 0.0.
pub fn parse_f32_or_zero(field: &str) -> Result<f32, NmeaError> {
    if field.is_empty() {
        return Ok(0.0);
    }
    field.parse().map_err(|_| NmeaError::BadField)
}

/// Parse a u8 field, treating an empty field as 0.
pub fn parse_u8_or_zero(field: &str) -> Result<u8, NmeaError> {
    if field.is_empty() {
        return Ok(0);
    }
    field.parse().map_err(|_| NmeaError::BadField)
}

/// Convert a `ddmm.mmmm`/`dddmm.mmmm` coordinate plus hemisphere letter
/// into signed decimal degrees. An absent coordinate (both fields empty,
/// as in a void fix) reads as 0.0.
pub fn parse_coordinate(
    value: &str,
    hemisphere: &str,
    positive: char,
    negative: char,
) -> Result<f32, NmeaError> {
    if value.is_empty() && hemisphere.is_empty() {
        return Ok(0.0);
    }

    let raw: f32 = value.parse().map_err(|_| NmeaError::BadField)?;
    if raw < 0.0 {
        return Err(NmeaError::BadField);
    }
    // ddmm.mmmm: everything above the hundreds place is whole degrees,
    // the remainder is minutes
    let degrees = (raw / 100.0) as u32 as f32;
    let minutes = raw - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;

    let mut hemi = hemisphere.chars();
    match (hemi.next(), hemi.next()) {
        (Some(h), None) if h == positive => Ok(decimal),
        (Some(h), None) if h == negative => Ok(-decimal),
        _ => Err(NmeaError::BadField),
    }
}

/// Parse an `hhmmss[.sss]` time field. Empty reads as the zero time.
pub fn parse_utc_time(field: &str) -> Result<UtcTime, NmeaError> {
    if field.is_empty() {
        return Ok(UtcTime::default());
    }
    let bytes = field.as_bytes();
    if bytes.len() < 6 {
        return Err(NmeaError::BadField);
    }

    let hour = two_digits(&bytes[0..2])?;
    let minute = two_digits(&bytes[2..4])?;
    let second = two_digits(&bytes[4..6])?;
    if hour > 23 || minute > 59 || second > 60 {
        return Err(NmeaError::BadField);
    }

    let mut millisecond = 0u16;
    if bytes.len() > 6 {
        if bytes[6] != b'.' {
            return Err(NmeaError::BadField);
        }
        let fraction = &bytes[7..];
        if fraction.is_empty() || fraction.len() > 3 {
            return Err(NmeaError::BadField);
        }
        for &digit in fraction {
            if !digit.is_ascii_digit() {
                return Err(NmeaError::BadField);
            }
            millisecond = millisecond * 10 + (digit - b'0') as u16;
        }
        for _ in fraction.len()..3 {
            millisecond *= 10;
        }
    }

    Ok(UtcTime {
        hour,
        minute,
        second,
        millisecond,
    })
}

/// Parse a `ddmmyy` date field. Empty reads as the zero date.
pub fn parse_utc_date(field: &str) -> Result<UtcDate, NmeaError> {
    if field.is_empty() {
        return Ok(UtcDate::default());
    }
    let bytes = field.as_bytes();
    if bytes.len() != 6 {
        return Err(NmeaError::BadField);
    }

    let day = two_digits(&bytes[0..2])?;
    let month = two_digits(&bytes[2..4])?;
    let year = two_digits(&bytes[4..6])? as u16 + 2000;
    if day == 0 || day > 31 || month == 0 || month > 12 {
        return Err(NmeaError::BadField);
    }

    Ok(UtcDate { day, month, year })
}

fn two_digits(pair: &[u8]) -> Result<u8, NmeaError> {
    if pair[0].is_ascii_digit() && pair[1].is_ascii_digit() {
        Ok((pair[0] - b'0') * 10 + (pair[1] - b'0'))
    } else {
        Err(NmeaError::BadField)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_xors_body() {
        assert_eq!(checksum(b""), 0);
        assert_eq!(
            checksum(b"GPRMC,123456.00,A,4042.768,N,07400.360,W,5.0,90.0,050525,,,A"),
            0x7D
        );
    }

    #[test]
    fn coordinate_conversion_matches_known_position() {
        let lat = parse_coordinate("4042.768", "N", 'N', 'S').unwrap();
        assert!((lat - 40.7128).abs() < 0.0005);

        let lon = parse_coordinate("07400.360", "W", 'E', 'W').unwrap();
        assert!((lon + 74.006).abs() < 0.0005);
    }

    #[test]
    fn coordinate_hemisphere_sign() {
        let south = parse_coordinate("3751.650", "S", 'N', 'S').unwrap();
        assert!(south < 0.0);
        let east = parse_coordinate("14507.360", "E", 'E', 'W').unwrap();
        assert!(east > 0.0);
    }

    #[test]
    fn coordinate_empty_pair_is_origin() {
        assert_eq!(parse_coordinate("", "", 'N', 'S'), Ok(0.0));
    }

    #[test]
    fn coordinate_rejects_bad_hemisphere() {
        assert_eq!(
            parse_coordinate("4042.768", "Q", 'N', 'S'),
            Err(NmeaError::BadField)
        );
        assert_eq!(
            parse_coordinate("4042.768", "", 'N', 'S'),
            Err(NmeaError::BadField)
        );
    }

    #[test]
    fn time_with_fraction() {
        let t = parse_utc_time("123456.00").unwrap();
        assert_eq!((t.hour, t.minute, t.second, t.millisecond), (12, 34, 56, 0));

        let t = parse_utc_time("235959.999").unwrap();
        assert_eq!((t.hour, t.minute, t.second, t.millisecond), (23, 59, 59, 999));

        // Short fractions scale up
        let t = parse_utc_time("000000.5").unwrap();
        assert_eq!(t.millisecond, 500);
    }

    #[test]
    fn time_without_fraction() {
        let t = parse_utc_time("081836").unwrap();
        assert_eq!((t.hour, t.minute, t.second), (8, 18, 36));
    }

    #[test]
    fn time_rejects_garbage() {
        assert!(parse_utc_time("12345").is_err());
        assert!(parse_utc_time("1234xy").is_err());
        assert!(parse_utc_time("250000").is_err());
        assert!(parse_utc_time("123456.1234").is_err());
    }

    #[test]
    fn date_expands_century() {
        let d = parse_utc_date("050525").unwrap();
        assert_eq!((d.day, d.month, d.year), (5, 5, 2025));
    }

    #[test]
    fn date_rejects_out_of_range() {
        assert!(parse_utc_date("320125").is_err());
        assert!(parse_utc_date("011325").is_err());
        assert!(parse_utc_date("0101").is_err());
    }
}
