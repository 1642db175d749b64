//! Sentence framing, validation, and dispatch

use heapless::Vec;
use stelvio_core::{ByteSink, Framer, FramerConfig, FramerError};

use crate::fields::{
    checksum, hex_digit, parse_coordinate, parse_f32_or_zero, parse_u8_or_zero, parse_utc_date,
    parse_utc_time, KNOTS_TO_KMH,
};
use crate::fix::GpsFix;

/// Maximum NMEA sentence length, `$` through the checksum digits.
pub const NMEA_MAX_SENTENCE_LEN: usize = 82;

/// Most comma-separated fields a supported sentence can carry.
const NMEA_MAX_FIELDS: usize = 20;

/// Framing rules for NMEA sentences.
pub const NMEA_GRAMMAR: FramerConfig = FramerConfig {
    start: Some(b'$'),
    terminator: b'\n',
    printable_only: false,
};

/// Reasons a sentence was dropped. All are recoverable; framing resumes
/// at the next `$`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NmeaError {
    /// Sentence exceeded [`NMEA_MAX_SENTENCE_LEN`] before its terminator
    Overflow,
    /// No `*XX` checksum suffix
    MissingChecksum,
    /// Checksum digits disagree with the body
    ChecksumMismatch,
    /// Recognized sentence type with too few fields
    TooFewFields,
    /// More fields than any supported sentence carries
    TooManyFields,
    /// A value field failed to parse
    BadField,
}

impl From<FramerError> for NmeaError {
    fn from(err: FramerError) -> Self {
        match err {
            FramerError::Overflow => NmeaError::Overflow,
        }
    }
}

/// Incremental NMEA decoder maintaining a single [`GpsFix`] record.
#[derive(Debug, Clone)]
pub struct NmeaDecoder {
    framer: Framer<NMEA_MAX_SENTENCE_LEN>,
    fix: GpsFix,
    updated: bool,
    /// Verdict of the most recent RMC sentence; GGA only decides overall
    /// validity when RMC has not (or was void)
    rmc_active: bool,
}

impl NmeaDecoder {
    pub fn new() -> Self {
        Self {
            framer: Framer::new(NMEA_GRAMMAR),
            fix: GpsFix::default(),
            updated: false,
            rmc_active: false,
        }
    }

    /// Feed one received byte, in arrival order.
    ///
    /// Errors mean the in-progress or just-terminated sentence was
    /// dropped; the record is untouched and the next sentence parses
    /// normally.
    pub fn process_byte(&mut self, byte: u8) -> Result<(), NmeaError> {
        match self.framer.feed(byte)? {
            Some(sentence) => self.handle_sentence(&sentence),
            None => Ok(()),
        }
    }

    /// Whether a sentence has updated the record since the last
    /// [`take_fix`](Self::take_fix).
    pub const fn fix_available(&self) -> bool {
        self.updated
    }

    /// Copy out the latest record and clear the updated flag. A second
    /// sentence arriving before retrieval overwrites the first.
    pub fn take_fix(&mut self) -> Option<GpsFix> {
        if !self.updated {
            return None;
        }
        self.updated = false;
        Some(self.fix)
    }

    /// Snapshot of the record regardless of the updated flag.
    pub const fn fix(&self) -> &GpsFix {
        &self.fix
    }

    /// Convenience: speed over ground, or 0.0 without a valid fix.
    pub fn speed_kmh(&self) -> f32 {
        if self.fix.fix_valid {
            self.fix.speed_kmh
        } else {
            0.0
        }
    }

    fn handle_sentence(&mut self, sentence: &[u8]) -> Result<(), NmeaError> {
        let body = verified_body(sentence)?;
        let body = core::str::from_utf8(body).map_err(|_| NmeaError::BadField)?;

        let mut fields: Vec<&str, NMEA_MAX_FIELDS> = Vec::new();
        for field in body.split(',') {
            fields.push(field).map_err(|_| NmeaError::TooManyFields)?;
        }

        match fields[0] {
            "GPRMC" | "GNRMC" => self.apply_rmc(&fields),
            "GPGGA" | "GNGGA" => self.apply_gga(&fields),
            // Checksum-valid sentence of a type we don't track
            _ => Ok(()),
        }
    }

    /// RMC: recommended minimum - time, validity, position, speed,
    /// course, date.
    fn apply_rmc(&mut self, fields: &[&str]) -> Result<(), NmeaError> {
        if fields.len() < 12 {
            return Err(NmeaError::TooFewFields);
        }

        // Parse everything before committing anything: a bad field must
        // leave the record exactly as it was.
        let time = parse_utc_time(fields[1])?;
        let active = fields[2] == "A";
        let latitude = parse_coordinate(fields[3], fields[4], 'N', 'S')?;
        let longitude = parse_coordinate(fields[5], fields[6], 'E', 'W')?;
        let speed_knots = parse_f32_or_zero(fields[7])?;
        let course_deg = parse_f32_or_zero(fields[8])?;
        let date = parse_utc_date(fields[9])?;

        self.fix.time = time;
        self.fix.date = date;
        self.fix.latitude = latitude;
        self.fix.longitude = longitude;
        self.fix.speed_knots = speed_knots;
        self.fix.speed_kmh = speed_knots * KNOTS_TO_KMH;
        self.fix.course_deg = course_deg;
        self.fix.fix_valid = active;
        self.fix.seen_rmc = true;
        self.rmc_active = active;
        self.updated = true;
        Ok(())
    }

    /// GGA: fix quality, satellite count, altitude.
    fn apply_gga(&mut self, fields: &[&str]) -> Result<(), NmeaError> {
        if fields.len() < 10 {
            return Err(NmeaError::TooFewFields);
        }

        let fix_quality = parse_u8_or_zero(fields[6])?;
        let satellites = parse_u8_or_zero(fields[7])?;
        let altitude_msl = parse_f32_or_zero(fields[9])?;

        self.fix.fix_quality = fix_quality;
        self.fix.satellites = satellites;
        self.fix.altitude_msl = altitude_msl;
        // RMC's verdict wins while it stands; GGA decides only when RMC
        // is silent or void
        if !self.fix.seen_rmc || !self.rmc_active {
            self.fix.fix_valid = fix_quality > 0;
        }
        self.fix.seen_gga = true;
        self.updated = true;
        Ok(())
    }
}

impl Default for NmeaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSink for NmeaDecoder {
    fn accept(&mut self, byte: u8) -> bool {
        self.process_byte(byte).is_ok()
    }
}

/// Validate the `*XX` suffix and return the body between `$` and `*`.
fn verified_body(sentence: &[u8]) -> Result<&[u8], NmeaError> {
    if sentence.first() != Some(&b'$') {
        return Err(NmeaError::MissingChecksum);
    }
    let star = sentence
        .iter()
        .rposition(|&b| b == b'*')
        .ok_or(NmeaError::MissingChecksum)?;
    // Exactly two hex digits after the star
    if sentence.len() != star + 3 {
        return Err(NmeaError::MissingChecksum);
    }
    let high = hex_digit(sentence[star + 1]).ok_or(NmeaError::MissingChecksum)?;
    let low = hex_digit(sentence[star + 2]).ok_or(NmeaError::MissingChecksum)?;

    let body = &sentence[1..star];
    if checksum(body) != (high << 4) | low {
        return Err(NmeaError::ChecksumMismatch);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RMC_VALID: &[u8] =
        b"$GPRMC,123456.00,A,4042.768,N,07400.360,W,5.0,90.0,050525,,,A*7D\r\n";
    const GGA_VALID: &[u8] =
        b"$GPGGA,123456.00,4042.768,N,07400.360,W,1,08,0.9,10.2,M,,M,,*58\r\n";

    fn feed(decoder: &mut NmeaDecoder, bytes: &[u8]) -> Result<(), NmeaError> {
        let mut result = Ok(());
        for &b in bytes {
            if let Err(e) = decoder.process_byte(b) {
                result = Err(e);
            }
        }
        result
    }

    #[test]
    fn valid_rmc_produces_fix() {
        let mut decoder = NmeaDecoder::new();
        assert!(!decoder.fix_available());

        feed(&mut decoder, RMC_VALID).unwrap();
        assert!(decoder.fix_available());

        let fix = decoder.take_fix().expect("fix after RMC");
        assert!(fix.fix_valid);
        assert!((fix.latitude - 40.7128).abs() < 0.0005);
        assert!((fix.longitude + 74.006).abs() < 0.0005);
        assert_eq!(fix.speed_knots, 5.0);
        assert!((fix.speed_kmh - 9.26).abs() < 0.001);
        assert_eq!(fix.course_deg, 90.0);
        assert_eq!((fix.time.hour, fix.time.minute, fix.time.second), (12, 34, 56));
        assert_eq!((fix.date.day, fix.date.month, fix.date.year), (5, 5, 2025));
        assert!(fix.seen_rmc);
        assert!(!fix.seen_gga);

        // Read-and-clear: no second record until the next sentence
        assert!(!decoder.fix_available());
        assert_eq!(decoder.take_fix(), None);
    }

    #[test]
    fn corrupted_checksum_drops_sentence() {
        let mut decoder = NmeaDecoder::new();
        let mut corrupted = RMC_VALID.to_vec();
        // Flip one checksum hex digit: 7D -> 7C
        let star = corrupted.iter().position(|&b| b == b'*').unwrap();
        corrupted[star + 2] = b'C';

        assert_eq!(feed(&mut decoder, &corrupted), Err(NmeaError::ChecksumMismatch));
        assert!(!decoder.fix_available());
        assert!(!decoder.fix().fix_valid);
    }

    #[test]
    fn lowercase_checksum_digits_accepted() {
        let mut decoder = NmeaDecoder::new();
        let lower =
            b"$GPRMC,123456.00,A,4042.768,N,07400.360,W,5.0,90.0,050525,,,A*7d\r\n";
        feed(&mut decoder, lower).unwrap();
        assert!(decoder.fix_available());
    }

    #[test]
    fn lf_only_termination_accepted() {
        let mut decoder = NmeaDecoder::new();
        let lf_only =
            b"$GPRMC,123456.00,A,4042.768,N,07400.360,W,5.0,90.0,050525,,,A*7D\n";
        feed(&mut decoder, lf_only).unwrap();
        assert!(decoder.fix_available());
    }

    #[test]
    fn short_rmc_dropped_despite_valid_checksum() {
        let mut decoder = NmeaDecoder::new();
        assert_eq!(
            feed(&mut decoder, b"$GPRMC,1,2,3*57\r\n"),
            Err(NmeaError::TooFewFields)
        );
        assert!(!decoder.fix_available());
    }

    #[test]
    fn missing_checksum_dropped() {
        let mut decoder = NmeaDecoder::new();
        assert_eq!(
            feed(&mut decoder, b"$GPRMC,123456.00,A\r\n"),
            Err(NmeaError::MissingChecksum)
        );
        assert!(!decoder.fix_available());
    }

    #[test]
    fn gga_fills_quality_satellites_altitude() {
        let mut decoder = NmeaDecoder::new();
        feed(&mut decoder, GGA_VALID).unwrap();

        let fix = decoder.take_fix().expect("fix after GGA");
        assert_eq!(fix.fix_quality, 1);
        assert_eq!(fix.satellites, 8);
        assert!((fix.altitude_msl - 10.2).abs() < 0.001);
        assert!(fix.seen_gga);
        // No RMC yet: validity derives from quality
        assert!(fix.fix_valid);
    }

    #[test]
    fn gga_validity_fallback_only_without_active_rmc() {
        let mut decoder = NmeaDecoder::new();

        // Active RMC takes precedence: a quality-0 GGA cannot void it
        feed(&mut decoder, RMC_VALID).unwrap();
        feed(&mut decoder, b"$GPGGA,123456.00,,,,,0,00,,,M,,M,,*4F\r\n").unwrap();
        assert!(decoder.fix().fix_valid);

        // A void RMC hands the verdict back to GGA
        feed(&mut decoder, b"$GPRMC,123456.00,V,,,,,,,050525,,,N*7D\r\n").unwrap();
        assert!(!decoder.fix().fix_valid);
        feed(&mut decoder, GGA_VALID).unwrap();
        assert!(decoder.fix().fix_valid);
    }

    #[test]
    fn void_rmc_with_empty_fields_still_updates() {
        let mut decoder = NmeaDecoder::new();
        feed(&mut decoder, b"$GPRMC,123456.00,V,,,,,,,050525,,,N*7D\r\n").unwrap();

        let fix = decoder.take_fix().expect("void RMC still updates");
        assert!(!fix.fix_valid);
        assert_eq!(fix.latitude, 0.0);
        assert_eq!(fix.speed_knots, 0.0);
        assert_eq!(decoder.speed_kmh(), 0.0);
    }

    #[test]
    fn unrecognized_tag_accepted_without_update() {
        let mut decoder = NmeaDecoder::new();
        feed(&mut decoder, b"$GPVTG,90.0,T,,M,5.0,N,9.3,K,A*3B\r\n").unwrap();
        assert!(!decoder.fix_available());
    }

    #[test]
    fn gn_talker_accepted() {
        let mut decoder = NmeaDecoder::new();
        feed(
            &mut decoder,
            b"$GNRMC,081836.00,A,3751.650,S,14507.360,E,0.0,360.0,130625,,,A*5E\r\n",
        )
        .unwrap();
        let fix = decoder.take_fix().unwrap();
        assert!(fix.fix_valid);
        assert!(fix.latitude < 0.0);
        assert!(fix.longitude > 0.0);
    }

    #[test]
    fn garbage_field_drops_sentence_and_preserves_record() {
        let mut decoder = NmeaDecoder::new();
        feed(&mut decoder, RMC_VALID).unwrap();
        let before = *decoder.fix();
        decoder.take_fix();

        // Same sentence with the speed field replaced by garbage
        let body = b"GPRMC,123456.00,A,4042.768,N,07400.360,W,5.x,90.0,050525,,,A";
        let mut line = std::vec::Vec::new();
        line.push(b'$');
        line.extend_from_slice(body);
        line.extend_from_slice(format!("*{:02X}\r\n", checksum(body)).as_bytes());

        assert_eq!(feed(&mut decoder, &line), Err(NmeaError::BadField));
        assert!(!decoder.fix_available());
        assert_eq!(*decoder.fix(), before);
    }

    #[test]
    fn oversized_sentence_discarded_then_next_parses() {
        let mut decoder = NmeaDecoder::new();

        let mut stream = std::vec::Vec::new();
        stream.push(b'$');
        stream.extend_from_slice(&[b'A'; 120]);
        assert_eq!(feed(&mut decoder, &stream), Err(NmeaError::Overflow));
        assert!(!decoder.fix_available());

        feed(&mut decoder, RMC_VALID).unwrap();
        assert!(decoder.take_fix().unwrap().fix_valid);
    }

    #[test]
    fn noise_between_sentences_ignored() {
        let mut decoder = NmeaDecoder::new();
        feed(&mut decoder, b"\x00\xffgarbage\r\n").unwrap();
        feed(&mut decoder, RMC_VALID).unwrap();
        assert!(decoder.fix_available());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Arbitrary byte streams never panic and never set the
            // updated flag without a checksum-valid sentence
            #[test]
            fn arbitrary_streams_are_safe(data in proptest::collection::vec(any::<u8>(), 0..512)) {
                let mut decoder = NmeaDecoder::new();
                for b in data {
                    let _ = decoder.process_byte(b);
                }
            }

            // A valid sentence parses regardless of surrounding noise
            #[test]
            fn valid_sentence_survives_noise(
                prefix in proptest::collection::vec(any::<u8>(), 0..64),
            ) {
                let mut decoder = NmeaDecoder::new();
                for b in prefix {
                    let _ = decoder.process_byte(b);
                }
                // Terminate whatever the noise started
                let _ = decoder.process_byte(b'\n');
                for &b in RMC_VALID {
                    let _ = decoder.process_byte(b);
                }
                prop_assert!(decoder.fix_available());
            }
        }
    }
}
