//! Line decoding for the display side

use stelvio_core::{ByteSink, Framer, FramerConfig, FramerError};

use crate::message::{LINK_MAX_LINE, NAV_PREFIX, STATUS_PREFIX};
use crate::types::{NavUpdate, StatusUpdate};
use stelvio_core::guidance::INSTRUCTION_MAX;

/// Framing rules for telemetry lines: no start marker, newline
/// terminated, printable ASCII only.
pub const LINK_GRAMMAR: FramerConfig = FramerConfig {
    start: None,
    terminator: b'\n',
    printable_only: true,
};

/// Reasons a line was dropped. All recoverable; framing resumes at the
/// next terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Line exceeded [`LINK_MAX_LINE`] before its terminator
    Overflow,
    /// Line carried neither known prefix
    UnknownPrefix,
    /// NAV line without both required fields
    MalformedNav,
    /// STATUS line without exactly three numeric fields
    MalformedStatus,
}

impl From<FramerError> for DecodeError {
    fn from(err: FramerError) -> Self {
        match err {
            FramerError::Overflow => DecodeError::Overflow,
        }
    }
}

/// Incremental telemetry decoder maintaining one record per message type.
///
/// Records have read-and-clear semantics: a second line of the same type
/// arriving before retrieval overwrites the first. Any successfully
/// parsed line marks the link connected.
#[derive(Debug, Clone)]
pub struct LinkDecoder {
    framer: Framer<LINK_MAX_LINE>,
    nav: NavUpdate,
    nav_updated: bool,
    status: StatusUpdate,
    status_updated: bool,
    connected: bool,
}

impl LinkDecoder {
    pub fn new() -> Self {
        Self {
            framer: Framer::new(LINK_GRAMMAR),
            nav: NavUpdate::new(),
            nav_updated: false,
            status: StatusUpdate::default(),
            status_updated: false,
            connected: false,
        }
    }

    /// Feed one received byte, in arrival order.
    pub fn process_byte(&mut self, byte: u8) -> Result<(), DecodeError> {
        match self.framer.feed(byte)? {
            Some(line) => self.handle_line(&line),
            None => Ok(()),
        }
    }

    pub const fn nav_available(&self) -> bool {
        self.nav_updated
    }

    /// Copy out the latest nav record and clear its updated flag.
    pub fn take_nav(&mut self) -> Option<NavUpdate> {
        if !self.nav_updated {
            return None;
        }
        self.nav_updated = false;
        Some(self.nav.clone())
    }

    pub const fn status_available(&self) -> bool {
        self.status_updated
    }

    /// Copy out the latest status record and clear its updated flag.
    pub fn take_status(&mut self) -> Option<StatusUpdate> {
        if !self.status_updated {
            return None;
        }
        self.status_updated = false;
        Some(self.status)
    }

    /// Whether any record has ever been received.
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    fn handle_line(&mut self, line: &[u8]) -> Result<(), DecodeError> {
        // The printable filter guarantees ASCII
        let line = core::str::from_utf8(line).map_err(|_| DecodeError::UnknownPrefix)?;

        if let Some(rest) = line.strip_prefix(NAV_PREFIX) {
            self.apply_nav(rest)
        } else if let Some(rest) = line.strip_prefix(STATUS_PREFIX) {
            self.apply_status(rest)
        } else {
            Err(DecodeError::UnknownPrefix)
        }
    }

    fn apply_nav(&mut self, rest: &str) -> Result<(), DecodeError> {
        let (instruction, distance) = rest.split_once(',').ok_or(DecodeError::MalformedNav)?;
        if instruction.is_empty() || instruction.len() > INSTRUCTION_MAX {
            return Err(DecodeError::MalformedNav);
        }
        let distance_m = parse_u16(distance).ok_or(DecodeError::MalformedNav)?;

        self.nav.instruction.clear();
        let _ = self.nav.instruction.push_str(instruction);
        self.nav.distance_m = distance_m;
        self.nav_updated = true;
        self.connected = true;
        Ok(())
    }

    fn apply_status(&mut self, rest: &str) -> Result<(), DecodeError> {
        let mut parts = rest.split(',');
        let battery_mv = parts
            .next()
            .and_then(parse_u16)
            .ok_or(DecodeError::MalformedStatus)?;
        let signal_status = parts
            .next()
            .and_then(parse_u8)
            .ok_or(DecodeError::MalformedStatus)?;
        let speed_kmh = parts
            .next()
            .and_then(parse_u8)
            .ok_or(DecodeError::MalformedStatus)?;
        if parts.next().is_some() {
            return Err(DecodeError::MalformedStatus);
        }

        self.status = StatusUpdate {
            battery_mv,
            signal_status,
            speed_kmh,
        };
        self.status_updated = true;
        self.connected = true;
        Ok(())
    }
}

impl Default for LinkDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSink for LinkDecoder {
    fn accept(&mut self, byte: u8) -> bool {
        self.process_byte(byte).is_ok()
    }
}

fn parse_u16(field: &str) -> Option<u16> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

fn parse_u8(field: &str) -> Option<u8> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::LinkMessage;
    use crate::types::SignalState;

    fn feed(decoder: &mut LinkDecoder, bytes: &[u8]) -> Result<(), DecodeError> {
        let mut result = Ok(());
        for &b in bytes {
            if let Err(e) = decoder.process_byte(b) {
                result = Err(e);
            }
        }
        result
    }

    #[test]
    fn nav_line_byte_at_a_time() {
        let mut decoder = LinkDecoder::new();
        assert!(!decoder.is_connected());

        for &b in b"NAV:Turn left,120\n" {
            decoder.process_byte(b).unwrap();
        }

        assert!(decoder.nav_available());
        let nav = decoder.take_nav().expect("nav record");
        assert_eq!(nav.instruction.as_str(), "Turn left");
        assert_eq!(nav.distance_m, 120);
        assert!(decoder.is_connected());

        // Read-and-clear
        assert!(!decoder.nav_available());
        assert_eq!(decoder.take_nav(), None);
    }

    #[test]
    fn status_line_parses_three_fields() {
        let mut decoder = LinkDecoder::new();
        feed(&mut decoder, b"STATUS:12400,2,88\n").unwrap();

        let status = decoder.take_status().expect("status record");
        assert_eq!(status.battery_mv, 12400);
        assert_eq!(SignalState::from_wire(status.signal_status), SignalState::Right);
        assert_eq!(status.speed_kmh, 88);
        assert!(decoder.is_connected());
    }

    #[test]
    fn short_status_dropped_and_prior_record_kept() {
        let mut decoder = LinkDecoder::new();
        feed(&mut decoder, b"STATUS:100,1,10\n").unwrap();
        decoder.take_status();

        assert_eq!(
            feed(&mut decoder, b"STATUS:100,2\n"),
            Err(DecodeError::MalformedStatus)
        );
        assert!(!decoder.status_available());
        // Prior values survive the malformed line
        assert_eq!(decoder.status.battery_mv, 100);
        assert_eq!(decoder.status.signal_status, 1);
    }

    #[test]
    fn extra_status_field_rejected() {
        let mut decoder = LinkDecoder::new();
        assert_eq!(
            feed(&mut decoder, b"STATUS:100,2,30,40\n"),
            Err(DecodeError::MalformedStatus)
        );
        assert!(!decoder.status_available());
    }

    #[test]
    fn unknown_prefix_leaves_connection_alone() {
        let mut decoder = LinkDecoder::new();
        assert_eq!(
            feed(&mut decoder, b"TELEM:1,2,3\n"),
            Err(DecodeError::UnknownPrefix)
        );
        assert!(!decoder.is_connected());
        assert!(!decoder.nav_available());
        assert!(!decoder.status_available());
    }

    #[test]
    fn empty_line_is_a_silent_no_op() {
        let mut decoder = LinkDecoder::new();
        feed(&mut decoder, b"\n\r\n").unwrap();
        assert!(!decoder.is_connected());
    }

    #[test]
    fn non_printable_bytes_are_stripped() {
        let mut decoder = LinkDecoder::new();
        feed(&mut decoder, b"NAV:Tu\x01rn left,9\r\n").unwrap();
        let nav = decoder.take_nav().unwrap();
        assert_eq!(nav.instruction.as_str(), "Turn left");
        assert_eq!(nav.distance_m, 9);
    }

    #[test]
    fn nav_without_distance_dropped() {
        let mut decoder = LinkDecoder::new();
        assert_eq!(
            feed(&mut decoder, b"NAV:Turn left\n"),
            Err(DecodeError::MalformedNav)
        );
        assert_eq!(
            feed(&mut decoder, b"NAV:Turn left,\n"),
            Err(DecodeError::MalformedNav)
        );
        assert_eq!(
            feed(&mut decoder, b"NAV:,120\n"),
            Err(DecodeError::MalformedNav)
        );
        assert!(!decoder.nav_available());
    }

    #[test]
    fn distance_overflow_dropped() {
        let mut decoder = LinkDecoder::new();
        assert_eq!(
            feed(&mut decoder, b"NAV:Turn left,70000\n"),
            Err(DecodeError::MalformedNav)
        );
        assert!(!decoder.nav_available());
    }

    #[test]
    fn instruction_length_boundary() {
        let mut decoder = LinkDecoder::new();

        let exact = "x".repeat(INSTRUCTION_MAX);
        let line = format!("NAV:{exact},1\n");
        feed(&mut decoder, line.as_bytes()).unwrap();
        assert_eq!(decoder.take_nav().unwrap().instruction.len(), INSTRUCTION_MAX);

        let over = "x".repeat(INSTRUCTION_MAX + 1);
        let line = format!("NAV:{over},1\n");
        assert_eq!(feed(&mut decoder, line.as_bytes()), Err(DecodeError::MalformedNav));
        assert!(!decoder.nav_available());
    }

    #[test]
    fn oversized_line_discarded_then_next_parses() {
        let mut decoder = LinkDecoder::new();

        let mut stream = vec![b'X'; LINK_MAX_LINE + 20];
        stream.push(b'\n');
        assert_eq!(feed(&mut decoder, &stream), Err(DecodeError::Overflow));
        assert!(!decoder.nav_available());

        feed(&mut decoder, b"NAV:Turn left,120\n").unwrap();
        assert_eq!(decoder.take_nav().unwrap().distance_m, 120);
    }

    #[test]
    fn second_update_overwrites_unretrieved_first() {
        let mut decoder = LinkDecoder::new();
        feed(&mut decoder, b"NAV:Turn left,120\n").unwrap();
        feed(&mut decoder, b"NAV:Turn right,80\n").unwrap();

        let nav = decoder.take_nav().unwrap();
        assert_eq!(nav.instruction.as_str(), "Turn right");
        assert_eq!(nav.distance_m, 80);
        assert_eq!(decoder.take_nav(), None);
    }

    #[test]
    fn encoder_output_decodes_identically() {
        let mut decoder = LinkDecoder::new();

        let nav = LinkMessage::Nav {
            instruction: "Keep right at the fork",
            distance_m: 450,
        };
        feed(&mut decoder, &nav.encode_to_vec().unwrap()).unwrap();
        let received = decoder.take_nav().unwrap();
        assert_eq!(received.instruction.as_str(), "Keep right at the fork");
        assert_eq!(received.distance_m, 450);

        let status = LinkMessage::Status {
            battery_mv: 13800,
            signal: SignalState::Hazard,
            speed_kmh: 0,
        };
        feed(&mut decoder, &status.encode_to_vec().unwrap()).unwrap();
        let received = decoder.take_status().unwrap();
        assert_eq!(received.battery_mv, 13800);
        assert_eq!(SignalState::from_wire(received.signal_status), SignalState::Hazard);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn arbitrary_streams_never_panic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
                let mut decoder = LinkDecoder::new();
                for b in data {
                    let _ = decoder.process_byte(b);
                }
            }

            // Whatever garbage preceded it, a terminated valid line parses
            #[test]
            fn valid_line_survives_preceding_noise(
                noise in proptest::collection::vec(any::<u8>(), 0..300),
            ) {
                let mut decoder = LinkDecoder::new();
                for b in noise {
                    let _ = decoder.process_byte(b);
                }
                let _ = decoder.process_byte(b'\n');
                for &b in b"NAV:Turn left,120\n" {
                    let _ = decoder.process_byte(b);
                }
                prop_assert!(decoder.nav_available());
            }
        }
    }
}
