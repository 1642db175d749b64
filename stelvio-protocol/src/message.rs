//! Line encoding for the brain side

use core::fmt::Write;

use heapless::{String, Vec};
use stelvio_core::guidance::INSTRUCTION_MAX;

use crate::types::SignalState;

/// Maximum line length on the wire, terminator included.
pub const LINK_MAX_LINE: usize = 128;

pub(crate) const NAV_PREFIX: &str = "NAV:";
pub(crate) const STATUS_PREFIX: &str = "STATUS:";

/// Errors raised while encoding a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Instruction is empty, too long, or contains a comma or
    /// non-printable character the wire format cannot carry
    InvalidInstruction,
    /// Encoded line would not fit the output buffer
    BufferTooSmall,
}

/// One outgoing telemetry line.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkMessage<'a> {
    Nav {
        instruction: &'a str,
        distance_m: u16,
    },
    Status {
        battery_mv: u16,
        signal: SignalState,
        speed_kmh: u8,
    },
}

impl LinkMessage<'_> {
    /// Encode into a byte buffer, returning the number of bytes written
    /// (terminator included).
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, EncodeError> {
        let line = self.encode_to_vec()?;
        if buffer.len() < line.len() {
            return Err(EncodeError::BufferTooSmall);
        }
        buffer[..line.len()].copy_from_slice(&line);
        Ok(line.len())
    }

    /// Encode into an owned line.
    pub fn encode_to_vec(&self) -> Result<Vec<u8, LINK_MAX_LINE>, EncodeError> {
        let mut line: String<LINK_MAX_LINE> = String::new();
        match self {
            LinkMessage::Nav {
                instruction,
                distance_m,
            } => {
                if !instruction_is_valid(instruction) {
                    return Err(EncodeError::InvalidInstruction);
                }
                write!(line, "{NAV_PREFIX}{instruction},{distance_m}\n")
                    .map_err(|_| EncodeError::BufferTooSmall)?;
            }
            LinkMessage::Status {
                battery_mv,
                signal,
                speed_kmh,
            } => {
                write!(
                    line,
                    "{STATUS_PREFIX}{battery_mv},{},{speed_kmh}\n",
                    signal.to_wire()
                )
                .map_err(|_| EncodeError::BufferTooSmall)?;
            }
        }
        Ok(line.into_bytes())
    }
}

/// The wire format reserves `,` as the field separator and strips
/// non-printable bytes on receive, so neither may appear in the text.
fn instruction_is_valid(instruction: &str) -> bool {
    !instruction.is_empty()
        && instruction.len() <= INSTRUCTION_MAX
        && instruction
            .bytes()
            .all(|b| b != b',' && (b == b' ' || b.is_ascii_graphic()))
}
