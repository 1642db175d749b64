//! Incremental frame accumulation over an unbounded byte stream
//!
//! One [`Framer`] instance per channel turns bytes delivered one at a time
//! (from an interrupt, a DMA drain, or a [`RingBuffer`](crate::RingBuffer))
//! into complete delimiter-terminated frames. The grammar is supplied as a
//! [`FramerConfig`] value rather than baked in, because both nodes run two
//! structurally identical but differently-configured instances:
//!
//! - NMEA sentences: `start = Some(b'$')`, terminated by `\n`
//! - telemetry lines: no start marker, terminated by `\n`, printable
//!   ASCII only
//!
//! Malformed input never wedges the machine: an overflowing frame is
//! discarded and framing resynchronizes at the next start marker (when the
//! grammar has one) or at the next terminator (when it does not). A frame
//! that never terminates simply occupies the accumulator until one of those
//! happens; there is deliberately no timeout at this layer.

use heapless::Vec;

/// Grammar parameters for a [`Framer`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramerConfig {
    /// Byte that begins a frame. `None` means accumulation is always
    /// active and frames are delimited by the terminator alone.
    pub start: Option<u8>,
    /// Byte that ends a frame. Not included in the returned frame.
    pub terminator: u8,
    /// When set, only printable ASCII (`' '..='~'`) is retained; other
    /// bytes are silently dropped.
    pub printable_only: bool,
}

/// Errors surfaced while framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FramerError {
    /// The accumulator filled before a terminator arrived. The in-progress
    /// frame (and the overflowing byte) were discarded; framing resumes at
    /// the next start condition.
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for the start marker (marker grammars only)
    Idle,
    /// Buffering frame bytes
    Accumulating,
    /// Dropping bytes until the next terminator (markerless overflow
    /// recovery)
    Discarding,
}

/// State machine for assembling frames byte by byte.
#[derive(Debug, Clone)]
pub struct Framer<const CAP: usize> {
    config: FramerConfig,
    buf: Vec<u8, CAP>,
    state: State,
}

impl<const CAP: usize> Framer<CAP> {
    /// Create a framer for the given grammar.
    pub fn new(config: FramerConfig) -> Self {
        Self {
            config,
            buf: Vec::new(),
            state: Self::initial_state(&config),
        }
    }

    const fn initial_state(config: &FramerConfig) -> State {
        if config.start.is_some() {
            State::Idle
        } else {
            State::Accumulating
        }
    }

    /// Drop any partial frame and return to the initial state.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = Self::initial_state(&self.config);
    }

    /// Feed a single byte.
    ///
    /// Returns `Ok(Some(frame))` when the byte completed a frame (start
    /// marker included, terminator and a trailing `\r` stripped),
    /// `Ok(None)` when more bytes are needed, or `Err` when the byte
    /// overflowed the accumulator and the frame was dropped.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Vec<u8, CAP>>, FramerError> {
        // A start marker always begins a fresh frame, even mid-frame:
        // whatever was accumulated can no longer terminate correctly.
        if self.config.start == Some(byte) {
            self.buf.clear();
            // CAP >= 1 for any usable grammar
            let _ = self.buf.push(byte);
            self.state = State::Accumulating;
            return Ok(None);
        }

        match self.state {
            State::Idle => Ok(None),
            State::Discarding => {
                if byte == self.config.terminator {
                    self.state = Self::initial_state(&self.config);
                }
                Ok(None)
            }
            State::Accumulating => {
                if byte == self.config.terminator {
                    return Ok(self.terminate());
                }
                if self.config.printable_only && !byte.is_ascii_graphic() && byte != b' ' {
                    return Ok(None);
                }
                if self.buf.push(byte).is_err() {
                    self.buf.clear();
                    self.state = if self.config.start.is_some() {
                        State::Idle
                    } else {
                        State::Discarding
                    };
                    return Err(FramerError::Overflow);
                }
                Ok(None)
            }
        }
    }

    fn terminate(&mut self) -> Option<Vec<u8, CAP>> {
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        self.state = Self::initial_state(&self.config);
        if self.buf.is_empty() {
            // Empty line on a markerless grammar: silent no-op
            return None;
        }
        Some(core::mem::take(&mut self.buf))
    }
}
