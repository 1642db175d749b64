//! BLE bridge connection tracking (brain side)
//!
//! HC-05 style modules report link state as plain text lines on the same
//! UART that carries telemetry in the other direction. The monitor frames
//! those lines and keeps a connected flag that gates status transmission.

use stelvio_core::{Framer, FramerConfig};

/// Response lines are short; anything longer is module chatter we do not
/// care about.
const RESPONSE_MAX_LINE: usize = 64;

const RESPONSE_GRAMMAR: FramerConfig = FramerConfig {
    start: None,
    terminator: b'\n',
    printable_only: true,
};

/// Watches BLE module response lines for connect/disconnect events.
#[derive(Debug, Clone)]
pub struct ConnectionMonitor {
    framer: Framer<RESPONSE_MAX_LINE>,
    connected: bool,
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        Self {
            framer: Framer::new(RESPONSE_GRAMMAR),
            connected: false,
        }
    }

    /// Feed one byte from the module. Returns the new link state when
    /// this byte completed a state-changing line.
    pub fn process_byte(&mut self, byte: u8) -> Option<bool> {
        // Oversized chatter is dropped by the framer; never an event
        let line = self.framer.feed(byte).ok()??;

        // DISCONNECT first: it contains CONNECT as a substring
        let line = core::str::from_utf8(&line).ok()?;
        if line.contains("DISCONNECT") {
            self.connected = false;
            Some(false)
        } else if line.contains("CONNECT") {
            self.connected = true;
            Some(true)
        } else {
            None
        }
    }

    pub const fn is_connected(&self) -> bool {
        self.connected
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}
