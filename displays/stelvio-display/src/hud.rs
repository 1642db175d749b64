//! Character HUD composed from link records

use core::fmt::Write;

use heapless::String;
use stelvio_protocol::{NavUpdate, SignalState, StatusUpdate};

use crate::backend::{DisplayError, TextBackend};

/// Character rows on the HUD.
pub const HUD_ROWS: usize = 4;

/// Characters per row.
pub const HUD_COLS: usize = 21;

const ROW_INSTRUCTION: usize = 0;
const ROW_DISTANCE: usize = 1;
const ROW_SPEED: usize = 2;
const ROW_STATUS: usize = 3;

/// Text HUD state with dirty tracking.
#[derive(Debug, Clone)]
pub struct Hud {
    rows: [String<HUD_COLS>; HUD_ROWS],
    dirty: bool,
}

impl Hud {
    /// Create an empty HUD. Usable in statics; the firmware applies
    /// [`NavUpdate::new`]'s connecting placeholder before first render.
    pub const fn new() -> Self {
        Self {
            rows: [String::new(), String::new(), String::new(), String::new()],
            dirty: true,
        }
    }

    /// Fold in a navigation record.
    pub fn apply_nav(&mut self, nav: &NavUpdate) {
        self.set_row(ROW_INSTRUCTION, nav.instruction.as_str());

        let mut line: String<HUD_COLS> = String::new();
        let _ = write!(line, "{} m", nav.distance_m);
        self.set_row(ROW_DISTANCE, line.as_str());
    }

    /// Fold in a status record and the current link state.
    pub fn apply_status(&mut self, status: &StatusUpdate, connected: bool) {
        let mut line: String<HUD_COLS> = String::new();
        let _ = write!(line, "{} km/h", status.speed_kmh);
        self.set_row(ROW_SPEED, line.as_str());

        let signal = SignalState::from_wire(status.signal_status);
        let left = if signal.left_active() { '<' } else { '-' };
        let right = if signal.right_active() { '>' } else { '-' };
        let link = if connected { "LINK" } else { "----" };

        let mut line: String<HUD_COLS> = String::new();
        let _ = write!(
            line,
            "{}.{}V {}{} {}",
            status.battery_mv / 1000,
            (status.battery_mv % 1000) / 100,
            left,
            right,
            link
        );
        self.set_row(ROW_STATUS, line.as_str());
    }

    /// One row of display text.
    pub fn row(&self, row: usize) -> &str {
        self.rows.get(row).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn rows(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|s| s.as_str())
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Draw every row through the backend and mark the HUD clean.
    pub fn render<B: TextBackend>(&mut self, backend: &mut B) -> Result<(), DisplayError> {
        backend.clear()?;
        for (row, text) in self.rows.iter().enumerate() {
            if !text.is_empty() {
                backend.draw_text(row as u8, 0, text.as_str())?;
            }
        }
        backend.flush()?;
        self.dirty = false;
        Ok(())
    }

    fn set_row(&mut self, row: usize, text: &str) {
        let line = &mut self.rows[row];
        // Records are ASCII by construction; byte truncation is safe
        let text = if text.len() > HUD_COLS {
            &text[..HUD_COLS]
        } else {
            text
        };
        if line.as_str() != text {
            line.clear();
            let _ = line.push_str(text);
            self.dirty = true;
        }
    }
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}
