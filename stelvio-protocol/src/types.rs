//! Record types carried over the link

use heapless::String;
use stelvio_core::guidance::INSTRUCTION_MAX;

/// Turn-signal state as reported in STATUS lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalState {
    #[default]
    Off,
    Left,
    Right,
    /// Both signals active
    Hazard,
}

// Wire format values
const SIGNAL_OFF: u8 = 0;
const SIGNAL_LEFT: u8 = 1;
const SIGNAL_RIGHT: u8 = 2;
const SIGNAL_HAZARD: u8 = 3;

impl SignalState {
    /// Combine the two debounced inputs into a state.
    pub const fn from_inputs(left: bool, right: bool) -> Self {
        match (left, right) {
            (true, true) => SignalState::Hazard,
            (true, false) => SignalState::Left,
            (false, true) => SignalState::Right,
            (false, false) => SignalState::Off,
        }
    }

    /// Convert to the wire format value.
    pub const fn to_wire(self) -> u8 {
        match self {
            SignalState::Off => SIGNAL_OFF,
            SignalState::Left => SIGNAL_LEFT,
            SignalState::Right => SIGNAL_RIGHT,
            SignalState::Hazard => SIGNAL_HAZARD,
        }
    }

    /// Parse a wire format value. Unknown values read as `Off` rather
    /// than failing the whole STATUS line.
    pub const fn from_wire(value: u8) -> Self {
        match value {
            SIGNAL_LEFT => SignalState::Left,
            SIGNAL_RIGHT => SignalState::Right,
            SIGNAL_HAZARD => SignalState::Hazard,
            _ => SignalState::Off,
        }
    }

    pub const fn left_active(self) -> bool {
        matches!(self, SignalState::Left | SignalState::Hazard)
    }

    pub const fn right_active(self) -> bool {
        matches!(self, SignalState::Right | SignalState::Hazard)
    }
}

/// Latest navigation cue received from the brain.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NavUpdate {
    pub instruction: String<INSTRUCTION_MAX>,
    /// Metres to the next maneuver
    pub distance_m: u16,
}

impl NavUpdate {
    pub fn new() -> Self {
        let mut instruction = String::new();
        let _ = instruction.push_str("Connecting...");
        Self {
            instruction,
            distance_m: 0,
        }
    }
}

impl Default for NavUpdate {
    fn default() -> Self {
        Self::new()
    }
}

/// Latest brain status received over the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusUpdate {
    pub battery_mv: u16,
    /// Raw wire value; decode with [`SignalState::from_wire`]
    pub signal_status: u8,
    pub speed_kmh: u8,
}
