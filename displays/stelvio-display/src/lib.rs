//! HUD composition for the Stelvio display unit
//!
//! Turns the link records (`NavUpdate`, `StatusUpdate`) into a small
//! character HUD, independent of the LCD hardware:
//!
//! ```text
//! ┌─────────────────────┐
//! │ Turn left           │  instruction
//! │ 120 m               │  distance to maneuver
//! │ 88 km/h             │  speed
//! │ 12.4V <> LINK       │  battery, signals, link state
//! └─────────────────────┘
//! ```
//!
//! The firmware implements [`TextBackend`] for its LCD driver and calls
//! [`Hud::render`]; everything above that line is host-testable.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod backend;
pub mod hud;

pub use backend::{DisplayError, TextBackend};
pub use hud::{Hud, HUD_COLS, HUD_ROWS};
