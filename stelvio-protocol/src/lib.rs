//! Brain-to-display telemetry protocol
//!
//! The link between the two Stelvio units is a BLE UART bridge carrying
//! newline-terminated ASCII lines, one record per line:
//!
//! ```text
//! NAV:<instruction, no commas>,<distance_m>\n
//! STATUS:<battery_mv>,<signal_status>,<speed_kmh>\n
//! ```
//!
//! No checksum: the transport is a continuous push stream and a damaged
//! line is simply dropped and superseded by the next one. Non-printable
//! bytes are stripped before framing, and a line longer than
//! [`LINK_MAX_LINE`] bytes is discarded whole.
//!
//! The brain encodes with [`LinkMessage`]; the display decodes with
//! [`LinkDecoder`], which keeps one record per message type with
//! read-and-clear retrieval. [`ConnectionMonitor`] watches the BLE
//! module's own response lines (`CONNECT`/`DISCONNECT`) on the brain
//! side.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod decoder;
pub mod link;
pub mod message;
pub mod types;

pub use decoder::{DecodeError, LinkDecoder, LINK_GRAMMAR};
pub use link::ConnectionMonitor;
pub use message::{EncodeError, LinkMessage, LINK_MAX_LINE};
pub use types::{NavUpdate, SignalState, StatusUpdate};
