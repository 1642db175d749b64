//! NMEA 0183 sentence decoder
//!
//! Consumes the raw byte stream of a GPS receiver one byte at a time and
//! maintains a single [`GpsFix`] record with read-and-clear retrieval.
//!
//! # Wire format
//!
//! ```text
//! $GPRMC,123456.00,A,4042.768,N,07400.360,W,5.0,90.0,050525,,,A*7D\r\n
//! │└┬┘└┬┘└────────────────── fields ──────────────────────────┘ └┬┘
//! │ │  └ sentence type                                  checksum ┘
//! │ └ talker (GP/GN)
//! └ start marker
//! ```
//!
//! The checksum is the XOR of every byte strictly between `$` and `*`,
//! transmitted as two hex digits. Only `RMC` and `GGA` sentences update
//! the fix; any other checksum-valid sentence is accepted and ignored.
//!
//! Malformed input (overflow, bad checksum, short sentences, garbage
//! fields) is dropped and framing resumes at the next `$`. The receiver
//! is a continuous push stream, so a lost sentence is superseded by the
//! next one.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod decoder;
pub mod fields;
pub mod fix;

pub use decoder::{NmeaDecoder, NmeaError, NMEA_GRAMMAR, NMEA_MAX_SENTENCE_LEN};
pub use fix::{GpsFix, UtcDate, UtcTime};
