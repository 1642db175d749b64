//! Board-agnostic core components for the Stelvio firmware pair
//!
//! Both nodes are built from the same two mechanisms:
//!
//! - [`RingBuffer`]: a fixed-capacity circular byte FIFO decoupling byte
//!   arrival (interrupt or poll) from consumption (application task)
//! - [`Framer`]: an incremental state machine that turns an unbounded byte
//!   stream into bounded, delimiter-terminated frames
//!
//! The grammar-specific decoders built on top of the framer live in
//! `stelvio-nmea` (GPS side) and `stelvio-protocol` (inter-node link).
//! Guidance logic shared by nothing but the brain node is here too, because
//! it is board-agnostic and host-testable.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod framer;
pub mod guidance;
pub mod ring;
pub mod sink;

pub use framer::{Framer, FramerConfig, FramerError};
pub use guidance::{GuidancePlanner, SpeedFilter};
pub use ring::RingBuffer;
pub use sink::ByteSink;
