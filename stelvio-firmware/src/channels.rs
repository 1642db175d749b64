//! Inter-task shared state
//!
//! Static embassy-sync primitives connecting the tasks. The TX queue is
//! written by two producer tasks (guidance, status), so it lives behind a
//! mutex rather than relying on the ring's lock-free SPSC discipline.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicBool, AtomicU8};

use stelvio_core::RingBuffer;
use stelvio_nmea::GpsFix;

use crate::config::LINK_TX_QUEUE;

/// Latest fix published by the GPS task; taken (read-and-clear) by the
/// guidance task each tick.
pub static LATEST_FIX: Mutex<CriticalSectionRawMutex, Option<GpsFix>> = Mutex::new(None);

/// Outgoing link bytes. Whole lines only; a line that does not fit is
/// dropped rather than split.
pub static LINK_TX: Mutex<CriticalSectionRawMutex, RingBuffer<LINK_TX_QUEUE>> =
    Mutex::new(RingBuffer::new());

/// Wakes the link TX task after a line is queued.
pub static LINK_TX_PENDING: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Debounced turn-signal state, wire encoding.
pub static SIGNAL_STATE: AtomicU8 = AtomicU8::new(0);

/// Smoothed speed for STATUS lines, km/h.
pub static SPEED_KMH: AtomicU8 = AtomicU8::new(0);

/// BLE link state from the connection monitor. Gates STATUS transmission.
pub static LINK_CONNECTED: AtomicBool = AtomicBool::new(false);
