//! Compile-time configuration for the brain unit
//!
//! Pin roles live in `main.rs` next to the peripheral setup; everything
//! tunable lives here.

/// GPS receiver UART (UART0), standard NMEA rate.
pub const GPS_BAUD: u32 = 9600;

/// BLE bridge UART (UART1).
pub const LINK_BAUD: u32 = 115200;

/// Buffered UART sizes. The GPS side must ride out a whole sentence
/// burst between task wakeups.
pub const GPS_UART_BUF: usize = 256;
pub const LINK_UART_BUF: usize = 128;

/// Outgoing link byte queue. Sized for several full-length lines so a
/// guidance and a status update never contend.
pub const LINK_TX_QUEUE: usize = 256;

/// How often a STATUS line is sent while the link is up.
pub const STATUS_INTERVAL_MS: u64 = 500;

/// How often guidance recalculates and a NAV line is sent.
pub const GUIDANCE_INTERVAL_MS: u64 = 1000;

/// Turn-signal input sampling and debounce. Inputs are active low.
pub const SIGNAL_POLL_MS: u64 = 10;
pub const SIGNAL_DEBOUNCE_SAMPLES: u8 = 5;

/// Battery sense divider: pack -- R1 -- ADC -- R2 -- GND.
pub const BATTERY_DIVIDER_R1_OHMS: f32 = 10_000.0;
pub const BATTERY_DIVIDER_R2_OHMS: f32 = 2_200.0;
pub const BATTERY_ADC_VREF_MV: f32 = 3_300.0;
pub const BATTERY_ADC_MAX: f32 = 4_095.0;
