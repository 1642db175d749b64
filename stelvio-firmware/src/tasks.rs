//! Brain unit tasks
//!
//! One task per concern, communicating through `channels`:
//!
//! - `gps_task` drains the GPS UART into the NMEA decoder
//! - `guidance_task` turns fixes into NAV lines
//! - `status_task` samples battery/signals into STATUS lines
//! - `link_tx_task` / `link_rx_task` own the BLE bridge UART
//! - `signal_task` debounces the turn-signal inputs

use defmt::*;
use embassy_rp::adc::{Adc, Async as AdcAsync, Channel};
use embassy_rp::gpio::Input;
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embassy_time::{Duration, Ticker};
use embedded_io_async::{Read, Write};
use portable_atomic::Ordering;

use stelvio_core::GuidancePlanner;
use stelvio_nmea::NmeaDecoder;
use stelvio_protocol::{ConnectionMonitor, LinkMessage, SignalState};

use crate::channels::{
    LATEST_FIX, LINK_CONNECTED, LINK_TX, LINK_TX_PENDING, SIGNAL_STATE, SPEED_KMH,
};
use crate::config::{
    BATTERY_ADC_MAX, BATTERY_ADC_VREF_MV, BATTERY_DIVIDER_R1_OHMS, BATTERY_DIVIDER_R2_OHMS,
    GUIDANCE_INTERVAL_MS, SIGNAL_DEBOUNCE_SAMPLES, SIGNAL_POLL_MS, STATUS_INTERVAL_MS,
};

/// GPS RX task - feeds the NMEA decoder in strict arrival order and
/// publishes each taken fix.
#[embassy_executor::task]
pub async fn gps_task(mut rx: BufferedUartRx<'static>) {
    info!("GPS task started");

    let mut decoder = NmeaDecoder::new();
    let mut buf = [0u8; 64];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                for &byte in &buf[..n] {
                    if let Err(e) = decoder.process_byte(byte) {
                        warn!("GPS sentence dropped: {:?}", e);
                    }
                    if let Some(fix) = decoder.take_fix() {
                        trace!("Fix update, valid={}", fix.fix_valid);
                        *LATEST_FIX.lock().await = Some(fix);
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("GPS UART read error: {:?}", e);
            }
        }
    }
}

/// Guidance task - periodic NAV line generation.
#[embassy_executor::task]
pub async fn guidance_task() {
    info!("Guidance task started");

    let mut planner = GuidancePlanner::new();
    let mut ticker = Ticker::every(Duration::from_millis(GUIDANCE_INTERVAL_MS));

    loop {
        ticker.next().await;

        if let Some(fix) = LATEST_FIX.lock().await.take() {
            planner.set_fix(fix.fix_valid, fix.speed_kmh);
        }
        SPEED_KMH.store(planner.speed_kmh() as u8, Ordering::Relaxed);

        let (instruction, distance_m) = planner.tick(GUIDANCE_INTERVAL_MS as u32);
        let msg = LinkMessage::Nav {
            instruction,
            distance_m,
        };
        match msg.encode_to_vec() {
            Ok(line) => enqueue_line(&line).await,
            Err(e) => warn!("NAV encode failed: {:?}", e),
        }
    }
}

/// Status task - periodic STATUS line generation while the link is up.
#[embassy_executor::task]
pub async fn status_task(mut adc: Adc<'static, AdcAsync>, mut battery: Channel<'static>) {
    info!("Status task started");

    let mut ticker = Ticker::every(Duration::from_millis(STATUS_INTERVAL_MS));

    loop {
        ticker.next().await;

        if !LINK_CONNECTED.load(Ordering::Relaxed) {
            continue;
        }

        let battery_mv = match adc.read(&mut battery).await {
            Ok(raw) => battery_millivolts(raw),
            Err(e) => {
                warn!("Battery ADC read failed: {:?}", e);
                continue;
            }
        };

        let msg = LinkMessage::Status {
            battery_mv,
            signal: SignalState::from_wire(SIGNAL_STATE.load(Ordering::Relaxed)),
            speed_kmh: SPEED_KMH.load(Ordering::Relaxed),
        };
        match msg.encode_to_vec() {
            Ok(line) => enqueue_line(&line).await,
            Err(e) => warn!("STATUS encode failed: {:?}", e),
        }
    }
}

/// Queue one whole line for transmission, or drop it whole: a split line
/// would corrupt the stream for the receiver.
async fn enqueue_line(line: &[u8]) {
    {
        let mut queue = LINK_TX.lock().await;
        if queue.free() < line.len() {
            warn!("Link TX queue full, dropping {} byte line", line.len());
            return;
        }
        queue.write_multi(line);
    }
    LINK_TX_PENDING.signal(());
}

/// Link TX task - drains the outgoing queue into the BLE UART.
#[embassy_executor::task]
pub async fn link_tx_task(mut tx: BufferedUartTx<'static>) {
    info!("Link TX task started");

    let mut chunk = [0u8; 64];

    loop {
        LINK_TX_PENDING.wait().await;
        loop {
            let n = LINK_TX.lock().await.read_multi(&mut chunk);
            if n == 0 {
                break;
            }
            if let Err(e) = tx.write_all(&chunk[..n]).await {
                warn!("Link UART write error: {:?}", e);
                break;
            }
        }
    }
}

/// Link RX task - watches the BLE module's response lines for
/// connect/disconnect events.
#[embassy_executor::task]
pub async fn link_rx_task(mut rx: BufferedUartRx<'static>) {
    info!("Link RX task started");

    let mut monitor = ConnectionMonitor::new();
    let mut buf = [0u8; 32];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                for &byte in &buf[..n] {
                    if let Some(connected) = monitor.process_byte(byte) {
                        info!("BLE link {}", if connected { "up" } else { "down" });
                        LINK_CONNECTED.store(connected, Ordering::Relaxed);
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Link UART read error: {:?}", e);
            }
        }
    }
}

/// Require a level to be stable for N consecutive samples before
/// accepting it.
struct Debounce {
    stable: bool,
    candidate: bool,
    count: u8,
}

impl Debounce {
    fn new(initial: bool) -> Self {
        Self {
            stable: initial,
            candidate: initial,
            count: 0,
        }
    }

    fn sample(&mut self, level: bool) -> bool {
        if level == self.stable {
            self.candidate = level;
            self.count = 0;
        } else if level == self.candidate {
            self.count += 1;
            if self.count >= SIGNAL_DEBOUNCE_SAMPLES {
                self.stable = level;
                self.count = 0;
            }
        } else {
            self.candidate = level;
            self.count = 1;
        }
        self.stable
    }
}

/// Signal task - polls the two active-low turn-signal inputs.
#[embassy_executor::task]
pub async fn signal_task(left: Input<'static>, right: Input<'static>) {
    info!("Signal task started");

    let mut left_db = Debounce::new(left.is_high());
    let mut right_db = Debounce::new(right.is_high());
    let mut ticker = Ticker::every(Duration::from_millis(SIGNAL_POLL_MS));

    loop {
        ticker.next().await;

        // Active low: signal on means pin pulled to ground
        let left_on = !left_db.sample(left.is_high());
        let right_on = !right_db.sample(right.is_high());
        let state = SignalState::from_inputs(left_on, right_on);

        let previous = SIGNAL_STATE.swap(state.to_wire(), Ordering::Relaxed);
        if previous != state.to_wire() {
            debug!("Signal state: {:?}", state);
        }
    }
}

/// Undo the sense divider and reference scaling.
fn battery_millivolts(raw: u16) -> u16 {
    let sensed_mv = raw as f32 * BATTERY_ADC_VREF_MV / BATTERY_ADC_MAX;
    let scale = (BATTERY_DIVIDER_R1_OHMS + BATTERY_DIVIDER_R2_OHMS) / BATTERY_DIVIDER_R2_OHMS;
    (sensed_mv * scale) as u16
}
