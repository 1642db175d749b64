//! Stelvio display unit firmware
//!
//! STM32F042K6 firmware for the dash unit: receives telemetry lines from
//! the brain over the BLE UART bridge and renders the HUD to an ST7735
//! LCD. Strictly a receiver - all guidance logic lives on the brain.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::bind_interrupts;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::mode::Async;
use embassy_stm32::peripherals::USART2;
use embassy_stm32::spi::{Config as SpiConfig, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, Uart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use {defmt_rtt as _, panic_probe as _};

mod st7735;

use st7735::St7735;
use stelvio_core::RingBuffer;
use stelvio_display::Hud;
use stelvio_protocol::{LinkDecoder, NavUpdate};

bind_interrupts!(struct Irqs {
    USART2 => usart::InterruptHandler<USART2>;
});

/// Link UART baud rate, matching the brain's BLE bridge.
const LINK_BAUD: u32 = 115_200;

/// Incoming byte queue between the UART producer and the decode
/// consumer. Holds at least one full longest line.
const RX_QUEUE: usize = 128;

/// Bytes received from the link, in strict arrival order.
static RX_RING: Mutex<CriticalSectionRawMutex, RingBuffer<RX_QUEUE>> =
    Mutex::new(RingBuffer::new());

/// Wakes the decode task after bytes are queued.
static RX_AVAILABLE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Shared HUD state.
static HUD: Mutex<CriticalSectionRawMutex, Hud> = Mutex::new(Hud::new());

/// Signal to trigger a display refresh.
static HUD_REFRESH: Signal<CriticalSectionRawMutex, ()> = Signal::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Stelvio display firmware starting...");

    let p = embassy_stm32::init(Default::default());

    // Link UART (PA2=TX, PA3=RX)
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = LINK_BAUD;

    let uart = Uart::new(
        p.USART2,
        p.PA3, // RX
        p.PA2, // TX
        Irqs,
        p.DMA1_CH4,
        p.DMA1_CH5,
        uart_config,
    )
    .unwrap();
    let (_tx, rx) = uart.split();

    // LCD on SPI1 (PA5=SCK, PA7=MOSI) with PB0=DC, PB1=RST, PB2=CS
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = Hertz(8_000_000);
    let spi = Spi::new_blocking_txonly(p.SPI1, p.PA5, p.PA7, spi_config);

    let dc = Output::new(p.PB0, Level::Low, Speed::VeryHigh);
    let rst = Output::new(p.PB1, Level::High, Speed::VeryHigh);
    let cs = Output::new(p.PB2, Level::High, Speed::VeryHigh);
    let panel = St7735::new(spi, dc, rst, cs);

    // Show the connecting placeholder until the first record lands
    {
        let mut hud = HUD.lock().await;
        hud.apply_nav(&NavUpdate::new());
    }

    spawner.spawn(uart_rx_task(rx)).unwrap();
    spawner.spawn(decode_task()).unwrap();
    spawner.spawn(display_task(panel)).unwrap();

    info!("All tasks spawned");
}

/// UART receive task (producer) - queues raw bytes for the decoder.
#[embassy_executor::task]
async fn uart_rx_task(mut rx: usart::UartRx<'static, Async>) {
    info!("UART RX task started");

    let mut buf = [0u8; 32];

    loop {
        match rx.read_until_idle(&mut buf).await {
            Ok(n) if n > 0 => {
                let queued = RX_RING.lock().await.write_multi(&buf[..n]);
                if queued < n {
                    // The link outpaced the decoder; bounded loss by design
                    warn!("RX queue full, dropped {} bytes", n - queued);
                }
                RX_AVAILABLE.signal(());
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

/// Decode task (consumer) - drains the queue in FIFO order and applies
/// records to the HUD.
#[embassy_executor::task]
async fn decode_task() {
    info!("Decode task started");

    let mut decoder = LinkDecoder::new();
    let mut chunk = [0u8; 32];

    loop {
        RX_AVAILABLE.wait().await;

        loop {
            let n = RX_RING.lock().await.read_multi(&mut chunk);
            if n == 0 {
                break;
            }
            for &byte in &chunk[..n] {
                if let Err(e) = decoder.process_byte(byte) {
                    warn!("Line dropped: {:?}", e);
                }
            }

            if let Some(nav) = decoder.take_nav() {
                trace!("NAV: {} in {}m", nav.instruction.as_str(), nav.distance_m);
                HUD.lock().await.apply_nav(&nav);
            }
            if let Some(status) = decoder.take_status() {
                trace!("STATUS: {}mV", status.battery_mv);
                HUD.lock()
                    .await
                    .apply_status(&status, decoder.is_connected());
            }
        }

        if HUD.lock().await.is_dirty() {
            HUD_REFRESH.signal(());
        }
    }
}

/// Display task - renders the HUD whenever it changes.
#[embassy_executor::task]
async fn display_task(mut panel: St7735<'static>) {
    info!("Display task started");

    if let Err(e) = panel.init().await {
        error!("LCD init failed: {:?}", e);
    } else {
        info!("LCD initialized");
    }
    HUD_REFRESH.signal(());

    loop {
        HUD_REFRESH.wait().await;

        let mut hud = HUD.lock().await;
        if hud.is_dirty() {
            if let Err(e) = hud.render(&mut panel) {
                warn!("HUD render failed: {:?}", e);
            }
        }
    }
}
