//! Stelvio brain unit firmware
//!
//! RP2040 firmware for the handlebar unit: parses GPS NMEA sentences,
//! runs guidance, reads battery and turn-signal inputs, and pushes
//! NAV/STATUS telemetry lines to the display unit over a BLE UART bridge.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

mod channels;
mod config;
mod tasks;

use config::{GPS_BAUD, GPS_UART_BUF, LINK_BAUD, LINK_UART_BUF};

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

// Static cells for UART buffers (must live forever)
static GPS_TX_BUF: StaticCell<[u8; 32]> = StaticCell::new();
static GPS_RX_BUF: StaticCell<[u8; GPS_UART_BUF]> = StaticCell::new();
static LINK_TX_BUF: StaticCell<[u8; LINK_UART_BUF]> = StaticCell::new();
static LINK_RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Stelvio brain firmware starting...");

    let p = embassy_rp::init(Default::default());

    // GPS receiver on UART0 (GPIO0 TX unused, GPIO1 RX)
    let gps_config = {
        let mut cfg = UartConfig::default();
        cfg.baudrate = GPS_BAUD;
        cfg
    };
    let gps_uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, gps_config).into_buffered(
        Irqs,
        GPS_TX_BUF.init([0u8; 32]),
        GPS_RX_BUF.init([0u8; GPS_UART_BUF]),
    );
    let (_gps_tx, gps_rx) = gps_uart.split();

    // BLE bridge on UART1 (GPIO4 TX, GPIO5 RX)
    let link_config = {
        let mut cfg = UartConfig::default();
        cfg.baudrate = LINK_BAUD;
        cfg
    };
    let link_uart = Uart::new_blocking(p.UART1, p.PIN_4, p.PIN_5, link_config).into_buffered(
        Irqs,
        LINK_TX_BUF.init([0u8; LINK_UART_BUF]),
        LINK_RX_BUF.init([0u8; 64]),
    );
    let (link_tx, link_rx) = link_uart.split();

    info!("UARTs initialized");

    // Battery sense on ADC0 (GPIO26), behind the divider
    let adc = Adc::new(p.ADC, Irqs, AdcConfig::default());
    let battery = Channel::new_pin(p.PIN_26, Pull::None);

    // Turn-signal inputs, active low
    let left_signal = Input::new(p.PIN_2, Pull::Up);
    let right_signal = Input::new(p.PIN_3, Pull::Up);

    info!("Peripherals initialized");

    spawner.spawn(tasks::gps_task(gps_rx)).unwrap();
    spawner.spawn(tasks::guidance_task()).unwrap();
    spawner.spawn(tasks::status_task(adc, battery)).unwrap();
    spawner.spawn(tasks::link_tx_task(link_tx)).unwrap();
    spawner.spawn(tasks::link_rx_task(link_rx)).unwrap();
    spawner
        .spawn(tasks::signal_task(left_signal, right_signal))
        .unwrap();

    info!("All tasks spawned");
}
