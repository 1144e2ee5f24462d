//! Nodelink - Cellular Sensor Node Firmware
//!
//! Main firmware binary for RP2040-based sensor nodes. A BG96 modem sits
//! on UART0 behind an interrupt-driven ring buffer bridge; an SHTC3 on
//! I2C0 and a battery divider on ADC0 provide the readings.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::Pull;
use embassy_rp::i2c::I2c;
use embassy_rp::uart::Uart;
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use nodelink_core::buffer::RingBuffer;
use nodelink_core::config::{parse_config, NodeConfig};
use nodelink_core::link::{LinkStats, UartBridge};
use nodelink_core::traits::ModemPower;
use nodelink_core::transport::{AtTransport, TransportConfig};
use nodelink_drivers::modem::{Bg96Pins, Bg96Power, Bg96Timing};
use nodelink_drivers::sensor::{AdcBattery, Shtc3};
use nodelink_hal::i2c::I2cConfig;
use nodelink_hal::UartConfig;
use nodelink_hal_rp2040::gpio::polarity;
use nodelink_hal_rp2040::{i2c as rp_i2c, uart as rp_uart};
use nodelink_hal_rp2040::{Board, PinBank, PinError, Pl011Fifo, RpAdcChannel, RpI2c, RpOutput};

use crate::clock::EmbassyClock;
use crate::link::{UartIrq, RX_SIZE, TX_SIZE};

mod clock;
mod link;
mod modem;
mod tasks;

/// Embedded node configuration (compiled into firmware)
/// Edit node.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../node.toml");

bind_interrupts!(struct Irqs {
    UART0_IRQ => UartIrq;
});

// Ring buffers and counters shared between the UART interrupt and the
// foreground (must live forever)
static RX_RING: StaticCell<RingBuffer<RX_SIZE>> = StaticCell::new();
static TX_RING: StaticCell<RingBuffer<TX_SIZE>> = StaticCell::new();
static LINK_STATS: StaticCell<LinkStats> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Nodelink firmware starting...");

    let p = embassy_rp::init(Default::default());
    let mut board = Board::split(p);
    info!("Peripherals initialized");

    let config = load_config();
    info!(
        "Modem {}, link {} baud, report every {}s",
        config.modem.model.as_str(),
        config.link.baudrate,
        config.report.interval_s
    );

    // Modem UART: configured by the blocking driver, then handed to the
    // interrupt bridge at register level
    let uart_config = UartConfig {
        baudrate: config.link.baudrate,
        ..Default::default()
    };
    let uart = Uart::new_blocking(
        board.uart0,
        board.uart_tx,
        board.uart_rx,
        rp_uart::embassy_config(&uart_config),
    );
    let (fifo, tx_irq) = Pl011Fifo::uart0(uart);

    let (rx_producer, rx_consumer) = RX_RING.init(RingBuffer::new()).split();
    let (tx_producer, tx_consumer) = TX_RING.init(RingBuffer::new()).split();
    let stats: &'static LinkStats = LINK_STATS.init(LinkStats::new());

    link::install(UartBridge::new(rx_producer, tx_consumer, stats), fifo);
    info!("UART bridge installed");

    // Modem power
    let pins = match modem_pins(&mut board.pins, &config) {
        Ok(pins) => pins,
        Err(e) => {
            error!("Modem pin assignment failed: {}", e);
            halt()
        }
    };
    let mut power = Bg96Power::new(pins, Delay, Bg96Timing::default());
    info!("Powering modem on");
    let ready = match power.power_on() {
        Ok(ready) => ready,
        Err(e) => {
            error!("Modem power-on failed: {}", e);
            halt()
        }
    };

    let transport_config = TransportConfig {
        poll_interval_ms: config.link.poll_interval_ms,
        ..Default::default()
    };
    let mut transport = AtTransport::new(
        rx_consumer,
        tx_producer,
        tx_irq,
        EmbassyClock,
        transport_config,
        ready,
    );

    match modem::sync(&mut transport, config.modem.boot_timeout_ms) {
        Ok(probes) => info!("Modem answered after {} probe(s)", probes),
        Err(e) => {
            error!("Modem not responding: {}", e);
            let _ = power.power_off();
            halt()
        }
    }

    let identity = modem::identify(&mut transport, config.modem.command_timeout_ms);
    info!("Modem identity: {}", identity);
    if identity.model.as_str() != config.modem.model.as_str() {
        warn!(
            "Configured for {} but modem reports {}",
            config.modem.model.as_str(),
            identity.model.as_str()
        );
    }

    // Sensor on I2C0
    let i2c = I2c::new_blocking(
        board.i2c0,
        board.scl,
        board.sda,
        rp_i2c::embassy_config(&I2cConfig::FAST),
    );
    let mut sensor = Shtc3::new(RpI2c::new(i2c), Delay);
    match sensor.probe() {
        Ok(id) => info!("SHTC3 found, id {=u16:#06x}", id),
        Err(e) => warn!("SHTC3 probe failed: {}", e),
    }

    // Battery divider on ADC0
    let adc = Adc::new_blocking(board.adc, Default::default());
    let sense = Channel::new_pin(board.battery_sense, Pull::None);
    let battery = AdcBattery::new(
        RpAdcChannel::new(adc, sense),
        config.battery.vref_mv,
        config.battery.divider_num,
        config.battery.divider_den,
    );

    let telemetry = tasks::TelemetryConfig {
        report: config.report,
        server: config.server,
        command_timeout_ms: config.modem.command_timeout_ms,
    };
    // Modem transactions busy-wait, so telemetry holds the executor for up
    // to a full socket open; other tasks only run between its cycles
    spawner
        .spawn(tasks::telemetry_task(transport, sensor, battery, stats, telemetry))
        .unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Parse the embedded node.toml, falling back to defaults
fn load_config() -> NodeConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            // build.rs validates node.toml, so this only happens if the
            // two parsers disagree
            error!("Failed to parse embedded config: {}", e);
            error!("Using default configuration");
            NodeConfig::default()
        }
    }
}

/// Take the modem control lines named in the config
fn modem_pins(bank: &mut PinBank, config: &NodeConfig) -> Result<Bg96Pins<RpOutput>, PinError> {
    let modem = &config.modem;
    let mut line = |pin: nodelink_core::config::PinConfig| {
        bank.take(pin.pin)
            .map(|p| (RpOutput::new(p), polarity(pin.inverted)))
    };
    Ok(Bg96Pins {
        power_key: line(modem.power_key_pin)?,
        reset: line(modem.reset_pin)?,
        disable: line(modem.disable_pin)?,
        supply_enable: line(modem.supply_enable_pin)?,
    })
}

/// Park the node after a fatal setup error
fn halt() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}
