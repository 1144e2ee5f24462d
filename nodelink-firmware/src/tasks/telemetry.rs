//! Telemetry task
//!
//! Every report interval: sample the sensor and battery, encode a
//! payload and, when a server is configured, push it over a fresh TCP
//! socket. The socket is closed again after each report so the modem
//! can drop back to idle between cycles.

use defmt::*;
use embassy_rp::peripherals::I2C0;
use embassy_time::{Delay, Timer};

use nodelink_core::config::{ReportConfig, ServerConfig};
use nodelink_core::link::{LinkSnapshot, LinkStats};
use nodelink_core::traits::{BatteryMonitor, TemperatureHumiditySensor};
use nodelink_drivers::sensor::{AdcBattery, Shtc3};
use nodelink_hal_rp2040::{RpAdcChannel, RpI2c};
use nodelink_protocol::{encode_payload, Reading};

use crate::modem::{self, ModemError, Transport};

pub type Sensor = Shtc3<RpI2c<I2C0>, Delay>;
pub type Battery = AdcBattery<RpAdcChannel>;

/// Payload buffer; fits the text format with room to spare
const PAYLOAD_SIZE: usize = 64;

/// Settings the task needs from `NodeConfig`
pub struct TelemetryConfig {
    pub report: ReportConfig,
    pub server: ServerConfig,
    pub command_timeout_ms: u32,
}

#[embassy_executor::task]
pub async fn telemetry_task(
    mut transport: Transport,
    mut sensor: Sensor,
    mut battery: Battery,
    stats: &'static LinkStats,
    config: TelemetryConfig,
) {
    info!(
        "Telemetry task started: every {}s as {}",
        config.report.interval_s, config.report.format
    );
    if !config.server.is_configured() {
        warn!("No server configured, readings are only logged");
    }

    let mut seq: u32 = 0;
    let mut last = stats.snapshot();

    loop {
        match sample(&mut sensor, &mut battery, seq) {
            Some(reading) => {
                info!(
                    "Reading {}: {} c°C, {} c%RH, battery {}%",
                    reading.seq,
                    reading.temperature_centi,
                    reading.humidity_centi,
                    reading.battery_percent
                );

                let mut buf = [0u8; PAYLOAD_SIZE];
                let encoded = encode_payload(&reading, config.report.format, &mut buf);
                if encoded.truncated {
                    warn!("Payload truncated to {} bytes", encoded.len);
                }

                if config.server.is_configured() {
                    match report(&mut transport, &config, &buf[..encoded.len]) {
                        Ok(()) => debug!("Report {} sent", reading.seq),
                        Err(e) => error!("Report {} failed: {}", reading.seq, e),
                    }
                }
                seq = seq.wrapping_add(1);
            }
            None => warn!("No reading this cycle"),
        }

        let now = stats.snapshot();
        log_link(&now.since(&last));
        last = now;

        Timer::after_secs(config.report.interval_s as u64).await;
    }
}

/// Take one reading; the battery is optional, the sensor is not
fn sample(sensor: &mut Sensor, battery: &mut Battery, seq: u32) -> Option<Reading> {
    let measurement = match sensor.read() {
        Ok(m) => m,
        Err(e) => {
            error!("Sensor read failed: {}", e);
            return None;
        }
    };

    let battery_percent = battery.read_percent().unwrap_or_else(|e| {
        warn!("Battery read failed: {}", e);
        0
    });

    Some(Reading {
        seq,
        temperature_centi: measurement.temperature_centi,
        humidity_centi: measurement.humidity_centi,
        battery_percent,
    })
}

/// Open, send, close
///
/// The socket is closed even when the send fails; the send error wins.
fn report(
    transport: &mut Transport,
    config: &TelemetryConfig,
    payload: &[u8],
) -> Result<(), ModemError> {
    let timeout = config.command_timeout_ms;
    let connect_id = config.server.connect_id;

    modem::open_socket(transport, &config.server, timeout)?;
    let sent = modem::send(transport, connect_id, payload, timeout);
    let closed = modem::close_socket(transport, connect_id, timeout);
    sent.and(closed)
}

fn log_link(delta: &LinkSnapshot) {
    if delta.rx_dropped > 0 {
        warn!("UART RX overrun: {} bytes dropped", delta.rx_dropped);
    }
    debug!(
        "Link: {} irqs, {} bytes in, {} bytes out",
        delta.interrupts, delta.rx_bytes, delta.tx_bytes
    );
}
