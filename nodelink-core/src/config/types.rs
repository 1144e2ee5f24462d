//! Node configuration types
//!
//! Defaults describe the reference board: an RP2040 with a Quectel BG96
//! on UART0 and an SHTC3 on I2C0. Bus pins are fixed by the board;
//! modem control lines are assigned here.

use heapless::String;
use nodelink_protocol::PayloadFormat;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum modem model name length
pub const MAX_MODEL_LEN: usize = 16;

/// Maximum server host name length
pub const MAX_HOST_LEN: usize = 64;

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO pin number (0-29 for RP2040)
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
}

impl PinConfig {
    /// Active-high pin
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Active-low pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }
}

/// Cellular modem wiring and timing
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModemConfig {
    /// Model name, informational
    pub model: String<MAX_MODEL_LEN>,
    /// PWRKEY line
    pub power_key_pin: PinConfig,
    /// RESET_N line
    pub reset_pin: PinConfig,
    /// W_DISABLE line
    pub disable_pin: PinConfig,
    /// Enable of the 3.8V supply rail
    pub supply_enable_pin: PinConfig,
    /// Time allowed for `RDY` after power-on (ms)
    pub boot_timeout_ms: u32,
    /// Timeout for ordinary commands (ms)
    pub command_timeout_ms: u32,
}

impl Default for ModemConfig {
    fn default() -> Self {
        let mut model = String::new();
        let _ = model.push_str("BG96");
        Self {
            model,
            power_key_pin: PinConfig::new(2),
            reset_pin: PinConfig::new(3),
            disable_pin: PinConfig::new(4),
            supply_enable_pin: PinConfig::new(5),
            boot_timeout_ms: 10_000,
            command_timeout_ms: 1_000,
        }
    }
}

/// UART link to the modem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    /// Baud rate
    pub baudrate: u32,
    /// Transport pause between polls (ms)
    pub poll_interval_ms: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baudrate: 115_200,
            poll_interval_ms: 10,
        }
    }
}

/// Battery measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatteryConfig {
    /// ADC reference voltage (mV)
    pub vref_mv: u16,
    /// Battery voltage divided by this ratio, numerator
    pub divider_num: u16,
    /// Battery voltage divided by this ratio, denominator
    pub divider_den: u16,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            vref_mv: 3300,
            divider_num: 2,
            divider_den: 1,
        }
    }
}

/// Telemetry reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReportConfig {
    /// Seconds between reports
    pub interval_s: u32,
    /// Payload encoding
    pub format: PayloadFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            interval_s: 300,
            format: PayloadFormat::Text,
        }
    }
}

/// Remote endpoint receiving reports
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServerConfig {
    /// Host name or dotted address
    pub host: String<MAX_HOST_LEN>,
    /// TCP port
    pub port: u16,
    /// PDP context to open the socket on
    pub context_id: u8,
    /// Socket index on the modem
    pub connect_id: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 5000,
            context_id: 1,
            connect_id: 0,
        }
    }
}

impl ServerConfig {
    /// Check if a destination has been configured
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && self.port != 0
    }
}

/// Complete node configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeConfig {
    pub modem: ModemConfig,
    pub link: LinkConfig,
    pub battery: BatteryConfig,
    pub report: ReportConfig,
    pub server: ServerConfig,
}
