//! Environmental sensor and battery traits

/// Errors that can occur while sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Bus transfer failed or device did not acknowledge
    Bus,
    /// Checksum over the returned data did not match
    Crc,
    /// Device returned an unexpected identifier
    UnknownDevice,
    /// Reading outside the physically plausible range
    OutOfRange,
}

/// One temperature/humidity sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Temperature in 0.01°C
    pub temperature_centi: i32,
    /// Relative humidity in 0.01%
    pub humidity_centi: u32,
}

/// Combined temperature and humidity sensor
pub trait TemperatureHumiditySensor {
    /// Take one measurement
    ///
    /// Takes `&mut self` because a measurement involves bus traffic.
    fn read(&mut self) -> Result<Measurement, SensorError>;
}

/// Battery state-of-charge estimate
pub trait BatteryMonitor {
    /// Battery level in percent (0-100)
    fn read_percent(&mut self) -> Result<u8, SensorError>;
}
