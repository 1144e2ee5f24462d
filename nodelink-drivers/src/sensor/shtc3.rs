//! Sensirion SHTC3 temperature/humidity sensor
//!
//! The sensor sleeps between samples. Each read wakes it, runs one
//! normal-mode measurement with temperature first and clock stretching
//! off, then puts it back to sleep.
//!
//! Every 16-bit word from the sensor is followed by a CRC-8
//! (polynomial 0x31, init 0xFF).

use embedded_hal::delay::DelayNs;
use nodelink_core::traits::{Measurement, SensorError, TemperatureHumiditySensor};
use nodelink_hal::I2cBus;

/// Fixed 7-bit bus address
pub const ADDRESS: u8 = 0x70;

const CMD_WAKEUP: u16 = 0x3517;
const CMD_SLEEP: u16 = 0xB098;
const CMD_READ_ID: u16 = 0xEFC8;
const CMD_MEASURE_T_FIRST: u16 = 0x7866;

/// Wake-up time, 240µs max
const WAKEUP_US: u32 = 240;
/// Normal-mode measurement time, 12.1ms max
const MEASURE_MS: u32 = 13;

/// ID register bits that identify an SHTC3
const ID_MASK: u16 = 0x083F;
const ID_SHTC3: u16 = 0x0807;

/// CRC-8 as used by Sensirion sensors
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Check a `[msb, lsb, crc]` triple and return the word
fn checked_word(triple: &[u8]) -> Result<u16, SensorError> {
    if crc8(&triple[..2]) != triple[2] {
        return Err(SensorError::Crc);
    }
    Ok(u16::from_be_bytes([triple[0], triple[1]]))
}

/// Raw temperature to 0.01°C: T = -45 + 175 * raw / 2^16
fn temperature_centi(raw: u16) -> i32 {
    -4500 + ((17_500 * raw as i64) >> 16) as i32
}

/// Raw humidity to 0.01 %RH: RH = 100 * raw / 2^16
fn humidity_centi(raw: u16) -> u32 {
    ((10_000 * raw as u64) >> 16) as u32
}

/// SHTC3 on an I2C bus
pub struct Shtc3<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C: I2cBus, D: DelayNs> Shtc3<I2C, D> {
    /// Create a driver; call [`Shtc3::probe`] before the first read
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self { i2c, delay }
    }

    fn command(&mut self, cmd: u16) -> Result<(), SensorError> {
        self.i2c
            .write(ADDRESS, &cmd.to_be_bytes())
            .map_err(|_| SensorError::Bus)
    }

    fn wake(&mut self) -> Result<(), SensorError> {
        self.command(CMD_WAKEUP)?;
        self.delay.delay_us(WAKEUP_US);
        Ok(())
    }

    /// Check the device identifier and leave the sensor asleep
    ///
    /// Returns the raw ID register.
    pub fn probe(&mut self) -> Result<u16, SensorError> {
        self.wake()?;
        let result = self.read_id();
        // Best effort; the ID result is what the caller needs
        let _ = self.command(CMD_SLEEP);
        result
    }

    fn read_id(&mut self) -> Result<u16, SensorError> {
        self.command(CMD_READ_ID)?;
        let mut buf = [0u8; 3];
        self.i2c
            .read(ADDRESS, &mut buf)
            .map_err(|_| SensorError::Bus)?;
        let id = checked_word(&buf)?;
        if id & ID_MASK != ID_SHTC3 {
            return Err(SensorError::UnknownDevice);
        }
        Ok(id)
    }

    fn measure(&mut self) -> Result<Measurement, SensorError> {
        self.command(CMD_MEASURE_T_FIRST)?;
        self.delay.delay_ms(MEASURE_MS);

        let mut buf = [0u8; 6];
        self.i2c
            .read(ADDRESS, &mut buf)
            .map_err(|_| SensorError::Bus)?;

        let raw_t = checked_word(&buf[0..3])?;
        let raw_rh = checked_word(&buf[3..6])?;
        Ok(Measurement {
            temperature_centi: temperature_centi(raw_t),
            humidity_centi: humidity_centi(raw_rh),
        })
    }

    /// Release the bus and delay
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C: I2cBus, D: DelayNs> TemperatureHumiditySensor for Shtc3<I2C, D> {
    fn read(&mut self) -> Result<Measurement, SensorError> {
        self.wake()?;
        let result = self.measure();
        let _ = self.command(CMD_SLEEP);
        result
    }
}
