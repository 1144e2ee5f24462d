//! Blocking I2C adapter

use embassy_rp::i2c::{self as rp_i2c, Blocking, Error, I2c, Instance};
use nodelink_hal::i2c::{I2cBus, I2cConfig};

/// Translate a board-independent I2C configuration
pub fn embassy_config(config: &I2cConfig) -> rp_i2c::Config {
    let mut cfg = rp_i2c::Config::default();
    cfg.frequency = config.frequency;
    cfg
}

/// embassy-rp blocking I2C master as an [`I2cBus`]
pub struct RpI2c<T: Instance>(I2c<'static, T, Blocking>);

impl<T: Instance> RpI2c<T> {
    pub fn new(i2c: I2c<'static, T, Blocking>) -> Self {
        Self(i2c)
    }
}

impl<T: Instance> I2cBus for RpI2c<T> {
    type Error = Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Error> {
        self.0.blocking_write(address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Error> {
        self.0.blocking_read(address, buf)
    }
}
