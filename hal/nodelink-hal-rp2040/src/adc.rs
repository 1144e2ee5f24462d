//! Blocking ADC channel adapter
//!
//! RP2040 has a single ADC with 5 channels:
//! - ADC0: GPIO26
//! - ADC1: GPIO27
//! - ADC2: GPIO28
//! - ADC3: GPIO29
//! - ADC4: Internal temperature sensor

use embassy_rp::adc::{Adc, Blocking, Channel, Error};
use nodelink_hal::adc::AdcReader;

/// One ADC channel with exclusive use of the converter
pub struct RpAdcChannel {
    adc: Adc<'static, Blocking>,
    channel: Channel<'static>,
}

impl RpAdcChannel {
    pub fn new(adc: Adc<'static, Blocking>, channel: Channel<'static>) -> Self {
        Self { adc, channel }
    }
}

impl AdcReader for RpAdcChannel {
    type Error = Error;

    fn read(&mut self) -> Result<u16, Error> {
        self.adc.blocking_read(&mut self.channel)
    }
}
