//! GPIO output adapter

use embassy_rp::gpio::{AnyPin, Level, Output};
use embassy_rp::Peri;
use nodelink_hal::gpio::{OutputPin, Polarity};

/// embassy-rp output driving a `nodelink-hal` [`OutputPin`]
pub struct RpOutput(Output<'static>);

impl RpOutput {
    /// Configure a pin as an output, driven low
    pub fn new(pin: Peri<'static, AnyPin>) -> Self {
        Self(Output::new(pin, Level::Low))
    }
}

/// Polarity for a config pin's inversion flag
pub fn polarity(inverted: bool) -> Polarity {
    if inverted {
        Polarity::ActiveLow
    } else {
        Polarity::ActiveHigh
    }
}

impl OutputPin for RpOutput {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}
