//! Quectel BG96 power sequencing
//!
//! Power-on:
//! 1. Enable the 3.8V supply and let it settle
//! 2. Release RESET_N and W_DISABLE
//! 3. Hold PWRKEY for at least 500ms
//! 4. Wait for the modem firmware to boot
//!
//! Power-off holds PWRKEY for at least 650ms, waits for the modem to
//! detach and shut down, then cuts the supply.

use embedded_hal::delay::DelayNs;
use nodelink_core::traits::{ModemPower, ModemReady};
use nodelink_hal::gpio::{ControlLine, OutputPin, Polarity};

/// Sequence timing in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bg96Timing {
    pub supply_settle_ms: u32,
    pub power_key_on_ms: u32,
    pub boot_ms: u32,
    pub power_key_off_ms: u32,
    pub shutdown_ms: u32,
}

impl Default for Bg96Timing {
    fn default() -> Self {
        Self {
            supply_settle_ms: 30,
            power_key_on_ms: 500,
            boot_ms: 4_800,
            power_key_off_ms: 650,
            shutdown_ms: 2_000,
        }
    }
}

/// Power sequencing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerError {
    /// The modem is already on; its ready token was issued before
    AlreadyOn,
}

/// Control lines of a BG96
pub struct Bg96Pins<P> {
    pub power_key: (P, Polarity),
    pub reset: (P, Polarity),
    pub disable: (P, Polarity),
    pub supply_enable: (P, Polarity),
}

/// BG96 power sequencer
pub struct Bg96Power<P, D> {
    power_key: ControlLine<P>,
    reset: ControlLine<P>,
    disable: ControlLine<P>,
    supply: ControlLine<P>,
    delay: D,
    timing: Bg96Timing,
    on: bool,
}

impl<P: OutputPin, D: DelayNs> Bg96Power<P, D> {
    /// Take the control lines; the modem is held in reset with the
    /// supply off until [`ModemPower::power_on`]
    pub fn new(pins: Bg96Pins<P>, delay: D, timing: Bg96Timing) -> Self {
        let mut reset = ControlLine::new(pins.reset.0, pins.reset.1);
        reset.assert();
        let mut disable = ControlLine::new(pins.disable.0, pins.disable.1);
        disable.assert();

        Self {
            power_key: ControlLine::new(pins.power_key.0, pins.power_key.1),
            reset,
            disable,
            supply: ControlLine::new(pins.supply_enable.0, pins.supply_enable.1),
            delay,
            timing,
            on: false,
        }
    }

    fn pulse_power_key(&mut self, hold_ms: u32) {
        self.power_key.assert();
        self.delay.delay_ms(hold_ms);
        self.power_key.deassert();
    }
}

impl<P: OutputPin, D: DelayNs> ModemPower for Bg96Power<P, D> {
    type Error = PowerError;

    fn power_on(&mut self) -> Result<ModemReady, PowerError> {
        if self.on {
            return Err(PowerError::AlreadyOn);
        }

        self.supply.assert();
        self.delay.delay_ms(self.timing.supply_settle_ms);

        self.reset.deassert();
        self.disable.deassert();

        self.pulse_power_key(self.timing.power_key_on_ms);
        self.delay.delay_ms(self.timing.boot_ms);

        self.on = true;
        Ok(ModemReady::assume_booted())
    }

    fn power_off(&mut self) -> Result<(), PowerError> {
        if !self.on {
            return Ok(());
        }

        self.pulse_power_key(self.timing.power_key_off_ms);
        self.delay.delay_ms(self.timing.shutdown_ms);

        self.disable.assert();
        self.reset.assert();
        self.supply.deassert();
        self.on = false;
        Ok(())
    }

    fn is_powered(&self) -> bool {
        self.supply.is_asserted()
    }
}
