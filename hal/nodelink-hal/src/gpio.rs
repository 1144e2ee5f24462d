//! GPIO pin abstractions
//!
//! Modem control lines are usually driven through level shifters or
//! transistors, so the electrical level of a pin and the logical meaning
//! of the signal do not always agree. [`ControlLine`] captures that
//! mapping once, at board setup.

/// Digital output pin
pub trait OutputPin {
    /// Drive the pin high (logic 1)
    fn set_high(&mut self);

    /// Drive the pin low (logic 0)
    fn set_low(&mut self);

    /// Drive the pin to a specific level
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently driven high
    fn is_set_high(&self) -> bool;
}

/// Electrical level at which a control signal is considered asserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    #[default]
    ActiveHigh,
    ActiveLow,
}

/// An output pin paired with the polarity of the signal it carries
pub struct ControlLine<P> {
    pin: P,
    polarity: Polarity,
}

impl<P: OutputPin> ControlLine<P> {
    /// Wrap a pin and leave the signal deasserted
    pub fn new(pin: P, polarity: Polarity) -> Self {
        let mut line = Self { pin, polarity };
        line.deassert();
        line
    }

    /// Drive the signal to its active level
    pub fn assert(&mut self) {
        self.pin.set_state(self.polarity == Polarity::ActiveHigh);
    }

    /// Drive the signal to its inactive level
    pub fn deassert(&mut self) {
        self.pin.set_state(self.polarity == Polarity::ActiveLow);
    }

    /// Check if the signal is currently asserted
    pub fn is_asserted(&self) -> bool {
        self.pin.is_set_high() == (self.polarity == Polarity::ActiveHigh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakePin(bool);

    impl OutputPin for FakePin {
        fn set_high(&mut self) {
            self.0 = true;
        }

        fn set_low(&mut self) {
            self.0 = false;
        }

        fn is_set_high(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn test_active_low_line() {
        let mut line = ControlLine::new(FakePin(false), Polarity::ActiveLow);
        // Deasserted on construction means driven high
        assert!(line.pin.is_set_high());
        assert!(!line.is_asserted());

        line.assert();
        assert!(!line.pin.is_set_high());
        assert!(line.is_asserted());
    }

    #[test]
    fn test_active_high_line() {
        let mut line = ControlLine::new(FakePin(true), Polarity::ActiveHigh);
        assert!(!line.is_asserted());

        line.assert();
        assert!(line.pin.is_set_high());
    }
}
