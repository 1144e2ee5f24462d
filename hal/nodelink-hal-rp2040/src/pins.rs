//! Board pin split and config-driven GPIO allocation
//!
//! Bus pins are fixed by the board and handed out typed, so the blocking
//! drivers can check pin functions at compile time. The remaining GPIOs
//! go into a [`PinBank`] and are taken by number from `node.toml`.
//!
//! Fixed assignments:
//! - GPIO0/GPIO1: UART0 TX/RX to the modem
//! - GPIO8/GPIO9: I2C0 SDA/SCL to the sensor
//! - GPIO26: ADC0 battery divider tap

use embassy_rp::gpio::AnyPin;
use embassy_rp::peripherals::{ADC, I2C0, PIN_0, PIN_1, PIN_26, PIN_8, PIN_9, UART0};
use embassy_rp::{Peri, Peripherals};

/// Number of user GPIOs on the RP2040
pub const GPIO_COUNT: usize = 30;

/// GPIOs owned by [`Board`] fields
pub const RESERVED_PINS: [u8; 5] = [0, 1, 8, 9, 26];

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken
    AlreadyTaken,
    /// Pin wired to a board bus
    Reserved,
}

/// Peripherals of the reference node board
pub struct Board {
    pub uart0: Peri<'static, UART0>,
    pub uart_tx: Peri<'static, PIN_0>,
    pub uart_rx: Peri<'static, PIN_1>,
    pub i2c0: Peri<'static, I2C0>,
    pub sda: Peri<'static, PIN_8>,
    pub scl: Peri<'static, PIN_9>,
    pub adc: Peri<'static, ADC>,
    pub battery_sense: Peri<'static, PIN_26>,
    /// Everything else, by number
    pub pins: PinBank,
}

impl Board {
    /// Split the chip peripherals into board functions
    pub fn split(p: Peripherals) -> Self {
        let pins = PinBank {
            pins: [
                None,
                None,
                Some(p.PIN_2.into()),
                Some(p.PIN_3.into()),
                Some(p.PIN_4.into()),
                Some(p.PIN_5.into()),
                Some(p.PIN_6.into()),
                Some(p.PIN_7.into()),
                None,
                None,
                Some(p.PIN_10.into()),
                Some(p.PIN_11.into()),
                Some(p.PIN_12.into()),
                Some(p.PIN_13.into()),
                Some(p.PIN_14.into()),
                Some(p.PIN_15.into()),
                Some(p.PIN_16.into()),
                Some(p.PIN_17.into()),
                Some(p.PIN_18.into()),
                Some(p.PIN_19.into()),
                Some(p.PIN_20.into()),
                Some(p.PIN_21.into()),
                Some(p.PIN_22.into()),
                Some(p.PIN_23.into()),
                Some(p.PIN_24.into()),
                Some(p.PIN_25.into()),
                None,
                Some(p.PIN_27.into()),
                Some(p.PIN_28.into()),
                Some(p.PIN_29.into()),
            ],
        };

        Self {
            uart0: p.UART0,
            uart_tx: p.PIN_0,
            uart_rx: p.PIN_1,
            i2c0: p.I2C0,
            sda: p.PIN_8,
            scl: p.PIN_9,
            adc: p.ADC,
            battery_sense: p.PIN_26,
            pins,
        }
    }
}

/// GPIOs not claimed by the board, taken by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
}

impl PinBank {
    /// Take a pin by number
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        if pin_num as usize >= GPIO_COUNT {
            return Err(PinError::InvalidPin);
        }
        if RESERVED_PINS.contains(&pin_num) {
            return Err(PinError::Reserved);
        }
        self.pins[pin_num as usize]
            .take()
            .ok_or(PinError::AlreadyTaken)
    }
}
