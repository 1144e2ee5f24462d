//! Modem power sequencing

/// Proof that the modem finished its power-on sequence
///
/// The AT transport can only be built from one of these, so no command
/// reaches the UART before the modem is able to answer. Deliberately not
/// `Clone`: one power-on, one token.
#[derive(Debug)]
pub struct ModemReady {
    _private: (),
}

impl ModemReady {
    /// Issue a token once the modem is known to be booted
    ///
    /// Power sequencers call this at the end of a successful sequence.
    pub fn assume_booted() -> Self {
        Self { _private: () }
    }
}

/// Power sequencing of a cellular modem
///
/// Implementations drive the power key, reset, disable and supply-enable
/// lines in the order the modem's hardware design guide requires.
pub trait ModemPower {
    /// Error type for the control lines
    type Error;

    /// Run the power-on sequence and wait for the modem to boot
    fn power_on(&mut self) -> Result<ModemReady, Self::Error>;

    /// Run the power-off sequence
    fn power_off(&mut self) -> Result<(), Self::Error>;

    /// Check if the modem supply is enabled
    fn is_powered(&self) -> bool;
}
