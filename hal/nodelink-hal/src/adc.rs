//! ADC abstractions

/// One ADC channel
pub trait AdcReader {
    /// Error type for conversions
    type Error;

    /// Take one 12-bit sample (0-4095)
    fn read(&mut self) -> Result<u16, Self::Error>;
}
