//! Battery gauge from an ADC divider tap
//!
//! The battery is measured through a resistor divider into a 12-bit ADC.
//! State of charge comes from a Li-ion open-circuit voltage table.

use nodelink_core::traits::{BatteryMonitor, SensorError};
use nodelink_hal::AdcReader;

/// Single-cell Li-ion discharge curve
///
/// Table format: (millivolts, percent), sorted by decreasing voltage.
const SOC_TABLE: &[(u16, u8)] = &[
    (4200, 100),
    (4100, 90),
    (4000, 79),
    (3900, 68),
    (3800, 55),
    (3700, 40),
    (3600, 20),
    (3500, 8),
    (3400, 3),
    (3300, 0),
];

/// Battery voltage sensed through a divider
pub struct AdcBattery<ADC> {
    adc: ADC,
    /// ADC reference voltage in mV
    vref_mv: u16,
    /// Battery voltage = tap voltage * num / den
    divider_num: u16,
    divider_den: u16,
}

impl<ADC> AdcBattery<ADC> {
    /// Create a gauge
    ///
    /// # Arguments
    /// - `adc`: ADC channel on the divider tap
    /// - `vref_mv`: Reference voltage in millivolts (typically 3300)
    /// - `divider_num`/`divider_den`: divider ratio, e.g. 2/1 for two
    ///   equal resistors
    pub fn new(adc: ADC, vref_mv: u16, divider_num: u16, divider_den: u16) -> Self {
        Self {
            adc,
            vref_mv,
            divider_num,
            divider_den: divider_den.max(1),
        }
    }

    /// Convert a raw reading to battery millivolts
    pub fn adc_to_millivolts(&self, raw: u16) -> u32 {
        let tap_mv = raw as u32 * self.vref_mv as u32 / 4096;
        tap_mv * self.divider_num as u32 / self.divider_den as u32
    }

    /// State of charge for a battery voltage
    ///
    /// Clamped to the table ends, linear between entries.
    pub fn millivolts_to_percent(mv: u32) -> u8 {
        let (top_mv, top_pct) = SOC_TABLE[0];
        if mv >= top_mv as u32 {
            return top_pct;
        }
        let (bottom_mv, bottom_pct) = SOC_TABLE[SOC_TABLE.len() - 1];
        if mv <= bottom_mv as u32 {
            return bottom_pct;
        }

        for pair in SOC_TABLE.windows(2) {
            let (v_high, p_high) = pair[0];
            let (v_low, p_low) = pair[1];
            if mv <= v_high as u32 && mv >= v_low as u32 {
                let v_range = (v_high - v_low) as u32;
                let p_range = (p_high - p_low) as u32;
                let v_offset = mv - v_low as u32;
                return p_low + (p_range * v_offset / v_range) as u8;
            }
        }

        bottom_pct
    }
}

impl<ADC: AdcReader> BatteryMonitor for AdcBattery<ADC> {
    fn read_percent(&mut self) -> Result<u8, SensorError> {
        let raw = self.adc.read().map_err(|_| SensorError::Bus)?;

        // A grounded tap means the divider or battery is disconnected
        if raw < 10 {
            return Err(SensorError::OutOfRange);
        }

        Ok(Self::millivolts_to_percent(self.adc_to_millivolts(raw)))
    }
}
