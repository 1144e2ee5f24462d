//! Environmental sensors and battery gauge

pub mod battery;
pub mod shtc3;

pub use battery::AdcBattery;
pub use shtc3::Shtc3;
