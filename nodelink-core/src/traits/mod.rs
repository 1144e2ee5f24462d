//! Hardware abstraction traits
//!
//! These traits define the interface between the node logic and the
//! board- or device-specific implementations.

pub mod clock;
pub mod modem;
pub mod sensor;

pub use clock::Clock;
pub use modem::{ModemPower, ModemReady};
pub use sensor::{BatteryMonitor, Measurement, SensorError, TemperatureHumiditySensor};
