//! AT command transport
//!
//! Foreground side of the UART link. See [`AtTransport`] for the
//! transaction model and [`TransportState`] for its state machine.

pub mod at;
pub mod state;

pub use at::{AtTransport, TransportConfig, TransportError, DEFAULT_POLL_INTERVAL_MS};
pub use state::{TransportEvent, TransportState};
