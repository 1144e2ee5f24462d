//! embassy-time backed transport clock

use embassy_time::{block_for, Duration, Instant};
use nodelink_core::traits::Clock;

/// Uptime clock that busy-waits between transport polls
///
/// The UART interrupt keeps running while the foreground spins, so
/// responses accumulate in the RX ring during the pause.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&mut self) -> u64 {
        Instant::now().as_millis()
    }

    fn pause(&mut self, ms: u32) {
        block_for(Duration::from_millis(ms as u64));
    }
}
