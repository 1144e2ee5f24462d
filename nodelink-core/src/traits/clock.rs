//! Monotonic time source for polling loops

/// Millisecond clock with a way to wait
///
/// The transport checks `now_ms` once per poll and calls `pause` between
/// polls. Implementations may spin, sleep until the next interrupt, or
/// (in tests) advance simulated time.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed point; never goes backwards
    fn now_ms(&mut self) -> u64;

    /// Wait roughly `ms` milliseconds
    fn pause(&mut self, ms: u32);
}
