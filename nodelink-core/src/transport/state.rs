//! Transaction state machine
//!
//! The transport's behaviour is a function of the current state and an
//! event; this module owns the transition table.

/// Per-transaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportState {
    /// No transaction in flight; a command may be submitted
    #[default]
    Idle,
    /// Command queued, TX ring still draining to the UART
    Sending,
    /// Command fully handed to the UART, collecting the response
    AwaitingResponse,
    /// Terminator seen or response buffer filled
    Complete,
    /// Deadline passed without a terminator
    TimedOut,
}

/// Inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportEvent {
    /// Command accepted into the TX ring
    Submitted,
    /// TX ring observed empty
    TxDrained,
    /// Terminator found in the response
    TerminatorSeen,
    /// Response buffer full without a terminator
    CapacityReached,
    /// Deadline elapsed
    DeadlineElapsed,
    /// Outcome handed back to the caller
    Finished,
}

impl TransportState {
    /// Check if a transaction is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Sending | Self::AwaitingResponse)
    }

    /// Check if this is a terminal outcome awaiting `Finished`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::TimedOut)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: TransportEvent) -> Self {
        use TransportEvent::*;
        use TransportState::*;

        match (self, event) {
            (Idle, Submitted) => Sending,

            (Sending, TxDrained) => AwaitingResponse,
            // A fast modem may answer before the TX ring is observed empty
            (Sending | AwaitingResponse, TerminatorSeen | CapacityReached) => Complete,
            (Sending | AwaitingResponse, DeadlineElapsed) => TimedOut,

            (Complete | TimedOut, Finished) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let s = TransportState::Idle.transition(TransportEvent::Submitted);
        assert_eq!(s, TransportState::Sending);
        let s = s.transition(TransportEvent::TxDrained);
        assert_eq!(s, TransportState::AwaitingResponse);
        let s = s.transition(TransportEvent::TerminatorSeen);
        assert_eq!(s, TransportState::Complete);
        assert!(s.is_terminal());
        assert_eq!(s.transition(TransportEvent::Finished), TransportState::Idle);
    }

    #[test]
    fn test_timeout_path() {
        let s = TransportState::AwaitingResponse.transition(TransportEvent::DeadlineElapsed);
        assert_eq!(s, TransportState::TimedOut);
        assert_eq!(s.transition(TransportEvent::Finished), TransportState::Idle);
    }

    #[test]
    fn test_response_while_sending() {
        let s = TransportState::Sending.transition(TransportEvent::TerminatorSeen);
        assert_eq!(s, TransportState::Complete);
    }

    #[test]
    fn test_idle_ignores_stray_events() {
        for event in [
            TransportEvent::TxDrained,
            TransportEvent::TerminatorSeen,
            TransportEvent::DeadlineElapsed,
            TransportEvent::Finished,
        ] {
            assert_eq!(TransportState::Idle.transition(event), TransportState::Idle);
        }
    }

    #[test]
    fn test_busy_states() {
        assert!(!TransportState::Idle.is_busy());
        assert!(TransportState::Sending.is_busy());
        assert!(TransportState::AwaitingResponse.is_busy());
        assert!(!TransportState::Complete.is_busy());
    }
}
