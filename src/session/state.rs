//! Session state machine
//!
//! Tracks a client session from accept to teardown.

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connected, no text relayed yet (welcome still pending)
    #[default]
    AwaitingFirstMessage,
    /// Welcome sent, relaying normally
    Active,
    /// Stream ended or failed
    Closed,
}

impl SessionPhase {
    /// Move to `Active` after the first relayed chunk
    ///
    /// Returns true only on the transition itself, so the welcome is sent
    /// exactly once.
    pub fn on_first_message(&mut self) -> bool {
        if *self == SessionPhase::AwaitingFirstMessage {
            *self = SessionPhase::Active;
            true
        } else {
            false
        }
    }

    /// Move to `Closed`
    pub fn close(&mut self) {
        *self = SessionPhase::Closed;
    }

    pub fn is_closed(&self) -> bool {
        *self == SessionPhase::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let mut phase = SessionPhase::default();
        assert_eq!(phase, SessionPhase::AwaitingFirstMessage);

        assert!(phase.on_first_message());
        assert_eq!(phase, SessionPhase::Active);

        // Second message does not re-trigger the welcome
        assert!(!phase.on_first_message());

        phase.close();
        assert!(phase.is_closed());
        assert!(!phase.on_first_message());
    }
}
