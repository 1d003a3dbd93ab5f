/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Session lifecycle state machine.
//!
//! The session holds exactly one [`SessionState`] at any time and every
//! mutation goes through a validated transition point. The target of the
//! connected transition depends on runtime data (whether a handshake
//! callback is registered), so this is a runtime machine rather than a
//! typestate one: `Connecting` may legally move to either `Checking` or
//! `Working`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// No connection. The only state from which `connect` is accepted.
    #[default]
    Closed,
    /// Transport connect issued, no connected event yet.
    Connecting,
    /// Transport connected, application-layer handshake in progress.
    Checking,
    /// Fully usable: requests transmit immediately, responses are expected.
    Working,
}

impl SessionState {
    /// Whether the machine may move from `self` to `next`.
    ///
    /// Valid paths: `Closed → Connecting`, `Connecting → Checking`,
    /// `Connecting → Working`, `Checking → Working`, and `* → Closed`.
    #[must_use]
    pub fn can_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (_, Self::Closed)
                | (Self::Closed, Self::Connecting)
                | (Self::Connecting, Self::Checking)
                | (Self::Connecting, Self::Working)
                | (Self::Checking, Self::Working)
        )
    }

    /// Whether outbound requests are buffered rather than transmitted.
    #[must_use]
    pub const fn is_buffering(self) -> bool {
        matches!(self, Self::Connecting | Self::Checking)
    }

    /// Whether requests transmit immediately.
    #[must_use]
    pub const fn is_working(self) -> bool {
        matches!(self, Self::Working)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::Connecting => "connecting",
            Self::Checking => "checking",
            Self::Working => "working",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_to_working() {
        // Direct path, no handshake callback registered.
        assert!(SessionState::Closed.can_transition(SessionState::Connecting));
        assert!(SessionState::Connecting.can_transition(SessionState::Working));

        // Handshake path.
        assert!(SessionState::Connecting.can_transition(SessionState::Checking));
        assert!(SessionState::Checking.can_transition(SessionState::Working));
    }

    #[test]
    fn test_any_state_may_close() {
        for state in [
            SessionState::Closed,
            SessionState::Connecting,
            SessionState::Checking,
            SessionState::Working,
        ] {
            assert!(state.can_transition(SessionState::Closed));
        }
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!SessionState::Closed.can_transition(SessionState::Working));
        assert!(!SessionState::Closed.can_transition(SessionState::Checking));
        assert!(!SessionState::Working.can_transition(SessionState::Connecting));
        assert!(!SessionState::Working.can_transition(SessionState::Checking));
        assert!(!SessionState::Checking.can_transition(SessionState::Connecting));
    }

    #[test]
    fn test_buffering_states() {
        assert!(SessionState::Connecting.is_buffering());
        assert!(SessionState::Checking.is_buffering());
        assert!(!SessionState::Working.is_buffering());
        assert!(!SessionState::Closed.is_buffering());
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::Checking.to_string(), "checking");
        assert_eq!(SessionState::default(), SessionState::Closed);
    }
}
