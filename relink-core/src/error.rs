/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Error types for the relink session layer.
//!
//! This module provides a unified error hierarchy using `thiserror` for typed,
//! domain-specific errors across all relink operations.
//!
//! None of these errors cross the session's public surface as panics: every
//! failure path is a logged diagnostic plus a state transition or a dropped
//! operation, and callers observe failures only through the callbacks they
//! registered.

use thiserror::Error;

/// Result type alias using [`RelinkError`] as the error type.
pub type Result<T> = std::result::Result<T, RelinkError>;

/// Top-level error type for all relink operations.
#[derive(Debug, Error)]
pub enum RelinkError {
    /// Error in session layer operations.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// I/O error from an underlying transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in session layer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No transport has been bound via `init`.
    #[error("no transport bound, call init first")]
    NotInitialized,

    /// The session is not in a valid state for the operation.
    #[error("invalid state for {operation}: current state is {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The session state at the time of the call.
        state: String,
    },

    /// A send was attempted while the session cannot transmit or queue.
    #[error("cannot send in state {state}")]
    SendUnavailable {
        /// The session state at the time of the call.
        state: String,
    },

    /// No endpoint has been recorded for a reconnect attempt.
    #[error("no remembered endpoint to reconnect to")]
    NoEndpoint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_display() {
        let err = SessionError::InvalidState {
            operation: "connect",
            state: "working".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid state for connect: current state is working"
        );
    }

    #[test]
    fn test_relink_error_from_session() {
        let session_err = SessionError::NotInitialized;
        let err: RelinkError = session_err.into();
        assert!(matches!(
            err,
            RelinkError::Session(SessionError::NotInitialized)
        ));
    }

    #[test]
    fn test_send_unavailable_display() {
        let err = SessionError::SendUnavailable {
            state: "closed".to_string(),
        };
        assert_eq!(err.to_string(), "cannot send in state closed");
    }
}
