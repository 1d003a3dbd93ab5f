/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! # Relink
//!
//! A resilient client session layer for command-framed protocols over TCP.
//!
//! Relink keeps one logical connection alive across transport failures: it
//! reconnects automatically, monitors liveness with heartbeats, buffers
//! requests issued before the connection is usable, and correlates responses
//! back to their requests by command identifier.
//!
//! ## Features
//!
//! - **Lifecycle state machine**: Closed, connecting, checking, and working
//!   states with validated transitions
//! - **Auto-reconnection**: Delayed retry against the last successful
//!   endpoint, with an application veto hook
//! - **Heartbeat & liveness**: Inbound silence force-closes the connection,
//!   outbound idleness sends a heartbeat
//! - **Request correlation**: Ordered pending-request ledger with replay on
//!   reconnect and first-match response dispatch
//! - **Listener fan-out**: Command-keyed handler registry independent of
//!   request correlation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use relink::prelude::*;
//! use std::sync::Arc;
//!
//! let session = Session::new(Arc::new(CommandCodec::new()));
//! session.init(Arc::new(TcpTransport::new()), None);
//! session.connect("127.0.0.1", 7810);
//! session.send_with_timeout(
//!     frame(CommandId::new(1), b"hello"),
//!     CommandId::new(1),
//!     Arc::new(|cmd, payload| println!("{cmd}: {} bytes", payload.len())),
//!     true,
//!     false,
//! );
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Fundamental types, collaborator traits, and error definitions
//! - [`session`]: Session lifecycle, timers, correlation, and dispatch
//! - [`transport`]: TCP transport and length-prefixed command framing

pub mod core {
    //! Core types, traits, and error definitions.
    pub use relink_core::*;
}

pub mod session {
    //! Session lifecycle, timers, correlation, and dispatch.
    pub use relink_session::*;
}

pub mod transport {
    //! TCP transport and command framing.
    pub use relink_transport::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use relink_core::{
        CloseEvent, CommandId, ConnectKind, Endpoint, NetworkIndicator, ProtocolCodec,
        RelinkError, ResponseCallback, Result, SessionError, SubscriberId, Transport,
        TransportEvents,
    };

    // Session
    pub use relink_session::{Session, SessionConfig, SessionState};

    // Transport
    pub use relink_transport::{CodecError, CommandCodec, FrameCodec, TcpTransport, body, frame};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_prelude_imports() {
        let cmd = CommandId::new(5);
        assert!(cmd.awaits_response());
        assert_eq!(SessionState::default(), SessionState::Closed);
        assert_eq!(Endpoint::new("host", 80).to_string(), "host:80");
    }

    #[tokio::test]
    async fn test_session_builds_from_prelude() {
        let session = Session::new(Arc::new(CommandCodec::new()));
        session.init(Arc::new(TcpTransport::new()), None);
        assert_eq!(session.state(), SessionState::Closed);
    }
}
