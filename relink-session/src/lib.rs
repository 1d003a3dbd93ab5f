/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! # Relink Session
//!
//! Client-side session layer for the relink stack.
//!
//! This crate provides:
//! - **State machine**: Runtime session FSM with validated transitions
//! - **Reconnection**: Delayed retry against the last successful endpoint
//! - **Heartbeat & liveness**: Outbound keep-alive and inbound silence timeout
//! - **Request correlation**: Ordered pending-request ledger with replay
//! - **Listener dispatch**: Command-keyed fan-out to registered handlers
//! - **Configuration**: Session timing options
//!
//! The [`Session`] assumes a Tokio runtime for its timers; every public entry
//! point is fire-and-forget and completion is observed through registered
//! callbacks only.

pub mod config;
mod ledger;
mod registry;
pub mod session;
pub mod state;
mod timer;

pub use config::SessionConfig;
pub use session::Session;
pub use state::SessionState;
