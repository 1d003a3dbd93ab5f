/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! # Relink Core
//!
//! Core types, collaborator traits, and error definitions for the relink
//! client session layer.
//!
//! This crate provides the fundamental building blocks used across all relink crates:
//! - **Error types**: Unified error handling with `thiserror`
//! - **Core types**: `CommandId`, `SubscriberId`, `Endpoint`, `ConnectKind`, `CloseEvent`
//! - **Collaborator traits**: `Transport`, `TransportEvents`, `ProtocolCodec`, `NetworkIndicator`
//!
//! ## Opaque Payloads
//!
//! The session layer never interprets message bodies. Payloads travel as
//! [`bytes::Bytes`] so they can be cloned into the pending-request ledger and
//! handed to listeners without copying.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{RelinkError, Result, SessionError};
pub use traits::{
    CloseCallback, ConnectedCallback, DisconnectCallback, NetworkIndicator, ProtocolCodec,
    ResponseCallback, Transport, TransportEvents,
};
pub use types::{CloseEvent, CommandId, ConnectKind, Endpoint, SubscriberId};
