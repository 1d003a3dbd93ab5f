/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! # Relink Transport
//!
//! Network transport layer for the Relink client session.
//!
//! This crate provides:
//! - **TCP transport**: Fire-and-forget connector driving the session's
//!   transport event contract
//! - **Codec**: Tokio codec for length-prefixed command framing, plus the
//!   protocol-knowledge adapter the session consumes

pub mod codec;
pub mod tcp;

pub use codec::{CodecError, CommandCodec, FrameCodec, HEADER_LEN, body, frame};
pub use tcp::TcpTransport;
