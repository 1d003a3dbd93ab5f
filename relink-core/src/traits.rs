/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Collaborator traits consumed by the session layer.
//!
//! The session core deliberately owns none of the machinery below. It drives
//! a [`Transport`] through a narrow fire-and-forget surface, validates frames
//! through a [`ProtocolCodec`], and reports connectivity through an optional
//! [`NetworkIndicator`]. Completion of any operation is observed only through
//! [`TransportEvents`] callbacks; no entry point blocks.

use crate::types::{CloseEvent, CommandId};
use bytes::Bytes;
use std::sync::Arc;

/// Callback invoked with a correlated or dispatched inbound message.
///
/// Receives the decoded response command and the full opaque payload.
pub type ResponseCallback = Arc<dyn Fn(CommandId, &Bytes) + Send + Sync>;

/// Callback invoked when the transport reports a successful connection and an
/// application-layer handshake is required before the session becomes usable.
pub type ConnectedCallback = Arc<dyn Fn() + Send + Sync>;

/// Callback invoked on unexpected closure, before any reconnect is scheduled.
///
/// Returning `false` vetoes the reconnect sequence: the session is forced to
/// closed and nothing further happens.
pub type DisconnectCallback = Arc<dyn Fn() -> bool + Send + Sync>;

/// One-shot callback registered via `close`, fired when a non-reconnecting
/// closure completes.
pub type CloseCallback = Box<dyn FnOnce() + Send>;

/// Event sink the transport drives as its connection changes state.
///
/// Contract: exactly one `on_connected` or `on_error` per connect attempt,
/// and exactly one `on_closed` terminating any open connection.
pub trait TransportEvents: Send + Sync {
    /// The connection attempt succeeded.
    fn on_connected(&self);

    /// A complete inbound message arrived.
    fn on_message(&self, payload: Bytes);

    /// The transport hit an error. Recovery is driven by the terminal
    /// `on_closed`, not by this notification.
    fn on_error(&self, message: &str);

    /// The connection terminated.
    fn on_closed(&self, event: CloseEvent);
}

/// A bidirectional byte-or-message channel to one remote endpoint.
///
/// All methods are fire-and-forget: they queue work and return immediately.
/// Outcomes surface through the [`TransportEvents`] sink registered with
/// [`Transport::bind`].
pub trait Transport: Send + Sync {
    /// Registers the event sink. Called once, lazily, the first time a
    /// connection is attempted.
    fn bind(&self, events: Arc<dyn TransportEvents>);

    /// Initiates a connection to `host:port`.
    fn connect(&self, host: &str, port: u16);

    /// Queues a payload for transmission.
    fn send(&self, payload: Bytes);

    /// Closes the connection, optionally with a code and reason.
    fn close(&self, code: Option<u16>, reason: Option<&str>);
}

/// Wire-format knowledge the session needs from the protocol layer.
///
/// The session treats message bodies as opaque; this trait covers the only
/// four things it ever asks about a frame.
pub trait ProtocolCodec: Send + Sync {
    /// Length of the frame header in bytes.
    fn header_len(&self) -> usize;

    /// Returns a ready-to-send heartbeat payload.
    fn heartbeat(&self) -> Bytes;

    /// Validates the header of a received frame.
    fn validate_header(&self, payload: &Bytes) -> bool;

    /// Extracts the response command identifier from a received frame.
    fn response_command(&self, payload: &Bytes) -> CommandId;
}

/// Optional UI notifications for connectivity and pending requests.
///
/// Every method is a no-op by default so implementors only override what
/// their host surface actually displays.
pub trait NetworkIndicator: Send + Sync {
    /// A reconnect sequence started.
    fn show_reconnect(&self) {}

    /// The session is usable again.
    fn hide_reconnect(&self) {}

    /// At least one request is awaiting a response.
    fn show_pending(&self) {}

    /// No request is awaiting a response.
    fn hide_pending(&self) {}
}
