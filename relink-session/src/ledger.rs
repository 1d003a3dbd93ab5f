/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Pending-request ledger.
//!
//! Ordered collection of requests awaiting transmission or a response.
//! Insertion order is send order; correlation removes the earliest entry
//! whose expected command matches a received frame. One response satisfies
//! at most one request.

use bytes::Bytes;
use relink_core::{CommandId, ResponseCallback};

/// One queued or in-flight request.
pub(crate) struct PendingRequest {
    /// Opaque payload to transmit (or already transmitted).
    pub payload: Bytes,
    /// Response command this request waits for; `<= 0` means fire-and-forget.
    pub response_cmd: CommandId,
    /// Callback to invoke with the matched response.
    pub callback: Option<ResponseCallback>,
}

impl PendingRequest {
    /// Creates a fire-and-forget entry that is replayed on flush and then
    /// dropped.
    pub(crate) fn fire_and_forget(payload: Bytes) -> Self {
        Self {
            payload,
            response_cmd: CommandId::NONE,
            callback: None,
        }
    }

    /// Creates an entry awaiting the given response command.
    pub(crate) fn awaiting(payload: Bytes, response_cmd: CommandId, callback: ResponseCallback) -> Self {
        Self {
            payload,
            response_cmd,
            callback: Some(callback),
        }
    }

    /// Whether this entry remains in the ledger after transmission.
    pub(crate) fn awaits_response(&self) -> bool {
        self.response_cmd.awaits_response() && self.callback.is_some()
    }
}

impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("payload_len", &self.payload.len())
            .field("response_cmd", &self.response_cmd)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// Ordered sequence of pending requests.
#[derive(Debug, Default)]
pub(crate) struct RequestLedger {
    entries: Vec<PendingRequest>,
}

impl RequestLedger {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an entry; insertion order is send order.
    pub(crate) fn push(&mut self, entry: PendingRequest) {
        self.entries.push(entry);
    }

    /// Drains the ledger for a flush on entering the working state.
    ///
    /// Returns every payload in insertion order for transmission. Entries
    /// that expect no response are dropped (the send alone satisfies them);
    /// entries awaiting a response are kept for future correlation.
    pub(crate) fn drain_for_flush(&mut self) -> Vec<Bytes> {
        let payloads: Vec<Bytes> = self.entries.iter().map(|e| e.payload.clone()).collect();
        self.entries.retain(PendingRequest::awaits_response);
        payloads
    }

    /// Removes and returns the earliest entry awaiting `cmd`, if any.
    pub(crate) fn take_match(&mut self, cmd: CommandId) -> Option<PendingRequest> {
        let index = self
            .entries
            .iter()
            .position(|e| e.response_cmd == cmd && e.awaits_response())?;
        Some(self.entries.remove(index))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
