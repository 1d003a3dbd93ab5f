/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! The client session: one logical connection to a server.
//!
//! [`Session`] composes five mechanisms over one transport handle and one
//! codec handle supplied at construction:
//!
//! 1. **Lifecycle state machine**: owns the canonical [`SessionState`] and
//!    validates every transition.
//! 2. **Reconnection controller**: detects unexpected closure and schedules
//!    a delayed retry against the last successful endpoint.
//! 3. **Heartbeat & liveness monitor**: re-armed on every validated inbound
//!    frame; silence force-closes the transport, outbound idleness sends a
//!    heartbeat.
//! 4. **Request correlator**: ordered pending-request ledger, replayed when
//!    the session becomes usable, with first-match response correlation.
//! 5. **Listener dispatch**: command-keyed fan-out, independent of request
//!    correlation.
//!
//! All interior state sits behind one mutex. The lock is never held while a
//! user callback or a transport operation runs: entry points collect their
//! effects under the lock and execute them after the guard drops, so a
//! callback may safely re-enter the session.

use crate::config::SessionConfig;
use crate::ledger::{PendingRequest, RequestLedger};
use crate::registry::{ListenerRegistry, ResponseHandler};
use crate::state::SessionState;
use crate::timer::TimerSlot;
use bytes::Bytes;
use parking_lot::Mutex;
use relink_core::{
    CloseCallback, CloseEvent, CommandId, ConnectKind, ConnectedCallback, DisconnectCallback,
    Endpoint, NetworkIndicator, ProtocolCodec, RelinkError, ResponseCallback, Result,
    SessionError, SubscriberId, Transport, TransportEvents,
};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

/// Client-side session over one abstract transport.
///
/// Constructed once with a codec, bound to a transport via [`Session::init`],
/// then connected as many times as needed: every completed closure returns
/// the session to [`SessionState::Closed`], from which `connect` is accepted
/// again. Requires a Tokio runtime for its timers.
pub struct Session {
    config: SessionConfig,
    codec: Arc<dyn ProtocolCodec>,
    inner: Mutex<Inner>,
}

struct Inner {
    transport: Option<Arc<dyn Transport>>,
    indicator: Option<Arc<dyn NetworkIndicator>>,
    state: SessionState,
    auto_reconnect: bool,
    /// Set by `close`; routes the next closure event away from reconnection.
    close_requested: bool,
    events_bound: bool,
    endpoint: Option<Endpoint>,
    connect_kind: ConnectKind,
    ledger: RequestLedger,
    listeners: ListenerRegistry,
    receive_timer: TimerSlot,
    heartbeat_timer: TimerSlot,
    reconnect_timer: TimerSlot,
    connected_cb: Option<ConnectedCallback>,
    disconnect_cb: Option<DisconnectCallback>,
    close_cb: Option<CloseCallback>,
}

impl Inner {
    fn cancel_timers(&mut self) {
        self.receive_timer.cancel();
        self.heartbeat_timer.cancel();
        self.reconnect_timer.cancel();
    }
}

impl Session {
    /// Creates a session with default timings.
    #[must_use]
    pub fn new(codec: Arc<dyn ProtocolCodec>) -> Arc<Self> {
        Self::with_config(codec, SessionConfig::default())
    }

    /// Creates a session with explicit timings.
    #[must_use]
    pub fn with_config(codec: Arc<dyn ProtocolCodec>, config: SessionConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            codec,
            inner: Mutex::new(Inner {
                transport: None,
                indicator: None,
                state: SessionState::Closed,
                auto_reconnect: false,
                close_requested: false,
                events_bound: false,
                endpoint: None,
                connect_kind: ConnectKind::Normal,
                ledger: RequestLedger::new(),
                listeners: ListenerRegistry::new(),
                receive_timer: TimerSlot::new(),
                heartbeat_timer: TimerSlot::new(),
                reconnect_timer: TimerSlot::new(),
                connected_cb: None,
                disconnect_cb: None,
                close_cb: None,
            }),
        })
    }

    /// Binds the transport and optional UI indicator.
    pub fn init(
        &self,
        transport: Arc<dyn Transport>,
        indicator: Option<Arc<dyn NetworkIndicator>>,
    ) {
        debug!("binding transport");
        let mut inner = self.inner.lock();
        inner.transport = Some(transport);
        inner.indicator = indicator;
        inner.events_bound = false;
    }

    /// Connects to `host:port` with auto-reconnect enabled.
    pub fn connect(self: &Arc<Self>, host: &str, port: u16) {
        self.connect_with(host, port, true, ConnectKind::Normal);
    }

    /// Connects to `host:port`.
    ///
    /// Accepted only while closed with a transport bound; anything else is a
    /// caller error, reported and dropped. Only a [`ConnectKind::Normal`]
    /// connect updates the remembered endpoint.
    pub fn connect_with(
        self: &Arc<Self>,
        host: &str,
        port: u16,
        auto_reconnect: bool,
        kind: ConnectKind,
    ) {
        let (transport, needs_bind) = {
            let mut inner = self.inner.lock();
            let transport = match Self::transport_for_connect(&inner) {
                Ok(transport) => transport,
                Err(err) => {
                    error!(%err, "connect rejected");
                    return;
                }
            };
            self.transition(&mut inner, SessionState::Connecting);
            inner.auto_reconnect = auto_reconnect;
            inner.connect_kind = kind;
            inner.close_requested = false;
            if kind == ConnectKind::Normal {
                inner.endpoint = Some(Endpoint::new(host, port));
            }
            let needs_bind = !inner.events_bound;
            inner.events_bound = true;
            (transport, needs_bind)
        };
        if needs_bind {
            transport.bind(Arc::new(SessionEvents {
                session: Arc::downgrade(self),
            }));
        }
        info!(host, port, %kind, "connecting");
        transport.connect(host, port);
    }

    /// Closes the session: cancels all timers, empties the ledger and the
    /// listener registry, hides both indicators, and closes the transport.
    ///
    /// The optional callback fires once the closure completes. A closure
    /// requested here never triggers reconnection.
    pub fn close(&self, code: Option<u16>, reason: Option<&str>, on_closed: Option<CloseCallback>) {
        let (transport, indicator) = {
            let mut inner = self.inner.lock();
            inner.cancel_timers();
            inner.ledger.clear();
            inner.listeners.clear();
            inner.close_requested = true;
            inner.close_cb = on_closed;
            if inner.transport.is_none() {
                self.transition(&mut inner, SessionState::Closed);
            }
            (inner.transport.clone(), inner.indicator.clone())
        };
        if let Some(indicator) = &indicator {
            indicator.hide_reconnect();
            indicator.hide_pending();
        }
        if let Some(transport) = &transport {
            info!("closing session");
            transport.close(code, reason);
        }
    }

    /// Closes only the underlying transport, keeping session caches and
    /// state for reuse.
    pub fn close_transport_only(&self, code: Option<u16>, reason: Option<&str>) {
        let transport = self.inner.lock().transport.clone();
        if let Some(transport) = &transport {
            transport.close(code, reason);
        }
    }

    /// Best-effort send with no response expected.
    ///
    /// Transmits immediately while working (or when forced); buffers a
    /// fire-and-forget ledger entry while connecting or checking; otherwise
    /// reports a send error and drops the payload.
    pub fn send(&self, payload: Bytes, force: bool) {
        let transport = {
            let mut inner = self.inner.lock();
            match Self::route_send(&inner, force) {
                Ok(SendRoute::Transmit(transport)) => transport,
                Ok(SendRoute::Buffer) => {
                    debug!(state = %inner.state, "session busy, buffering payload");
                    inner.ledger.push(PendingRequest::fire_and_forget(payload));
                    return;
                }
                Err(err) => {
                    error!(%err, "send dropped");
                    return;
                }
            }
        };
        transport.send(payload);
    }

    /// Sends a request that awaits a response with the given command.
    ///
    /// The payload transmits immediately while working (or forced). A
    /// request with `response_cmd > 0` always joins the ledger so the
    /// response can be matched later, even when transmitted right away; a
    /// non-awaitable request joins the ledger only when it could not be
    /// transmitted, and is dropped at the next flush.
    pub fn send_with_timeout(
        &self,
        payload: Bytes,
        response_cmd: CommandId,
        callback: ResponseCallback,
        show_indicator: bool,
        force: bool,
    ) {
        let (transport, indicator) = {
            let mut inner = self.inner.lock();
            let transmit_now = inner.state.is_working() || force;
            let transport = if transmit_now {
                if inner.transport.is_none() {
                    let err = RelinkError::from(SessionError::NotInitialized);
                    error!(%err, "request cannot transmit");
                }
                inner.transport.clone()
            } else {
                None
            };
            debug!(%response_cmd, transmit_now, "registering request");
            let queued = if response_cmd.awaits_response() {
                inner
                    .ledger
                    .push(PendingRequest::awaiting(payload.clone(), response_cmd, callback));
                true
            } else if transmit_now {
                false
            } else {
                inner
                    .ledger
                    .push(PendingRequest::fire_and_forget(payload.clone()));
                true
            };
            let indicator = if queued && show_indicator {
                inner.indicator.clone()
            } else {
                None
            };
            (transport, indicator)
        };
        if let Some(transport) = &transport {
            transport.send(payload);
        }
        if let Some(indicator) = &indicator {
            indicator.show_pending();
        }
    }

    /// Signals that the application-layer handshake succeeded.
    ///
    /// Moves the session into the working state, hides the reconnect
    /// indicator, and flushes queued requests in insertion order.
    pub fn on_checked(&self) {
        let (transport, indicator, payloads, waiting) = {
            let mut inner = self.inner.lock();
            if !inner.state.is_buffering() {
                let err = RelinkError::from(SessionError::InvalidState {
                    operation: "on_checked",
                    state: inner.state.to_string(),
                });
                error!(%err, "checked signal ignored");
                return;
            }
            self.transition(&mut inner, SessionState::Working);
            let had_entries = !inner.ledger.is_empty();
            let payloads = inner.ledger.drain_for_flush();
            let waiting = if had_entries {
                Some(inner.ledger.len())
            } else {
                None
            };
            (
                inner.transport.clone(),
                inner.indicator.clone(),
                payloads,
                waiting,
            )
        };
        if let Some(indicator) = &indicator {
            indicator.hide_reconnect();
        }
        info!(flushed = payloads.len(), "session working");
        if let Some(transport) = &transport {
            for payload in payloads {
                transport.send(payload);
            }
        }
        if let (Some(indicator), Some(waiting)) = (&indicator, waiting) {
            if waiting > 0 {
                debug!(waiting, "requests awaiting responses");
                indicator.show_pending();
            } else {
                indicator.hide_pending();
            }
        }
    }

    /// Replaces all handlers for `cmd` with this one.
    ///
    /// Returns whether an existing registration was displaced.
    pub fn set_response_handler(
        &self,
        cmd: CommandId,
        callback: ResponseCallback,
        target: Option<SubscriberId>,
    ) -> bool {
        self.inner
            .lock()
            .listeners
            .set(cmd, ResponseHandler::new(callback, target))
    }

    /// Appends a handler for `cmd` unless an identity-equal `(target,
    /// callback)` registration already exists.
    ///
    /// Returns whether the handler was newly added.
    pub fn add_response_handler(
        &self,
        cmd: CommandId,
        callback: ResponseCallback,
        target: Option<SubscriberId>,
    ) -> bool {
        self.inner
            .lock()
            .listeners
            .add(cmd, ResponseHandler::new(callback, target))
    }

    /// Removes a handler registration by identity.
    pub fn remove_response_handler(
        &self,
        cmd: CommandId,
        callback: &ResponseCallback,
        target: Option<SubscriberId>,
    ) {
        self.inner.lock().listeners.remove(cmd, callback, target);
    }

    /// Registers the handshake callback. When present, a transport
    /// connection moves the session to checking and invokes this callback;
    /// the callback's owner completes the handshake via [`Session::on_checked`].
    pub fn set_connected_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.lock().connected_cb = Some(Arc::new(callback));
    }

    /// Registers the unexpected-closure callback. Returning `false` vetoes
    /// the reconnect sequence.
    pub fn set_disconnect_callback<F>(&self, callback: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.inner.lock().disconnect_cb = Some(Arc::new(callback));
    }

    /// Permanently disables auto-reconnect for this instance and cancels all
    /// timers, without altering the current state.
    pub fn reject_reconnect(&self) {
        let mut inner = self.inner.lock();
        inner.auto_reconnect = false;
        inner.cancel_timers();
        info!("auto-reconnect disabled");
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Whether unexpected closure currently triggers a retry.
    #[must_use]
    pub fn is_auto_reconnect(&self) -> bool {
        self.inner.lock().auto_reconnect
    }

    /// Number of entries in the pending-request ledger.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.inner.lock().ledger.len()
    }

    /// Guard for `connect`: requires a bound transport and a closed session.
    fn transport_for_connect(inner: &Inner) -> Result<Arc<dyn Transport>> {
        let transport = inner
            .transport
            .clone()
            .ok_or(SessionError::NotInitialized)?;
        if inner.state != SessionState::Closed {
            return Err(SessionError::InvalidState {
                operation: "connect",
                state: inner.state.to_string(),
            }
            .into());
        }
        Ok(transport)
    }

    /// Routes an outbound payload: transmit, buffer, or typed rejection.
    fn route_send(inner: &Inner, force: bool) -> Result<SendRoute> {
        if inner.state.is_working() || force {
            let transport = inner
                .transport
                .clone()
                .ok_or(SessionError::NotInitialized)?;
            Ok(SendRoute::Transmit(transport))
        } else if inner.state.is_buffering() {
            Ok(SendRoute::Buffer)
        } else {
            Err(SessionError::SendUnavailable {
                state: inner.state.to_string(),
            }
            .into())
        }
    }

    fn transition(&self, inner: &mut Inner, next: SessionState) {
        if !inner.state.can_transition(next) {
            error!(from = %inner.state, to = %next, "invalid state transition dropped");
            return;
        }
        debug!(from = %inner.state, to = %next, "state transition");
        inner.state = next;
    }

    fn handle_connected(self: &Arc<Self>) {
        info!("transport connected");
        let connected_cb = {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Connecting {
                warn!(state = %inner.state, "connected event ignored");
                return;
            }
            match inner.connected_cb.clone() {
                Some(cb) => {
                    self.transition(&mut inner, SessionState::Checking);
                    Some(cb)
                }
                None => None,
            }
        };
        match connected_cb {
            Some(cb) => cb(),
            None => self.on_checked(),
        }
    }

    fn handle_message(self: &Arc<Self>, payload: Bytes) {
        let (cmd, matched, ledger_emptied, handlers, indicator) = {
            let mut inner = self.inner.lock();
            if !self.codec.validate_header(&payload) {
                error!(len = payload.len(), "header validation failed, dropping frame");
                if self.config.liveness_on_invalid_frames {
                    self.arm_receive_timer(&mut inner);
                }
                return;
            }
            self.arm_receive_timer(&mut inner);
            self.arm_heartbeat_timer(&mut inner);

            let cmd = self.codec.response_command(&payload);
            let matched = inner.ledger.take_match(cmd);
            let ledger_emptied = matched.is_some() && inner.ledger.is_empty();
            let handlers = inner.listeners.handlers_for(cmd);
            (
                cmd,
                matched,
                ledger_emptied,
                handlers,
                inner.indicator.clone(),
            )
        };

        if let Some(request) = matched {
            debug!(%cmd, "response matched pending request");
            if let Some(callback) = request.callback {
                callback(cmd, &payload);
            }
            if ledger_emptied && let Some(indicator) = &indicator {
                indicator.hide_pending();
            }
        }

        for handler in handlers {
            debug!(%cmd, "dispatching to listener");
            (handler.callback)(cmd, &payload);
        }
    }

    fn handle_error(&self, message: &str) {
        error!(message, "transport error");
    }

    fn handle_closed(self: &Arc<Self>, event: CloseEvent) {
        info!(%event, "transport closed");
        let disconnect_cb = {
            let mut inner = self.inner.lock();
            inner.cancel_timers();
            inner.disconnect_cb.clone()
        };

        if let Some(cb) = disconnect_cb
            && !cb()
        {
            debug!("disconnect callback vetoed reconnection");
            let mut inner = self.inner.lock();
            self.transition(&mut inner, SessionState::Closed);
            return;
        }

        let (indicator, close_cb) = {
            let mut inner = self.inner.lock();
            if inner.auto_reconnect && !inner.close_requested {
                self.arm_reconnect_timer(&mut inner);
                (inner.indicator.clone(), None)
            } else {
                self.transition(&mut inner, SessionState::Closed);
                (None, inner.close_cb.take())
            }
        };
        if let Some(indicator) = &indicator {
            indicator.show_reconnect();
        }
        if let Some(cb) = close_cb {
            cb();
        }
    }

    fn arm_receive_timer(self: &Arc<Self>, inner: &mut Inner) {
        let weak = Arc::downgrade(self);
        inner
            .receive_timer
            .arm(self.config.receive_timeout, async move {
                if let Some(session) = weak.upgrade() {
                    warn!("liveness window elapsed with no inbound traffic, closing transport");
                    session.close_transport_only(None, None);
                }
            });
    }

    fn arm_heartbeat_timer(self: &Arc<Self>, inner: &mut Inner) {
        let weak = Arc::downgrade(self);
        inner
            .heartbeat_timer
            .arm(self.config.heartbeat_interval, async move {
                if let Some(session) = weak.upgrade() {
                    debug!("outbound idle window elapsed, sending heartbeat");
                    let heartbeat = session.codec.heartbeat();
                    session.send(heartbeat, false);
                }
            });
    }

    fn arm_reconnect_timer(self: &Arc<Self>, inner: &mut Inner) {
        debug!(delay = ?self.config.reconnect_delay, "scheduling reconnect");
        let weak = Arc::downgrade(self);
        inner
            .reconnect_timer
            .arm(self.config.reconnect_delay, async move {
                if let Some(session) = weak.upgrade() {
                    session.reconnect_now();
                }
            });
    }

    fn reconnect_now(self: &Arc<Self>) {
        let (transport, endpoint, auto_reconnect) = {
            let mut inner = self.inner.lock();
            self.transition(&mut inner, SessionState::Closed);
            (
                inner.transport.clone(),
                inner.endpoint.clone(),
                inner.auto_reconnect,
            )
        };
        if let Some(transport) = &transport {
            transport.close(None, None);
        }
        let Some(endpoint) = endpoint else {
            let err = RelinkError::from(SessionError::NoEndpoint);
            error!(%err, "reconnect abandoned");
            return;
        };
        info!(%endpoint, "attempting reconnect");
        self.connect_with(
            &endpoint.host,
            endpoint.port,
            auto_reconnect,
            ConnectKind::Reconnect,
        );
    }
}

/// Outcome of the send guard when the payload is not rejected outright.
enum SendRoute {
    Transmit(Arc<dyn Transport>),
    Buffer,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Session")
            .field("state", &inner.state)
            .field("auto_reconnect", &inner.auto_reconnect)
            .field("pending_requests", &inner.ledger.len())
            .finish()
    }
}

/// Weak-backed adapter between the transport's event sink and the session.
///
/// The transport holds this adapter strongly; holding the session weakly
/// breaks the `Session → Transport → events` reference cycle.
struct SessionEvents {
    session: Weak<Session>,
}

impl TransportEvents for SessionEvents {
    fn on_connected(&self) {
        if let Some(session) = self.session.upgrade() {
            session.handle_connected();
        }
    }

    fn on_message(&self, payload: Bytes) {
        if let Some(session) = self.session.upgrade() {
            session.handle_message(payload);
        }
    }

    fn on_error(&self, message: &str) {
        if let Some(session) = self.session.upgrade() {
            session.handle_error(message);
        }
    }

    fn on_closed(&self, event: CloseEvent) {
        if let Some(session) = self.session.upgrade() {
            session.handle_closed(event);
        }
    }
}
