/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! TCP connector implementing the session's [`Transport`] contract.
//!
//! Each connection runs in one spawned driver task that owns the socket: it
//! reads frames through [`FrameCodec`] and forwards them to the bound event
//! sink, drains an outbound queue, and listens for an explicit shutdown
//! request. A failed connect attempt reports `on_error` followed by
//! `on_closed`, so the session's reconnect handling covers a refused
//! connection the same way as a dropped one.
//!
//! All entry points are fire-and-forget and must be called from within a
//! Tokio runtime context.

use crate::codec::FrameCodec;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use relink_core::{CloseEvent, Transport, TransportEvents};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::Decoder;
use tracing::{debug, error, info, warn};

/// Shared flags between the transport handle and one driver task.
#[derive(Default)]
struct ConnFlags {
    /// Set when the handle abandons this connection; a silenced driver
    /// stops reporting events and winds down.
    silenced: AtomicBool,
    /// Set by the driver on exit.
    finished: AtomicBool,
}

struct Conn {
    host: String,
    port: u16,
    outbound: mpsc::UnboundedSender<Bytes>,
    shutdown: Option<oneshot::Sender<CloseEvent>>,
    flags: Arc<ConnFlags>,
}

impl Conn {
    fn is_live(&self) -> bool {
        !self.flags.finished.load(Ordering::Acquire)
            && !self.flags.silenced.load(Ordering::Acquire)
    }
}

#[derive(Default)]
struct TcpInner {
    events: Option<Arc<dyn TransportEvents>>,
    conn: Option<Conn>,
}

/// TCP client transport.
///
/// One instance serves one session across any number of sequential
/// connections; a new `connect` silences and replaces whatever connection
/// came before, except a still-live one to the very same endpoint, which is
/// kept and the duplicate request dropped.
pub struct TcpTransport {
    max_frame_size: usize,
    inner: Mutex<TcpInner>,
}

impl TcpTransport {
    /// Creates a transport with the default 1MB frame limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_frame_size: 1024 * 1024,
            inner: Mutex::new(TcpInner::default()),
        }
    }

    /// Sets the maximum inbound frame size.
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for TcpTransport {
    fn bind(&self, events: Arc<dyn TransportEvents>) {
        self.inner.lock().events = Some(events);
    }

    fn connect(&self, host: &str, port: u16) {
        let (events, outbound_rx, shutdown_rx, flags) = {
            let mut inner = self.inner.lock();
            let Some(events) = inner.events.clone() else {
                error!("connect rejected: no event sink bound");
                return;
            };
            if let Some(conn) = &inner.conn
                && conn.is_live()
                && conn.host == host
                && conn.port == port
            {
                warn!(host, port, "connect ignored: already connected to this endpoint");
                return;
            }
            if let Some(old) = inner.conn.take() {
                debug!(host = %old.host, port = old.port, "abandoning previous connection");
                old.flags.silenced.store(true, Ordering::Release);
            }

            let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
            let (shutdown_tx, shutdown_rx) = oneshot::channel();
            let flags = Arc::new(ConnFlags::default());
            inner.conn = Some(Conn {
                host: host.to_string(),
                port,
                outbound: outbound_tx,
                shutdown: Some(shutdown_tx),
                flags: Arc::clone(&flags),
            });
            (events, outbound_rx, shutdown_rx, flags)
        };

        let host = host.to_string();
        let codec = FrameCodec::new().with_max_frame_size(self.max_frame_size);
        tokio::spawn(async move {
            drive(host, port, codec, events, outbound_rx, shutdown_rx, &flags).await;
            flags.finished.store(true, Ordering::Release);
        });
    }

    fn send(&self, payload: Bytes) {
        let inner = self.inner.lock();
        match &inner.conn {
            Some(conn) if conn.is_live() => {
                if conn.outbound.send(payload).is_err() {
                    warn!("send dropped: connection wound down");
                }
            }
            _ => error!("send dropped: no open connection"),
        }
    }

    fn close(&self, code: Option<u16>, reason: Option<&str>) {
        let mut inner = self.inner.lock();
        let Some(mut conn) = inner.conn.take() else {
            return;
        };
        debug!(host = %conn.host, port = conn.port, "closing connection");
        if let Some(shutdown) = conn.shutdown.take() {
            let event = CloseEvent {
                code,
                reason: reason.map(str::to_string),
            };
            // Errors only mean the driver already exited.
            let _ = shutdown.send(event);
        }
    }
}

/// Runs one connection to completion.
async fn drive(
    host: String,
    port: u16,
    mut codec: FrameCodec,
    events: Arc<dyn TransportEvents>,
    mut outbound_rx: mpsc::UnboundedReceiver<Bytes>,
    mut shutdown_rx: oneshot::Receiver<CloseEvent>,
    flags: &ConnFlags,
) {
    let silenced = || flags.silenced.load(Ordering::Acquire);

    let stream = match TcpStream::connect((host.as_str(), port)).await {
        Ok(stream) => stream,
        Err(err) => {
            if !silenced() {
                error!(%host, port, %err, "connect failed");
                events.on_error(&err.to_string());
                events.on_closed(CloseEvent::default());
            }
            return;
        }
    };
    if silenced() {
        return;
    }
    info!(%host, port, "connected");
    events.on_connected();

    let (mut reader, mut writer) = stream.into_split();
    let mut buf = BytesMut::with_capacity(4096);
    let mut close_event = CloseEvent::default();

    'conn: loop {
        tokio::select! {
            queued = outbound_rx.recv() => match queued {
                Some(payload) => {
                    if let Err(err) = writer.write_all(&payload).await {
                        if !silenced() {
                            events.on_error(&err.to_string());
                        }
                        break 'conn;
                    }
                }
                // Handle replaced; wind down quietly.
                None => break 'conn,
            },
            requested = &mut shutdown_rx => {
                if let Ok(event) = requested {
                    close_event = event;
                }
                let _ = writer.shutdown().await;
                break 'conn;
            },
            read = reader.read_buf(&mut buf) => match read {
                Ok(0) => break 'conn,
                Ok(_) => loop {
                    match codec.decode(&mut buf) {
                        Ok(Some(frame)) => {
                            if !silenced() {
                                events.on_message(frame.freeze());
                            }
                        }
                        Ok(None) => break,
                        // Framing is unrecoverable once the stream desyncs.
                        Err(err) => {
                            if !silenced() {
                                events.on_error(&err.to_string());
                            }
                            break 'conn;
                        }
                    }
                },
                Err(err) => {
                    if !silenced() {
                        events.on_error(&err.to_string());
                    }
                    break 'conn;
                }
            },
        }
    }

    if !silenced() {
        info!(%host, port, "connection closed");
        events.on_closed(close_event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::frame;
    use relink_core::CommandId;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[derive(Debug, PartialEq)]
    enum Ev {
        Connected,
        Message(Bytes),
        Error,
        Closed(CloseEvent),
    }

    struct RecordingEvents {
        tx: mpsc::UnboundedSender<Ev>,
    }

    impl TransportEvents for RecordingEvents {
        fn on_connected(&self) {
            let _ = self.tx.send(Ev::Connected);
        }

        fn on_message(&self, payload: Bytes) {
            let _ = self.tx.send(Ev::Message(payload));
        }

        fn on_error(&self, _message: &str) {
            let _ = self.tx.send(Ev::Error);
        }

        fn on_closed(&self, event: CloseEvent) {
            let _ = self.tx.send(Ev::Closed(event));
        }
    }

    fn recorder() -> (Arc<RecordingEvents>, mpsc::UnboundedReceiver<Ev>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(RecordingEvents { tx }), rx)
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Ev>) -> Ev {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for transport event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn test_connect_send_receive_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Echo one frame back verbatim, then drop the connection.
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 256];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(&buf[..n]).await.unwrap();
        });

        let transport = TcpTransport::new();
        let (events, mut rx) = recorder();
        transport.bind(events);
        transport.connect("127.0.0.1", port);

        assert_eq!(next(&mut rx).await, Ev::Connected);

        let request = frame(CommandId::new(42), b"ping");
        transport.send(request.clone());
        assert_eq!(next(&mut rx).await, Ev::Message(request));

        assert_eq!(next(&mut rx).await, Ev::Closed(CloseEvent::default()));
    }

    #[tokio::test]
    async fn test_refused_connect_reports_error_then_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = TcpTransport::new();
        let (events, mut rx) = recorder();
        transport.bind(events);
        transport.connect("127.0.0.1", port);

        assert_eq!(next(&mut rx).await, Ev::Error);
        assert_eq!(next(&mut rx).await, Ev::Closed(CloseEvent::default()));
    }

    #[tokio::test]
    async fn test_duplicate_connect_to_live_endpoint_is_ignored() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
        });

        let transport = TcpTransport::new();
        let (events, mut rx) = recorder();
        transport.bind(events);
        transport.connect("127.0.0.1", port);
        assert_eq!(next(&mut rx).await, Ev::Connected);

        transport.connect("127.0.0.1", port);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_explicit_close_carries_code_and_reason() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
        });

        let transport = TcpTransport::new();
        let (events, mut rx) = recorder();
        transport.bind(events);
        transport.connect("127.0.0.1", port);
        assert_eq!(next(&mut rx).await, Ev::Connected);

        transport.close(Some(1000), Some("done"));
        assert_eq!(
            next(&mut rx).await,
            Ev::Closed(CloseEvent {
                code: Some(1000),
                reason: Some("done".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_partial_frames_reassembled() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let payload = frame(CommandId::new(7), b"split across writes");
        let wire = payload.clone();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mid = wire.len() / 2;
            socket.write_all(&wire[..mid]).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            socket.write_all(&wire[mid..]).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        });

        let transport = TcpTransport::new();
        let (events, mut rx) = recorder();
        transport.bind(events);
        transport.connect("127.0.0.1", port);

        assert_eq!(next(&mut rx).await, Ev::Connected);
        assert_eq!(next(&mut rx).await, Ev::Message(payload));
    }

    #[tokio::test]
    async fn test_send_without_connection_is_dropped() {
        let transport = TcpTransport::new();
        let (events, _rx) = recorder();
        transport.bind(events);

        // No connect issued; nothing to assert beyond not panicking.
        transport.send(frame(CommandId::new(1), b"x"));
        transport.close(None, None);
    }
}
