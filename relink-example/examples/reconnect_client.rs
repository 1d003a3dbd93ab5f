//! Reconnect Client Example
//!
//! Drives a session against the echo server: issues one correlated request
//! per second and logs every response. Stop and restart the server while
//! this runs to see the reconnect indicator, the buffered requests, and the
//! replay once the session is working again.

use relink_core::{CommandId, NetworkIndicator};
use relink_session::Session;
use relink_transport::{CommandCodec, TcpTransport, body, frame};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod common;
use common::{init_logging, port};

struct LogIndicator;

impl NetworkIndicator for LogIndicator {
    fn show_reconnect(&self) {
        info!("[indicator] reconnecting...");
    }

    fn hide_reconnect(&self) {
        info!("[indicator] link restored");
    }

    fn show_pending(&self) {
        info!("[indicator] waiting for server...");
    }

    fn hide_pending(&self) {
        info!("[indicator] all responses in");
    }
}

#[tokio::main]
async fn main() {
    init_logging();

    let session = Session::new(Arc::new(CommandCodec::new()));
    session.init(Arc::new(TcpTransport::new()), Some(Arc::new(LogIndicator)));
    session.set_disconnect_callback(|| {
        info!("connection lost, letting the session retry");
        true
    });

    session.connect("127.0.0.1", port());

    for seq in 1u32.. {
        let cmd = CommandId::new(1);
        let payload = frame(cmd, format!("ping #{seq}").as_bytes());
        session.send_with_timeout(
            payload,
            cmd,
            Arc::new(|cmd, response| {
                let text = String::from_utf8_lossy(&body(response)).into_owned();
                info!("response to {cmd}: {text}");
            }),
            true,
            false,
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
