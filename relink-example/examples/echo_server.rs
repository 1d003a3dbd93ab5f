//! Echo Server Example
//!
//! Accepts command-framed connections and echoes every frame back with the
//! same command, so a request issued with `send_with_timeout(cmd, ...)`
//! correlates against its own echo. Kill and restart the server while the
//! reconnect client runs to watch the session recover.

use bytes::BytesMut;
use relink_core::CommandId;
use relink_transport::{FrameCodec, body, frame};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Decoder;
use tracing::{error, info};

mod common;
use common::{init_logging, port};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let addr = format!("127.0.0.1:{}", port());
    let listener = TcpListener::bind(&addr).await?;
    info!("echo server listening on {addr}");

    loop {
        let (socket, peer) = listener.accept().await?;
        info!("client connected from {peer}");
        tokio::spawn(async move {
            if let Err(err) = serve(socket).await {
                error!("connection error: {err}");
            }
            info!("client {peer} gone");
        });
    }
}

async fn serve(mut socket: TcpStream) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut codec = FrameCodec::new();
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        while let Some(inbound) = codec.decode(&mut buf)? {
            let inbound = inbound.freeze();
            let cmd = CommandId::new(i32::from_be_bytes(inbound[4..8].try_into()?));
            if cmd == CommandId::NONE {
                info!("heartbeat");
            } else {
                info!("echoing command {cmd} ({} body bytes)", inbound.len() - 8);
            }
            socket.write_all(&frame(cmd, &body(&inbound))).await?;
        }
        if socket.read_buf(&mut buf).await? == 0 {
            return Ok(());
        }
    }
}
