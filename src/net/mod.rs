//! TCP transport: accept loop, `\n`-delimited framing, and per-connection
//! reader/writer tasks.
//!
//! Each connection gets a reader loop (this module) and a writer task
//! draining a bounded queue; rooms only ever see the cloneable
//! [`ConnectionHandle`] that feeds the queue.

pub mod connection;

pub use connection::ConnectionHandle;

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};

use crate::server::GameServer;

/// Accept clients forever. Connection failures only ever end that one
/// session, never the server.
pub async fn serve(server: Arc<GameServer>, listener: TcpListener) -> anyhow::Result<()> {
    tracing::info!(local_addr = %listener.local_addr()?, "Listening for clients");
    loop {
        let (stream, addr) = listener.accept().await?;
        let server = Arc::clone(&server);
        tokio::spawn(handle_connection(server, stream, addr));
    }
}

async fn handle_connection(server: Arc<GameServer>, stream: TcpStream, addr: SocketAddr) {
    let codec = LinesCodec::new_with_max_length(server.config().max_line_length);
    let (sink, mut lines) = Framed::new(stream, codec).split();

    let (tx, rx) = mpsc::channel(server.config().outbound_queue_capacity);
    let conn = ConnectionHandle::new(tx);
    tracing::info!(conn_id = %conn.id(), client_addr = %addr, "Client connected");

    tokio::spawn(connection::write_outbound(sink, rx, conn.id()));

    while let Some(next) = lines.next().await {
        match next {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                server.dispatch_line(&conn, line).await;
            }
            Err(err) => {
                tracing::warn!(conn_id = %conn.id(), error = %err, "Framing error, closing connection");
                break;
            }
        }
    }

    tracing::info!(conn_id = %conn.id(), client_addr = %addr, "Client disconnected");
    server.handle_connection_closed(&conn).await;
}
