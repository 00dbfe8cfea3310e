use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::codec::{Framed, LinesCodec};
use uuid::Uuid;

use crate::protocol::{self, ConnectionId, ServerMessage};

/// Cheap, cloneable send handle for one client connection.
///
/// Rooms hold these as opaque send targets; the actual socket lives with the
/// writer task. Sending never blocks: messages are queued on a bounded
/// channel and dropped (with a log line) when the client cannot keep up, so
/// a slow socket can never stall a room.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::Sender<Arc<ServerMessage>>,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::Sender<Arc<ServerMessage>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a message for delivery. Failures are logged and swallowed; they
    /// never cascade into room state.
    pub fn send(&self, message: Arc<ServerMessage>) {
        match self.sender.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Outbound queue full, dropping message");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(conn_id = %self.id, "Connection closed, dropping message");
            }
        }
    }

    /// Convenience wrapper for one-off direct responses.
    pub fn send_message(&self, message: ServerMessage) {
        self.send(Arc::new(message));
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

/// Drain the outbound queue onto the socket, one envelope per line.
pub(crate) async fn write_outbound(
    mut sink: SplitSink<Framed<TcpStream, LinesCodec>, String>,
    mut outbound: mpsc::Receiver<Arc<ServerMessage>>,
    conn_id: ConnectionId,
) {
    while let Some(message) = outbound.recv().await {
        let line = protocol::encode(&message);
        if let Err(err) = sink.send(line).await {
            tracing::debug!(conn_id = %conn_id, error = %err, "Socket write failed, stopping writer");
            break;
        }
    }
}
