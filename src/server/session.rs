use crate::net::ConnectionHandle;
use crate::protocol::{self, ClientMessage};

use super::GameServer;

impl GameServer {
    /// Handle one raw wire line from a connection. Malformed or unknown
    /// messages are logged and skipped; they never tear down the session.
    pub async fn dispatch_line(&self, conn: &ConnectionHandle, line: &str) {
        match protocol::decode(line) {
            Ok(message) => self.dispatch(conn, message).await,
            Err(err) => {
                tracing::warn!(conn_id = %conn.id(), error = %err, "Skipping unparseable line");
            }
        }
    }

    /// Route a parsed client message to its service handler.
    pub async fn dispatch(&self, conn: &ConnectionHandle, message: ClientMessage) {
        match message {
            ClientMessage::CreateRoom { player_name } => {
                self.handle_create_room(conn, &player_name).await;
            }
            ClientMessage::JoinRoom {
                room_id,
                player_name,
            } => {
                self.handle_join_room(conn, &room_id, &player_name).await;
            }
            ClientMessage::SpectateRoom {
                room_id,
                spectator_name,
            } => {
                self.handle_spectate_room(conn, &room_id, &spectator_name)
                    .await;
            }
            ClientMessage::ListRooms {} => self.handle_list_rooms(conn).await,
            ClientMessage::LeaveRoom {} => self.handle_leave_room(conn).await,
            ClientMessage::Ready {} => self.handle_ready(conn).await,
            ClientMessage::PlaceStone { x, y } => self.handle_place_stone(conn, x, y).await,
            ClientMessage::ChatMessage { message } => self.handle_chat(conn, &message).await,
            ClientMessage::SpectatorChat { message } => {
                self.handle_spectator_chat(conn, &message).await;
            }
            ClientMessage::Surrender {} => self.handle_surrender(conn).await,
            ClientMessage::Rematch {} => self.handle_rematch(conn).await,
            ClientMessage::RematchResponse { accepted } => {
                self.handle_rematch_response(conn, accepted).await;
            }
            ClientMessage::Reconnect { player_name } => {
                self.handle_reconnect(conn, &player_name).await;
            }
        }
    }

    /// Socket loss: hand the connection to its room for disconnect
    /// bookkeeping, then drop rooms that emptied out.
    pub async fn handle_connection_closed(&self, conn: &ConnectionHandle) {
        if let Some((room, _role)) = self.registry.find_by_connection(conn.id()).await {
            let (removed, outbox) = room.handle_disconnect(conn.id()).await;
            outbox.dispatch();
            if let Some((name, role)) = removed {
                tracing::info!(
                    conn_id = %conn.id(),
                    room_id = %room.id(),
                    user_name = %name,
                    %role,
                    "Connection lost"
                );
            }
        }
        self.registry.purge().await;
    }
}
