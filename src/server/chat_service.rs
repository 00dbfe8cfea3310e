use crate::net::ConnectionHandle;
use crate::protocol::ErrorKind;

use super::GameServer;

impl GameServer {
    /// `CHAT_MESSAGE`: room-wide chat, visible to players and spectators.
    pub async fn handle_chat(&self, conn: &ConnectionHandle, text: &str) {
        let Some((room, _role)) = self.registry.find_by_connection(conn.id()).await else {
            self.send_error(conn, ErrorKind::NotInRoom);
            return;
        };
        match room.chat(conn.id(), text).await {
            Ok(outbox) => outbox.dispatch(),
            Err(kind) => self.send_error(conn, kind),
        }
    }

    /// `SPECTATOR_CHAT`: side channel among spectators only.
    pub async fn handle_spectator_chat(&self, conn: &ConnectionHandle, text: &str) {
        let Some((room, _role)) = self.registry.find_by_connection(conn.id()).await else {
            self.send_error(conn, ErrorKind::NotInRoom);
            return;
        };
        match room.spectator_chat(conn.id(), text).await {
            Ok(outbox) => outbox.dispatch(),
            Err(kind) => self.send_error(conn, kind),
        }
    }
}
