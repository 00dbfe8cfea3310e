use crate::net::ConnectionHandle;
use crate::protocol::ErrorKind;

use super::GameServer;

impl GameServer {
    /// `READY`: toggle the seat's ready flag; both flags up starts the game.
    pub async fn handle_ready(&self, conn: &ConnectionHandle) {
        let Some((room, _role)) = self.registry.find_by_connection(conn.id()).await else {
            self.send_error(conn, ErrorKind::NotInRoom);
            return;
        };
        match room.set_ready(conn.id()).await {
            Ok(outbox) => outbox.dispatch(),
            Err(kind) => self.send_error(conn, kind),
        }
    }

    /// `PLACE_STONE`: one move of the current turn.
    pub async fn handle_place_stone(&self, conn: &ConnectionHandle, x: i32, y: i32) {
        let Some((room, _role)) = self.registry.find_by_connection(conn.id()).await else {
            self.send_error(conn, ErrorKind::NotInRoom);
            return;
        };
        match room.place_stone(conn.id(), x, y).await {
            Ok(outbox) => {
                outbox.dispatch();
                tracing::debug!(room_id = %room.id(), x, y, "Stone placed");
            }
            Err(kind) => self.send_error(conn, kind),
        }
    }

    /// `SURRENDER`: concede the current game.
    pub async fn handle_surrender(&self, conn: &ConnectionHandle) {
        let Some((room, _role)) = self.registry.find_by_connection(conn.id()).await else {
            self.send_error(conn, ErrorKind::NotInRoom);
            return;
        };
        match room.surrender(conn.id()).await {
            Ok(outbox) => {
                outbox.dispatch();
                tracing::info!(room_id = %room.id(), conn_id = %conn.id(), "Player surrendered");
            }
            Err(kind) => self.send_error(conn, kind),
        }
    }
}
