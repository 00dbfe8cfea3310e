use crate::net::ConnectionHandle;
use crate::protocol::{ErrorKind, ServerMessage, SuccessPayload};
use crate::room::RematchOutcome;

use super::GameServer;

impl GameServer {
    /// `REMATCH`: ask the opponent to play again. Mutual agreement restarts
    /// the game with swapped colors.
    pub async fn handle_rematch(&self, conn: &ConnectionHandle) {
        let Some((room, _role)) = self.registry.find_by_connection(conn.id()).await else {
            self.send_error(conn, ErrorKind::NotInRoom);
            return;
        };
        match room.request_rematch(conn.id()).await {
            Ok(outbox) => {
                outbox.dispatch();
                tracing::info!(room_id = %room.id(), conn_id = %conn.id(), "Rematch requested");
            }
            Err(kind) => self.send_error(conn, kind),
        }
    }

    /// `REMATCH_RESPONSE`: accept (equivalent to requesting) or decline.
    pub async fn handle_rematch_response(&self, conn: &ConnectionHandle, accepted: bool) {
        let Some((room, _role)) = self.registry.find_by_connection(conn.id()).await else {
            self.send_error(conn, ErrorKind::NotInRoom);
            return;
        };
        match room.respond_rematch(conn.id(), accepted).await {
            Ok((RematchOutcome::AwaitingOpponent, outbox)) => {
                outbox.dispatch();
                let mut payload = SuccessPayload::new("Waiting for other player's response...");
                payload.rematch_accepted = Some(true);
                conn.send_message(ServerMessage::Success(Box::new(payload)));
            }
            Ok((outcome, outbox)) => {
                outbox.dispatch();
                tracing::info!(room_id = %room.id(), ?outcome, "Rematch response resolved");
            }
            Err(kind) => self.send_error(conn, kind),
        }
    }
}
