use std::sync::Arc;

use crate::net::ConnectionHandle;
use crate::protocol::{ErrorKind, Role, ServerMessage, SuccessPayload};
use crate::room::Room;

use super::GameServer;

impl GameServer {
    /// `RECONNECT`: resume a seat lost to a mid-game disconnection.
    ///
    /// The failure kinds are distinguishable: a room that still tracks the
    /// player explains whether the window expired or the attempt cap was
    /// hit; with no bookkeeping anywhere there is no session to resume.
    pub async fn handle_reconnect(&self, conn: &ConnectionHandle, player_name: &str) {
        let room = if let Some(room) = self.registry.find_reconnectable(player_name).await {
            room
        } else if let Some(room) = self.registry.find_reconnect_state(player_name).await {
            room
        } else {
            self.send_error(conn, ErrorKind::NoReconnectSession);
            return;
        };
        self.reconnect_into(conn, &room, player_name).await;
    }

    /// Run the reconnect against a specific room and answer the client with
    /// the full room snapshot. Shared with the join-as-reconnect reroute.
    pub(crate) async fn reconnect_into(
        &self,
        conn: &ConnectionHandle,
        room: &Arc<Room>,
        player_name: &str,
    ) {
        match room.reconnect(player_name, conn).await {
            Ok((snapshot, outbox)) => {
                let mut payload = SuccessPayload::new("Reconnected successfully");
                payload.room_id = Some(room.id().clone());
                payload.your_color = Some(snapshot.color);
                payload.role = Some(Role::Player);
                payload.board = Some(snapshot.board);
                payload.current_turn = Some(snapshot.current_turn);
                payload.game_status = Some(snapshot.status);
                payload.remaining_time = snapshot.remaining_time;
                conn.send_message(ServerMessage::Success(Box::new(payload)));
                outbox.dispatch();
                tracing::info!(
                    room_id = %room.id(),
                    player_name = %player_name,
                    conn_id = %conn.id(),
                    "Player reconnected"
                );
            }
            Err(kind) => {
                tracing::warn!(
                    room_id = %room.id(),
                    player_name = %player_name,
                    error = %kind,
                    "Reconnect rejected"
                );
                self.send_error(conn, kind);
            }
        }
    }
}
