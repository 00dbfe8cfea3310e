use crate::net::ConnectionHandle;
use crate::protocol::{ErrorKind, Role, ServerMessage, SuccessPayload};

use super::GameServer;

impl GameServer {
    /// `CREATE_ROOM`: allocate a room and seat the creator as black.
    pub async fn handle_create_room(&self, conn: &ConnectionHandle, player_name: &str) {
        // A connection belongs to at most one room; switching rooms implies
        // leaving the previous one first.
        self.leave_current_room(conn).await;

        let room = self.registry.create();
        match room.add_player(player_name, conn).await {
            Ok((seat, outbox)) => {
                let mut payload = SuccessPayload::new("Room created successfully");
                payload.room_id = Some(room.id().clone());
                payload.your_color = Some(seat.color);
                payload.role = Some(Role::Player);
                conn.send_message(ServerMessage::Success(Box::new(payload)));
                outbox.dispatch();
                tracing::info!(
                    room_id = %room.id(),
                    player_name = %player_name,
                    conn_id = %conn.id(),
                    "Room created"
                );
            }
            Err(kind) => self.send_error(conn, kind),
        }
    }

    /// `JOIN_ROOM`: take the second seat. A player with a redeemable
    /// disconnection record in the room is rerouted to the reconnect flow.
    pub async fn handle_join_room(&self, conn: &ConnectionHandle, room_id: &str, player_name: &str) {
        self.leave_current_room(conn).await;

        let Some(room) = self.registry.get(room_id) else {
            self.send_error(conn, ErrorKind::RoomNotFound);
            return;
        };

        if room.can_reconnect(player_name).await {
            tracing::info!(
                room_id = %room.id(),
                player_name = %player_name,
                "Join rerouted to reconnect"
            );
            self.reconnect_into(conn, &room, player_name).await;
            return;
        }

        match room.add_player(player_name, conn).await {
            Ok((seat, outbox)) => {
                let mut payload = SuccessPayload::new("Joined room successfully");
                payload.room_id = Some(room.id().clone());
                payload.your_color = Some(seat.color);
                payload.role = Some(Role::Player);
                payload.board = Some(seat.board);
                payload.current_turn = Some(seat.current_turn);
                conn.send_message(ServerMessage::Success(Box::new(payload)));
                outbox.dispatch();
                tracing::info!(
                    room_id = %room.id(),
                    player_name = %player_name,
                    color = %seat.color,
                    "Player joined room"
                );
            }
            Err(kind) => self.send_error(conn, kind),
        }
    }

    /// `SPECTATE_ROOM`: watch a room; the snapshot lets the client render
    /// a game already in progress.
    pub async fn handle_spectate_room(
        &self,
        conn: &ConnectionHandle,
        room_id: &str,
        spectator_name: &str,
    ) {
        self.leave_current_room(conn).await;

        let Some(room) = self.registry.get(room_id) else {
            self.send_error(conn, ErrorKind::RoomNotFound);
            return;
        };

        let (snapshot, outbox) = room.add_spectator(spectator_name, conn).await;
        let mut payload = SuccessPayload::new("Spectating room");
        payload.room_id = Some(room.id().clone());
        payload.role = Some(Role::Spectator);
        payload.board = Some(snapshot.board);
        payload.current_turn = Some(snapshot.current_turn);
        payload.status = Some(snapshot.status);
        conn.send_message(ServerMessage::Success(Box::new(payload)));
        outbox.dispatch();
        tracing::info!(
            room_id = %room.id(),
            spectator_name = %spectator_name,
            "Spectator joined room"
        );
    }

    /// `LIST_ROOMS`: the room directory.
    pub async fn handle_list_rooms(&self, conn: &ConnectionHandle) {
        let rooms = self.registry.list().await;
        conn.send_message(ServerMessage::RoomList { rooms });
    }

    /// `LEAVE_ROOM`: graceful leave; leaving from the lobby is not an error.
    pub async fn handle_leave_room(&self, conn: &ConnectionHandle) {
        let message = if self.leave_current_room(conn).await {
            "Left room and returned to lobby"
        } else {
            "Already in lobby"
        };
        conn.send_message(ServerMessage::Success(Box::new(SuccessPayload::new(message))));
    }

    /// Remove the connection from whichever room currently references it.
    /// Returns whether it was in one.
    pub(crate) async fn leave_current_room(&self, conn: &ConnectionHandle) -> bool {
        let Some((room, _role)) = self.registry.find_by_connection(conn.id()).await else {
            return false;
        };
        let (removed, outbox) = room.leave(conn.id()).await;
        outbox.dispatch();
        if let Some((name, role)) = removed {
            tracing::info!(room_id = %room.id(), user_name = %name, %role, "Left room");
        }
        self.registry.purge().await;
        true
    }
}
