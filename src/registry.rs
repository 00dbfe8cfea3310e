//! Room directory.
//!
//! Allocates monotonically increasing `room_<N>` ids and resolves
//! connections to their room and role. The map lock is never held while
//! calling into a room: lookups snapshot the `Arc<Room>` handles first.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::config::ServerConfig;
use crate::protocol::{ConnectionId, Role, RoomId, RoomInfo};
use crate::room::Room;

pub struct RoomRegistry {
    rooms: DashMap<RoomId, Arc<Room>>,
    next_room_id: AtomicU64,
    config: Arc<ServerConfig>,
}

impl RoomRegistry {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            rooms: DashMap::new(),
            next_room_id: AtomicU64::new(1),
            config,
        }
    }

    /// Create an empty room under a fresh id.
    pub fn create(&self) -> Arc<Room> {
        let id = format!("room_{}", self.next_room_id.fetch_add(1, Ordering::Relaxed));
        let room = Room::new(id.clone(), Arc::clone(&self.config));
        self.rooms.insert(id, Arc::clone(&room));
        room
    }

    pub fn get(&self, id: &str) -> Option<Arc<Room>> {
        self.rooms.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Snapshot of all rooms; safe to await on afterwards.
    pub fn rooms(&self) -> Vec<Arc<Room>> {
        self.rooms
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Immutable summaries of every room, for `ROOM_LIST`.
    pub async fn list(&self) -> Vec<RoomInfo> {
        let mut infos = Vec::with_capacity(self.rooms.len());
        for room in self.rooms() {
            infos.push(room.info().await);
        }
        infos
    }

    /// Resolve a connection to its current room and role. A connection is
    /// referenced by at most one room at a time.
    pub async fn find_by_connection(&self, conn_id: ConnectionId) -> Option<(Arc<Room>, Role)> {
        for room in self.rooms() {
            if let Some(role) = room.role_of(conn_id).await {
                return Some((room, role));
            }
        }
        None
    }

    /// Find the room holding a redeemable disconnection record for `name`.
    pub async fn find_reconnectable(&self, name: &str) -> Option<Arc<Room>> {
        for room in self.rooms() {
            if room.can_reconnect(name).await {
                return Some(room);
            }
        }
        None
    }

    /// Find a room that can explain why `name` cannot reconnect (it holds
    /// expired or exhausted reconnect bookkeeping for that player).
    pub async fn find_reconnect_state(&self, name: &str) -> Option<Arc<Room>> {
        for room in self.rooms() {
            if room.has_reconnect_state(name).await {
                return Some(room);
            }
        }
        None
    }

    /// Remove rooms with zero live connections. Returns how many were purged.
    pub async fn purge(&self) -> usize {
        let mut purged = 0;
        for room in self.rooms() {
            if room.is_empty().await {
                // Re-check presence so concurrent purges stay idempotent.
                if self.rooms.remove(room.id()).is_some() {
                    tracing::info!(room_id = %room.id(), "Removed empty room");
                    purged += 1;
                }
            }
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::ConnectionHandle;
    use crate::protocol::ServerMessage;
    use tokio::sync::mpsc;

    fn test_registry() -> RoomRegistry {
        RoomRegistry::new(Arc::new(ServerConfig::default()))
    }

    fn test_conn() -> (ConnectionHandle, mpsc::Receiver<Arc<ServerMessage>>) {
        let (tx, rx) = mpsc::channel(16);
        (ConnectionHandle::new(tx), rx)
    }

    #[tokio::test]
    async fn ids_are_monotonic() {
        let registry = test_registry();
        assert_eq!(registry.create().id(), "room_1");
        assert_eq!(registry.create().id(), "room_2");
        assert_eq!(registry.create().id(), "room_3");
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn get_returns_the_same_room() {
        let registry = test_registry();
        let room = registry.create();
        let fetched = registry.get(room.id()).expect("room exists");
        assert!(Arc::ptr_eq(&room, &fetched));
        assert!(registry.get("room_999").is_none());
    }

    #[tokio::test]
    async fn find_by_connection_reports_role() {
        let registry = test_registry();
        let room = registry.create();
        let (player, _player_rx) = test_conn();
        let (spectator, _spectator_rx) = test_conn();
        let (stranger, _stranger_rx) = test_conn();

        room.add_player("alice", &player).await.expect("seat free");
        room.add_spectator("watcher", &spectator).await;

        let (found, role) = registry
            .find_by_connection(player.id())
            .await
            .expect("player is tracked");
        assert!(Arc::ptr_eq(&found, &room));
        assert_eq!(role, Role::Player);

        let (_, role) = registry
            .find_by_connection(spectator.id())
            .await
            .expect("spectator is tracked");
        assert_eq!(role, Role::Spectator);

        assert!(registry.find_by_connection(stranger.id()).await.is_none());
    }

    #[tokio::test]
    async fn purge_removes_only_empty_rooms() {
        let registry = test_registry();
        let empty = registry.create();
        let occupied = registry.create();
        let (conn, _rx) = test_conn();
        occupied.add_player("alice", &conn).await.expect("seat free");

        assert_eq!(registry.purge().await, 1);
        assert!(registry.get(empty.id()).is_none());
        assert!(registry.get(occupied.id()).is_some());
    }
}
