//! Game server: per-connection message dispatch plus background maintenance.
//!
//! Handlers are grouped by concern, one file per service, all implemented on
//! [`GameServer`]. Every handler follows the same shape: resolve the room,
//! run one locked room operation, send the direct acknowledgement, then
//! dispatch the deferred notifications the room returned.

mod chat_service;
mod forfeit_monitor;
mod game_service;
mod reconnection_service;
mod rematch_service;
mod room_service;
mod session;

#[cfg(test)]
mod rematch_service_tests;

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::net::ConnectionHandle;
use crate::protocol::ErrorKind;
use crate::registry::RoomRegistry;

pub struct GameServer {
    config: Arc<ServerConfig>,
    registry: RoomRegistry,
}

impl GameServer {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let config = Arc::new(config);
        Arc::new(Self {
            registry: RoomRegistry::new(Arc::clone(&config)),
            config,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Spawn the forfeit monitor / room purge loop.
    pub fn spawn_maintenance(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(Arc::clone(self).maintenance_task())
    }

    pub(crate) fn send_error(&self, conn: &ConnectionHandle, kind: ErrorKind) {
        conn.send_message(kind.into_message());
    }
}
