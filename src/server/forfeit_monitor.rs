use std::sync::Arc;

use super::GameServer;

impl GameServer {
    /// Background maintenance loop: expire over-grace disconnections (ending
    /// their games by forfeit) and purge rooms with no live connections.
    ///
    /// A single task runs the loop, so sweeps never overlap.
    pub(crate) async fn maintenance_task(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.forfeit_sweep_interval);
        loop {
            interval.tick().await;
            self.sweep().await;
        }
    }

    /// One sweep over every room. Forfeit notifications returned by the
    /// rooms are sent here, outside any room lock.
    pub(crate) async fn sweep(&self) {
        for room in self.registry.rooms() {
            let outbox = room.expire_overdue().await;
            outbox.dispatch();
        }
        let purged = self.registry.purge().await;
        if purged > 0 {
            tracing::debug!(purged, "Maintenance sweep removed empty rooms");
        }
    }
}
