use std::sync::Arc;

use smallvec::SmallVec;

use crate::net::ConnectionHandle;
use crate::protocol::ServerMessage;

/// Stack-allocated recipient snapshot; rooms rarely exceed two players and a
/// handful of spectators.
pub type Recipients = SmallVec<[ConnectionHandle; 8]>;

/// One deferred notification: a message and the recipients captured for it.
#[derive(Debug)]
pub struct Notification {
    pub recipients: Recipients,
    pub message: Arc<ServerMessage>,
}

/// Deferred notifications collected by room operations.
///
/// Recipients are snapshotted while the room lock is held so every message
/// reflects a consistent membership view; `dispatch` runs after the lock is
/// released, so no send can stall a state transition.
#[derive(Debug, Default)]
pub struct Outbox {
    queued: Vec<Notification>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, recipients: Recipients, message: ServerMessage) {
        self.queued.push(Notification {
            recipients,
            message: Arc::new(message),
        });
    }

    pub fn push_to(&mut self, recipient: &ConnectionHandle, message: ServerMessage) {
        let mut recipients = Recipients::new();
        recipients.push(recipient.clone());
        self.push(recipients, message);
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Deliver every queued notification. Must be called with no room lock
    /// held. Per-recipient failures are handled (and logged) inside
    /// [`ConnectionHandle::send`] and never cascade.
    pub fn dispatch(self) {
        for notification in self.queued {
            for recipient in &notification.recipients {
                recipient.send(Arc::clone(&notification.message));
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn messages(&self) -> Vec<&ServerMessage> {
        self.queued.iter().map(|n| n.message.as_ref()).collect()
    }
}
