use std::collections::HashMap;
use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use tokio::sync::{mpsc::UnboundedSender, RwLock};
use uuid::Uuid;

pub mod messages;
pub mod session;

pub use messages::{WsInboundEvent, WsOutboundEvent};

/// A delivery target. Mirrors the two room namespaces of the socket
/// protocol: one per user for conversation traffic, one per user for
/// notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    User(ObjectId),
    Notifications(ObjectId),
}

/// Unique identifier for a WebSocket subscriber.
///
/// Each connection gets one id when it registers, allowing precise
/// cleanup when the connection closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

struct Subscriber {
    id: SubscriberId,
    sender: UnboundedSender<String>,
}

/// Connection registry for WebSocket subscribers.
///
/// Tracks which connections joined which rooms. Cleanup is keyed by
/// subscriber id so a closing connection never removes its siblings.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<Room, Vec<Subscriber>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber to a room. Joining a room twice with the same
    /// id is a no-op.
    pub async fn join(&self, room: Room, id: SubscriberId, sender: UnboundedSender<String>) {
        let mut guard = self.inner.write().await;
        let subscribers = guard.entry(room).or_default();
        if subscribers.iter().any(|s| s.id == id) {
            return;
        }
        subscribers.push(Subscriber { id, sender });

        tracing::debug!(
            ?room,
            subscriber = ?id,
            total = subscribers.len(),
            "subscriber joined room"
        );
    }

    /// Remove a subscriber from every room it joined. Must be called
    /// when a connection closes to avoid leaking senders.
    pub async fn leave_all(&self, id: SubscriberId) {
        let mut guard = self.inner.write().await;
        guard.retain(|room, subscribers| {
            let before = subscribers.len();
            subscribers.retain(|s| s.id != id);
            if subscribers.len() != before {
                tracing::debug!(?room, subscriber = ?id, "subscriber left room");
            }
            !subscribers.is_empty()
        });
    }

    /// Broadcast a message to all subscribers of a room, cleaning up
    /// dead senders as they are found.
    pub async fn broadcast(&self, room: Room, msg: String) {
        let mut guard = self.inner.write().await;
        if let Some(subscribers) = guard.get_mut(&room) {
            let before = subscribers.len();
            subscribers.retain(|subscriber| subscriber.sender.send(msg.clone()).is_ok());
            let after = subscribers.len();

            if before != after {
                tracing::debug!(
                    ?room,
                    cleaned = before - after,
                    active = after,
                    "dead senders cleaned up during broadcast"
                );
            }
            if subscribers.is_empty() {
                guard.remove(&room);
            }
        }
    }

    /// Subscriber count for a room (for debugging/tests).
    pub async fn room_size(&self, room: Room) -> usize {
        let guard = self.inner.read().await;
        guard.get(&room).map(|v| v.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn broadcast_reaches_room_members_only() {
        let registry = ConnectionRegistry::new();
        let alice = ObjectId::new();
        let bob = ObjectId::new();

        let (alice_tx, mut alice_rx) = unbounded_channel();
        let (bob_tx, mut bob_rx) = unbounded_channel();
        registry
            .join(Room::User(alice), SubscriberId::new(), alice_tx)
            .await;
        registry
            .join(Room::User(bob), SubscriberId::new(), bob_tx)
            .await;

        registry
            .broadcast(Room::User(alice), "hello".to_string())
            .await;

        assert_eq!(alice_rx.recv().await.unwrap(), "hello");
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn leave_all_removes_from_every_room() {
        let registry = ConnectionRegistry::new();
        let user = ObjectId::new();
        let id = SubscriberId::new();

        let (tx, _rx) = unbounded_channel();
        registry.join(Room::User(user), id, tx.clone()).await;
        registry.join(Room::Notifications(user), id, tx).await;
        assert_eq!(registry.room_size(Room::User(user)).await, 1);
        assert_eq!(registry.room_size(Room::Notifications(user)).await, 1);

        registry.leave_all(id).await;
        assert_eq!(registry.room_size(Room::User(user)).await, 0);
        assert_eq!(registry.room_size(Room::Notifications(user)).await, 0);
    }

    #[tokio::test]
    async fn broadcast_drops_dead_subscribers() {
        let registry = ConnectionRegistry::new();
        let user = ObjectId::new();

        let (dead_tx, dead_rx) = unbounded_channel();
        drop(dead_rx);
        let (live_tx, mut live_rx) = unbounded_channel();

        registry
            .join(Room::Notifications(user), SubscriberId::new(), dead_tx)
            .await;
        registry
            .join(Room::Notifications(user), SubscriberId::new(), live_tx)
            .await;

        registry
            .broadcast(Room::Notifications(user), "ping".to_string())
            .await;

        assert_eq!(live_rx.recv().await.unwrap(), "ping");
        assert_eq!(registry.room_size(Room::Notifications(user)).await, 1);
    }

    #[tokio::test]
    async fn double_join_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let user = ObjectId::new();
        let id = SubscriberId::new();

        let (tx, _rx) = unbounded_channel();
        registry.join(Room::User(user), id, tx.clone()).await;
        registry.join(Room::User(user), id, tx).await;

        assert_eq!(registry.room_size(Room::User(user)).await, 1);
    }
}
