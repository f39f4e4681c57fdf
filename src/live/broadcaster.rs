//! The injected push capability.
//!
//! Services depend on [`LiveBroadcast`] rather than a concrete transport
//! so the core stays testable without a real connection registry.

use std::sync::Arc;

use async_trait::async_trait;

use super::connection::{ConnectionManager, GroupKey};
use super::messages::ServerMessage;

/// Fire-and-forget push to a logical target's subscription group.
///
/// At most one delivery attempt; implementations must never block on or
/// surface a slow or unreachable client.
#[async_trait]
pub trait LiveBroadcast: Send + Sync {
    /// Push a payload to all of a user's connections.
    async fn push_to_user(&self, user_id: i64, message: ServerMessage);

    /// Push a payload to everyone viewing a topic.
    async fn push_to_topic(&self, topic_id: i64, message: ServerMessage);
}

/// Broadcasts through an in-process [`ConnectionManager`].
pub struct GroupBroadcaster {
    connections: Arc<ConnectionManager>,
}

impl GroupBroadcaster {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }
}

#[async_trait]
impl LiveBroadcast for GroupBroadcaster {
    async fn push_to_user(&self, user_id: i64, message: ServerMessage) {
        self.connections
            .broadcast(GroupKey::User(user_id), message)
            .await;
    }

    async fn push_to_topic(&self, topic_id: i64, message: ServerMessage) {
        self.connections
            .broadcast(GroupKey::Topic(topic_id), message)
            .await;
    }
}

/// Discards every push. For wiring without live clients.
pub struct NoOpBroadcast;

#[async_trait]
impl LiveBroadcast for NoOpBroadcast {
    async fn push_to_user(&self, _user_id: i64, _message: ServerMessage) {}

    async fn push_to_topic(&self, _topic_id: i64, _message: ServerMessage) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn group_broadcaster_routes_to_the_user_group() {
        let connections = Arc::new(ConnectionManager::default());
        let broadcaster = GroupBroadcaster::new(connections.clone());

        let (_, mut user_rx) = connections.subscribe(GroupKey::User(5)).await;
        let (_, mut topic_rx) = connections.subscribe(GroupKey::Topic(5)).await;

        broadcaster
            .push_to_user(5, ServerMessage::empty("notification"))
            .await;

        assert_eq!(user_rx.recv().await.unwrap().msg_type, "notification");
        assert!(topic_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn group_broadcaster_routes_to_the_topic_group() {
        let connections = Arc::new(ConnectionManager::default());
        let broadcaster = GroupBroadcaster::new(connections.clone());

        let (_, mut topic_rx) = connections.subscribe(GroupKey::Topic(9)).await;

        broadcaster
            .push_to_topic(9, ServerMessage::empty("comment_added"))
            .await;

        assert_eq!(topic_rx.recv().await.unwrap().msg_type, "comment_added");
    }
}
