//! Live connection registry.
//!
//! Tracks active client connections, organized by named subscription
//! group. A connection subscribes to the group it wants (its own user's
//! notifications, a topic it is viewing) and receives every payload
//! broadcast to that group.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use super::messages::ServerMessage;

pub(crate) const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Names a subscription group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// All of one user's connections (notification delivery).
    User(i64),
    /// Everyone currently viewing one topic (comment/reply delivery).
    Topic(i64),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::User(id) => write!(f, "user:{}", id),
            GroupKey::Topic(id) => write!(f, "topic:{}", id),
        }
    }
}

/// Manages all active live connections.
///
/// Connections are organized by group, then by an opaque connection id
/// assigned at subscription time. One client may hold subscriptions in
/// any number of groups.
pub struct ConnectionManager {
    channel_capacity: usize,
    /// group -> (connection id -> outgoing sender)
    groups: RwLock<HashMap<GroupKey, HashMap<u64, mpsc::Sender<ServerMessage>>>>,
    next_connection_id: AtomicU64,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl ConnectionManager {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            channel_capacity,
            groups: RwLock::new(HashMap::new()),
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Adds a connection to a group.
    ///
    /// Returns the connection id and a receiver for payloads broadcast to
    /// the group. The caller should forward messages from this receiver to
    /// the client and `unsubscribe` on disconnect.
    pub async fn subscribe(&self, group: GroupKey) -> (u64, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);

        let mut groups = self.groups.write().await;
        groups.entry(group).or_default().insert(connection_id, tx);

        (connection_id, rx)
    }

    /// Removes a connection from a group (called on disconnect).
    ///
    /// Removes the entry and cleans up empty groups.
    pub async fn unsubscribe(&self, group: GroupKey, connection_id: u64) {
        let mut groups = self.groups.write().await;
        if let Some(members) = groups.get_mut(&group) {
            members.remove(&connection_id);
            if members.is_empty() {
                groups.remove(&group);
            }
        }
    }

    /// Fires a payload at every connection in the group.
    ///
    /// Sends never block: a connection whose channel is full or closed is
    /// skipped. Returns the number of connections that missed the payload.
    pub async fn broadcast(&self, group: GroupKey, message: ServerMessage) -> usize {
        let groups = self.groups.read().await;
        let mut failed = 0;

        if let Some(members) = groups.get(&group) {
            for sender in members.values() {
                if sender.try_send(message.clone()).is_err() {
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            debug!("Missed {} connections broadcasting to {}", failed, group);
        }
        failed
    }

    /// Number of connections currently subscribed to a group.
    pub async fn subscriber_count(&self, group: GroupKey) -> usize {
        let groups = self.groups.read().await;
        groups.get(&group).map(|members| members.len()).unwrap_or(0)
    }

    /// Total number of subscriptions across all groups.
    pub async fn total_subscriptions(&self) -> usize {
        let groups = self.groups.read().await;
        groups.values().map(|members| members.len()).sum()
    }
}
