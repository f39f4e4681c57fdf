//! Notification service for emitting and acknowledging notifications.
//!
//! Emission is a three-step pipeline: duplicate suppression, durable
//! append, best-effort live push. Only the append can fail the caller.

use std::sync::Arc;

use tracing::debug;

use crate::error::{ForumError, ForumResult};
use crate::forum_store::{Comment, FullForumStore, Topic, User};
use crate::keyed_locks::KeyedLocks;
use crate::live::{msg_types, LiveBroadcast, ServerMessage};

use super::feed::FeedItem;
use super::models::{HydratedNotification, NotificationCandidate, NotificationType};
use super::store::NotificationStore;

pub struct NotificationService {
    store: Arc<dyn FullForumStore>,
    broadcaster: Arc<dyn LiveBroadcast>,
    emit_locks: KeyedLocks<(i64, i64, Option<i64>)>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn FullForumStore>, broadcaster: Arc<dyn LiveBroadcast>) -> Self {
        Self {
            store,
            broadcaster,
            emit_locks: KeyedLocks::new(),
        }
    }

    /// Notifies a topic's author that someone voted on it.
    pub async fn notify_topic_vote(
        &self,
        sender: &User,
        topic: &Topic,
        is_up: bool,
    ) -> ForumResult<()> {
        let candidate = NotificationCandidate {
            notification_type: if is_up {
                NotificationType::UpVote
            } else {
                NotificationType::DownVote
            },
            sender_id: sender.id,
            receiver_id: topic.author_id,
            topic_id: topic.id,
            comment_id: None,
            new_id: None,
        };
        self.emit(candidate, sender, topic, None).await
    }

    /// Notifies a topic's author that a comment was posted on it.
    pub async fn notify_comment(
        &self,
        sender: &User,
        topic: &Topic,
        comment_id: i64,
    ) -> ForumResult<()> {
        let candidate = NotificationCandidate {
            notification_type: NotificationType::Comment,
            sender_id: sender.id,
            receiver_id: topic.author_id,
            topic_id: topic.id,
            comment_id: None,
            new_id: Some(comment_id),
        };
        self.emit(candidate, sender, topic, None).await
    }

    /// Notifies a comment's author that someone voted on it.
    pub async fn notify_comment_vote(
        &self,
        sender: &User,
        topic: &Topic,
        comment: &Comment,
        is_up: bool,
    ) -> ForumResult<()> {
        let candidate = NotificationCandidate {
            notification_type: if is_up {
                NotificationType::CommentUpVote
            } else {
                NotificationType::CommentDownVote
            },
            sender_id: sender.id,
            receiver_id: comment.author_id,
            topic_id: comment.topic_id,
            comment_id: Some(comment.id),
            new_id: None,
        };
        self.emit(candidate, sender, topic, Some(comment)).await
    }

    /// Notifies a comment's author that a reply was posted under it.
    pub async fn notify_reply(
        &self,
        sender: &User,
        topic: &Topic,
        comment: &Comment,
        reply_id: i64,
    ) -> ForumResult<()> {
        let candidate = NotificationCandidate {
            notification_type: NotificationType::Reply,
            sender_id: sender.id,
            receiver_id: comment.author_id,
            topic_id: comment.topic_id,
            comment_id: Some(comment.id),
            new_id: Some(reply_id),
        };
        self.emit(candidate, sender, topic, Some(comment)).await
    }

    /// Duplicate suppression: the candidate is dropped when a notification
    /// from the same sender on the same (topic, comment) key with the same
    /// type, or its opposite vote direction, is already logged.
    pub fn should_emit(&self, candidate: &NotificationCandidate) -> ForumResult<bool> {
        let mut types = vec![candidate.notification_type];
        if let Some(opposite) = candidate.notification_type.opposite() {
            types.push(opposite);
        }
        let exists = self.store.notification_exists(
            candidate.sender_id,
            candidate.topic_id,
            candidate.comment_id,
            &types,
        )?;
        Ok(!exists)
    }

    /// Marks one of the receiver's notifications as read.
    ///
    /// Fails with `NotFound` when the notification does not exist or
    /// belongs to someone else.
    pub fn mark_as_read(&self, receiver_id: i64, notification_id: i64) -> ForumResult<()> {
        match self.store.get_notification(notification_id)? {
            Some(notification) if notification.receiver_id == receiver_id => {
                self.store.mark_notification_read(notification_id)?;
                Ok(())
            }
            _ => Err(ForumError::NotFound("notification")),
        }
    }

    async fn emit(
        &self,
        candidate: NotificationCandidate,
        sender: &User,
        topic: &Topic,
        comment: Option<&Comment>,
    ) -> ForumResult<()> {
        // Serialize check-then-insert per trigger key so two concurrent
        // candidates cannot both pass the existence check.
        let key = (candidate.sender_id, candidate.topic_id, candidate.comment_id);
        let _guard = self.emit_locks.acquire(key).await;

        if !self.should_emit(&candidate)? {
            debug!(
                "Suppressed duplicate {:?} notification from {} on topic {}",
                candidate.notification_type, candidate.sender_id, candidate.topic_id
            );
            return Ok(());
        }

        let notification = self.store.insert_notification(&candidate)?;
        let receiver_id = notification.receiver_id;

        // The row is durable from here on; delivery is best-effort and
        // failures stay invisible to the caller.
        let entry = HydratedNotification {
            notification,
            sender_handle: sender.handle.clone(),
            topic_title: topic.title.clone(),
            topic_uri: topic.uri.clone(),
            topic_is_deleted: topic.is_deleted,
            comment_content: comment.map(|comment| comment.content.clone()),
        };
        let item = FeedItem::render(&entry, None);
        self.broadcaster
            .push_to_user(receiver_id, ServerMessage::new(msg_types::NOTIFICATION, &item))
            .await;

        Ok(())
    }
}
