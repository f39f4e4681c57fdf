//! Notification data models

use serde::{Deserialize, Serialize};

/// Notification type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    UpVote,
    DownVote,
    Comment,
    CommentUpVote,
    CommentDownVote,
    Reply,
}

impl NotificationType {
    /// The closed up/down pairing used for duplicate suppression: a vote
    /// notification also suppresses its opposite direction. Comment and
    /// reply types have no opposite.
    pub fn opposite(self) -> Option<NotificationType> {
        match self {
            NotificationType::UpVote => Some(NotificationType::DownVote),
            NotificationType::DownVote => Some(NotificationType::UpVote),
            NotificationType::CommentUpVote => Some(NotificationType::CommentDownVote),
            NotificationType::CommentDownVote => Some(NotificationType::CommentUpVote),
            NotificationType::Comment | NotificationType::Reply => None,
        }
    }

    pub(crate) fn to_int(self) -> i64 {
        match self {
            NotificationType::UpVote => 0,
            NotificationType::DownVote => 1,
            NotificationType::Comment => 2,
            NotificationType::CommentUpVote => 3,
            NotificationType::CommentDownVote => 4,
            NotificationType::Reply => 5,
        }
    }

    pub(crate) fn from_int(value: i64) -> Option<NotificationType> {
        match value {
            0 => Some(NotificationType::UpVote),
            1 => Some(NotificationType::DownVote),
            2 => Some(NotificationType::Comment),
            3 => Some(NotificationType::CommentUpVote),
            4 => Some(NotificationType::CommentDownVote),
            5 => Some(NotificationType::Reply),
            _ => None,
        }
    }
}

/// One entry of the append-only notification log.
///
/// `is_read` is the only field that ever mutates after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub notification_type: NotificationType,
    pub created_at: i64,
    pub is_read: bool,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub topic_id: i64,
    /// Present only for comment-scoped types.
    pub comment_id: Option<i64>,
    /// Id of the comment or reply that triggered the notification, when a
    /// new piece of content did.
    pub new_id: Option<i64>,
}

/// A notification about to be emitted, before the log assigns id,
/// timestamp and read state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCandidate {
    pub notification_type: NotificationType,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub topic_id: i64,
    pub comment_id: Option<i64>,
    pub new_id: Option<i64>,
}

/// A log entry joined with the display context the feed renders from.
///
/// `comment_content` is None when the referenced comment no longer exists;
/// together with `topic_is_deleted` this is how vanished content is
/// detected after the fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydratedNotification {
    pub notification: Notification,
    pub sender_handle: String,
    pub topic_title: String,
    pub topic_uri: String,
    pub topic_is_deleted: bool,
    pub comment_content: Option<String>,
}
