//! Feed aggregation: collapses the raw notification log into
//! display-ready items.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ForumError, ForumResult};
use crate::forum_store::FullForumStore;

use super::models::{HydratedNotification, NotificationType};
use super::store::NotificationStore;

/// Fixed page size of the paged viewing mode.
pub const FEED_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderView {
    pub id: i64,
    pub handle: String,
}

/// One aggregated, display-ready notification. Represents every log row
/// sharing the exact (type, topic, comment) key; `others` counts the
/// distinct senders beyond the one shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: i64,
    pub notification_type: NotificationType,
    pub sender: SenderView,
    pub created_at: i64,
    pub uri: String,
    pub title: String,
    pub topic_id: i64,
    pub is_read: bool,
    pub others: Option<u32>,
    pub comment_id: Option<i64>,
    pub new_id: Option<i64>,
}

impl FeedItem {
    pub(crate) fn render(entry: &HydratedNotification, others: Option<u32>) -> FeedItem {
        let notification = &entry.notification;
        let title = match &entry.comment_content {
            Some(content) if notification.comment_id.is_some() => format!("Comment: {}", content),
            _ => format!("Topic: {}", entry.topic_title),
        };
        FeedItem {
            id: notification.id,
            notification_type: notification.notification_type,
            sender: SenderView {
                id: notification.sender_id,
                handle: entry.sender_handle.clone(),
            },
            created_at: notification.created_at,
            uri: entry.topic_uri.clone(),
            title,
            topic_id: notification.topic_id,
            is_read: notification.is_read,
            others,
            comment_id: notification.comment_id,
            new_id: notification.new_id,
        }
    }
}

type GroupKey = (NotificationType, i64, Option<i64>);

/// Collapses a newest-first log into one item per exact
/// (type, topic, comment) key.
///
/// Entries whose topic was soft-deleted, or whose referenced comment no
/// longer exists, are dropped: the content vanished after the row was
/// logged. The newest entry of each group is the representative, so group
/// order follows representative recency.
fn aggregate(entries: &[HydratedNotification]) -> Vec<FeedItem> {
    let mut order: Vec<GroupKey> = Vec::new();
    let mut groups: HashMap<GroupKey, (usize, HashSet<i64>)> = HashMap::new();

    for (index, entry) in entries.iter().enumerate() {
        let notification = &entry.notification;
        if entry.topic_is_deleted {
            continue;
        }
        if notification.comment_id.is_some() && entry.comment_content.is_none() {
            continue;
        }

        let key = (
            notification.notification_type,
            notification.topic_id,
            notification.comment_id,
        );
        let (_, senders) = groups.entry(key).or_insert_with(|| {
            order.push(key);
            (index, HashSet::new())
        });
        senders.insert(notification.sender_id);
    }

    order
        .iter()
        .map(|key| {
            let (representative, senders) = &groups[key];
            FeedItem::render(&entries[*representative], Some(senders.len() as u32 - 1))
        })
        .collect()
}

/// Builds the user-visible notification feed from the raw log.
pub struct FeedAggregator {
    store: Arc<dyn FullForumStore>,
}

impl FeedAggregator {
    pub fn new(store: Arc<dyn FullForumStore>) -> Self {
        Self { store }
    }

    /// Returns the receiver's aggregated feed.
    ///
    /// Dual viewing mode, preserved exactly:
    /// - `page = None`: unread items only, no pagination (live
    ///   badge/dropdown).
    /// - `page = Some(offset)`: a fixed page of [`FEED_PAGE_SIZE`] items
    ///   starting at `offset` over the full grouped list, read and unread.
    ///   A negative offset is an `InvalidArgument`.
    pub fn feed(&self, receiver_id: i64, page: Option<i64>) -> ForumResult<Vec<FeedItem>> {
        if let Some(offset) = page {
            if offset < 0 {
                return Err(ForumError::InvalidArgument(
                    "page offset must be non-negative",
                ));
            }
        }

        let entries = self.store.get_notifications_for_receiver(receiver_id)?;
        let items = aggregate(&entries);

        Ok(match page {
            None => items.into_iter().filter(|item| !item.is_read).collect(),
            Some(offset) => items
                .into_iter()
                .skip(offset as usize)
                .take(FEED_PAGE_SIZE)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::models::Notification;

    fn entry(
        id: i64,
        notification_type: NotificationType,
        sender_id: i64,
        topic_id: i64,
        comment_id: Option<i64>,
    ) -> HydratedNotification {
        HydratedNotification {
            notification: Notification {
                id,
                notification_type,
                created_at: 1_000 + id,
                is_read: false,
                sender_id,
                receiver_id: 1,
                topic_id,
                comment_id,
                new_id: None,
            },
            sender_handle: format!("user-{}", sender_id),
            topic_title: format!("topic-{}", topic_id),
            topic_uri: format!("topic-{}", topic_id),
            topic_is_deleted: false,
            comment_content: comment_id.map(|id| format!("comment-{}", id)),
        }
    }

    #[test]
    fn groups_by_exact_type_topic_and_comment() {
        // Newest first: ids descending
        let entries = vec![
            entry(5, NotificationType::UpVote, 4, 10, None),
            entry(4, NotificationType::DownVote, 3, 10, None),
            entry(3, NotificationType::UpVote, 2, 10, None),
        ];

        let items = aggregate(&entries);

        // Up and down votes on the same topic are distinct items
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].notification_type, NotificationType::UpVote);
        assert_eq!(items[0].others, Some(1));
        assert_eq!(items[1].notification_type, NotificationType::DownVote);
        assert_eq!(items[1].others, Some(0));
    }

    #[test]
    fn representative_is_the_newest_entry() {
        let entries = vec![
            entry(9, NotificationType::UpVote, 5, 10, None),
            entry(2, NotificationType::UpVote, 4, 10, None),
        ];

        let items = aggregate(&entries);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 9);
        assert_eq!(items[0].sender.handle, "user-5");
    }

    #[test]
    fn others_counts_distinct_senders() {
        let mut entries = vec![
            entry(4, NotificationType::Comment, 4, 10, None),
            entry(3, NotificationType::Comment, 3, 10, None),
            entry(2, NotificationType::Comment, 2, 10, None),
        ];
        // Same sender twice does not inflate the count
        entries.push(entry(1, NotificationType::Comment, 4, 10, None));

        let items = aggregate(&entries);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].others, Some(2));
    }

    #[test]
    fn deleted_topic_entries_are_dropped() {
        let mut deleted = entry(2, NotificationType::UpVote, 2, 10, None);
        deleted.topic_is_deleted = true;
        let entries = vec![deleted, entry(1, NotificationType::UpVote, 3, 11, None)];

        let items = aggregate(&entries);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].topic_id, 11);
    }

    #[test]
    fn orphaned_comment_entries_are_dropped() {
        let mut orphaned = entry(2, NotificationType::Reply, 2, 10, Some(7));
        orphaned.comment_content = None;
        let entries = vec![orphaned, entry(1, NotificationType::UpVote, 3, 10, None)];

        let items = aggregate(&entries);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].comment_id, None);
    }

    #[test]
    fn titles_point_at_the_comment_or_the_topic() {
        let entries = vec![
            entry(2, NotificationType::CommentUpVote, 2, 10, Some(7)),
            entry(1, NotificationType::UpVote, 2, 10, None),
        ];

        let items = aggregate(&entries);

        assert_eq!(items[0].title, "Comment: comment-7");
        assert_eq!(items[1].title, "Topic: topic-10");
    }
}
