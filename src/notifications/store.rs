use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use crate::forum_store::sqlite_forum_store::{
    now_millis, SqliteForumStore, COMMENT_TABLE_V_0, NOTIFICATION_TABLE_V_0, TOPIC_TABLE_V_0,
    USER_TABLE_V_0,
};

use super::models::{HydratedNotification, Notification, NotificationCandidate, NotificationType};

pub trait NotificationStore: Send + Sync {
    /// Appends a notification to the log and returns the stored row.
    fn insert_notification(&self, candidate: &NotificationCandidate) -> Result<Notification>;

    /// Returns whether a notification with the given sender/topic/comment
    /// key and any of the given types is already logged, read or not.
    fn notification_exists(
        &self,
        sender_id: i64,
        topic_id: i64,
        comment_id: Option<i64>,
        types: &[NotificationType],
    ) -> Result<bool>;

    /// Returns the receiver's full log, newest first, each entry joined
    /// with sender handle, topic title/uri/deleted flag and the referenced
    /// comment's content where the comment still exists.
    fn get_notifications_for_receiver(
        &self,
        receiver_id: i64,
    ) -> Result<Vec<HydratedNotification>>;

    /// Returns the notification with the given id.
    /// Returns Ok(None) if the row does not exist.
    fn get_notification(&self, notification_id: i64) -> Result<Option<Notification>>;

    /// Flips the read flag to true. Idempotent.
    fn mark_notification_read(&self, notification_id: i64) -> Result<()>;
}

fn type_from_row(index: usize, value: i64) -> rusqlite::Result<NotificationType> {
    NotificationType::from_int(value).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(index, "type".to_string(), rusqlite::types::Type::Integer)
    })
}

impl NotificationStore for SqliteForumStore {
    fn insert_notification(&self, candidate: &NotificationCandidate) -> Result<Notification> {
        let conn = self.conn.lock().unwrap();
        let created = now_millis();
        conn.execute(
            &format!(
                "INSERT INTO {} (type, is_read, sender_id, receiver_id, topic_id, comment_id, new_id, created) \
                 VALUES (?1, 0, ?2, ?3, ?4, ?5, ?6, ?7)",
                NOTIFICATION_TABLE_V_0.name
            ),
            params![
                candidate.notification_type.to_int(),
                candidate.sender_id,
                candidate.receiver_id,
                candidate.topic_id,
                candidate.comment_id,
                candidate.new_id,
                created,
            ],
        )
        .with_context(|| {
            format!(
                "Failed to insert notification for receiver {}",
                candidate.receiver_id
            )
        })?;

        Ok(Notification {
            id: conn.last_insert_rowid(),
            notification_type: candidate.notification_type,
            created_at: created,
            is_read: false,
            sender_id: candidate.sender_id,
            receiver_id: candidate.receiver_id,
            topic_id: candidate.topic_id,
            comment_id: candidate.comment_id,
            new_id: candidate.new_id,
        })
    }

    fn notification_exists(
        &self,
        sender_id: i64,
        topic_id: i64,
        comment_id: Option<i64>,
        types: &[NotificationType],
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let type_list = types
            .iter()
            .map(|t| t.to_int().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE sender_id = ?1 AND topic_id = ?2 \
             AND type IN ({}) AND comment_id {}",
            NOTIFICATION_TABLE_V_0.name,
            type_list,
            if comment_id.is_some() { "= ?3" } else { "IS NULL" },
        );
        let count: i64 = match comment_id {
            Some(comment_id) => {
                conn.query_row(&sql, params![sender_id, topic_id, comment_id], |row| {
                    row.get(0)
                })?
            }
            None => conn.query_row(&sql, params![sender_id, topic_id], |row| row.get(0))?,
        };
        Ok(count > 0)
    }

    fn get_notifications_for_receiver(
        &self,
        receiver_id: i64,
    ) -> Result<Vec<HydratedNotification>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT n.id, n.type, n.created, n.is_read, n.sender_id, n.receiver_id, \
                    n.topic_id, n.comment_id, n.new_id, \
                    u.handle, t.title, t.uri, t.is_deleted, c.content \
             FROM {notification} n \
             JOIN {user} u ON u.id = n.sender_id \
             JOIN {topic} t ON t.id = n.topic_id \
             LEFT JOIN {comment} c ON c.id = n.comment_id \
             WHERE n.receiver_id = ?1 \
             ORDER BY n.created DESC, n.id DESC",
            notification = NOTIFICATION_TABLE_V_0.name,
            user = USER_TABLE_V_0.name,
            topic = TOPIC_TABLE_V_0.name,
            comment = COMMENT_TABLE_V_0.name,
        ))?;

        let entries = stmt
            .query_map(params![receiver_id], |row| {
                Ok(HydratedNotification {
                    notification: Notification {
                        id: row.get(0)?,
                        notification_type: type_from_row(1, row.get(1)?)?,
                        created_at: row.get(2)?,
                        is_read: row.get::<_, i64>(3)? != 0,
                        sender_id: row.get(4)?,
                        receiver_id: row.get(5)?,
                        topic_id: row.get(6)?,
                        comment_id: row.get(7)?,
                        new_id: row.get(8)?,
                    },
                    sender_handle: row.get(9)?,
                    topic_title: row.get(10)?,
                    topic_uri: row.get(11)?,
                    topic_is_deleted: row.get::<_, i64>(12)? != 0,
                    comment_content: row.get(13)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn get_notification(&self, notification_id: i64) -> Result<Option<Notification>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, type, created, is_read, sender_id, receiver_id, topic_id, comment_id, new_id \
             FROM {} WHERE id = ?1",
            NOTIFICATION_TABLE_V_0.name
        ))?;
        let notification = stmt
            .query_row(params![notification_id], |row| {
                Ok(Notification {
                    id: row.get(0)?,
                    notification_type: type_from_row(1, row.get(1)?)?,
                    created_at: row.get(2)?,
                    is_read: row.get::<_, i64>(3)? != 0,
                    sender_id: row.get(4)?,
                    receiver_id: row.get(5)?,
                    topic_id: row.get(6)?,
                    comment_id: row.get(7)?,
                    new_id: row.get(8)?,
                })
            })
            .optional()?;
        Ok(notification)
    }

    fn mark_notification_read(&self, notification_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "UPDATE {} SET is_read = 1 WHERE id = ?1",
                NOTIFICATION_TABLE_V_0.name
            ),
            params![notification_id],
        )
        .with_context(|| format!("Failed to mark notification {} read", notification_id))?;
        Ok(())
    }
}
