//! Comment and reply creation: persist, notify the content owner, push a
//! rendered view to everyone viewing the topic.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ForumError, ForumResult};
use crate::forum_store::{Comment, ForumStore, FullForumStore, Topic};
use crate::live::{msg_types, LiveBroadcast, ServerMessage};
use crate::notifications::{NotificationService, SenderView};

/// Display-ready comment, also the payload pushed to the topic group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i64,
    pub topic_id: i64,
    pub author: SenderView,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyView {
    pub id: i64,
    pub comment_id: i64,
    pub author: SenderView,
    pub content: String,
    pub created_at: i64,
}

pub struct CommentService {
    store: Arc<dyn FullForumStore>,
    notifications: Arc<NotificationService>,
    broadcaster: Arc<dyn LiveBroadcast>,
}

impl CommentService {
    pub fn new(
        store: Arc<dyn FullForumStore>,
        notifications: Arc<NotificationService>,
        broadcaster: Arc<dyn LiveBroadcast>,
    ) -> Self {
        Self {
            store,
            notifications,
            broadcaster,
        }
    }

    /// Posts a comment on a topic.
    ///
    /// The topic's author is notified unless they wrote the comment
    /// themselves; the rendered view is then pushed to the topic group,
    /// best-effort.
    pub async fn add_comment(
        &self,
        author_id: i64,
        topic_id: i64,
        content: &str,
    ) -> ForumResult<CommentView> {
        let topic = self.live_topic(topic_id)?;
        let author = self
            .store
            .get_user(author_id)?
            .ok_or(ForumError::NotFound("user"))?;

        let comment = self.store.create_comment(topic_id, author_id, content)?;

        if author_id != topic.author_id {
            self.notifications
                .notify_comment(&author, &topic, comment.id)
                .await?;
        }

        let view = CommentView {
            id: comment.id,
            topic_id,
            author: SenderView {
                id: author.id,
                handle: author.handle,
            },
            content: comment.content,
            created_at: comment.created_at,
        };
        self.broadcaster
            .push_to_topic(topic_id, ServerMessage::new(msg_types::COMMENT_ADDED, &view))
            .await;

        Ok(view)
    }

    /// Posts a reply under a comment.
    ///
    /// The comment's author is notified unless they wrote the reply
    /// themselves; the rendered view is then pushed to the topic group,
    /// best-effort.
    pub async fn add_reply(
        &self,
        author_id: i64,
        comment_id: i64,
        content: &str,
    ) -> ForumResult<ReplyView> {
        let (comment, topic) = self.live_comment(comment_id)?;
        let author = self
            .store
            .get_user(author_id)?
            .ok_or(ForumError::NotFound("user"))?;

        let reply = self.store.create_reply(comment_id, author_id, content)?;

        if author_id != comment.author_id {
            self.notifications
                .notify_reply(&author, &topic, &comment, reply.id)
                .await?;
        }

        let view = ReplyView {
            id: reply.id,
            comment_id,
            author: SenderView {
                id: author.id,
                handle: author.handle,
            },
            content: reply.content,
            created_at: reply.created_at,
        };
        self.broadcaster
            .push_to_topic(
                comment.topic_id,
                ServerMessage::new(msg_types::REPLY_ADDED, &view),
            )
            .await;

        Ok(view)
    }

    fn live_topic(&self, topic_id: i64) -> ForumResult<Topic> {
        self.store
            .get_topic(topic_id)?
            .filter(|topic| !topic.is_deleted)
            .ok_or(ForumError::NotFound("topic"))
    }

    fn live_comment(&self, comment_id: i64) -> ForumResult<(Comment, Topic)> {
        let comment = self
            .store
            .get_comment(comment_id)?
            .ok_or(ForumError::NotFound("comment"))?;
        let topic = self
            .store
            .get_topic(comment.topic_id)?
            .filter(|topic| !topic.is_deleted)
            .ok_or(ForumError::NotFound("comment"))?;
        Ok((comment, topic))
    }
}
