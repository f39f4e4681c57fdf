//! Composition root: wires the store, the live registry and the services
//! into one embeddable backend.

use std::sync::Arc;

use anyhow::Result;

use crate::comments::{CommentService, CommentView, ReplyView};
use crate::config::ForumConfig;
use crate::error::{ForumError, ForumResult};
use crate::forum_store::{ForumStore, FullForumStore, SqliteForumStore, Topic, User};
use crate::live::{ConnectionManager, GroupBroadcaster, LiveBroadcast};
use crate::notifications::{FeedAggregator, FeedItem, NotificationService};
use crate::votes::{VoteLedger, VoteOutcome};

const DB_FILE_NAME: &str = "forum.db";

pub struct ForumBackend {
    store: Arc<dyn FullForumStore>,
    connections: Arc<ConnectionManager>,
    notifications: Arc<NotificationService>,
    ledger: VoteLedger,
    comments: CommentService,
    feed: FeedAggregator,
}

impl ForumBackend {
    /// Opens (or creates) the database under the configured directory and
    /// wires the backend around it.
    pub fn open(config: &ForumConfig) -> Result<Self> {
        let store: Arc<dyn FullForumStore> =
            Arc::new(SqliteForumStore::new(config.db_dir.join(DB_FILE_NAME))?);
        Ok(Self::with_store(store, config.live_channel_capacity))
    }

    /// Wires the backend around an existing store.
    pub fn with_store(store: Arc<dyn FullForumStore>, live_channel_capacity: usize) -> Self {
        let connections = Arc::new(ConnectionManager::new(live_channel_capacity));
        let broadcaster: Arc<dyn LiveBroadcast> =
            Arc::new(GroupBroadcaster::new(connections.clone()));
        let notifications = Arc::new(NotificationService::new(store.clone(), broadcaster.clone()));
        let ledger = VoteLedger::new(store.clone(), notifications.clone());
        let comments = CommentService::new(store.clone(), notifications.clone(), broadcaster);
        let feed = FeedAggregator::new(store.clone());

        Self {
            store,
            connections,
            notifications,
            ledger,
            comments,
            feed,
        }
    }

    pub fn store(&self) -> &Arc<dyn FullForumStore> {
        &self.store
    }

    /// The live registry clients subscribe through.
    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    pub fn create_user(&self, handle: &str) -> ForumResult<User> {
        if handle.is_empty() {
            return Err(ForumError::InvalidArgument("user handle cannot be empty"));
        }
        let id = self.store.create_user(handle)?;
        Ok(User {
            id,
            handle: handle.to_string(),
        })
    }

    pub fn create_topic(
        &self,
        author_id: i64,
        title: &str,
        uri: &str,
        content: &str,
    ) -> ForumResult<Topic> {
        Ok(self.store.create_topic(author_id, title, uri, content)?)
    }

    /// Soft-deletes a topic owned by the caller.
    pub fn delete_topic(&self, user_id: i64, topic_id: i64) -> ForumResult<()> {
        match self.store.get_topic(topic_id)? {
            Some(topic) if topic.author_id == user_id && !topic.is_deleted => {
                self.store.set_topic_deleted(topic_id)?;
                Ok(())
            }
            _ => Err(ForumError::NotFound("topic")),
        }
    }

    /// Removes a comment owned by the caller. Notifications referencing it
    /// stay in the log and drop out of the feed.
    pub fn delete_comment(&self, user_id: i64, comment_id: i64) -> ForumResult<()> {
        let comment = self
            .store
            .get_comment(comment_id)?
            .ok_or(ForumError::NotFound("comment"))?;
        if comment.author_id != user_id {
            return Err(ForumError::NotFound("comment"));
        }
        let topic = self.store.get_topic(comment.topic_id)?;
        if !topic.is_some_and(|topic| !topic.is_deleted) {
            return Err(ForumError::NotFound("comment"));
        }
        self.store.delete_comment(comment_id)?;
        Ok(())
    }

    pub async fn toggle_topic_vote(
        &self,
        voter_id: i64,
        topic_id: i64,
        is_up: bool,
    ) -> ForumResult<VoteOutcome> {
        self.ledger.toggle_topic_vote(voter_id, topic_id, is_up).await
    }

    pub async fn toggle_comment_vote(
        &self,
        voter_id: i64,
        comment_id: i64,
        is_up: bool,
    ) -> ForumResult<VoteOutcome> {
        self.ledger
            .toggle_comment_vote(voter_id, comment_id, is_up)
            .await
    }

    pub async fn add_comment(
        &self,
        author_id: i64,
        topic_id: i64,
        content: &str,
    ) -> ForumResult<CommentView> {
        self.comments.add_comment(author_id, topic_id, content).await
    }

    pub async fn add_reply(
        &self,
        author_id: i64,
        comment_id: i64,
        content: &str,
    ) -> ForumResult<ReplyView> {
        self.comments.add_reply(author_id, comment_id, content).await
    }

    /// The receiver's aggregated notification feed; see
    /// [`FeedAggregator::feed`] for the dual viewing mode.
    pub fn feed(&self, receiver_id: i64, page: Option<i64>) -> ForumResult<Vec<FeedItem>> {
        self.feed.feed(receiver_id, page)
    }

    pub fn mark_as_read(&self, receiver_id: i64, notification_id: i64) -> ForumResult<()> {
        self.notifications.mark_as_read(receiver_id, notification_id)
    }
}
