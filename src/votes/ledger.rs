//! Vote toggle state machine.
//!
//! One logical state per (voter, target) pair: None, Up or Down. Toggling
//! the current direction removes the vote, toggling the other direction
//! flips it, and voting with no record creates one. Only creation can
//! notify the content owner.

use std::sync::Arc;

use tracing::debug;

use crate::error::{ForumError, ForumResult};
use crate::forum_store::{ForumStore, FullForumStore};
use crate::keyed_locks::KeyedLocks;
use crate::notifications::NotificationService;

use super::models::VoteOutcome;
use super::store::{is_unique_violation, VoteStore};

pub struct VoteLedger {
    store: Arc<dyn FullForumStore>,
    notifications: Arc<NotificationService>,
    topic_locks: KeyedLocks<(i64, i64)>,
    comment_locks: KeyedLocks<(i64, i64)>,
}

impl VoteLedger {
    pub fn new(store: Arc<dyn FullForumStore>, notifications: Arc<NotificationService>) -> Self {
        Self {
            store,
            notifications,
            topic_locks: KeyedLocks::new(),
            comment_locks: KeyedLocks::new(),
        }
    }

    /// Applies a toggle to the voter's vote on a topic.
    ///
    /// The read-modify-write is serialized per (voter, topic); should a
    /// concurrent writer still win the insert race, the toggle is retried
    /// once against the new state before `Conflict` escalates.
    pub async fn toggle_topic_vote(
        &self,
        voter_id: i64,
        topic_id: i64,
        is_up: bool,
    ) -> ForumResult<VoteOutcome> {
        let _guard = self.topic_locks.acquire((voter_id, topic_id)).await;
        match self.toggle_topic_once(voter_id, topic_id, is_up).await {
            Err(ForumError::Conflict) => {
                debug!(
                    "Topic vote insert lost a race for voter {} on topic {}, retrying",
                    voter_id, topic_id
                );
                self.toggle_topic_once(voter_id, topic_id, is_up).await
            }
            outcome => outcome,
        }
    }

    /// Applies a toggle to the voter's vote on a comment.
    pub async fn toggle_comment_vote(
        &self,
        voter_id: i64,
        comment_id: i64,
        is_up: bool,
    ) -> ForumResult<VoteOutcome> {
        let _guard = self.comment_locks.acquire((voter_id, comment_id)).await;
        match self.toggle_comment_once(voter_id, comment_id, is_up).await {
            Err(ForumError::Conflict) => {
                debug!(
                    "Comment vote insert lost a race for voter {} on comment {}, retrying",
                    voter_id, comment_id
                );
                self.toggle_comment_once(voter_id, comment_id, is_up).await
            }
            outcome => outcome,
        }
    }

    async fn toggle_topic_once(
        &self,
        voter_id: i64,
        topic_id: i64,
        is_up: bool,
    ) -> ForumResult<VoteOutcome> {
        if let Some(previous) = self.store.find_topic_vote(voter_id, topic_id)? {
            return if previous == is_up {
                self.store.delete_topic_vote(voter_id, topic_id)?;
                Ok(VoteOutcome::removed(previous))
            } else {
                self.store.update_topic_vote(voter_id, topic_id, is_up)?;
                Ok(VoteOutcome::flipped(is_up))
            };
        }

        let topic = self
            .store
            .get_topic(topic_id)?
            .filter(|topic| !topic.is_deleted)
            .ok_or(ForumError::NotFound("topic"))?;

        if let Err(err) = self.store.insert_topic_vote(voter_id, topic_id, is_up) {
            return Err(if is_unique_violation(&err) {
                ForumError::Conflict
            } else {
                err.into()
            });
        }

        // Voting on one's own content applies but never alerts.
        if voter_id != topic.author_id {
            let sender = self
                .store
                .get_user(voter_id)?
                .ok_or(ForumError::NotFound("user"))?;
            self.notifications
                .notify_topic_vote(&sender, &topic, is_up)
                .await?;
        }

        Ok(VoteOutcome::created(is_up))
    }

    async fn toggle_comment_once(
        &self,
        voter_id: i64,
        comment_id: i64,
        is_up: bool,
    ) -> ForumResult<VoteOutcome> {
        if let Some(previous) = self.store.find_comment_vote(voter_id, comment_id)? {
            return if previous == is_up {
                self.store.delete_comment_vote(voter_id, comment_id)?;
                Ok(VoteOutcome::removed(previous))
            } else {
                self.store.update_comment_vote(voter_id, comment_id, is_up)?;
                Ok(VoteOutcome::flipped(is_up))
            };
        }

        let comment = self
            .store
            .get_comment(comment_id)?
            .ok_or(ForumError::NotFound("comment"))?;
        let topic = self
            .store
            .get_topic(comment.topic_id)?
            .filter(|topic| !topic.is_deleted)
            .ok_or(ForumError::NotFound("comment"))?;

        if let Err(err) = self.store.insert_comment_vote(voter_id, comment_id, is_up) {
            return Err(if is_unique_violation(&err) {
                ForumError::Conflict
            } else {
                err.into()
            });
        }

        if voter_id != comment.author_id {
            let sender = self
                .store
                .get_user(voter_id)?
                .ok_or(ForumError::NotFound("user"))?;
            self.notifications
                .notify_comment_vote(&sender, &topic, &comment, is_up)
                .await?;
        }

        Ok(VoteOutcome::created(is_up))
    }
}
