use super::models::{Comment, Reply, Topic, User};
use anyhow::Result;

pub trait ForumStore: Send + Sync {
    /// Creates a new user and returns the user id.
    fn create_user(&self, handle: &str) -> Result<i64>;

    /// Returns the user with the given id.
    /// Returns Ok(None) if the user does not exist.
    /// Returns Err if there is a database error.
    fn get_user(&self, user_id: i64) -> Result<Option<User>>;

    /// Creates a new topic and returns the stored row.
    fn create_topic(&self, author_id: i64, title: &str, uri: &str, content: &str)
        -> Result<Topic>;

    /// Returns the topic with the given id, soft-deleted or not.
    /// Returns Ok(None) if the row does not exist.
    fn get_topic(&self, topic_id: i64) -> Result<Option<Topic>>;

    /// Flags a topic as deleted. The row is kept.
    fn set_topic_deleted(&self, topic_id: i64) -> Result<()>;

    /// Creates a new comment under a topic and returns the stored row.
    fn create_comment(&self, topic_id: i64, author_id: i64, content: &str) -> Result<Comment>;

    /// Returns the comment with the given id.
    /// Returns Ok(None) if the row does not exist.
    fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>>;

    /// Removes a comment row. Notifications referencing it are left in
    /// place and become orphaned.
    fn delete_comment(&self, comment_id: i64) -> Result<()>;

    /// Creates a new reply under a comment and returns the stored row.
    fn create_reply(&self, comment_id: i64, author_id: i64, content: &str) -> Result<Reply>;
}
