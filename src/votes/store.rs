use anyhow::{Context, Result};
use rusqlite::params;

use crate::forum_store::sqlite_forum_store::{
    now_millis, SqliteForumStore, COMMENT_VOTE_TABLE_V_0, TOPIC_VOTE_TABLE_V_0,
};

pub trait VoteStore: Send + Sync {
    /// Returns the direction of the voter's vote on the topic.
    /// Returns Ok(None) if no vote record exists.
    /// Returns Err if there is a database error.
    fn find_topic_vote(&self, voter_id: i64, topic_id: i64) -> Result<Option<bool>>;

    /// Inserts a new vote record. Fails on the (voter, topic) unique
    /// constraint if a record already exists.
    fn insert_topic_vote(&self, voter_id: i64, topic_id: i64, is_up: bool) -> Result<()>;

    /// Changes the direction of an existing vote record.
    fn update_topic_vote(&self, voter_id: i64, topic_id: i64, is_up: bool) -> Result<()>;

    /// Removes the vote record for the (voter, topic) pair.
    fn delete_topic_vote(&self, voter_id: i64, topic_id: i64) -> Result<()>;

    fn find_comment_vote(&self, voter_id: i64, comment_id: i64) -> Result<Option<bool>>;

    fn insert_comment_vote(&self, voter_id: i64, comment_id: i64, is_up: bool) -> Result<()>;

    fn update_comment_vote(&self, voter_id: i64, comment_id: i64, is_up: bool) -> Result<()>;

    fn delete_comment_vote(&self, voter_id: i64, comment_id: i64) -> Result<()>;
}

/// True when the error chain bottoms out in a sqlite UNIQUE-constraint
/// violation, i.e. a concurrent writer won the insert race.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<rusqlite::Error>(),
            Some(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    })
}

impl VoteStore for SqliteForumStore {
    fn find_topic_vote(&self, voter_id: i64, topic_id: i64) -> Result<Option<bool>> {
        find_vote(self, TOPIC_VOTE_TABLE_V_0.name, "topic_id", voter_id, topic_id)
    }

    fn insert_topic_vote(&self, voter_id: i64, topic_id: i64, is_up: bool) -> Result<()> {
        insert_vote(
            self,
            TOPIC_VOTE_TABLE_V_0.name,
            "topic_id",
            voter_id,
            topic_id,
            is_up,
        )
    }

    fn update_topic_vote(&self, voter_id: i64, topic_id: i64, is_up: bool) -> Result<()> {
        update_vote(
            self,
            TOPIC_VOTE_TABLE_V_0.name,
            "topic_id",
            voter_id,
            topic_id,
            is_up,
        )
    }

    fn delete_topic_vote(&self, voter_id: i64, topic_id: i64) -> Result<()> {
        delete_vote(self, TOPIC_VOTE_TABLE_V_0.name, "topic_id", voter_id, topic_id)
    }

    fn find_comment_vote(&self, voter_id: i64, comment_id: i64) -> Result<Option<bool>> {
        find_vote(
            self,
            COMMENT_VOTE_TABLE_V_0.name,
            "comment_id",
            voter_id,
            comment_id,
        )
    }

    fn insert_comment_vote(&self, voter_id: i64, comment_id: i64, is_up: bool) -> Result<()> {
        insert_vote(
            self,
            COMMENT_VOTE_TABLE_V_0.name,
            "comment_id",
            voter_id,
            comment_id,
            is_up,
        )
    }

    fn update_comment_vote(&self, voter_id: i64, comment_id: i64, is_up: bool) -> Result<()> {
        update_vote(
            self,
            COMMENT_VOTE_TABLE_V_0.name,
            "comment_id",
            voter_id,
            comment_id,
            is_up,
        )
    }

    fn delete_comment_vote(&self, voter_id: i64, comment_id: i64) -> Result<()> {
        delete_vote(
            self,
            COMMENT_VOTE_TABLE_V_0.name,
            "comment_id",
            voter_id,
            comment_id,
        )
    }
}

fn find_vote(
    store: &SqliteForumStore,
    table: &str,
    target_column: &str,
    voter_id: i64,
    target_id: i64,
) -> Result<Option<bool>> {
    use rusqlite::OptionalExtension;

    let conn = store.conn.lock().unwrap();
    let mut stmt = conn.prepare(&format!(
        "SELECT is_up FROM {} WHERE voter_id = ?1 AND {} = ?2",
        table, target_column
    ))?;
    let is_up = stmt
        .query_row(params![voter_id, target_id], |row| {
            row.get::<_, i64>(0).map(|v| v != 0)
        })
        .optional()?;
    Ok(is_up)
}

fn insert_vote(
    store: &SqliteForumStore,
    table: &str,
    target_column: &str,
    voter_id: i64,
    target_id: i64,
    is_up: bool,
) -> Result<()> {
    let conn = store.conn.lock().unwrap();
    conn.execute(
        &format!(
            "INSERT INTO {} (voter_id, {}, is_up, created) VALUES (?1, ?2, ?3, ?4)",
            table, target_column
        ),
        params![voter_id, target_id, is_up as i64, now_millis()],
    )?;
    Ok(())
}

fn update_vote(
    store: &SqliteForumStore,
    table: &str,
    target_column: &str,
    voter_id: i64,
    target_id: i64,
    is_up: bool,
) -> Result<()> {
    let conn = store.conn.lock().unwrap();
    let updated = conn
        .execute(
            &format!(
                "UPDATE {} SET is_up = ?3 WHERE voter_id = ?1 AND {} = ?2",
                table, target_column
            ),
            params![voter_id, target_id, is_up as i64],
        )
        .with_context(|| format!("Failed to update vote in {}", table))?;
    anyhow::ensure!(updated == 1, "Expected one {} row for update, got {}", table, updated);
    Ok(())
}

fn delete_vote(
    store: &SqliteForumStore,
    table: &str,
    target_column: &str,
    voter_id: i64,
    target_id: i64,
) -> Result<()> {
    let conn = store.conn.lock().unwrap();
    conn.execute(
        &format!(
            "DELETE FROM {} WHERE voter_id = ?1 AND {} = ?2",
            table, target_column
        ),
        params![voter_id, target_id],
    )
    .with_context(|| format!("Failed to delete vote from {}", table))?;
    Ok(())
}
