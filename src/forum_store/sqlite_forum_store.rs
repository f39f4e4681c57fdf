use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::{
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::info;

use super::models::{Comment, Reply, Topic, User};
use super::store::ForumStore;

const USER_FK: ForeignKey = ForeignKey {
    foreign_table: "user",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};
const TOPIC_FK: ForeignKey = ForeignKey {
    foreign_table: "topic",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};
const COMMENT_FK: ForeignKey = ForeignKey {
    foreign_table: "comment",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

/// V 0
pub(crate) const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_handle", "handle")],
};

pub(crate) const TOPIC_TABLE_V_0: Table = Table {
    name: "topic",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "author_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("uri", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("content", &SqlType::Text, non_null = true),
        sqlite_column!("is_deleted", &SqlType::Integer, non_null = true),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
    ],
    unique_constraints: &[],
    indices: &[("idx_topic_author_id", "author_id")],
};

pub(crate) const COMMENT_TABLE_V_0: Table = Table {
    name: "comment",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "topic_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TOPIC_FK)
        ),
        sqlite_column!(
            "author_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("content", &SqlType::Text, non_null = true),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
    ],
    unique_constraints: &[],
    indices: &[("idx_comment_topic_id", "topic_id")],
};

pub(crate) const REPLY_TABLE_V_0: Table = Table {
    name: "reply",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "comment_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&COMMENT_FK)
        ),
        sqlite_column!(
            "author_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("content", &SqlType::Text, non_null = true),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
    ],
    unique_constraints: &[],
    indices: &[("idx_reply_comment_id", "comment_id")],
};

pub(crate) const TOPIC_VOTE_TABLE_V_0: Table = Table {
    name: "topic_vote",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "voter_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!(
            "topic_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TOPIC_FK)
        ),
        sqlite_column!("is_up", &SqlType::Integer, non_null = true),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
    ],
    unique_constraints: &[&["voter_id", "topic_id"]],
    indices: &[("idx_topic_vote_topic_id", "topic_id")],
};

pub(crate) const COMMENT_VOTE_TABLE_V_0: Table = Table {
    name: "comment_vote",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "voter_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!(
            "comment_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&COMMENT_FK)
        ),
        sqlite_column!("is_up", &SqlType::Integer, non_null = true),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
    ],
    unique_constraints: &[&["voter_id", "comment_id"]],
    indices: &[("idx_comment_vote_comment_id", "comment_id")],
};

// The notification log is append-only and must survive the disappearance
// of the content it points at: `comment_id` is deliberately NOT a foreign
// key so rows orphaned by a comment deletion stay in the log (the feed
// filters them out).
pub(crate) const NOTIFICATION_TABLE_V_0: Table = Table {
    name: "notification",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("type", &SqlType::Integer, non_null = true),
        sqlite_column!("is_read", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "sender_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!(
            "receiver_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!(
            "topic_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TOPIC_FK)
        ),
        sqlite_column!("comment_id", &SqlType::Integer),
        sqlite_column!("new_id", &SqlType::Integer),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
    ],
    unique_constraints: &[],
    indices: &[("idx_notification_receiver_id", "receiver_id")],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE_V_0,
        TOPIC_TABLE_V_0,
        COMMENT_TABLE_V_0,
        REPLY_TABLE_V_0,
        TOPIC_VOTE_TABLE_V_0,
        COMMENT_VOTE_TABLE_V_0,
        NOTIFICATION_TABLE_V_0,
    ],
    migration: None,
}];

/// Epoch milliseconds, the creation-timestamp resolution used everywhere
/// in this store.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Clone)]
pub struct SqliteForumStore {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl SqliteForumStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            let conn = Connection::open(db_path)?;
            VERSIONED_SCHEMAS
                .last()
                .context("No schema versions defined")?
                .create(&conn)?;
            conn
        };

        // Read the database version
        let db_version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
            .context("Failed to read database version")?
            - BASE_DB_VERSION as i64;

        if db_version < 0 {
            bail!(
                "Database version {} is too old, does not contain base db version {}",
                db_version,
                BASE_DB_VERSION
            );
        }
        if db_version >= VERSIONED_SCHEMAS.len() as i64 {
            bail!("Database version {} is too new", db_version);
        }
        let version = db_version as usize;

        VERSIONED_SCHEMAS
            .get(version)
            .context("Failed to get schema")?
            .validate(&conn)?;

        Self::migrate_if_needed(&conn, version)?;

        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        Ok(SqliteForumStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate_if_needed(conn: &Connection, version: usize) -> Result<()> {
        let mut latest_from = version;
        for schema in VERSIONED_SCHEMAS.iter().skip(version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating db from version {} to {}",
                    latest_from, schema.version
                );
                migration_fn(conn)?;
                latest_from = schema.version;
            }
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest_from),
            [],
        )?;

        Ok(())
    }
}

impl ForumStore for SqliteForumStore {
    fn create_user(&self, handle: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (handle, created) VALUES (?1, ?2)",
                USER_TABLE_V_0.name
            ),
            params![handle, now_millis()],
        )
        .with_context(|| format!("Failed to create user {}", handle))?;
        Ok(conn.last_insert_rowid())
    }

    fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, handle FROM {} WHERE id = ?1",
            USER_TABLE_V_0.name
        ))?;
        let user = stmt
            .query_row(params![user_id], |row| {
                Ok(User {
                    id: row.get(0)?,
                    handle: row.get(1)?,
                })
            })
            .optional()?;
        Ok(user)
    }

    fn create_topic(
        &self,
        author_id: i64,
        title: &str,
        uri: &str,
        content: &str,
    ) -> Result<Topic> {
        let conn = self.conn.lock().unwrap();
        let created = now_millis();
        conn.execute(
            &format!(
                "INSERT INTO {} (author_id, title, uri, content, is_deleted, created) \
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                TOPIC_TABLE_V_0.name
            ),
            params![author_id, title, uri, content, created],
        )
        .with_context(|| format!("Failed to create topic {}", uri))?;
        Ok(Topic {
            id: conn.last_insert_rowid(),
            author_id,
            title: title.to_string(),
            uri: uri.to_string(),
            content: content.to_string(),
            is_deleted: false,
            created_at: created,
        })
    }

    fn get_topic(&self, topic_id: i64) -> Result<Option<Topic>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, author_id, title, uri, content, is_deleted, created FROM {} WHERE id = ?1",
            TOPIC_TABLE_V_0.name
        ))?;
        let topic = stmt
            .query_row(params![topic_id], |row| {
                Ok(Topic {
                    id: row.get(0)?,
                    author_id: row.get(1)?,
                    title: row.get(2)?,
                    uri: row.get(3)?,
                    content: row.get(4)?,
                    is_deleted: row.get::<_, i64>(5)? != 0,
                    created_at: row.get(6)?,
                })
            })
            .optional()?;
        Ok(topic)
    }

    fn set_topic_deleted(&self, topic_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "UPDATE {} SET is_deleted = 1 WHERE id = ?1",
                TOPIC_TABLE_V_0.name
            ),
            params![topic_id],
        )
        .with_context(|| format!("Failed to soft-delete topic {}", topic_id))?;
        Ok(())
    }

    fn create_comment(&self, topic_id: i64, author_id: i64, content: &str) -> Result<Comment> {
        let conn = self.conn.lock().unwrap();
        let created = now_millis();
        conn.execute(
            &format!(
                "INSERT INTO {} (topic_id, author_id, content, created) VALUES (?1, ?2, ?3, ?4)",
                COMMENT_TABLE_V_0.name
            ),
            params![topic_id, author_id, content, created],
        )
        .with_context(|| format!("Failed to create comment on topic {}", topic_id))?;
        Ok(Comment {
            id: conn.last_insert_rowid(),
            topic_id,
            author_id,
            content: content.to_string(),
            created_at: created,
        })
    }

    fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, topic_id, author_id, content, created FROM {} WHERE id = ?1",
            COMMENT_TABLE_V_0.name
        ))?;
        let comment = stmt
            .query_row(params![comment_id], |row| {
                Ok(Comment {
                    id: row.get(0)?,
                    topic_id: row.get(1)?,
                    author_id: row.get(2)?,
                    content: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })
            .optional()?;
        Ok(comment)
    }

    fn delete_comment(&self, comment_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", COMMENT_TABLE_V_0.name),
            params![comment_id],
        )
        .with_context(|| format!("Failed to delete comment {}", comment_id))?;
        Ok(())
    }

    fn create_reply(&self, comment_id: i64, author_id: i64, content: &str) -> Result<Reply> {
        let conn = self.conn.lock().unwrap();
        let created = now_millis();
        conn.execute(
            &format!(
                "INSERT INTO {} (comment_id, author_id, content, created) VALUES (?1, ?2, ?3, ?4)",
                REPLY_TABLE_V_0.name
            ),
            params![comment_id, author_id, content, created],
        )
        .with_context(|| format!("Failed to create reply on comment {}", comment_id))?;
        Ok(Reply {
            id: conn.last_insert_rowid(),
            comment_id,
            author_id,
            content: content.to_string(),
            created_at: created,
        })
    }
}
