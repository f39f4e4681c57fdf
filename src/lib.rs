//! Agora Forum Backend Library
//!
//! The voting and notification core of a discussion forum: idempotent
//! vote toggling, duplicate-suppressing notification emission,
//! sender-collapsed feed aggregation and best-effort live push.

pub mod backend;
pub mod comments;
pub mod config;
pub mod error;
pub mod forum_store;
pub mod keyed_locks;
pub mod live;
pub mod notifications;
pub mod sqlite_persistence;
pub mod votes;

// Re-export commonly used types for convenience
pub use backend::ForumBackend;
pub use config::{FileConfig, ForumConfig};
pub use error::{ForumError, ForumResult};
pub use forum_store::{ForumStore, FullForumStore, SqliteForumStore};
pub use notifications::{FeedItem, NotificationService, NotificationType};
pub use votes::{VoteOutcome, VoteTransition};
