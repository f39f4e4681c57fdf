//! Forum content records and their durable store.

mod models;
pub(crate) mod sqlite_forum_store;
mod store;

pub use models::{Comment, Reply, Topic, User};
pub use sqlite_forum_store::SqliteForumStore;
pub use store::ForumStore;

use crate::notifications::NotificationStore;
use crate::votes::VoteStore;

/// Combined trait for everything the forum core persists.
pub trait FullForumStore: ForumStore + VoteStore + NotificationStore {}

// Blanket implementation for any type that implements all the store traits
impl<T: ForumStore + VoteStore + NotificationStore> FullForumStore for T {}
