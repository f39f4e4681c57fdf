//! Shared fixtures for the integration suites.
#![allow(dead_code)]

use std::sync::Arc;

use agora_backend::comments::CommentView;
use agora_backend::forum_store::{SqliteForumStore, Topic, User};
use agora_backend::{ForumBackend, FullForumStore};
use tempfile::TempDir;

/// A backend over a scratch database. The temp dir lives as long as the
/// fixture.
pub struct TestBackend {
    pub backend: ForumBackend,
    _db_dir: TempDir,
}

pub fn backend() -> TestBackend {
    let db_dir = TempDir::new().expect("Failed to create temp dir");
    let store: Arc<dyn FullForumStore> = Arc::new(
        SqliteForumStore::new(db_dir.path().join("forum.db")).expect("Failed to open store"),
    );
    TestBackend {
        backend: ForumBackend::with_store(store, 32),
        _db_dir: db_dir,
    }
}

impl TestBackend {
    pub fn user(&self, handle: &str) -> User {
        self.backend.create_user(handle).expect("Failed to create user")
    }

    pub fn topic(&self, author: &User, title: &str) -> Topic {
        let uri = title.to_lowercase().replace(' ', "-");
        self.backend
            .create_topic(author.id, title, &uri, "some topic content")
            .expect("Failed to create topic")
    }

    pub async fn comment(&self, author: &User, topic: &Topic, content: &str) -> CommentView {
        self.backend
            .add_comment(author.id, topic.id, content)
            .await
            .expect("Failed to add comment")
    }
}
