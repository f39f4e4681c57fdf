//! Forum content data models

use serde::{Deserialize, Serialize};

/// A forum account, reduced to what votes and notifications need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub handle: String,
}

/// A discussion topic.
///
/// Deletion is a soft flag: the row stays so existing votes and
/// notifications keep their references, but flagged topics are excluded
/// from vote targets and feed output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub uri: String,
    pub content: String,
    pub is_deleted: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub topic_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: i64,
    pub comment_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_serialization_roundtrips() {
        let topic = Topic {
            id: 7,
            author_id: 1,
            title: "First post".to_string(),
            uri: "first-post".to_string(),
            content: "hello".to_string(),
            is_deleted: false,
            created_at: 1700000000000,
        };

        let serialized = serde_json::to_string(&topic).unwrap();
        let deserialized: Topic = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized, topic);
    }

    #[test]
    fn comment_serialization_roundtrips() {
        let comment = Comment {
            id: 3,
            topic_id: 7,
            author_id: 2,
            content: "nice".to_string(),
            created_at: 1700000001000,
        };

        let serialized = serde_json::to_string(&comment).unwrap();
        let deserialized: Comment = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized, comment);
    }
}
