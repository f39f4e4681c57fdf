//! Live push message types.
//!
//! Defines the generic message envelope used for all pushed payloads.
//! Feature-specific payloads are carried as JSON values, allowing
//! extensibility.

use serde::{Deserialize, Serialize};

/// Server -> Client message envelope.
///
/// All pushed messages use this format. The `msg_type` field is used for
/// routing (e.g., "notification", "comment_added").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerMessage {
    /// Message type identifier
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Feature-specific payload (JSON value)
    pub payload: serde_json::Value,
}

impl ServerMessage {
    /// Create a new server message with the given type and payload.
    pub fn new(msg_type: impl Into<String>, payload: impl Serialize) -> Self {
        Self {
            msg_type: msg_type.into(),
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Create a server message with a null payload.
    pub fn empty(msg_type: impl Into<String>) -> Self {
        Self {
            msg_type: msg_type.into(),
            payload: serde_json::Value::Null,
        }
    }
}

/// Reserved message type constants.
pub mod msg_types {
    /// A freshly emitted notification (server -> receiver's group).
    pub const NOTIFICATION: &str = "notification";
    /// A comment was posted (server -> topic group).
    pub const COMMENT_ADDED: &str = "comment_added";
    /// A reply was posted (server -> topic group).
    pub const REPLY_ADDED: &str = "reply_added";
}
