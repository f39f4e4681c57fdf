//! Comment and reply creation path.

mod service;

pub use service::{CommentService, CommentView, ReplyView};
