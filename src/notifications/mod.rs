//! Notification emission, deduplication and feed aggregation.

mod feed;
mod models;
mod service;
mod store;

pub use feed::{FeedAggregator, FeedItem, SenderView, FEED_PAGE_SIZE};
pub use models::{HydratedNotification, Notification, NotificationCandidate, NotificationType};
pub use service::NotificationService;
pub use store::NotificationStore;
