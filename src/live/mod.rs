//! Best-effort live push to connected clients.
//!
//! A durable-log nicety layer: payloads are fired at named subscription
//! groups with no acknowledgement, no retry and no delivery guarantee.

mod broadcaster;
mod connection;
mod messages;

pub use broadcaster::{GroupBroadcaster, LiveBroadcast, NoOpBroadcast};
pub use connection::{ConnectionManager, GroupKey};
pub use messages::{msg_types, ServerMessage};
