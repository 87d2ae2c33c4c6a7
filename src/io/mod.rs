//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `feed` - Location/permission feed from file, stdin or TCP
//! - `egress_channel` - Typed channel for tracker output events
//! - `egress` - Event output to file (JSONL format)

pub mod egress;
pub mod egress_channel;
pub mod feed;

// Re-export commonly used types
pub use egress::Egress;
pub use egress_channel::{
    create_egress_channel, ActiveZonePayload, AlertPayload, EgressMessage, EgressSender,
    PermissionPayload,
};
pub use feed::{
    bind_tcp_feed, open_feed_input, parse_feed_line, read_feed, start_tcp_feed, FeedInput,
    FeedMessage,
};
