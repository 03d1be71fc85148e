//! SockFeed client implementation

pub mod sender;

pub use sender::{MessageSender, SendSummary, StopReason};
