//! Message types shared by the sender and the command line

pub mod message;

pub use message::{LogLevel, MessageFormat, OutboundMessage, TIMESTAMP_FORMAT};
