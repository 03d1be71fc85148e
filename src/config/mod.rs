//! Configuration management for SockFeed

pub mod settings;

pub use settings::ClientConfig;
