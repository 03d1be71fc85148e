//! # SockFeed - Socket Test Client for Log Collectors
//!
//! SockFeed opens a single TCP connection to a collector's socket input and
//! feeds it synthetic, sequence-numbered log lines at a fixed interval until
//! it is interrupted.
//!
//! ## Features
//!
//! - **Two Formats**: plain text lines or single-line JSON objects
//! - **Sequence Numbers**: every line carries a gap-free counter starting at 1
//! - **Graceful Shutdown**: interruption is observed during the interval wait
//!   and the connection is always closed before returning
//! - **TOML Config**: optional config file, overridable from the command line
//!
//! ## Quick Start
//!
//! ```no_run
//! use sockfeed::client::MessageSender;
//! use sockfeed::config::ClientConfig;
//! use sockfeed::types::MessageFormat;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig {
//!         format: MessageFormat::Json,
//!         count: Some(10),
//!         ..Default::default()
//!     };
//!
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
//!     let sender = MessageSender::connect(config).await?;
//!     let summary = sender.run(shutdown_rx).await?;
//!     println!("sent {} messages", summary.sent);
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod types;

/// Common error types used throughout SockFeed
pub mod error {
    use std::fmt;

    /// SockFeed error types
    #[derive(Debug)]
    pub enum SockFeedError {
        /// I/O operation failed
        Io(std::io::Error),
        /// Serialization/deserialization failed
        Serde(serde_json::Error),
        /// Configuration error
        Config(String),
        /// Could not establish the connection to the collector
        Connection {
            /// Target host
            host: String,
            /// Target port
            port: u16,
            /// Underlying connect error
            source: std::io::Error,
        },
        /// Writing to an established connection failed
        Write(std::io::Error),
    }

    impl SockFeedError {
        /// True when the collector actively refused the connection
        pub fn is_refused(&self) -> bool {
            matches!(
                self,
                SockFeedError::Connection { source, .. }
                    if source.kind() == std::io::ErrorKind::ConnectionRefused
            )
        }
    }

    impl fmt::Display for SockFeedError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                SockFeedError::Io(e) => write!(f, "I/O error: {}", e),
                SockFeedError::Serde(e) => write!(f, "Serialization error: {}", e),
                SockFeedError::Config(e) => write!(f, "Configuration error: {}", e),
                SockFeedError::Connection { host, port, source } => {
                    write!(f, "Connection to {}:{} failed: {}", host, port, source)
                }
                SockFeedError::Write(e) => write!(f, "Write error: {}", e),
            }
        }
    }

    impl std::error::Error for SockFeedError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                SockFeedError::Io(e) | SockFeedError::Write(e) => Some(e),
                SockFeedError::Connection { source, .. } => Some(source),
                SockFeedError::Serde(e) => Some(e),
                SockFeedError::Config(_) => None,
            }
        }
    }

    impl From<std::io::Error> for SockFeedError {
        fn from(err: std::io::Error) -> Self {
            SockFeedError::Io(err)
        }
    }

    impl From<serde_json::Error> for SockFeedError {
        fn from(err: serde_json::Error) -> Self {
            SockFeedError::Serde(err)
        }
    }

    /// Result type alias for SockFeed operations
    pub type Result<T> = std::result::Result<T, SockFeedError>;
}

pub use error::{Result, SockFeedError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{MessageSender, SendSummary};
    pub use crate::config::ClientConfig;
    pub use crate::types::{LogLevel, MessageFormat, OutboundMessage};
    pub use crate::{Result, SockFeedError};
}
