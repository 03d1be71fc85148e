//! TCP sender that feeds formatted messages to a collector's socket input

use crate::config::ClientConfig;
use crate::types::OutboundMessage;
use crate::{Result, SockFeedError};
use std::io;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

/// Why the send loop stopped without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A shutdown signal arrived
    Interrupted,
    /// The configured message count was reached
    CountReached,
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendSummary {
    /// Number of messages fully written
    pub sent: u64,
    /// Why the loop ended
    pub stop: StopReason,
}

/// Owns one TCP connection and writes sequence-numbered messages to it
#[derive(Debug)]
pub struct MessageSender {
    config: ClientConfig,
    connection: Option<TcpStream>,
    sequence: u64,
}

impl MessageSender {
    /// Validate the configuration and open the connection
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let connect_future = TcpStream::connect((config.host.as_str(), config.port));
        let connected = match config.connect_timeout_duration() {
            Some(limit) => timeout(limit, connect_future).await.unwrap_or_else(|_| {
                Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no connection within {:?}", limit),
                ))
            }),
            None => connect_future.await,
        };

        let stream = connected.map_err(|source| SockFeedError::Connection {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle's algorithm: {}", e);
        }

        info!(peer = ?stream.peer_addr().ok(), "Connected to {}", config.address());

        Ok(Self {
            config,
            connection: Some(stream),
            sequence: 0,
        })
    }

    /// Build, write and return the next message
    pub async fn send_next(&mut self) -> Result<OutboundMessage> {
        let stream = self.connection.as_mut().ok_or_else(|| {
            SockFeedError::Write(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection is closed",
            ))
        })?;

        self.sequence += 1;
        let message = OutboundMessage::now(
            self.config.format,
            &self.config.message,
            self.config.level,
            self.sequence,
        )?;

        // write_all keeps going on partial writes until the body is out or the socket fails
        stream
            .write_all(message.as_bytes())
            .await
            .map_err(SockFeedError::Write)?;
        stream.flush().await.map_err(SockFeedError::Write)?;

        debug!(sequence = message.sequence, bytes = message.as_bytes().len(), "Message written");
        Ok(message)
    }

    /// Send until interrupted, the count is reached, or a write fails.
    ///
    /// The connection is closed before this returns, on every path. A closed
    /// shutdown channel is treated the same as a received signal.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<SendSummary> {
        let outcome = self.send_loop(&mut shutdown).await;
        let closed = self.close().await;

        match outcome {
            Ok(summary) => {
                closed?;
                info!(sent = summary.sent, stop = ?summary.stop, "Sender stopped");
                Ok(summary)
            }
            Err(e) => {
                if let Err(close_err) = closed {
                    debug!("Close after failure also failed: {}", close_err);
                }
                debug!(sent = self.sequence, "Sender failed: {}", e);
                Err(e)
            }
        }
    }

    async fn send_loop(&mut self, shutdown: &mut broadcast::Receiver<()>) -> Result<SendSummary> {
        let interval = self.config.interval_duration();
        let mut sent = 0u64;

        loop {
            if !matches!(shutdown.try_recv(), Err(TryRecvError::Empty)) {
                return Ok(SendSummary {
                    sent,
                    stop: StopReason::Interrupted,
                });
            }

            // A collector that stops reading can park write_all indefinitely
            let message = tokio::select! {
                result = self.send_next() => result?,
                _ = shutdown.recv() => {
                    debug!("Shutdown observed while a write was pending");
                    return Ok(SendSummary {
                        sent,
                        stop: StopReason::Interrupted,
                    });
                }
            };
            sent += 1;
            println!("Sent: {}", message.display_line());

            if self.config.count.is_some_and(|max| sent >= max) {
                return Ok(SendSummary {
                    sent,
                    stop: StopReason::CountReached,
                });
            }

            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("Shutdown observed during interval wait");
                    return Ok(SendSummary {
                        sent,
                        stop: StopReason::Interrupted,
                    });
                }
                _ = sleep(interval) => {}
            }
        }
    }

    /// Shut down and drop the connection. Calling it again is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut conn) = self.connection.take() {
            match conn.shutdown().await {
                Ok(()) => debug!("Connection closed"),
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {
                    debug!("Peer already gone at close")
                }
                Err(e) => return Err(SockFeedError::Io(e)),
            }
        }
        Ok(())
    }

    /// Active configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sequence number of the most recent message, 0 before the first send
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Whether the connection is still open
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Local address of the connection
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.stream()?.local_addr().map_err(SockFeedError::Io)
    }

    /// Collector address of the connection
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.stream()?.peer_addr().map_err(SockFeedError::Io)
    }

    fn stream(&self) -> Result<&TcpStream> {
        self.connection.as_ref().ok_or_else(|| {
            SockFeedError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection is closed",
            ))
        })
    }
}
