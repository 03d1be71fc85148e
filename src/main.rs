//! SockFeed Binary
//!
//! Feeds synthetic log lines to a collector's TCP socket input until interrupted.

use clap::Parser;
use sockfeed::client::MessageSender;
use sockfeed::config::ClientConfig;
use sockfeed::types::{LogLevel, MessageFormat};
use sockfeed::{Result, SockFeedError};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sockfeed")]
#[command(about = "Socket client that feeds test messages to a collector")]
#[command(version)]
struct Args {
    /// Message to send [default: "Test message from socket client"]
    message: Option<String>,

    /// Server hostname [default: localhost]
    #[arg(long)]
    host: Option<String>,

    /// Server port [default: 8888]
    #[arg(long)]
    port: Option<u16>,

    /// Interval between messages in seconds [default: 1.0]
    #[arg(long)]
    interval: Option<f64>,

    /// Message format [default: text]
    #[arg(long, value_enum)]
    format: Option<MessageFormat>,

    /// Level written into JSON messages [default: INFO]
    #[arg(long, value_enum, ignore_case = true)]
    level: Option<LogLevel>,

    /// Stop after sending this many messages
    #[arg(long)]
    count: Option<u64>,

    /// Give up connecting after this many seconds
    #[arg(long)]
    connect_timeout: Option<f64>,

    /// TOML configuration file; command line flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::parse_file(path)?,
            None => ClientConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(level) = self.level {
            config.level = level;
        }
        if let Some(message) = self.message {
            config.message = message;
        }
        if self.count.is_some() {
            config.count = self.count;
        }
        if self.connect_timeout.is_some() {
            config.connect_timeout = self.connect_timeout;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Diagnostics go to stderr; stdout carries the send log
    let default_filter = if args.verbose {
        "sockfeed=debug"
    } else {
        "sockfeed=warn"
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match &e {
                SockFeedError::Connection { host, port, .. } if e.is_refused() => {
                    eprintln!("Connection to {}:{} refused. Is the server running?", host, port);
                }
                _ => eprintln!("Error: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    info!("Starting SockFeed v{}", env!("CARGO_PKG_VERSION"));

    let config = args.into_config()?;
    debug!(?config, "Configuration loaded");

    // Both receivers exist before the handler is installed so no signal is missed
    let (shutdown_tx, mut connect_rx) = broadcast::channel(1);
    let run_rx = shutdown_tx.subscribe();

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                println!("\nStopping...");
                let _ = signal_tx.send(());
            }
            Err(e) => warn!("Failed to install CTRL+C signal handler: {}", e),
        }
    });

    let sender = tokio::select! {
        result = MessageSender::connect(config.clone()) => result?,
        _ = connect_rx.recv() => {
            info!("Interrupted before the connection was established");
            return Ok(());
        }
    };
    println!("Connected to {}", config.address());

    let summary = sender.run(run_rx).await?;
    info!(sent = summary.sent, stop = ?summary.stop, "SockFeed stopped");
    Ok(())
}
