// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! snippet-ls language server.
//!
//! Speaks LSP over stdin/stdout. Termination signals and fatal I/O errors
//! exit with code 1; `exit` after `shutdown` and end of input exit with 0.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use snippet_ls::config::Config;
use snippet_ls::event_log::{EventKind, EventLog};
use snippet_ls::server::Server;

/// Command-line arguments for snippet-ls.
#[derive(Parser, Debug)]
#[command(name = "snippet-ls")]
#[command(about = "Language server for React snippets and JSX tag shorthand")]
#[command(version = snippet_ls::VERSION)]
struct Args {
    /// Path to configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Event log file. Overrides the config file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Use stdio transport. Accepted for editor compatibility; stdio is the
    /// only transport.
    #[arg(long)]
    #[allow(dead_code, reason = "Editors pass --stdio unconditionally")]
    stdio: bool,
}

/// Entry point for the snippet-ls binary.
///
/// # Errors
///
/// Returns an error if logging or configuration cannot be set up.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("snippet_ls=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(args.config)?;

    if let Some(path) = args.log_file {
        config.log_file = path;
    }

    let events = EventLog::open_or_disabled(&config.log_file);
    let mut server = Server::from_config(&config, events.clone());

    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();

    // Wait for either the client to finish or a termination signal
    let code = tokio::select! {
        result = server.serve(&mut stdin, &mut stdout) => match result {
            Ok(stop) => stop.code(),
            Err(e) => {
                error!("Server failed: {e:#}");
                1
            }
        },
        name = termination_signal() => {
            info!("Received {}, shutting down", name);
            events.record(EventKind::Signal { name: name.to_string() });
            1
        }
    };

    events.flush();
    std::process::exit(code);
}

/// Resolves once Ctrl-C arrives; never resolves if the handler cannot be
/// installed.
async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for SIGINT: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Resolves when `signal` is delivered; never resolves without a listener.
#[cfg(unix)]
async fn received(signal: Option<tokio::signal::unix::Signal>) {
    match signal {
        // `None` from recv means the stream closed, not a signal.
        Some(mut signal) => {
            if signal.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}

/// Resolves with the name of the first termination signal received.
#[cfg(unix)]
async fn termination_signal() -> &'static str {
    use tokio::signal::unix::{Signal, SignalKind, signal};

    fn listen(kind: SignalKind, name: &str) -> Option<Signal> {
        signal(kind)
            .map_err(|e| warn!("Cannot listen for {}: {}", name, e))
            .ok()
    }

    let term = listen(SignalKind::terminate(), "SIGTERM");
    let hup = listen(SignalKind::hangup(), "SIGHUP");

    tokio::select! {
        () = interrupt() => "SIGINT",
        () = received(term) => "SIGTERM",
        () = received(hup) => "SIGHUP",
    }
}

#[cfg(not(unix))]
async fn termination_signal() -> &'static str {
    interrupt().await;
    "SIGINT"
}

#[cfg(all(test, unix))]
mod tests {
    use super::received;
    use std::time::Duration;

    #[tokio::test]
    async fn test_missing_listener_never_fires() {
        let waited = tokio::time::timeout(Duration::from_millis(50), received(None)).await;
        assert!(waited.is_err(), "a missing listener must not count as a signal");
    }
}
