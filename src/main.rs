//! texter-daemon: turns recognized speech into keystrokes and editor commands
//!
//! This daemon reads transcripts from stdin or an IPC socket and provides:
//! - A validated command catalog loaded from JSON
//! - An explicit mode state machine (dormant/active, language, terminal dialect)
//! - Exact matching with optional containment fallback
//! - Keyboard, text and snippet injection through an input sink
//! - Status and event notifications for observers over IPC

mod catalog;
mod config;
mod dispatch;
mod events;
mod executor;
mod input;
mod ipc;
mod lifecycle;
mod matcher;
mod state;
mod transcript;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::catalog::Catalog;
use crate::config::{Args, Config};
use crate::dispatch::Dispatcher;
use crate::events::StateEvent;
use crate::ipc::{Server, ServerContext};
use crate::lifecycle::{Signal, Signals};
use crate::matcher::Matcher;
use crate::state::ModeState;
use crate::transcript::StdinListener;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "texter-daemon starting");

    let config = Config::load(args)?;
    config.ensure_dirs()?;
    info!(
        commands = %config.commands_path.display(),
        socket = %config.socket_path.display(),
        fuzzy = config.fuzzy_matching,
        "configuration loaded"
    );

    // An invalid catalog is fatal at startup
    let catalog = Catalog::load(&config.commands_path).with_context(|| {
        format!(
            "failed to load command catalog from {}",
            config.commands_path.display()
        )
    })?;
    info!(commands = catalog.len(), "command catalog loaded");

    if catalog.is_empty() {
        warn!("command catalog is empty");
    } else if !config.start_active && !catalog.has_wake_command() {
        warn!("catalog has no wake command and daemon starts dormant, nothing can be recognized");
    }

    let mode = state::shared(ModeState::new(config.start_active));
    let catalog = catalog::shared(catalog);

    // Transcript sources -> dispatcher
    let (transcript_tx, transcript_rx) = mpsc::channel(32);
    // Dispatcher -> observers
    let (event_tx, _) = broadcast::channel::<StateEvent>(64);

    let sink = input::default_sink(config.dry_run)?;
    let mut dispatcher = Dispatcher::new(
        Arc::clone(&catalog),
        Arc::clone(&mode),
        Matcher::new(config.fuzzy_matching),
        sink,
        event_tx.clone(),
    );

    let stdin_listener = StdinListener::new(transcript_tx.clone());
    if config.read_stdin {
        match stdin_listener.start() {
            Ok(()) => info!("stdin listener started"),
            Err(e) => warn!(?e, "continuing without stdin transcripts"),
        }
    }

    let context = Arc::new(ServerContext {
        start_time: Instant::now(),
        mode: Arc::clone(&mode),
        catalog: Arc::clone(&catalog),
        catalog_path: config.commands_path.clone(),
        transcript_tx,
        event_tx: event_tx.clone(),
    });
    let server = Arc::new(Server::new(&config.socket_path, Arc::clone(&context))?);

    let mut signals = Signals::new().context("failed to install signal handlers")?;
    let mut log_rx = event_tx.subscribe();

    info!("daemon initialized, entering main loop");

    let dispatch_loop = dispatcher.run(transcript_rx);
    tokio::pin!(dispatch_loop);
    // Accepts clients on its own task so a busy dispatcher never stalls IPC
    let mut server_task = tokio::spawn({
        let server = Arc::clone(&server);
        async move { server.run().await }
    });

    loop {
        tokio::select! {
            _ = &mut dispatch_loop => {
                info!("dispatcher exited");
                break;
            }

            result = &mut server_task => {
                match result {
                    Ok(Err(e)) => error!(?e, "IPC server error"),
                    Err(e) => error!(?e, "IPC server task failed"),
                    Ok(Ok(())) => info!("IPC server exited"),
                }
                break;
            }

            event = log_rx.recv() => match event {
                Ok(event) => info!(%event, "state event"),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "state event receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },

            signal = signals.recv() => match signal {
                Signal::Shutdown => {
                    info!("shutdown signal received");
                    break;
                }
                Signal::Reload => {
                    if let Err(e) = context.reload_catalog().await {
                        error!(error = %e, "catalog reload failed, keeping the current catalog");
                    }
                }
            },
        }
    }

    info!("shutting down...");

    stdin_listener.stop();
    server.shutdown().await;
    if !server_task.is_finished() {
        server_task.abort();
    }

    let mode = *mode.read().await;
    info!(%mode, "texter-daemon stopped");

    Ok(())
}
