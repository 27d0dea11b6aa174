//! Unix domain socket server for IPC
//!
//! Provides request-response communication, transcript submission for
//! external recognizers, and push notifications of state events to
//! subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::catalog::{self, ConfigError, SharedCatalog};
use crate::events::StateEvent;
use crate::state::SharedMode;
use crate::transcript::{Source, Transcript};

use super::protocol::{read_frame, write_message, DaemonStatus, Notification, Request, Response};

/// Daemon handles the server answers requests from
pub struct ServerContext {
    pub start_time: Instant,
    pub mode: SharedMode,
    pub catalog: SharedCatalog,
    pub catalog_path: PathBuf,
    pub transcript_tx: mpsc::Sender<Transcript>,
    pub event_tx: broadcast::Sender<StateEvent>,
}

impl ServerContext {
    /// Reload the catalog from disk and announce the new size
    pub async fn reload_catalog(&self) -> Result<usize, ConfigError> {
        let commands = catalog::reload(&self.catalog, &self.catalog_path).await?;
        let _ = self
            .event_tx
            .send(StateEvent::CatalogReloaded { commands });
        Ok(commands)
    }

    pub async fn status(&self) -> DaemonStatus {
        let mode = *self.mode.read().await;
        let commands = self.catalog.read().await.len();
        DaemonStatus::new(&mode, commands, self.start_time.elapsed().as_secs())
    }
}

/// Messages queued for a client's writer task
#[derive(Debug)]
enum Outbound {
    Response(Response),
    Notification(Notification),
}

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    context: Arc<ServerContext>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Bind the socket, replacing a stale one left by a previous run
    pub fn new(socket_path: &Path, context: Arc<ServerContext>) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            context,
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let context = Arc::clone(&self.context);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, context) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(stream: UnixStream, context: Arc<ServerContext>) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();
        let (out_tx, mut out_rx) = mpsc::channel::<Outbound>(32);

        // Responses and notifications share one writer so frames never interleave
        let writer_task = tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let result = match &msg {
                    Outbound::Response(resp) => write_message(&mut writer, resp).await,
                    Outbound::Notification(note) => write_message(&mut writer, note).await,
                };
                if let Err(e) = result {
                    debug!(?e, "client write failed");
                    break;
                }
            }
        });

        let mut forwarder: Option<JoinHandle<()>> = None;

        let result = loop {
            let body = match read_frame(&mut reader).await {
                Ok(Some(body)) => body,
                Ok(None) => {
                    debug!("client disconnected");
                    break Ok(());
                }
                Err(e) => break Err(e.into()),
            };

            let response = match serde_json::from_slice::<Request>(&body) {
                Ok(request) => {
                    debug!(?request, "received request");
                    let (response, subscribe) = Self::process_request(request, &context).await;
                    if subscribe && forwarder.is_none() {
                        // Confirm before any event can be pushed
                        let events = context.event_tx.subscribe();
                        if out_tx.send(Outbound::Response(response)).await.is_err() {
                            break Ok(());
                        }
                        forwarder = Some(Self::forward_events(events, out_tx.clone()));
                        debug!("client subscribed to notifications");
                        continue;
                    }
                    response
                }
                Err(e) => Response::error("bad_request", e.to_string()),
            };

            if out_tx.send(Outbound::Response(response)).await.is_err() {
                break Ok(());
            }
        };

        if let Some(forwarder) = forwarder {
            forwarder.abort();
        }
        drop(out_tx);
        let _ = writer_task.await;

        result
    }

    fn forward_events(
        mut events: broadcast::Receiver<StateEvent>,
        out_tx: mpsc::Sender<Outbound>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let note = Notification::Event { event };
                        if out_tx.send(Outbound::Notification(note)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "subscriber lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Process a request and return a response
    /// Returns (Response, should_subscribe)
    async fn process_request(request: Request, context: &ServerContext) -> (Response, bool) {
        match request {
            Request::Ping => (Response::Pong, false),

            Request::GetStatus => (Response::Status(context.status().await), false),

            Request::Subscribe => (Response::Subscribed, true),

            Request::Transcript { text } => {
                let Some(transcript) = Transcript::new(text, Source::Ipc) else {
                    return (Response::error("empty_transcript", "transcript is blank"), false);
                };
                match context.transcript_tx.send(transcript).await {
                    Ok(()) => (Response::Accepted, false),
                    Err(_) => (
                        Response::error("dispatcher_stopped", "dispatcher is not running"),
                        false,
                    ),
                }
            }

            Request::Reload => match context.reload_catalog().await {
                Ok(commands) => (Response::Reloaded { commands }, false),
                Err(e) => {
                    warn!(error = %e, "catalog reload via IPC failed");
                    (Response::error("reload_failed", e.to_string()), false)
                }
            },
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}
