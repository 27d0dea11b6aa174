//! Dispatch loop
//!
//! Consumes transcripts one at a time in arrival order, runs them through
//! the matcher and executor, and broadcasts the resulting events. Runtime
//! errors are reported and the loop carries on with the next transcript.

use std::sync::Arc;

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::catalog::{CommandType, SharedCatalog};
use crate::events::StateEvent;
use crate::executor::{self, ExecutionError, Outcome};
use crate::input::InputSink;
use crate::matcher::Matcher;
use crate::state::SharedMode;
use crate::transcript::Transcript;

/// How a single transcript was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Blank transcript, nothing attempted
    Ignored,
    /// No enabled command matched
    Unrecognized,
    Executed {
        name: String,
        command_type: CommandType,
        outcome: Outcome,
    },
    Failed {
        name: String,
        command_type: CommandType,
        reason: String,
    },
}

/// Serializes transcript handling against one input sink
pub struct Dispatcher {
    catalog: SharedCatalog,
    mode: SharedMode,
    matcher: Matcher,
    sink: Box<dyn InputSink>,
    event_tx: broadcast::Sender<StateEvent>,
}

impl Dispatcher {
    pub fn new(
        catalog: SharedCatalog,
        mode: SharedMode,
        matcher: Matcher,
        sink: Box<dyn InputSink>,
        event_tx: broadcast::Sender<StateEvent>,
    ) -> Self {
        Self {
            catalog,
            mode,
            matcher,
            sink,
            event_tx,
        }
    }

    /// Run until every transcript sender has been dropped
    pub async fn run(&mut self, mut transcript_rx: mpsc::Receiver<Transcript>) {
        let mode = *self.mode.read().await;
        info!(%mode, "dispatcher started");

        while let Some(transcript) = transcript_rx.recv().await {
            debug!(source = %transcript.source, text = %transcript.text, "transcript received");
            self.handle(&transcript.text).await;
        }

        info!("dispatcher stopped");
    }

    /// Match and execute one transcript
    pub async fn handle(&mut self, text: &str) -> Dispatch {
        if text.trim().is_empty() {
            return Dispatch::Ignored;
        }

        // Hold our own reference so a concurrent reload cannot swap it mid-match
        let catalog = Arc::clone(&*self.catalog.read().await);
        let mut mode = self.mode.write().await;

        let Some(matched) = self.matcher.find(text, &catalog, &mode) else {
            debug!(text, active = mode.active, "unrecognized utterance");
            if mode.active {
                self.emit(StateEvent::Unrecognized {
                    transcript: text.to_string(),
                });
            }
            return Dispatch::Unrecognized;
        };

        let name = matched.command.name.clone();
        let command_type = matched.command.command_type;
        let sink = self.sink.as_mut();
        // Sinks block while injecting; keep other tasks moving on this worker
        let result = if Handle::current().runtime_flavor() == RuntimeFlavor::MultiThread {
            tokio::task::block_in_place(|| executor::execute(&matched, &mut mode, sink))
        } else {
            executor::execute(&matched, &mut mode, sink)
        };
        drop(mode);

        match result {
            Ok(outcome) => {
                info!(command = %name, %command_type, "command executed");
                if let Outcome::Transitioned(transition) = outcome {
                    if let Some(event) = StateEvent::from_transition(transition) {
                        self.emit(event);
                    }
                }
                self.emit(StateEvent::CommandExecuted {
                    name: name.clone(),
                    command_type,
                });
                Dispatch::Executed {
                    name,
                    command_type,
                    outcome,
                }
            }
            Err(e) => {
                warn!(command = %name, %command_type, error = %e, "command failed");
                let reason = e.to_string();
                let event = match e {
                    ExecutionError::InvalidModeTransition(_) => StateEvent::InvalidTransition {
                        name: name.clone(),
                        reason: reason.clone(),
                    },
                    _ => StateEvent::ExecutionFailed {
                        name: name.clone(),
                        command_type,
                        reason: reason.clone(),
                    },
                };
                self.emit(event);
                Dispatch::Failed {
                    name,
                    command_type,
                    reason,
                }
            }
        }
    }

    fn emit(&self, event: StateEvent) {
        debug!(%event, "emitting event");
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
