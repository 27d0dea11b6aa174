//! Stdin transcript listener
//!
//! Reads one utterance per line on a dedicated thread, so a recognizer can
//! be piped straight into the daemon.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{Source, Transcript};

/// Feeds stdin lines into the transcript channel
pub struct StdinListener {
    transcript_tx: mpsc::Sender<Transcript>,
    running: Arc<AtomicBool>,
}

impl StdinListener {
    pub fn new(transcript_tx: mpsc::Sender<Transcript>) -> Self {
        Self {
            transcript_tx,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start reading stdin on a dedicated thread
    ///
    /// The thread ends at end of input, when the channel closes, or once
    /// `stop()` has been called and the next line arrives.
    pub fn start(&self) -> Result<(), ListenerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ListenerError::AlreadyRunning);
        }

        let transcript_tx = self.transcript_tx.clone();
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("stdin-listener".to_string())
            .spawn(move || {
                info!("stdin listener thread started");

                let stdin = std::io::stdin();
                if let Err(e) = pump(stdin.lock(), &transcript_tx, &running) {
                    error!(?e, "stdin listener error");
                }

                running.store(false, Ordering::SeqCst);
                info!("stdin listener thread stopped");
            })
            .map_err(|e| ListenerError::ThreadSpawn(e.to_string()))?;

        Ok(())
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

}

/// Errors that can occur in the stdin listener
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("stdin listener is already running")]
    AlreadyRunning,

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),

    #[error("failed to read transcript: {0}")]
    Read(#[from] std::io::Error),
}

/// Forward non-blank lines until EOF, channel close, or stop
///
/// Returns the number of transcripts forwarded.
fn pump<R: BufRead>(
    reader: R,
    transcript_tx: &mpsc::Sender<Transcript>,
    running: &AtomicBool,
) -> Result<usize, ListenerError> {
    let mut forwarded = 0;

    for line in reader.lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let Some(transcript) = Transcript::new(line?, Source::Stdin) else {
            continue;
        };

        debug!(text = %transcript.text, "transcript read from stdin");
        // Not in an async context, so block until the dispatcher has room
        if transcript_tx.blocking_send(transcript).is_err() {
            warn!("failed to send transcript - channel closed?");
            break;
        }
        forwarded += 1;
    }

    Ok(forwarded)
}
