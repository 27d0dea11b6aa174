//! Signal handling for graceful shutdown and catalog reload

use tokio::signal::unix::{signal, Signal as UnixSignal, SignalKind};
use tracing::debug;

/// What a received signal asks the daemon to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// SIGTERM or SIGINT
    Shutdown,
    /// SIGHUP: re-read the command catalog
    Reload,
}

/// Handles SIGTERM, SIGINT and SIGHUP
pub struct Signals {
    sigterm: UnixSignal,
    sigint: UnixSignal,
    sighup: UnixSignal,
}

impl Signals {
    /// Register the signal handlers
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
            sighup: signal(SignalKind::hangup())?,
        })
    }

    /// Wait for the next signal
    pub async fn recv(&mut self) -> Signal {
        tokio::select! {
            _ = self.sigterm.recv() => {
                debug!("received SIGTERM");
                Signal::Shutdown
            }
            _ = self.sigint.recv() => {
                debug!("received SIGINT");
                Signal::Shutdown
            }
            _ = self.sighup.recv() => {
                debug!("received SIGHUP");
                Signal::Reload
            }
        }
    }
}
