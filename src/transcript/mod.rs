//! Transcript sources
//!
//! Recognized utterances arrive as text lines, either on stdin or over the
//! IPC socket, and are queued on one channel so the dispatcher handles them
//! strictly in arrival order.

mod listener;

pub use listener::StdinListener;

/// Where a transcript came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Stdin,
    Ipc,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Stdin => write!(f, "stdin"),
            Source::Ipc => write!(f, "ipc"),
        }
    }
}

/// One recognized utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub source: Source,
}

impl Transcript {
    /// Wrap recognized text, dropping silence (empty or blank text)
    pub fn new(text: impl Into<String>, source: Source) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self { text, source })
    }
}
