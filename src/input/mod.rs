//! Keystroke and text injection
//!
//! The [`InputSink`] trait is the boundary to the OS input layer. Sinks
//! accept a chord name or a literal string and report failure without
//! aborting the daemon.
//!
//! - `EnigoSink` (feature `typing`) injects real OS input events
//! - [`LogSink`] only logs what it would have typed
//! - `RecordingSink` records calls for tests

mod keys;
#[cfg(feature = "typing")]
mod native;
mod snippet;

use tracing::info;

#[cfg(feature = "typing")]
pub use native::EnigoSink;
pub use keys::{Key, KeyChord, KeyParseError, NamedKey};
pub use snippet::{fill_placeholders, Snippet};

/// Errors reported by a sink
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error(transparent)]
    Key(#[from] KeyParseError),

    #[error("input backend error: {0}")]
    Backend(String),
}

/// Built-in editing primitives used by selection commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    SelectLine,
    SelectAll,
    DeleteLine,
    DeleteAll,
    Copy,
    Paste,
    Cut,
    Undo,
    Redo,
}

impl EditAction {
    /// Look up the primitive for a normalized selection command name
    pub fn from_name(name: &str) -> Option<Self> {
        let action = match name {
            "select line" => Self::SelectLine,
            "select all" => Self::SelectAll,
            "delete line" => Self::DeleteLine,
            "delete all" => Self::DeleteAll,
            "copy" => Self::Copy,
            "paste" => Self::Paste,
            "cut" => Self::Cut,
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            _ => return None,
        };
        Some(action)
    }

    /// The chord sequence that performs this primitive
    pub fn chords(&self) -> &'static [&'static str] {
        match self {
            Self::SelectLine => &["home", "shift+end"],
            Self::SelectAll => &["primary+a"],
            Self::DeleteLine => &["home", "shift+end", "backspace"],
            Self::DeleteAll => &["primary+a", "backspace"],
            Self::Copy => &["primary+c"],
            Self::Paste => &["primary+v"],
            Self::Cut => &["primary+x"],
            Self::Undo => &["primary+z"],
            Self::Redo => &["primary+shift+z"],
        }
    }
}

/// OS-level keystroke and text injection
pub trait InputSink {
    /// Click a parsed chord
    fn press_chord(&mut self, chord: &KeyChord) -> Result<(), SinkError>;

    /// Type a literal string
    fn type_text(&mut self, text: &str) -> Result<(), SinkError>;

    /// Run an editing primitive
    ///
    /// Every chord is parsed before the first one is pressed.
    fn edit(&mut self, action: EditAction) -> Result<(), SinkError> {
        let chords = action
            .chords()
            .iter()
            .map(|name| KeyChord::parse(name))
            .collect::<Result<Vec<_>, _>>()?;
        for chord in &chords {
            self.press_chord(chord)?;
        }
        Ok(())
    }

    /// Type a snippet and move the cursor back to its marker
    fn insert(&mut self, snippet: &Snippet) -> Result<(), SinkError> {
        self.type_text(&snippet.text)?;
        let left = KeyChord::plain(Key::Named(NamedKey::Left));
        for _ in 0..snippet.cursor_back {
            self.press_chord(&left)?;
        }
        Ok(())
    }
}

/// Dry-run sink that logs instead of injecting input
#[derive(Debug, Default)]
pub struct LogSink;

impl InputSink for LogSink {
    fn press_chord(&mut self, chord: &KeyChord) -> Result<(), SinkError> {
        info!(%chord, "press");
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> Result<(), SinkError> {
        info!(text, "type");
        Ok(())
    }
}

/// Build the sink for this build: real input with `typing`, logging otherwise
pub fn default_sink(dry_run: bool) -> anyhow::Result<Box<dyn InputSink>> {
    if dry_run {
        return Ok(Box::new(LogSink));
    }

    #[cfg(feature = "typing")]
    {
        Ok(Box::new(EnigoSink::new()?))
    }

    #[cfg(not(feature = "typing"))]
    {
        tracing::warn!("built without the `typing` feature, keystrokes will only be logged");
        Ok(Box::new(LogSink))
    }
}

#[cfg(test)]
pub use recording::{RecordingSink, SinkCall};


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_action_names() {
        assert_eq!(EditAction::from_name("select line"), Some(EditAction::SelectLine));
        assert_eq!(EditAction::from_name("delete all"), Some(EditAction::DeleteAll));
        assert_eq!(EditAction::from_name("select paragraph"), None);
    }

    #[test]
    fn test_every_edit_chord_parses() {
        for name in [
            "select line",
            "select all",
            "delete line",
            "delete all",
            "copy",
            "paste",
            "cut",
            "undo",
            "redo",
        ] {
            let action = EditAction::from_name(name).unwrap();
            for chord in action.chords() {
                assert!(KeyChord::parse(chord).is_ok(), "{} in {:?}", chord, action);
            }
        }
    }

    #[test]
    fn test_insert_moves_cursor_back() {
        let sink = RecordingSink::new();
        let mut boxed: Box<dyn InputSink> = Box::new(sink.clone());
        boxed.insert(&Snippet::parse("print($0)")).unwrap();

        assert_eq!(
            sink.calls(),
            vec![
                SinkCall::Type("print()".into()),
                SinkCall::Press("left".into()),
            ]
        );
    }

    #[test]
    fn test_recording_sink_fails_after_limit() {
        let mut sink = RecordingSink::failing_after(1);
        assert!(sink.type_text("one").is_ok());
        assert!(matches!(sink.type_text("two"), Err(SinkError::Backend(_))));
        assert_eq!(sink.calls(), vec![SinkCall::Type("one".into())]);
    }

    #[test]
    fn test_log_sink_accepts_valid_input() {
        let mut sink = LogSink;
        let chord = KeyChord::parse("ctrl+s").unwrap();
        assert!(sink.press_chord(&chord).is_ok());
        assert!(sink.type_text("hello").is_ok());
        assert!(sink.edit(EditAction::Undo).is_ok());
    }
}
