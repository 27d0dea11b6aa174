//! OS keystroke injection using enigo

use std::thread;
use std::time::Duration;

use enigo::{Direction, Enigo, Keyboard, Settings};
use tracing::debug;

use super::keys::{drive_chord, ChordStep, Key, KeyChord, NamedKey};
use super::{InputSink, SinkError};

/// Injects real keyboard events into the focused window
pub struct EnigoSink {
    enigo: Enigo,
}

impl EnigoSink {
    pub fn new() -> Result<Self, SinkError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| SinkError::Backend(format!("failed to initialize enigo: {}", e)))?;
        Ok(Self { enigo })
    }

    fn modifier_keys(chord: &KeyChord) -> Vec<enigo::Key> {
        let m = &chord.modifiers;
        [
            (m.control, enigo::Key::Control),
            (m.shift, enigo::Key::Shift),
            (m.alt, enigo::Key::Alt),
            (m.meta, enigo::Key::Meta),
        ]
        .into_iter()
        .filter_map(|(held, key)| held.then_some(key))
        .collect()
    }
}

fn to_enigo(key: Key) -> enigo::Key {
    match key {
        Key::Named(named) => match named {
            NamedKey::Enter => enigo::Key::Return,
            NamedKey::Tab => enigo::Key::Tab,
            NamedKey::Space => enigo::Key::Space,
            NamedKey::Backspace => enigo::Key::Backspace,
            NamedKey::Delete => enigo::Key::Delete,
            NamedKey::Escape => enigo::Key::Escape,
            NamedKey::Home => enigo::Key::Home,
            NamedKey::End => enigo::Key::End,
            NamedKey::PageUp => enigo::Key::PageUp,
            NamedKey::PageDown => enigo::Key::PageDown,
            NamedKey::Up => enigo::Key::UpArrow,
            NamedKey::Down => enigo::Key::DownArrow,
            NamedKey::Left => enigo::Key::LeftArrow,
            NamedKey::Right => enigo::Key::RightArrow,
        },
        Key::Function(n) => match n {
            1 => enigo::Key::F1,
            2 => enigo::Key::F2,
            3 => enigo::Key::F3,
            4 => enigo::Key::F4,
            5 => enigo::Key::F5,
            6 => enigo::Key::F6,
            7 => enigo::Key::F7,
            8 => enigo::Key::F8,
            9 => enigo::Key::F9,
            10 => enigo::Key::F10,
            11 => enigo::Key::F11,
            _ => enigo::Key::F12,
        },
        Key::Char(c) => enigo::Key::Unicode(c),
    }
}

impl InputSink for EnigoSink {
    fn press_chord(&mut self, chord: &KeyChord) -> Result<(), SinkError> {
        debug!(%chord, "injecting chord");
        let modifiers = Self::modifier_keys(chord);
        let enigo = &mut self.enigo;

        drive_chord(&modifiers, |step| match step {
            ChordStep::Press(modifier) => enigo
                .key(modifier, Direction::Press)
                .map_err(|e| SinkError::Backend(format!("failed to press modifier: {}", e))),
            ChordStep::Click => {
                // Give the modifiers time to register
                if !modifiers.is_empty() {
                    thread::sleep(Duration::from_millis(10));
                }
                enigo
                    .key(to_enigo(chord.key), Direction::Click)
                    .map_err(|e| SinkError::Backend(format!("failed to click key: {}", e)))
            }
            ChordStep::Release(modifier) => enigo
                .key(modifier, Direction::Release)
                .map_err(|e| SinkError::Backend(format!("failed to release modifier: {}", e))),
        })
    }

    fn type_text(&mut self, text: &str) -> Result<(), SinkError> {
        if text.is_empty() {
            return Ok(());
        }
        self.enigo
            .text(text)
            .map_err(|e| SinkError::Backend(format!("failed to type text: {}", e)))
    }
}
