//! Key chord definitions and parsing
//!
//! Chords are written as `+`-joined modifier names followed by a single key,
//! e.g. `ctrl+shift+t`, `enter`, `f5`, `primary+c`.

/// Tracks which modifier keys a chord holds down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub control: bool,
    pub shift: bool,
    pub alt: bool,
    /// Command on macOS, Windows/Super elsewhere
    pub meta: bool,
}

impl ModifierState {
    /// Check if no modifiers are held
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        !self.control && !self.shift && !self.alt && !self.meta
    }

    /// Set the modifier named `name`, returning false for unknown names
    fn set(&mut self, name: &str) -> bool {
        match name {
            "ctrl" | "control" => self.control = true,
            "shift" => self.shift = true,
            "alt" | "option" => self.alt = true,
            "meta" | "cmd" | "command" | "win" | "super" => self.meta = true,
            // Cmd on macOS, Ctrl elsewhere
            "primary" => {
                if cfg!(target_os = "macos") {
                    self.meta = true
                } else {
                    self.control = true
                }
            }
            _ => return false,
        }
        true
    }
}

/// Keys with a symbolic name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedKey {
    Enter,
    Tab,
    Space,
    Backspace,
    Delete,
    Escape,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
}

impl NamedKey {
    fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "enter" | "return" => Self::Enter,
            "tab" => Self::Tab,
            "space" | "spacebar" => Self::Space,
            "backspace" => Self::Backspace,
            "delete" | "del" => Self::Delete,
            "escape" | "esc" => Self::Escape,
            "home" => Self::Home,
            "end" => Self::End,
            "pageup" | "pgup" => Self::PageUp,
            "pagedown" | "pgdn" => Self::PageDown,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            _ => return None,
        };
        Some(key)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Tab => "tab",
            Self::Space => "space",
            Self::Backspace => "backspace",
            Self::Delete => "delete",
            Self::Escape => "escape",
            Self::Home => "home",
            Self::End => "end",
            Self::PageUp => "pageup",
            Self::PageDown => "pagedown",
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// The non-modifier part of a chord
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Named(NamedKey),
    /// F1 through F12
    Function(u8),
    Char(char),
}

impl Key {
    fn parse(name: &str) -> Option<Self> {
        if let Some(named) = NamedKey::from_name(name) {
            return Some(Self::Named(named));
        }

        if let Some(n) = name.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            return (1..=12).contains(&n).then_some(Self::Function(n));
        }

        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Self::Char(c)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Named(named) => f.write_str(named.as_str()),
            Key::Function(n) => write!(f, "f{}", n),
            Key::Char(c) => write!(f, "{}", c),
        }
    }
}

/// Errors from parsing a chord name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("empty key name")]
    Empty,

    #[error("unknown key '{0}'")]
    UnknownKey(String),

    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),
}

/// A key plus the modifiers held while it is clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub modifiers: ModifierState,
    pub key: Key,
}

impl KeyChord {
    /// A chord without modifiers
    pub fn plain(key: Key) -> Self {
        Self {
            modifiers: ModifierState::default(),
            key,
        }
    }

    /// Parse a chord such as `ctrl+shift+t`; `ctrl++` is the plus key
    pub fn parse(name: &str) -> Result<Self, KeyParseError> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let (modifier_part, key_part) = if name == "+" {
            ("", "+")
        } else if let Some(prefix) = name.strip_suffix("++") {
            (prefix, "+")
        } else {
            match name.rsplit_once('+') {
                Some((prefix, key)) => (prefix, key.trim()),
                None => ("", name.as_str()),
            }
        };

        let key = Key::parse(key_part).ok_or_else(|| KeyParseError::UnknownKey(key_part.to_string()))?;

        let mut modifiers = ModifierState::default();
        for part in modifier_part.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            if !modifiers.set(part) {
                return Err(KeyParseError::UnknownModifier(part.to_string()));
            }
        }

        Ok(Self { modifiers, key })
    }
}

impl std::fmt::Display for KeyChord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = &self.modifiers;
        for (held, name) in [
            (m.control, "ctrl"),
            (m.shift, "shift"),
            (m.alt, "alt"),
            (m.meta, "meta"),
        ] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        write!(f, "{}", self.key)
    }
}

/// One backend action while injecting a chord
#[cfg(any(test, feature = "typing"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChordStep<K> {
    Press(K),
    Click,
    Release(K),
}

/// Press each modifier, click the key, then release the modifiers in
/// reverse order
///
/// Every modifier that went down is released even when a later step fails,
/// and the first error is returned.
#[cfg(any(test, feature = "typing"))]
pub(super) fn drive_chord<K: Copy, E>(
    modifiers: &[K],
    mut step: impl FnMut(ChordStep<K>) -> Result<(), E>,
) -> Result<(), E> {
    let mut pressed = 0;
    let mut result = Ok(());

    for &modifier in modifiers {
        result = step(ChordStep::Press(modifier));
        if result.is_err() {
            break;
        }
        pressed += 1;
    }

    if result.is_ok() {
        result = step(ChordStep::Click);
    }

    for &modifier in modifiers[..pressed].iter().rev() {
        let released = step(ChordStep::Release(modifier));
        if result.is_ok() {
            result = released;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    type Steps = Vec<ChordStep<char>>;

    /// Drive a chord with a backend that fails on exactly one step
    fn drive(modifiers: &[char], fail_on: ChordStep<char>) -> (Result<(), ChordStep<char>>, Steps) {
        let mut steps = Vec::new();
        let result = drive_chord(modifiers, |step| {
            steps.push(step);
            if step == fail_on {
                Err(step)
            } else {
                Ok(())
            }
        });
        (result, steps)
    }

    #[test]
    fn test_plain_keys() {
        assert_eq!(
            KeyChord::parse("Enter").unwrap(),
            KeyChord::plain(Key::Named(NamedKey::Enter))
        );
        assert_eq!(KeyChord::parse("f5").unwrap().key, Key::Function(5));
        assert_eq!(KeyChord::parse("a").unwrap().key, Key::Char('a'));
        assert!(KeyChord::parse("esc").unwrap().modifiers.is_empty());
    }

    #[test]
    fn test_chord_with_modifiers() {
        let chord = KeyChord::parse("ctrl+shift+t").unwrap();
        assert!(chord.modifiers.control);
        assert!(chord.modifiers.shift);
        assert!(!chord.modifiers.alt);
        assert_eq!(chord.key, Key::Char('t'));
        assert_eq!(chord.to_string(), "ctrl+shift+t");
    }

    #[test]
    fn test_plus_key() {
        let chord = KeyChord::parse("ctrl++").unwrap();
        assert!(chord.modifiers.control);
        assert_eq!(chord.key, Key::Char('+'));
        assert_eq!(KeyChord::parse("+").unwrap().key, Key::Char('+'));
    }

    #[test]
    fn test_primary_modifier() {
        let chord = KeyChord::parse("primary+v").unwrap();
        if cfg!(target_os = "macos") {
            assert!(chord.modifiers.meta);
        } else {
            assert!(chord.modifiers.control);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(KeyParseError::Empty, KeyChord::parse("  ").unwrap_err());
        assert_eq!(
            KeyChord::parse("ctrl+banana").unwrap_err(),
            KeyParseError::UnknownKey("banana".into())
        );
        assert_eq!(
            KeyChord::parse("hyper+a").unwrap_err(),
            KeyParseError::UnknownModifier("hyper".into())
        );
        assert!(KeyChord::parse("f13").is_err());
    }

    #[test]
    fn test_chord_steps_in_order() {
        let (result, steps) = drive(&['c', 's'], ChordStep::Release('x'));
        assert!(result.is_ok());
        assert_eq!(
            steps,
            vec![
                ChordStep::Press('c'),
                ChordStep::Press('s'),
                ChordStep::Click,
                ChordStep::Release('s'),
                ChordStep::Release('c'),
            ]
        );
    }

    #[test]
    fn test_failed_modifier_press_releases_earlier_ones() {
        let (result, steps) = drive(&['c', 's', 'a'], ChordStep::Press('s'));
        assert_eq!(result, Err(ChordStep::Press('s')));
        assert_eq!(
            steps,
            vec![
                ChordStep::Press('c'),
                ChordStep::Press('s'),
                ChordStep::Release('c'),
            ]
        );
    }

    #[test]
    fn test_failed_click_releases_all_modifiers() {
        let (result, steps) = drive(&['c', 's'], ChordStep::Click);
        assert_eq!(result, Err(ChordStep::Click));
        assert_eq!(
            &steps[2..],
            &[ChordStep::Click, ChordStep::Release('s'), ChordStep::Release('c')]
        );
    }

    #[test]
    fn test_release_error_surfaces_when_click_succeeded() {
        let (result, steps) = drive(&['c'], ChordStep::Release('c'));
        assert_eq!(result, Err(ChordStep::Release('c')));
        assert_eq!(steps.len(), 3);
    }
}
