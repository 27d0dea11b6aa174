//! Core mode state machine
//!
//! Handles wake/sleep transitions and the language and terminal dialect
//! switches. Mutated only by the executor in response to matched commands.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Programming languages with their own command subsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgrammingLanguage {
    Python,
    Java,
}

impl ProgrammingLanguage {
    pub const ALL: [ProgrammingLanguage; 2] = [Self::Python, Self::Java];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Java => "java",
        }
    }

    /// Look up a language by its spoken or configured name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|lang| lang.as_str() == name)
    }
}

impl std::fmt::Display for ProgrammingLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal command dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalDialect {
    Linux,
    Windows,
}

impl TerminalDialect {
    pub const ALL: [TerminalDialect; 2] = [Self::Linux, Self::Windows];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|os| os.as_str() == name)
    }
}

impl std::fmt::Display for TerminalDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spoken values that clear a language or dialect selection
const CLEAR_WORDS: [&str; 3] = ["none", "off", "nothing"];

/// A requested change to the mode state
///
/// Switch targets stay as text until applied so that a command naming an
/// unknown language is reported at execution instead of rejected at load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeAction {
    Wake,
    Sleep,
    SwitchLanguage(String),
    SwitchDialect(String),
}

impl ModeAction {
    /// Parse an explicit action payload: `wake`, `sleep`,
    /// `language:<name>` or `terminal:<name>`
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        match key.as_str() {
            "wake" => return Some(Self::Wake),
            "sleep" => return Some(Self::Sleep),
            _ => {}
        }

        let (kind, target) = key.split_once(':')?;
        let target = target.trim();
        if target.is_empty() {
            return None;
        }
        match kind.trim() {
            "language" => Some(Self::SwitchLanguage(target.to_string())),
            "terminal" => Some(Self::SwitchDialect(target.to_string())),
            _ => None,
        }
    }

    /// Infer an action from a normalized command name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "wake up" => return Some(Self::Wake),
            "go to sleep" => return Some(Self::Sleep),
            _ => {}
        }

        let target = switch_target(name)?;
        if TerminalDialect::from_name(target).is_some() {
            Some(Self::SwitchDialect(target.to_string()))
        } else {
            Some(Self::SwitchLanguage(target.to_string()))
        }
    }
}

/// Extract `<x>` from a normalized `switch to <x>` phrase
pub fn switch_target(name: &str) -> Option<&str> {
    name.strip_prefix("switch to ")
        .map(str::trim)
        .filter(|target| !target.is_empty())
}

/// The observable effect of applying a mode action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Activated,
    Deactivated,
    LanguageChanged {
        from: Option<ProgrammingLanguage>,
        to: Option<ProgrammingLanguage>,
    },
    DialectChanged {
        from: Option<TerminalDialect>,
        to: Option<TerminalDialect>,
    },
    /// The action was valid but the state already matched it
    Unchanged,
}

/// A switch command named a value the daemon does not know
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("unknown programming language '{0}'")]
    UnknownLanguage(String),

    #[error("unknown terminal dialect '{0}'")]
    UnknownDialect(String),
}

/// Session mode: active flag plus the language and dialect selections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeState {
    /// When false only the wake command is matched
    pub active: bool,
    pub programming_language: Option<ProgrammingLanguage>,
    pub terminal_dialect: Option<TerminalDialect>,
}

impl ModeState {
    /// Create a fresh session state with nothing selected
    pub fn new(active: bool) -> Self {
        Self {
            active,
            programming_language: None,
            terminal_dialect: None,
        }
    }

    /// Apply an action, leaving the state untouched on error
    pub fn apply(&mut self, action: &ModeAction) -> Result<Transition, TransitionError> {
        let transition = match action {
            ModeAction::Wake => self.set_active(true),
            ModeAction::Sleep => self.set_active(false),
            ModeAction::SwitchLanguage(target) => {
                let to = resolve(target, ProgrammingLanguage::from_name)
                    .ok_or_else(|| TransitionError::UnknownLanguage(target.clone()))?;
                let from = self.programming_language;
                if from == to {
                    Transition::Unchanged
                } else {
                    self.programming_language = to;
                    Transition::LanguageChanged { from, to }
                }
            }
            ModeAction::SwitchDialect(target) => {
                let to = resolve(target, TerminalDialect::from_name)
                    .ok_or_else(|| TransitionError::UnknownDialect(target.clone()))?;
                let from = self.terminal_dialect;
                if from == to {
                    Transition::Unchanged
                } else {
                    self.terminal_dialect = to;
                    Transition::DialectChanged { from, to }
                }
            }
        };

        if transition != Transition::Unchanged {
            info!(?transition, state = %self, "mode transition");
        }
        Ok(transition)
    }

    fn set_active(&mut self, active: bool) -> Transition {
        if self.active == active {
            return Transition::Unchanged;
        }
        self.active = active;
        if active {
            Transition::Activated
        } else {
            Transition::Deactivated
        }
    }
}

/// Resolve a switch target, where the clear words map to `Some(None)`
fn resolve<T>(target: &str, lookup: impl Fn(&str) -> Option<T>) -> Option<Option<T>> {
    let target = target.trim().to_lowercase();
    if CLEAR_WORDS.contains(&target.as_str()) {
        return Some(None);
    }
    lookup(&target).map(Some)
}

impl std::fmt::Display for ModeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | language: {} | terminal: {}",
            if self.active { "Active" } else { "Dormant" },
            self.programming_language
                .map(|l| l.as_str())
                .unwrap_or("none"),
            self.terminal_dialect.map(|d| d.as_str()).unwrap_or("none"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = ModeState::new(false);
        assert!(!state.active);
        assert_eq!(state.programming_language, None);
        assert_eq!(state.terminal_dialect, None);
    }

    #[test]
    fn test_wake_and_sleep() {
        let mut state = ModeState::new(false);

        assert_eq!(state.apply(&ModeAction::Wake), Ok(Transition::Activated));
        assert!(state.active);

        assert_eq!(state.apply(&ModeAction::Wake), Ok(Transition::Unchanged));

        assert_eq!(state.apply(&ModeAction::Sleep), Ok(Transition::Deactivated));
        assert!(!state.active);
    }

    #[test]
    fn test_language_switch_leaves_other_axes() {
        let mut state = ModeState::new(true);
        state.terminal_dialect = Some(TerminalDialect::Linux);

        let transition = state
            .apply(&ModeAction::SwitchLanguage("python".into()))
            .unwrap();
        assert_eq!(
            transition,
            Transition::LanguageChanged {
                from: None,
                to: Some(ProgrammingLanguage::Python),
            }
        );

        state.apply(&ModeAction::SwitchLanguage("Java".into())).unwrap();
        assert_eq!(state.programming_language, Some(ProgrammingLanguage::Java));
        assert!(state.active);
        assert_eq!(state.terminal_dialect, Some(TerminalDialect::Linux));
    }

    #[test]
    fn test_dialect_switch_and_clear() {
        let mut state = ModeState::new(true);

        state.apply(&ModeAction::SwitchDialect("windows".into())).unwrap();
        assert_eq!(state.terminal_dialect, Some(TerminalDialect::Windows));

        let transition = state.apply(&ModeAction::SwitchDialect("off".into())).unwrap();
        assert_eq!(
            transition,
            Transition::DialectChanged {
                from: Some(TerminalDialect::Windows),
                to: None,
            }
        );
    }

    #[test]
    fn test_unknown_target_leaves_state_unchanged() {
        let mut state = ModeState::new(true);
        state.programming_language = Some(ProgrammingLanguage::Python);
        let before = state;

        let err = state
            .apply(&ModeAction::SwitchLanguage("cobol".into()))
            .unwrap_err();
        assert_eq!(err, TransitionError::UnknownLanguage("cobol".into()));
        assert_eq!(state, before);

        assert!(state
            .apply(&ModeAction::SwitchDialect("plan9".into()))
            .is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_action_from_key() {
        assert_eq!(ModeAction::from_key("wake"), Some(ModeAction::Wake));
        assert_eq!(ModeAction::from_key(" Sleep "), Some(ModeAction::Sleep));
        assert_eq!(
            ModeAction::from_key("language:java"),
            Some(ModeAction::SwitchLanguage("java".into()))
        );
        assert_eq!(
            ModeAction::from_key("terminal: linux"),
            Some(ModeAction::SwitchDialect("linux".into()))
        );
        assert_eq!(ModeAction::from_key("language:"), None);
        assert_eq!(ModeAction::from_key("restart"), None);
    }

    #[test]
    fn test_action_from_name() {
        assert_eq!(ModeAction::from_name("wake up"), Some(ModeAction::Wake));
        assert_eq!(ModeAction::from_name("go to sleep"), Some(ModeAction::Sleep));
        assert_eq!(
            ModeAction::from_name("switch to python"),
            Some(ModeAction::SwitchLanguage("python".into()))
        );
        assert_eq!(
            ModeAction::from_name("switch to windows"),
            Some(ModeAction::SwitchDialect("windows".into()))
        );
        assert_eq!(ModeAction::from_name("switch to"), None);
        assert_eq!(ModeAction::from_name("new line"), None);
    }
}
