//! Command records and the scopes that enable them

use serde::{Deserialize, Serialize};

use crate::state::{switch_target, ModeAction, ModeState, ProgrammingLanguage, TerminalDialect};

/// Lowercase, trim and collapse internal whitespace
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// What kind of action a command performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    /// Press a key or chord
    Keyboard,
    /// Type a literal string
    Info,
    /// Run a built-in editing primitive
    Selection,
    /// Emit a code snippet for the selected language
    Programming,
    /// Type a command line for the selected terminal dialect
    Terminal,
    /// Wake, sleep, or switch language/dialect
    Mode,
}

impl CommandType {
    /// Parse a configured `command_type` value
    pub fn parse(value: &str) -> Option<Self> {
        let kind = match value.trim().to_lowercase().as_str() {
            "keyboard" => Self::Keyboard,
            "info" => Self::Info,
            "selection" => Self::Selection,
            "programming" => Self::Programming,
            "terminal" => Self::Terminal,
            "mode" | "switch" | "start_stop" => Self::Mode,
            _ => return None,
        };
        Some(kind)
    }

    /// Rank used when commands of different types share a trigger phrase;
    /// lower wins
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Mode => 0,
            Self::Keyboard => 1,
            Self::Selection => 2,
            Self::Programming | Self::Terminal => 3,
            Self::Info => 4,
        }
    }

    /// Whether a definition of this type named `name` must carry a `key`
    ///
    /// Programming and terminal commands named `switch to <x>` change the
    /// mode instead of typing, so they need none.
    pub fn requires_key(&self, name: &str) -> bool {
        match self {
            Self::Keyboard | Self::Info => true,
            Self::Programming | Self::Terminal => switch_target(name).is_none(),
            Self::Selection | Self::Mode => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyboard => "keyboard",
            Self::Info => "info",
            Self::Selection => "selection",
            Self::Programming => "programming",
            Self::Terminal => "terminal",
            Self::Mode => "mode",
        }
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a command is eligible for matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Always,
    /// Any programming language is selected
    AnyLanguage,
    Language(ProgrammingLanguage),
    /// Any terminal dialect is selected
    AnyDialect,
    Dialect(TerminalDialect),
}

impl Scope {
    pub fn enabled_in(&self, mode: &ModeState) -> bool {
        match self {
            Scope::Always => true,
            Scope::AnyLanguage => mode.programming_language.is_some(),
            Scope::Language(lang) => mode.programming_language == Some(*lang),
            Scope::AnyDialect => mode.terminal_dialect.is_some(),
            Scope::Dialect(os) => mode.terminal_dialect == Some(*os),
        }
    }

    /// Whether some mode state enables both scopes at once
    pub fn overlaps(&self, other: &Scope) -> bool {
        use Scope::*;
        match (self, other) {
            (Always, Always) => true,
            (AnyLanguage, AnyLanguage | Language(_)) | (Language(_), AnyLanguage) => true,
            (Language(a), Language(b)) => a == b,
            (AnyDialect, AnyDialect | Dialect(_)) | (Dialect(_), AnyDialect) => true,
            (Dialect(a), Dialect(b)) => a == b,
            _ => false,
        }
    }
}

/// A single matchable voice command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Normalized trigger phrase
    pub name: String,
    pub command_type: CommandType,
    /// Payload whose meaning depends on the type
    pub key: Option<String>,
    pub scope: Scope,
    /// Position in the catalog, used as the final tie-break
    pub order: usize,
}

impl Command {
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The mode action of a `Mode` command, from its key or its name
    pub fn mode_action(&self) -> Option<ModeAction> {
        if self.command_type != CommandType::Mode {
            return None;
        }
        match self.key() {
            Some(key) => ModeAction::from_key(key),
            None => ModeAction::from_name(&self.name),
        }
    }

    /// Whether this command wakes a dormant session
    pub fn is_wake(&self) -> bool {
        self.mode_action() == Some(ModeAction::Wake)
    }

    pub fn word_count(&self) -> usize {
        self.name.split(' ').count()
    }
}
