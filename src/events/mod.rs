//! Events module for status observers
//!
//! Provides structured notifications for mode changes, executed commands,
//! and reported runtime errors.

use serde::{Deserialize, Serialize};

use crate::catalog::CommandType;
use crate::state::{ProgrammingLanguage, TerminalDialect, Transition};

/// Events broadcast by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    /// Woke up and started matching the full command set
    Activated,

    /// Went dormant, only the wake command is matched
    Deactivated,

    LanguageChanged {
        from: Option<ProgrammingLanguage>,
        to: Option<ProgrammingLanguage>,
    },

    DialectChanged {
        from: Option<TerminalDialect>,
        to: Option<TerminalDialect>,
    },

    /// A matched command ran successfully
    CommandExecuted {
        name: String,
        command_type: CommandType,
    },

    /// The sink rejected a command's input
    ExecutionFailed {
        name: String,
        command_type: CommandType,
        reason: String,
    },

    /// A switch command named an unknown language or dialect
    InvalidTransition { name: String, reason: String },

    /// No enabled command matched the transcript
    Unrecognized { transcript: String },

    /// A new command catalog was swapped in
    CatalogReloaded { commands: usize },
}

impl StateEvent {
    /// The event announcing a mode transition, if it changed anything
    pub fn from_transition(transition: Transition) -> Option<Self> {
        let event = match transition {
            Transition::Activated => Self::Activated,
            Transition::Deactivated => Self::Deactivated,
            Transition::LanguageChanged { from, to } => Self::LanguageChanged { from, to },
            Transition::DialectChanged { from, to } => Self::DialectChanged { from, to },
            Transition::Unchanged => return None,
        };
        Some(event)
    }
}

fn or_none<T: std::fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl std::fmt::Display for StateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateEvent::Activated => write!(f, "ACTIVATED"),
            StateEvent::Deactivated => write!(f, "DEACTIVATED"),
            StateEvent::LanguageChanged { from, to } => {
                write!(f, "LANGUAGE_CHANGED ({} -> {})", or_none(from), or_none(to))
            }
            StateEvent::DialectChanged { from, to } => {
                write!(f, "DIALECT_CHANGED ({} -> {})", or_none(from), or_none(to))
            }
            StateEvent::CommandExecuted { name, command_type } => {
                write!(f, "COMMAND_EXECUTED ({}: {})", command_type, name)
            }
            StateEvent::ExecutionFailed {
                name,
                command_type,
                reason,
            } => write!(f, "EXECUTION_FAILED ({}: {}: {})", command_type, name, reason),
            StateEvent::InvalidTransition { name, reason } => {
                write!(f, "INVALID_TRANSITION ({}: {})", name, reason)
            }
            StateEvent::Unrecognized { transcript } => write!(f, "UNRECOGNIZED ({})", transcript),
            StateEvent::CatalogReloaded { commands } => {
                write!(f, "CATALOG_RELOADED ({} commands)", commands)
            }
        }
    }
}
