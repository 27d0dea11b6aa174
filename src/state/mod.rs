//! Mode state for the command interpreter
//!
//! Two top-level states:
//! - Dormant: every transcript is ignored except the wake command
//! - Active: the full enabled command set is matched
//!
//! Orthogonal to those, the selected programming language and terminal
//! dialect decide which programming and terminal commands are enabled.

mod machine;

use std::sync::Arc;

use tokio::sync::RwLock;

pub use machine::{
    switch_target, ModeAction, ModeState, ProgrammingLanguage, TerminalDialect, Transition,
    TransitionError,
};

/// Mode state shared between the dispatcher (writer) and status readers
pub type SharedMode = Arc<RwLock<ModeState>>;

/// Wrap a mode state for sharing across tasks
pub fn shared(state: ModeState) -> SharedMode {
    Arc::new(RwLock::new(state))
}
