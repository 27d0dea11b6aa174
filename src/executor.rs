//! Command execution
//!
//! Each call either performs one external side effect through the sink,
//! applies one mode transition, or returns an error having done neither.

use crate::catalog::{Command, CommandType};
use crate::input::{fill_placeholders, EditAction, InputSink, KeyChord, SinkError, Snippet};
use crate::matcher::Match;
use crate::state::{switch_target, ModeAction, ModeState, Transition, TransitionError};

/// What a successful execution did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Input was sent to the sink
    Injected,
    /// The mode state was updated (or already matched)
    Transitioned(Transition),
}

/// Runtime failures, reported to observers and never fatal
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("invalid mode transition: {0}")]
    InvalidModeTransition(#[from] TransitionError),

    #[error("{command_type} command '{name}' has no key")]
    MissingKey {
        name: String,
        command_type: CommandType,
    },

    #[error("repeat interrupted after {completed} of {requested} presses: {source}")]
    RepeatInterrupted {
        completed: u32,
        requested: u32,
        source: SinkError,
    },

    #[error("'{0}' is not a built-in selection command")]
    UnknownSelection(String),

    #[error("mode command '{0}' has no recognizable action")]
    UnknownModeAction(String),
}

/// Run a matched command against the mode state and sink
pub fn execute(
    matched: &Match<'_>,
    mode: &mut ModeState,
    sink: &mut dyn InputSink,
) -> Result<Outcome, ExecutionError> {
    let command = matched.command;

    match command.command_type {
        CommandType::Keyboard => {
            let chord = KeyChord::parse(payload(command)?).map_err(SinkError::from)?;
            let times = matched.repeat_count().unwrap_or(1);
            // Repeats stop at the first failed press
            for completed in 0..times {
                sink.press_chord(&chord).map_err(|source| match completed {
                    0 => ExecutionError::Sink(source),
                    _ => ExecutionError::RepeatInterrupted {
                        completed,
                        requested: times,
                        source,
                    },
                })?;
            }
            Ok(Outcome::Injected)
        }
        CommandType::Info => {
            sink.type_text(payload(command)?)?;
            Ok(Outcome::Injected)
        }
        CommandType::Selection => {
            let action = EditAction::from_name(&command.name)
                .ok_or_else(|| ExecutionError::UnknownSelection(command.name.clone()))?;
            sink.edit(action)?;
            Ok(Outcome::Injected)
        }
        CommandType::Programming => match switch_target(&command.name) {
            Some(target) => transition(mode, ModeAction::SwitchLanguage(target.to_string())),
            None => {
                sink.insert(&Snippet::render(payload(command)?, &matched.remainder))?;
                Ok(Outcome::Injected)
            }
        },
        CommandType::Terminal => match switch_target(&command.name) {
            Some(target) => transition(mode, ModeAction::SwitchDialect(target.to_string())),
            None => {
                sink.type_text(&fill_placeholders(payload(command)?, &matched.remainder))?;
                Ok(Outcome::Injected)
            }
        },
        CommandType::Mode => {
            let action = command
                .mode_action()
                .ok_or_else(|| ExecutionError::UnknownModeAction(command.name.clone()))?;
            transition(mode, action)
        }
    }
}

fn payload(command: &Command) -> Result<&str, ExecutionError> {
    command.key().ok_or_else(|| ExecutionError::MissingKey {
        name: command.name.clone(),
        command_type: command.command_type,
    })
}

fn transition(mode: &mut ModeState, action: ModeAction) -> Result<Outcome, ExecutionError> {
    Ok(Outcome::Transitioned(mode.apply(&action)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Scope;
    use crate::input::{RecordingSink, SinkCall};
    use crate::state::{ProgrammingLanguage, TerminalDialect};

    fn command(name: &str, command_type: CommandType, key: Option<&str>) -> Command {
        Command {
            name: name.to_string(),
            command_type,
            key: key.map(String::from),
            scope: Scope::Always,
            order: 0,
        }
    }

    fn run(
        command: &Command,
        remainder: &str,
        mode: &mut ModeState,
    ) -> (Result<Outcome, ExecutionError>, Vec<SinkCall>) {
        let sink = RecordingSink::new();
        let mut target = sink.clone();
        let matched = Match {
            command,
            remainder: remainder.to_string(),
        };
        let result = execute(&matched, mode, &mut target);
        (result, sink.calls())
    }

    #[test]
    fn test_keyboard_presses_chord() {
        let cmd = command("save file", CommandType::Keyboard, Some("ctrl+s"));
        let mut mode = ModeState::new(true);
        let (result, calls) = run(&cmd, "", &mut mode);
        assert_eq!(result.unwrap(), Outcome::Injected);
        assert_eq!(calls, vec![SinkCall::Press("ctrl+s".into())]);
    }

    #[test]
    fn test_keyboard_repeats_spoken_count() {
        let cmd = command("down", CommandType::Keyboard, Some("down"));
        let mut mode = ModeState::new(true);
        let (_, calls) = run(&cmd, "three", &mut mode);
        assert_eq!(calls.len(), 3);
    }

    #[test]
    fn test_unknown_key_injects_nothing() {
        let cmd = command("launch", CommandType::Keyboard, Some("ctrl+rocket"));
        let mut mode = ModeState::new(true);
        let (result, calls) = run(&cmd, "five", &mut mode);
        assert!(matches!(result, Err(ExecutionError::Sink(SinkError::Key(_)))));
        assert!(calls.is_empty());
    }

    #[test]
    fn test_failed_repeat_stops_and_counts() {
        let cmd = command("down", CommandType::Keyboard, Some("down"));
        let mut mode = ModeState::new(true);
        let sink = RecordingSink::failing_after(2);
        let mut target = sink.clone();
        let matched = Match {
            command: &cmd,
            remainder: "five".to_string(),
        };

        let err = execute(&matched, &mut mode, &mut target).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::RepeatInterrupted {
                completed: 2,
                requested: 5,
                ..
            }
        ));
        assert!(err.to_string().starts_with("repeat interrupted after 2 of 5 presses"));
        assert_eq!(sink.calls().len(), 2);
    }

    #[test]
    fn test_info_types_literal() {
        let cmd = command("type hello", CommandType::Info, Some("hello"));
        let mut mode = ModeState::new(true);
        let (_, calls) = run(&cmd, "", &mut mode);
        assert_eq!(calls, vec![SinkCall::Type("hello".into())]);
    }

    #[test]
    fn test_selection_is_one_edit() {
        let cmd = command("delete line", CommandType::Selection, None);
        let mut mode = ModeState::new(true);
        let (_, calls) = run(&cmd, "", &mut mode);
        assert_eq!(calls, vec![SinkCall::Edit(EditAction::DeleteLine)]);
    }

    #[test]
    fn test_programming_snippet_and_switch() {
        let mut mode = ModeState::new(true);
        mode.programming_language = Some(ProgrammingLanguage::Python);

        let snippet = command("print statement", CommandType::Programming, Some("print($0)"));
        let (_, calls) = run(&snippet, "", &mut mode);
        assert_eq!(
            calls,
            vec![SinkCall::Type("print()".into()), SinkCall::Press("left".into())]
        );

        let switch = command("switch to java", CommandType::Programming, None);
        let (result, calls) = run(&switch, "", &mut mode);
        assert!(matches!(
            result.unwrap(),
            Outcome::Transitioned(Transition::LanguageChanged { .. })
        ));
        assert!(calls.is_empty());
        assert_eq!(mode.programming_language, Some(ProgrammingLanguage::Java));
    }

    #[test]
    fn test_spoken_name_fills_snippet() {
        let mut mode = ModeState::new(true);
        mode.programming_language = Some(ProgrammingLanguage::Python);

        let class = command("create class", CommandType::Programming, Some("class $Name:"));
        let (_, calls) = run(&class, "user account", &mut mode);
        assert_eq!(calls, vec![SinkCall::Type("class UserAccount:".into())]);

        let function = command(
            "create function",
            CommandType::Programming,
            Some("def $snake_name($0):"),
        );
        let (_, calls) = run(&function, "load file", &mut mode);
        assert_eq!(
            calls,
            vec![
                SinkCall::Type("def load_file():".into()),
                SinkCall::Press("left".into()),
                SinkCall::Press("left".into()),
            ]
        );
    }

    #[test]
    fn test_terminal_path_argument() {
        let mut mode = ModeState::new(true);
        let cd = command("change directory", CommandType::Terminal, Some("cd $args"));
        let (_, calls) = run(&cd, "projects texter", &mut mode);
        assert_eq!(calls, vec![SinkCall::Type("cd projects texter".into())]);
    }

    #[test]
    fn test_terminal_command_and_switch() {
        let mut mode = ModeState::new(true);
        let list = command("list files", CommandType::Terminal, Some("ls -la"));
        let (_, calls) = run(&list, "", &mut mode);
        assert_eq!(calls, vec![SinkCall::Type("ls -la".into())]);

        let switch = command("switch to windows", CommandType::Terminal, None);
        run(&switch, "", &mut mode).0.unwrap();
        assert_eq!(mode.terminal_dialect, Some(TerminalDialect::Windows));
    }

    #[test]
    fn test_mode_commands_never_touch_sink() {
        let mut mode = ModeState::new(false);
        let wake = command("wake up", CommandType::Mode, None);
        let (result, calls) = run(&wake, "", &mut mode);
        assert_eq!(result.unwrap(), Outcome::Transitioned(Transition::Activated));
        assert!(calls.is_empty());
        assert!(mode.active);
    }

    #[test]
    fn test_invalid_switch_leaves_mode() {
        let mut mode = ModeState::new(true);
        let before = mode;
        let cmd = command("switch to cobol", CommandType::Mode, None);
        let (result, _) = run(&cmd, "", &mut mode);
        assert!(matches!(
            result,
            Err(ExecutionError::InvalidModeTransition(TransitionError::UnknownLanguage(_)))
        ));
        assert_eq!(mode, before);
    }

    #[test]
    fn test_sink_failure_is_reported() {
        let cmd = command("type hello", CommandType::Info, Some("hello"));
        let mut mode = ModeState::new(true);
        let mut sink = RecordingSink::failing();
        let matched = Match {
            command: &cmd,
            remainder: String::new(),
        };
        let result = execute(&matched, &mut mode, &mut sink);
        assert!(matches!(result, Err(ExecutionError::Sink(SinkError::Backend(_)))));
    }
}
