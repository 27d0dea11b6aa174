//! Catalog file format and load-time validation
//!
//! A catalog file is a JSON object mapping category names to command
//! definitions:
//!
//! ```json
//! {
//!   "keyboard_commands": [{ "name": "new line", "command_type": "keyboard", "key": "enter" }],
//!   "python_commands": [{ "name": "print statement", "command_type": "programming", "key": "print($0)" }],
//!   "replacements": { "lyft": "left" }
//! }
//! ```
//!
//! Loading is all-or-nothing: the first invalid definition fails the load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use super::command::{normalize, Command, CommandType, Scope};
use super::Catalog;
use crate::input::EditAction;
use crate::state::{ProgrammingLanguage, TerminalDialect};

/// Errors that reject a catalog at load time
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to search {path} for command files: {message}")]
    Search { path: PathBuf, message: String },

    #[error("no *commands.json files found under {0}")]
    NoCatalogFiles(PathBuf),

    #[error("unknown command category '{0}'")]
    UnknownCategory(String),

    #[error("command in '{category}' has an empty name")]
    EmptyName { category: String },

    #[error("command '{name}' has unknown command_type '{value}'")]
    UnknownType { name: String, value: String },

    #[error("{command_type} command '{name}' is not allowed in '{category}'")]
    TypeMismatch {
        name: String,
        command_type: CommandType,
        category: String,
    },

    #[error("{command_type} command '{name}' requires a key")]
    MissingKey {
        name: String,
        command_type: CommandType,
    },

    #[error("'{0}' is not a built-in selection command")]
    UnknownSelection(String),

    #[error("mode command '{0}' has no recognizable action")]
    UnknownModeAction(String),

    #[error("replacement '{from}' would rewrite command '{name}'")]
    ShadowingReplacement { from: String, name: String },

    #[error("duplicate {command_type} command '{name}'")]
    Duplicate {
        name: String,
        command_type: CommandType,
    },
}

/// One command definition as written in the catalog file
#[derive(Debug, Clone, Deserialize)]
pub struct CommandDef {
    pub name: String,
    pub command_type: String,
    #[serde(default)]
    pub key: Option<String>,
}

/// The parsed, not yet validated, contents of one or more catalog files
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    /// Misrecognized phrase -> correction, applied before matching
    #[serde(default)]
    pub replacements: BTreeMap<String, String>,

    #[serde(flatten)]
    pub groups: BTreeMap<String, Vec<CommandDef>>,
}

impl CatalogFile {
    /// Fold a later file into this one; its categories replace ours
    fn merge(&mut self, other: CatalogFile) {
        self.replacements.extend(other.replacements);
        self.groups.extend(other.groups);
    }
}

/// Command categories, declared in catalog order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Category {
    Mode,
    Keyboard,
    Selection,
    AnyLanguage,
    Language(ProgrammingLanguage),
    AnyDialect,
    Dialect(TerminalDialect),
    Info,
}

impl Category {
    fn parse(name: &str) -> Option<Self> {
        let base = name.strip_suffix("_commands")?;
        let category = match base {
            "keyboard" => Self::Keyboard,
            "info" => Self::Info,
            "selection" => Self::Selection,
            "mode" | "switch" => Self::Mode,
            "programming" => Self::AnyLanguage,
            "terminal" => Self::AnyDialect,
            other => {
                if let Some(lang) = ProgrammingLanguage::from_name(other) {
                    Self::Language(lang)
                } else {
                    Self::Dialect(TerminalDialect::from_name(other)?)
                }
            }
        };
        Some(category)
    }

    fn scope(&self) -> Scope {
        match self {
            Self::AnyLanguage => Scope::AnyLanguage,
            Self::Language(lang) => Scope::Language(*lang),
            Self::AnyDialect => Scope::AnyDialect,
            Self::Dialect(os) => Scope::Dialect(*os),
            Self::Mode | Self::Keyboard | Self::Selection | Self::Info => Scope::Always,
        }
    }

    /// Language categories hold programming commands, dialect categories
    /// hold terminal commands, the rest hold everything else
    fn accepts(&self, command_type: CommandType) -> bool {
        match self {
            Self::AnyLanguage | Self::Language(_) => command_type == CommandType::Programming,
            Self::AnyDialect | Self::Dialect(_) => command_type == CommandType::Terminal,
            _ => !matches!(
                command_type,
                CommandType::Programming | CommandType::Terminal
            ),
        }
    }
}

/// Read a catalog file, or every `*commands.json` under a directory
pub fn read_catalog(path: &Path) -> Result<CatalogFile, ConfigError> {
    let files = if path.is_dir() {
        find_command_files(path)?
    } else {
        vec![path.to_path_buf()]
    };

    let mut merged = CatalogFile::default();
    for file in files {
        debug!(path = %file.display(), "reading command file");
        let text = std::fs::read_to_string(&file).map_err(|source| ConfigError::Io {
            path: file.clone(),
            source,
        })?;
        let parsed: CatalogFile =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: file.clone(),
                source,
            })?;
        merged.merge(parsed);
    }
    Ok(merged)
}

fn find_command_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let search_error = |message: String| ConfigError::Search {
        path: dir.to_path_buf(),
        message,
    };

    let pattern = format!(
        "{}/**/*commands.json",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let mut files = glob::glob(&pattern)
        .map_err(|e| search_error(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| search_error(e.to_string()))?;

    if files.is_empty() {
        return Err(ConfigError::NoCatalogFiles(dir.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

/// Validate a parsed file into a catalog
pub fn build_catalog(file: CatalogFile) -> Result<Catalog, ConfigError> {
    let mut groups = Vec::with_capacity(file.groups.len());
    for (name, defs) in file.groups {
        let category =
            Category::parse(&name).ok_or_else(|| ConfigError::UnknownCategory(name.clone()))?;
        groups.push((category, name, defs));
    }
    groups.sort_by_key(|(category, _, _)| *category);

    let mut commands: Vec<Command> = Vec::new();
    for (category, category_name, defs) in groups {
        for def in defs {
            let command = validate(def, category, &category_name, commands.len())?;

            let duplicate = commands.iter().any(|other| {
                other.name == command.name
                    && other.command_type == command.command_type
                    && other.scope.overlaps(&command.scope)
            });
            if duplicate {
                return Err(ConfigError::Duplicate {
                    name: command.name,
                    command_type: command.command_type,
                });
            }
            commands.push(command);
        }
    }

    let replacements: Vec<(String, String)> = file
        .replacements
        .into_iter()
        .map(|(from, to)| (normalize(&from), normalize(&to)))
        .filter(|(from, _)| !from.is_empty())
        .collect();

    // A replacement inside a trigger phrase would make that command unmatchable
    for (from, _) in &replacements {
        let pattern: Vec<&str> = from.split(' ').collect();
        let shadowed = commands.iter().find(|c| {
            let words: Vec<&str> = c.name.split(' ').collect();
            words.windows(pattern.len()).any(|w| w == pattern.as_slice())
        });
        if let Some(command) = shadowed {
            return Err(ConfigError::ShadowingReplacement {
                from: from.clone(),
                name: command.name.clone(),
            });
        }
    }

    info!(commands = commands.len(), "command catalog built");
    Ok(Catalog::new(commands, replacements))
}

fn validate(
    def: CommandDef,
    category: Category,
    category_name: &str,
    order: usize,
) -> Result<Command, ConfigError> {
    let name = normalize(&def.name);
    if name.is_empty() {
        return Err(ConfigError::EmptyName {
            category: category_name.to_string(),
        });
    }

    let command_type =
        CommandType::parse(&def.command_type).ok_or_else(|| ConfigError::UnknownType {
            name: name.clone(),
            value: def.command_type.clone(),
        })?;

    if !category.accepts(command_type) {
        return Err(ConfigError::TypeMismatch {
            name,
            command_type,
            category: category_name.to_string(),
        });
    }

    let key = def.key.filter(|k| !k.trim().is_empty());
    if key.is_none() && command_type.requires_key(&name) {
        return Err(ConfigError::MissingKey { name, command_type });
    }

    let command = Command {
        name,
        command_type,
        key,
        scope: category.scope(),
        order,
    };

    match command_type {
        CommandType::Selection if EditAction::from_name(&command.name).is_none() => {
            Err(ConfigError::UnknownSelection(command.name))
        }
        CommandType::Mode if command.mode_action().is_none() => {
            Err(ConfigError::UnknownModeAction(command.name))
        }
        _ => Ok(command),
    }
}
