//! Command catalog
//!
//! The catalog is built once from validated configuration and never mutated.
//! Reloading builds a fresh catalog and swaps it in whole.

mod command;
mod loader;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::state::ModeState;

pub use command::{normalize, Command, CommandType};
pub use loader::{build_catalog, read_catalog, ConfigError};

#[cfg(test)]
pub use command::Scope;
#[cfg(test)]
pub use loader::CatalogFile;

/// Immutable set of commands in catalog order
#[derive(Debug, Default)]
pub struct Catalog {
    commands: Vec<Command>,
    replacements: Vec<(String, String)>,
}

impl Catalog {
    pub(crate) fn new(commands: Vec<Command>, replacements: Vec<(String, String)>) -> Self {
        Self {
            commands,
            replacements,
        }
    }

    /// Load and validate a catalog from a file or directory
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        build_catalog(read_catalog(path)?)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Commands of one type, in catalog order
    pub fn of_type(&self, command_type: CommandType) -> impl Iterator<Item = &Command> + '_ {
        self.commands
            .iter()
            .filter(move |c| c.command_type == command_type)
    }

    /// The commands eligible for matching in the given mode
    ///
    /// While dormant only wake commands are enabled.
    pub fn enabled(&self, mode: &ModeState) -> impl Iterator<Item = &Command> + '_ {
        let mode = *mode;
        self.commands.iter().filter(move |c| {
            if mode.active {
                c.scope.enabled_in(&mode)
            } else {
                c.is_wake()
            }
        })
    }

    pub fn has_wake_command(&self) -> bool {
        self.of_type(CommandType::Mode).any(Command::is_wake)
    }

    /// Rewrite known misrecognitions in a normalized transcript, matching
    /// whole words only
    pub fn apply_replacements(&self, transcript: &str) -> String {
        let mut words: Vec<String> = transcript.split(' ').map(String::from).collect();
        for (from, to) in &self.replacements {
            let pattern: Vec<&str> = from.split(' ').collect();
            let mut i = 0;
            while i + pattern.len() <= words.len() {
                if words[i..i + pattern.len()].iter().zip(&pattern).all(|(w, p)| w == p) {
                    words.splice(i..i + pattern.len(), to.split(' ').map(String::from));
                    i += to.split(' ').count().max(1);
                } else {
                    i += 1;
                }
            }
        }
        words.retain(|w| !w.is_empty());
        words.join(" ")
    }
}

/// Catalog handle shared between the dispatcher and the reload path
pub type SharedCatalog = Arc<RwLock<Arc<Catalog>>>;

pub fn shared(catalog: Catalog) -> SharedCatalog {
    Arc::new(RwLock::new(Arc::new(catalog)))
}

/// Load a new catalog and swap it in, keeping the old one on failure
pub async fn reload(catalog: &SharedCatalog, path: &Path) -> Result<usize, ConfigError> {
    let fresh = Catalog::load(path)?;
    let count = fresh.len();
    *catalog.write().await = Arc::new(fresh);
    info!(commands = count, path = %path.display(), "command catalog reloaded");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ProgrammingLanguage;

    fn sample() -> Catalog {
        let file: CatalogFile = serde_json::from_str(
            r#"{
                "mode_commands": [
                    {"name": "wake up", "command_type": "mode"},
                    {"name": "go to sleep", "command_type": "mode"}
                ],
                "info_commands": [{"name": "type hello", "command_type": "info", "key": "hello"}],
                "python_commands": [{"name": "print statement", "command_type": "programming", "key": "print($0)"}],
                "java_commands": [{"name": "print statement", "command_type": "programming", "key": "System.out.println($0);"}],
                "replacements": {"new lion": "new line", "colon": ":"}
            }"#,
        )
        .unwrap();
        build_catalog(file).unwrap()
    }

    #[test]
    fn test_dormant_enables_only_wake() {
        let catalog = sample();
        let mode = ModeState::new(false);
        let enabled: Vec<_> = catalog.enabled(&mode).map(|c| c.name.as_str()).collect();
        assert_eq!(enabled, vec!["wake up"]);
    }

    #[test]
    fn test_language_switch_swaps_programming_subset() {
        let catalog = sample();
        let mut mode = ModeState::new(true);
        mode.programming_language = Some(ProgrammingLanguage::Python);

        let keys: Vec<_> = catalog
            .enabled(&mode)
            .filter(|c| c.command_type == CommandType::Programming)
            .filter_map(|c| c.key())
            .collect();
        assert_eq!(keys, vec!["print($0)"]);

        mode.programming_language = Some(ProgrammingLanguage::Java);
        let keys: Vec<_> = catalog
            .enabled(&mode)
            .filter(|c| c.command_type == CommandType::Programming)
            .filter_map(|c| c.key())
            .collect();
        assert_eq!(keys, vec!["System.out.println($0);"]);
        assert!(mode.active);
        assert_eq!(mode.terminal_dialect, None);
    }

    #[test]
    fn test_replacements_match_whole_words() {
        let catalog = sample();
        assert_eq!(catalog.apply_replacements("new lion please"), "new line please");
        assert_eq!(catalog.apply_replacements("colonel"), "colonel");
        assert_eq!(catalog.apply_replacements("colon colon"), ": :");
    }

    #[test]
    fn test_demo_catalog_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/commands.json");
        let catalog = Catalog::load(&path).unwrap();
        assert!(catalog.has_wake_command());
        assert_eq!(catalog.of_type(CommandType::Selection).count(), 7);
        assert_eq!(catalog.apply_replacements("lyft"), "left");

        let cd = catalog
            .of_type(CommandType::Terminal)
            .find(|c| c.name == "change directory")
            .unwrap();
        assert_eq!(cd.key(), Some("cd $args"));
    }

    #[tokio::test]
    async fn test_reload_keeps_old_catalog_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.json");
        std::fs::write(
            &path,
            r#"{"keyboard_commands": [{"name": "save", "command_type": "keyboard", "key": "ctrl+s"}]}"#,
        )
        .unwrap();

        let shared = shared(sample());
        assert_eq!(reload(&shared, &path).await.unwrap(), 1);
        assert_eq!(shared.read().await.len(), 1);

        std::fs::write(
            &path,
            r#"{"keyboard_commands": [{"name": "save", "command_type": "keyboard"}]}"#,
        )
        .unwrap();
        assert!(reload(&shared, &path).await.is_err());
        assert_eq!(shared.read().await.commands()[0].name, "save");
    }
}
