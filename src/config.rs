//! Configuration loading and management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

/// Command line arguments
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "texter-daemon")]
#[command(about = "Turns voice transcripts into keystrokes and editor commands")]
#[command(version)]
pub struct Args {
    /// Command catalog: a JSON file or a directory of *commands.json files
    #[arg(short, long, env = "TEXTER_COMMANDS")]
    pub commands: Option<PathBuf>,

    /// Path of the status/transcript IPC socket
    #[arg(short, long, env = "TEXTER_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Also match commands spoken inside a longer utterance
    #[arg(long)]
    pub fuzzy: bool,

    /// Start active instead of waiting for the wake command
    #[arg(long)]
    pub active: bool,

    /// Do not read transcripts from stdin
    #[arg(long)]
    pub no_stdin: bool,

    /// Log keystrokes instead of injecting them
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Command catalog file or directory
    pub commands_path: PathBuf,

    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Enable containment matching
    pub fuzzy_matching: bool,

    /// Initial active flag
    pub start_active: bool,

    pub read_stdin: bool,

    pub dry_run: bool,
}

impl Config {
    /// Load configuration from arguments, environment and defaults
    pub fn load(args: Args) -> Result<Self> {
        let home = std::env::var("HOME").context("HOME is not set")?;
        Ok(Self::resolve(args, Path::new(&home)))
    }

    /// Fill in defaults under `home` for anything the arguments leave out
    pub fn resolve(args: Args, home: &Path) -> Self {
        let data_dir = home.join(".local").join("share").join("texter");

        let socket_path = args
            .socket
            .unwrap_or_else(|| data_dir.join("daemon.sock"));
        let commands_path = args
            .commands
            .unwrap_or_else(|| home.join(".config").join("texter").join("commands"));

        Self {
            commands_path,
            socket_path,
            data_dir,
            fuzzy_matching: args.fuzzy,
            start_active: args.active,
            read_stdin: !args.no_stdin,
            dry_run: args.dry_run,
        }
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}
