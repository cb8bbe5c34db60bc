//! Command-line argument parsing
//!
//! Supports:
//! - Replaying scenario files and checking their expectations
//! - Validating shortcut files
//! - A live window that matches real key presses

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::EngineConfig;
use crate::shortcuts::Millis;

/// Keyboard shortcut matching engine
#[derive(Parser, Debug)]
#[command(
    name = "chordmatch",
    version,
    about = "Match chords and key sequences against shortcut definitions"
)]
pub struct CliArgs {
    /// Engine config file (defaults to the user config)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the idle timeout in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub idle_timeout: Option<Millis>,

    /// Override the batch window in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub batch_window: Option<Millis>,

    /// More console logging (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Replay scenario files and report which commands fired
    Replay {
        /// Scenario YAML files
        #[arg(value_name = "SCENARIO", required = true)]
        scenarios: Vec<PathBuf>,

        /// Print fired commands as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a shortcut file and print its predicates
    Check {
        /// Shortcut file (YAML, or JSON by extension)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Open a window and match its key presses live
    Live {
        /// Shortcut file (defaults to the user shortcuts, then the built-in set)
        #[arg(long, value_name = "FILE")]
        shortcuts: Option<PathBuf>,
    },
}

impl CliArgs {
    /// Engine config from the config file with command-line overrides applied
    pub fn engine_config(&self) -> EngineConfig {
        let config = match &self.config {
            Some(path) => EngineConfig::load_from(path),
            None => EngineConfig::load(),
        };
        self.apply_overrides(config)
    }

    fn apply_overrides(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(idle) = self.idle_timeout {
            config.idle_timeout_ms = idle;
        }
        if let Some(window) = self.batch_window {
            config.batch_window_ms = window;
        }
        config
    }
}
