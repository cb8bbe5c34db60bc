//! Engine configuration persistence
//!
//! Stores timing preferences in `~/.config/chordmatch/config.yaml`

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::shortcuts::{Millis, DEFAULT_BATCH_WINDOW, DEFAULT_IDLE_TIMEOUT};

/// Timing configuration for an [`Engine`](crate::shortcuts::Engine)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Inactivity (since the last key release) after which accumulated state is purged
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_ms: Millis,
    /// Events closer together than this are matched as one batch
    #[serde(default = "default_batch_window")]
    pub batch_window_ms: Millis,
}

fn default_idle_timeout() -> Millis {
    DEFAULT_IDLE_TIMEOUT
}

fn default_batch_window() -> Millis {
    DEFAULT_BATCH_WINDOW
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: default_idle_timeout(),
            batch_window_ms: default_batch_window(),
        }
    }
}

impl EngineConfig {
    /// Load config from the user config dir, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        Self::load_from(&path)
    }

    /// Load config from `path`, falling back to defaults on any problem
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to the user config dir
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    /// Save config to `path`, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn with_idle_timeout(mut self, idle_timeout_ms: Millis) -> Self {
        self.idle_timeout_ms = idle_timeout_ms;
        self
    }

    pub fn with_batch_window(mut self, batch_window_ms: Millis) -> Self {
        self.batch_window_ms = batch_window_ms;
        self
    }
}
