//! Locations of the files chordmatch reads and writes
//!
//! Engine config, user shortcuts and logs share one directory:
//! `$XDG_CONFIG_HOME/chordmatch` (or `~/.config/chordmatch`) on Unix and
//! macOS, `%APPDATA%\chordmatch` on Windows.

use std::{env, fs, io, path::PathBuf};

const APP_DIR: &str = "chordmatch";

/// Engine timing config
pub const CONFIG_FILE_NAME: &str = "config.yaml";
/// Shortcuts picked up by `chordmatch live` when no file is given
pub const SHORTCUTS_FILE_NAME: &str = "shortcuts.yaml";
const LOGS_DIR_NAME: &str = "logs";

#[cfg(target_os = "windows")]
fn platform_config_root() -> Option<PathBuf> {
    env::var_os("APPDATA").map(PathBuf::from)
}

#[cfg(not(target_os = "windows"))]
fn platform_config_root() -> Option<PathBuf> {
    env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
}

/// The chordmatch directory, or `None` when no home directory is known
pub fn config_dir() -> Option<PathBuf> {
    platform_config_root().map(|root| root.join(APP_DIR))
}

fn entry(name: &str) -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(name))
}

pub fn config_file() -> Option<PathBuf> {
    entry(CONFIG_FILE_NAME)
}

pub fn shortcuts_file() -> Option<PathBuf> {
    entry(SHORTCUTS_FILE_NAME)
}

pub fn logs_dir() -> Option<PathBuf> {
    entry(LOGS_DIR_NAME)
}

/// Create the log directory and its parents if missing
pub fn ensure_logs_dir() -> io::Result<PathBuf> {
    let logs = logs_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "no home directory to keep logs in")
    })?;
    fs::create_dir_all(&logs)?;
    Ok(logs)
}
