//! chordmatch - keyboard shortcut matching engine
//!
//! This crate turns raw key press/release events into command invocations,
//! with support for simultaneous chords, multi-step sequences, priorities and
//! an inactivity reset. Hosts own time: they pass a millisecond timestamp with
//! every event and poll the engine for its deadlines.

pub mod cli;
pub mod config;
pub mod config_paths;
pub mod replay;
pub mod shortcuts;
pub mod tracing;

// Re-export commonly used types
pub use config::EngineConfig;
pub use shortcuts::{
    Command, Engine, EngineHandle, InputHub, KeyEvent, Modifiers, Predicate, RawKeyEvent,
    Resolution, Target,
};
