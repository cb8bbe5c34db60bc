//! Keyboard shortcut matching engine
//!
//! This module turns a stream of raw key presses and releases into command
//! invocations:
//! - Events arriving within a short batch window are treated as simultaneous
//! - Each batch becomes one snapshot; a chord is matched against any snapshot
//! - Multi-step predicates align positionally with the snapshot series
//! - Among several matching commands, the lowest priority value wins
//! - After a period of inactivity the accumulated state is purged
//!
//! # Architecture
//!
//! ```text
//! winit::KeyEvent → RawKeyEvent → Engine::handle_event() → Snapshot series → Command → Handler
//! ```
//!
//! # Registering Shortcuts
//!
//! ```ignore
//! let engine = Engine::new(&EngineConfig::default()).with_target(Target::new("editor"));
//!
//! // Built in code
//! engine.register_commands(
//!     vec![Command::new("save", Predicate::chord("s", Modifiers::META), |_| save())],
//!     Some("editor"),
//! );
//!
//! // Or loaded from YAML
//! let defs = load_shortcuts_file(Path::new("shortcuts.yaml"))?;
//! ```

mod command;
mod dsl;
mod engine;
mod event;
mod history;
mod hub;
mod predicate;
mod registry;
mod scheduler;
mod series;
mod winit_adapter;

pub use command::{Command, Handler};
pub use dsl::{
    convert_entries, load_shortcuts_file, parse_modifiers, parse_shorthand, parse_shortcuts_json,
    parse_shortcuts_yaml, PredicateDef, PredicateSpec, ShortcutDef, ShortcutEntry, ShortcutError,
    ShortcutFile,
};
pub use engine::{Engine, EngineCore, EngineHandle, Phase, Resolution, Target};
pub use event::{KeyEvent, KeyEventKind, Millis, Modifiers, Normalizer, RawKeyEvent};
pub use history::History;
pub use hub::{InputHub, KeyListener, ListenerId, Subscription};
pub use predicate::{KeyPattern, Predicate};
pub use registry::Registry;
pub use scheduler::{Scheduler, Timer, DEFAULT_BATCH_WINDOW, DEFAULT_IDLE_TIMEOUT};
pub use series::{SeriesBuilder, Snapshot};
pub use winit_adapter::{key_name, raw_event_from_winit};

#[cfg(test)]
mod tests;
