//! Deterministic replay of recorded key timelines
//!
//! A scenario names a set of shortcuts and a timeline of key events with
//! explicit timestamps. Replaying drives a fresh [`Engine`] through the
//! timeline, firing deadlines at their exact times, and records which command
//! fired when. Used by `chordmatch replay` and by the integration tests.
//!
//! ```yaml
//! name: save chord
//! commands:
//!   - uuid: save
//!     predicate: "meta+s"
//! timeline:
//!   - { at: 0, press: Meta, modifiers: meta }
//!   - { at: 0, press: s, modifiers: meta }
//!   - { at: 40, release: s, modifiers: meta }
//! expect:
//!   - { uuid: save, at: 1 }
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::shortcuts::{
    convert_entries, parse_modifiers, Engine, Millis, RawKeyEvent, ShortcutEntry, ShortcutError,
    Target,
};

// ---------------------------------------------------------------------------
// Scenario YAML schema
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub config: ConfigOverrides,
    /// Target label; `~` replays with no target, which drops every event
    #[serde(default = "default_target")]
    pub target: Option<String>,
    #[serde(default)]
    pub commands: Vec<ShortcutEntry>,
    #[serde(default)]
    pub timeline: Vec<Step>,
    #[serde(default)]
    pub expect: Option<Vec<ExpectedFire>>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ConfigOverrides {
    #[serde(default)]
    pub idle_timeout_ms: Option<Millis>,
    #[serde(default)]
    pub batch_window_ms: Option<Millis>,
}

/// One timeline entry
///
/// Exactly one of `press`, `release`, `begin` or `flush` may be given. A step
/// with none of them just advances the clock to `at`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Step {
    pub at: Millis,
    #[serde(default)]
    pub press: Option<String>,
    #[serde(default)]
    pub release: Option<String>,
    /// Modifier list like `"ctrl+shift"`
    #[serde(default)]
    pub modifiers: String,
    #[serde(default)]
    pub begin: bool,
    #[serde(default)]
    pub flush: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ExpectedFire {
    pub uuid: String,
    /// When omitted only the order of uuids is checked
    #[serde(default)]
    pub at: Option<Millis>,
}

fn default_target() -> Option<String> {
    Some("replay".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Key(RawKeyEvent),
    Begin,
    Flush,
    Wait,
}

impl Step {
    fn action(&self) -> Result<Action, String> {
        let mods = parse_modifiers(&self.modifiers).map_err(|e| e.to_string())?;
        match (&self.press, &self.release, self.begin, self.flush) {
            (Some(key), None, false, false) => Ok(Action::Key(RawKeyEvent::press(key, mods))),
            (None, Some(key), false, false) => Ok(Action::Key(RawKeyEvent::release(key, mods))),
            (None, None, true, false) => Ok(Action::Begin),
            (None, None, false, true) => Ok(Action::Flush),
            (None, None, false, false) => Ok(Action::Wait),
            _ => Err("step mixes press, release, begin and flush".to_string()),
        }
    }
}

impl Scenario {
    pub fn from_yaml(yaml: &str) -> Result<Self, ReplayError> {
        serde_yaml::from_str(yaml).map_err(|e| ReplayError::ParseError(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ReplayError::IoError(e.to_string()))?;
        Self::from_yaml(&content)
    }

    /// Base config with this scenario's overrides applied
    pub fn engine_config(&self, base: &EngineConfig) -> EngineConfig {
        let mut config = base.clone();
        if let Some(idle) = self.config.idle_timeout_ms {
            config.idle_timeout_ms = idle;
        }
        if let Some(window) = self.config.batch_window_ms {
            config.batch_window_ms = window;
        }
        config
    }
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

/// A command firing observed during replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fire {
    pub at: Millis,
    pub uuid: String,
    /// Display form of the event handed to the handler
    pub trigger: String,
}

impl fmt::Display for Fire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}ms  {}  ({})", self.at, self.uuid, self.trigger)
    }
}

#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub name: Option<String>,
    pub fired: Vec<Fire>,
    pub expected: Option<Vec<ExpectedFire>>,
}

impl ReplayReport {
    /// Differences between what fired and what the scenario expected
    ///
    /// Empty when the scenario has no `expect` list or everything matched.
    pub fn mismatches(&self) -> Vec<String> {
        let Some(expected) = &self.expected else {
            return Vec::new();
        };

        let mut problems = Vec::new();
        for (idx, want) in expected.iter().enumerate() {
            match self.fired.get(idx) {
                None => problems.push(format!("#{}: expected {} but nothing fired", idx, want.uuid)),
                Some(got) if got.uuid != want.uuid => problems.push(format!(
                    "#{}: expected {} but {} fired at {}ms",
                    idx, want.uuid, got.uuid, got.at
                )),
                Some(got) => {
                    if let Some(at) = want.at.filter(|&at| at != got.at) {
                        problems.push(format!(
                            "#{}: {} fired at {}ms, expected {}ms",
                            idx, got.uuid, got.at, at
                        ));
                    }
                }
            }
        }
        for (idx, extra) in self.fired.iter().enumerate().skip(expected.len()) {
            problems.push(format!("#{}: unexpected {} at {}ms", idx, extra.uuid, extra.at));
        }
        problems
    }

    pub fn passed(&self) -> bool {
        self.mismatches().is_empty()
    }
}

/// Replay `scenario` against a fresh engine built from `base` plus the scenario's overrides
pub fn run(scenario: &Scenario, base: &EngineConfig) -> Result<ReplayReport, ReplayError> {
    let actions = scenario
        .timeline
        .iter()
        .enumerate()
        .map(|(idx, step)| {
            step.action()
                .map(|action| (step.at, action))
                .map_err(|message| ReplayError::InvalidStep { index: idx, message })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let defs = convert_entries(scenario.commands.clone()).map_err(ReplayError::Shortcut)?;

    let clock = Rc::new(Cell::new(Millis::default()));
    let fired = Rc::new(RefCell::new(Vec::new()));
    let commands = defs
        .into_iter()
        .map(|def| {
            let uuid = def.uuid.clone();
            let clock = clock.clone();
            let fired = fired.clone();
            def.into_command(move |event| {
                fired.borrow_mut().push(Fire {
                    at: clock.get(),
                    uuid: uuid.clone(),
                    trigger: event.display_string(),
                });
            })
        })
        .collect();

    let engine = Engine::new(&scenario.engine_config(base));
    engine.set_target(scenario.target.as_deref().map(Target::new));
    engine.register_commands(commands, scenario.name.as_deref());

    let mut last_at = 0;
    for (at, action) in actions {
        if at < last_at {
            tracing::warn!(at, last_at, "replay: timeline step goes back in time");
        }
        last_at = last_at.max(at);

        drain_until(&engine, &clock, at);
        clock.set(at);
        match action {
            Action::Key(raw) => engine.handle_event(&raw, at),
            Action::Begin => engine.begin_batch(),
            Action::Flush => {
                engine.flush_batch();
            }
            Action::Wait => {
                engine.poll(at);
            }
        }
    }
    drain_until(&engine, &clock, Millis::MAX);

    let fired = fired.borrow().clone();
    tracing::debug!(fired = fired.len(), "replay: finished");
    Ok(ReplayReport {
        name: scenario.name.clone(),
        fired,
        expected: scenario.expect.clone(),
    })
}

/// Fire pending deadlines up to and including `until`, each at its own time
fn drain_until(engine: &Engine, clock: &Cell<Millis>, until: Millis) {
    while let Some(deadline) = engine.next_deadline().filter(|&d| d <= until) {
        clock.set(deadline);
        engine.poll(deadline);
    }
}

/// Load and replay a scenario file with the given base config
pub fn run_file(path: &Path, base: &EngineConfig) -> Result<ReplayReport, ReplayError> {
    let scenario = Scenario::load(path)?;
    run(&scenario, base)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    IoError(String),
    ParseError(String),
    Shortcut(ShortcutError),
    InvalidStep { index: usize, message: String },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::IoError(e) => write!(f, "IO error: {}", e),
            ReplayError::ParseError(e) => write!(f, "Parse error: {}", e),
            ReplayError::Shortcut(e) => write!(f, "{}", e),
            ReplayError::InvalidStep { index, message } => {
                write!(f, "Invalid timeline step {}: {}", index, message)
            }
        }
    }
}

impl std::error::Error for ReplayError {}
