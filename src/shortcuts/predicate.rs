//! Predicates describing required key state, and the matcher that evaluates them
//!
//! Three shapes exist:
//! - [`Predicate::Simple`]: some snapshot holds an event equal to the pattern
//! - [`Predicate::Sequence`]: sub-predicates align positionally with snapshots
//! - [`Predicate::Presence`]: the key occurs anywhere in history

use std::fmt;

use super::event::{KeyEvent, KeyEventKind, Modifiers};
use super::history::History;
use super::series::Snapshot;

/// Exact key, modifier and phase an event must carry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPattern {
    pub key: String,
    pub mods: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyPattern {
    /// A press of `key` with no modifiers
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            mods: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    pub fn with_mods(mut self, mods: Modifiers) -> Self {
        self.mods = mods;
        self
    }

    pub fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// All five fields must be equal; unspecified modifiers are `false`, not wildcards
    pub fn matches_event(&self, event: &KeyEvent) -> bool {
        event.is_named()
            && self.key == event.key
            && self.mods == event.mods
            && self.kind == event.kind
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.mods.is_empty() {
            write!(f, "{}+", self.mods)?;
        }
        match self.key.as_str() {
            " " => write!(f, "Space")?,
            key => write!(f, "{}", key)?,
        }
        if self.kind == KeyEventKind::Release {
            write!(f, ":release")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Simple(KeyPattern),
    Sequence(Vec<Predicate>),
    Presence { key: String, kind: KeyEventKind },
}

impl Predicate {
    /// Plain press of `key`
    pub fn key(key: impl Into<String>) -> Self {
        Predicate::Simple(KeyPattern::new(key))
    }

    /// Press of `key` with exactly `mods` held
    pub fn chord(key: impl Into<String>, mods: Modifiers) -> Self {
        Predicate::Simple(KeyPattern::new(key).with_mods(mods))
    }

    /// Release of `key` with exactly `mods` held
    pub fn released(key: impl Into<String>, mods: Modifiers) -> Self {
        Predicate::Simple(
            KeyPattern::new(key)
                .with_mods(mods)
                .with_kind(KeyEventKind::Release),
        )
    }

    /// Ordered steps, each matched against the snapshot at the same position
    pub fn sequence(steps: Vec<Predicate>) -> Self {
        Predicate::Sequence(steps)
    }

    /// `key` was pressed at some point since the last reset
    pub fn present(key: impl Into<String>) -> Self {
        Predicate::Presence {
            key: key.into(),
            kind: KeyEventKind::Press,
        }
    }

    pub fn present_on(key: impl Into<String>, kind: KeyEventKind) -> Self {
        Predicate::Presence {
            key: key.into(),
            kind,
        }
    }

    /// Evaluate against the snapshot series and the full history
    pub fn matches(&self, series: &[Snapshot], history: &History) -> bool {
        match self {
            Predicate::Simple(pattern) => series
                .iter()
                .any(|snapshot| snapshot.events().iter().any(|e| pattern.matches_event(e))),
            Predicate::Sequence(steps) => match steps.as_slice() {
                [] => false,
                [only] => only.matches(series, history),
                _ => {
                    steps.len() <= series.len()
                        && steps
                            .iter()
                            .zip(series)
                            .all(|(step, snapshot)| step.matches_snapshot(snapshot, history))
                }
            },
            Predicate::Presence { key, kind } => !key.is_empty() && history.contains(*kind, key),
        }
    }

    fn matches_snapshot(&self, snapshot: &Snapshot, history: &History) -> bool {
        self.matches(std::slice::from_ref(snapshot), history)
    }

    /// Number of snapshots needed before this predicate can match
    pub fn min_snapshots(&self) -> usize {
        match self {
            Predicate::Simple(_) => 1,
            Predicate::Sequence(steps) if steps.len() >= 2 => steps.len(),
            Predicate::Sequence(steps) => steps.first().map_or(0, Predicate::min_snapshots),
            Predicate::Presence { .. } => 0,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Simple(pattern) => write!(f, "{}", pattern),
            Predicate::Sequence(steps) => {
                let parts: Vec<String> = steps.iter().map(|s| s.to_string()).collect();
                write!(f, "{}", parts.join(" "))
            }
            Predicate::Presence { key, kind } => match kind {
                KeyEventKind::Press => write!(f, "present({})", key),
                KeyEventKind::Release => write!(f, "present({}:release)", key),
            },
        }
    }
}
