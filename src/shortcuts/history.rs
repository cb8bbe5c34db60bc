//! History store: every key event recorded since the last reset
//!
//! Events are grouped first by [`KeyEventKind`] and then by key name. Records
//! are only ever removed wholesale via [`History::clear`], which is what lets
//! presence predicates ask "was this key pressed at any point in the burst".

use std::collections::HashMap;

use super::event::{KeyEvent, KeyEventKind};

type KeyLog = HashMap<String, Vec<KeyEvent>>;

#[derive(Debug, Clone, Default)]
pub struct History {
    pressed: KeyLog,
    released: KeyLog,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to its per-kind, per-key list
    pub fn record(&mut self, event: KeyEvent) {
        self.log_mut(event.kind)
            .entry(event.key.clone())
            .or_default()
            .push(event);
    }

    pub fn clear(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }

    /// Events of `kind` for `key`, in arrival order
    pub fn events(&self, kind: KeyEventKind, key: &str) -> &[KeyEvent] {
        self.log(kind).get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, kind: KeyEventKind, key: &str) -> bool {
        !self.events(kind, key).is_empty()
    }

    /// Key names seen for `kind`, in no particular order
    pub fn keys(&self, kind: KeyEventKind) -> impl Iterator<Item = &str> {
        self.log(kind).keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty() && self.released.is_empty()
    }

    /// Total number of recorded events across both kinds
    pub fn len(&self) -> usize {
        self.pressed
            .values()
            .chain(self.released.values())
            .map(Vec::len)
            .sum()
    }

    fn log(&self, kind: KeyEventKind) -> &KeyLog {
        match kind {
            KeyEventKind::Press => &self.pressed,
            KeyEventKind::Release => &self.released,
        }
    }

    fn log_mut(&mut self, kind: KeyEventKind) -> &mut KeyLog {
        match kind {
            KeyEventKind::Press => &mut self.pressed,
            KeyEventKind::Release => &mut self.released,
        }
    }
}
