//! Core event types: Modifiers, KeyEvent, RawKeyEvent and the Normalizer

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host-supplied time in milliseconds
pub type Millis = u64;

/// Modifier keys as a bitfield for efficient storage and comparison
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CTRL: Modifiers = Modifiers(0b0001);
    pub const SHIFT: Modifiers = Modifiers(0b0010);
    pub const ALT: Modifiers = Modifiers(0b0100);
    pub const META: Modifiers = Modifiers(0b1000); // Cmd on macOS, Win on Windows

    /// Create modifiers from individual flags
    pub const fn new(ctrl: bool, shift: bool, alt: bool, meta: bool) -> Self {
        let mut bits = 0u8;
        if ctrl {
            bits |= 0b0001;
        }
        if shift {
            bits |= 0b0010;
        }
        if alt {
            bits |= 0b0100;
        }
        if meta {
            bits |= 0b1000;
        }
        Modifiers(bits)
    }

    #[inline]
    pub const fn ctrl(self) -> bool {
        self.0 & 0b0001 != 0
    }

    #[inline]
    pub const fn shift(self) -> bool {
        self.0 & 0b0010 != 0
    }

    #[inline]
    pub const fn alt(self) -> bool {
        self.0 & 0b0100 != 0
    }

    #[inline]
    pub const fn meta(self) -> bool {
        self.0 & 0b1000 != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Combine two modifier sets
    #[inline]
    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    /// Get the platform-specific "command" modifier (Cmd on macOS, Ctrl elsewhere)
    pub fn cmd() -> Modifiers {
        if cfg!(target_os = "macos") {
            Modifiers::META
        } else {
            Modifiers::CTRL
        }
    }

    /// Check if the platform command key is held (Cmd on macOS, Ctrl elsewhere)
    pub fn has_cmd(self) -> bool {
        if cfg!(target_os = "macos") {
            self.meta()
        } else {
            self.ctrl()
        }
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.ctrl() {
            parts.push("ctrl");
        }
        if self.shift() {
            parts.push("shift");
        }
        if self.alt() {
            parts.push("alt");
        }
        if self.meta() {
            parts.push("meta");
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// Which phase of a key stroke an event describes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEventKind {
    #[default]
    #[serde(alias = "keydown", alias = "down")]
    Press,
    #[serde(alias = "keyup", alias = "up")]
    Release,
}

impl KeyEventKind {
    pub const ALL: [KeyEventKind; 2] = [KeyEventKind::Press, KeyEventKind::Release];
}

impl fmt::Display for KeyEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyEventKind::Press => write!(f, "press"),
            KeyEventKind::Release => write!(f, "release"),
        }
    }
}

/// A key event as the host delivers it, before normalization
///
/// `key` may be missing for keys the host could not name; such events are
/// recorded with an empty key and never match a predicate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub key: Option<String>,
    pub mods: Modifiers,
    pub kind: KeyEventKind,
}

impl RawKeyEvent {
    pub fn press(key: impl Into<String>, mods: Modifiers) -> Self {
        Self {
            key: Some(key.into()),
            mods,
            kind: KeyEventKind::Press,
        }
    }

    pub fn release(key: impl Into<String>, mods: Modifiers) -> Self {
        Self {
            key: Some(key.into()),
            mods,
            kind: KeyEventKind::Release,
        }
    }
}

/// A normalized, immutable key event
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: String,
    pub mods: Modifiers,
    pub kind: KeyEventKind,
    pub timestamp: Millis,
}

impl KeyEvent {
    pub fn new(
        key: impl Into<String>,
        mods: Modifiers,
        kind: KeyEventKind,
        timestamp: Millis,
    ) -> Self {
        Self {
            key: key.into(),
            mods,
            kind,
            timestamp,
        }
    }

    /// Events the host sent without a key name are recorded but never match
    pub fn is_named(&self) -> bool {
        !self.key.is_empty()
    }

    pub fn alt_key(&self) -> bool {
        self.mods.alt()
    }

    pub fn ctrl_key(&self) -> bool {
        self.mods.ctrl()
    }

    pub fn meta_key(&self) -> bool {
        self.mods.meta()
    }

    pub fn shift_key(&self) -> bool {
        self.mods.shift()
    }

    pub fn is_press(&self) -> bool {
        self.kind == KeyEventKind::Press
    }

    /// Short form used in logs, e.g. `meta+s↓`
    pub fn display_string(&self) -> String {
        let arrow = match self.kind {
            KeyEventKind::Press => '↓',
            KeyEventKind::Release => '↑',
        };
        if self.mods.is_empty() {
            format!("{}{}", self.key, arrow)
        } else {
            format!("{}+{}{}", self.mods, self.key, arrow)
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.display_string(), self.timestamp)
    }
}

/// Converts raw host events into [`KeyEvent`]s with non-decreasing timestamps
#[derive(Debug, Default, Clone)]
pub struct Normalizer {
    last_timestamp: Millis,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&mut self, raw: &RawKeyEvent, now: Millis) -> KeyEvent {
        // Host clocks can step backwards
        let timestamp = now.max(self.last_timestamp);
        self.last_timestamp = timestamp;

        KeyEvent {
            key: raw.key.clone().unwrap_or_default(),
            mods: raw.mods,
            kind: raw.kind,
            timestamp,
        }
    }

    pub fn last_timestamp(&self) -> Millis {
        self.last_timestamp
    }
}
