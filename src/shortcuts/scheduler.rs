//! Batch and idle deadlines
//!
//! Nothing here sleeps. Deadlines are plain timestamps that the engine fires
//! when the host polls (or when a later event arrives), which keeps timer and
//! event interleaving deterministic.

use super::event::{KeyEvent, KeyEventKind, Millis};

/// Default idle timeout in milliseconds
pub const DEFAULT_IDLE_TIMEOUT: Millis = 1000;
/// Default batch window in milliseconds
pub const DEFAULT_BATCH_WINDOW: Millis = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Flush the current batch and resolve
    Batch,
    /// Purge accumulated state after inactivity
    Idle,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    batch_window: Millis,
    idle_timeout: Millis,
    batch_deadline: Option<Millis>,
    idle_deadline: Option<Millis>,
    /// Host opened a batch with `begin_batch`; no batch deadline until it flushes
    explicit_batch: bool,
    /// Idle expired while keys were down; clear on the next release
    pending_clear: bool,
    /// Physically held keys; survives resets
    held: Vec<String>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_WINDOW, DEFAULT_IDLE_TIMEOUT)
    }
}

impl Scheduler {
    pub fn new(batch_window: Millis, idle_timeout: Millis) -> Self {
        Self {
            batch_window,
            idle_timeout,
            batch_deadline: None,
            idle_deadline: None,
            explicit_batch: false,
            pending_clear: false,
            held: Vec::new(),
        }
    }

    /// Follow physical key state
    pub fn track(&mut self, event: &KeyEvent) {
        match event.kind {
            KeyEventKind::Press => {
                if !self.held.iter().any(|k| *k == event.key) {
                    self.held.push(event.key.clone());
                }
            }
            KeyEventKind::Release => self.held.retain(|k| *k != event.key),
        }
    }

    /// Restart timers for a recorded event
    pub fn arm_for(&mut self, event: &KeyEvent) {
        if !self.explicit_batch {
            self.batch_deadline = Some(event.timestamp.saturating_add(self.batch_window));
        }
        // Presses never extend the idle window, so a held chord is not wiped mid-way
        if event.kind == KeyEventKind::Release {
            self.idle_deadline = Some(event.timestamp.saturating_add(self.idle_timeout));
        }
    }

    pub fn begin_batch(&mut self) {
        self.explicit_batch = true;
        self.batch_deadline = None;
    }

    pub fn end_batch(&mut self) {
        self.explicit_batch = false;
    }

    pub fn in_explicit_batch(&self) -> bool {
        self.explicit_batch
    }

    /// Earliest timer due at `now`; batch first when both share a deadline
    pub fn next_due(&self, now: Millis) -> Option<Timer> {
        let batch = self.batch_deadline.filter(|&d| d <= now);
        let idle = self.idle_deadline.filter(|&d| d <= now);
        match (batch, idle) {
            (Some(b), Some(i)) if i < b => Some(Timer::Idle),
            (Some(_), _) => Some(Timer::Batch),
            (None, Some(_)) => Some(Timer::Idle),
            (None, None) => None,
        }
    }

    /// Earliest pending deadline, for hosts that sleep until it
    pub fn next_deadline(&self) -> Option<Millis> {
        match (self.batch_deadline, self.idle_deadline) {
            (Some(b), Some(i)) => Some(b.min(i)),
            (b, i) => b.or(i),
        }
    }

    pub fn cancel(&mut self, timer: Timer) {
        match timer {
            Timer::Batch => self.batch_deadline = None,
            Timer::Idle => self.idle_deadline = None,
        }
    }

    pub fn cancel_all(&mut self) {
        self.batch_deadline = None;
        self.idle_deadline = None;
        self.pending_clear = false;
    }

    pub fn has_deadlines(&self) -> bool {
        self.batch_deadline.is_some() || self.idle_deadline.is_some()
    }

    pub fn held_keys_outstanding(&self) -> bool {
        !self.held.is_empty()
    }

    pub fn held_keys(&self) -> &[String] {
        &self.held
    }

    /// Forget physical key state (on dispose or when the target is cleared)
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn pending_clear(&self) -> bool {
        self.pending_clear
    }

    pub fn set_pending_clear(&mut self, pending: bool) {
        self.pending_clear = pending;
    }

    pub fn idle_timeout(&self) -> Millis {
        self.idle_timeout
    }

    pub fn batch_window(&self) -> Millis {
        self.batch_window
    }
}
