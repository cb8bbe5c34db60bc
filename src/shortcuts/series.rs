//! Chord series builder
//!
//! Turns the stream of recorded events into an ordered list of snapshots, one
//! per batch that contained a press. A snapshot holds every key considered
//! down together at that instant, so index 0 is the earliest chord and the
//! last index the most recent.
//!
//! ```text
//! batch: [Control↓]        -> series: [[Control↓]]
//! batch: [c↓]              -> series: [[Control↓], [Control↓, c↓]]
//! batch: [c↑, Control↑]    -> series: [[Control↓], [Control↓, c↓, c↑, Control↑]]
//! ```
//!
//! Release-only batches close the most recent snapshot by appending their
//! release events to it instead of opening a new one; this keeps "X, release,
//! then Y" as two positions for sequence predicates.

use super::event::{KeyEvent, KeyEventKind};

/// Keys considered held together at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    events: Vec<KeyEvent>,
}

impl Snapshot {
    pub fn new(events: Vec<KeyEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[KeyEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Key names in the snapshot, presses and releases alike
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.key.as_str())
    }

    pub fn display_string(&self) -> String {
        let parts: Vec<String> = self.events.iter().map(KeyEvent::display_string).collect();
        format!("[{}]", parts.join(", "))
    }
}

/// Builds the snapshot series batch by batch
#[derive(Debug, Clone, Default)]
pub struct SeriesBuilder {
    snapshots: Vec<Snapshot>,
    /// Presses not yet released, in press order, one per key
    open: Vec<KeyEvent>,
    /// Events of the batch that has not been finalized yet
    batch: Vec<KeyEvent>,
}

impl SeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an event in the current batch
    pub fn push(&mut self, event: KeyEvent) {
        self.open.retain(|held| held.key != event.key);
        if event.kind == KeyEventKind::Press {
            self.open.push(event.clone());
        }
        self.batch.push(event);
    }

    /// Whether events are waiting for [`SeriesBuilder::finalize_batch`]
    pub fn has_pending(&self) -> bool {
        !self.batch.is_empty()
    }

    /// Close the current batch, turning it into (part of) a snapshot
    ///
    /// Returns true if the series changed.
    pub fn finalize_batch(&mut self) -> bool {
        if self.batch.is_empty() {
            return false;
        }

        let batch = std::mem::take(&mut self.batch);
        let (presses, releases): (Vec<_>, Vec<_>) =
            batch.into_iter().partition(|e| e.kind == KeyEventKind::Press);

        if presses.is_empty() {
            match self.snapshots.last_mut() {
                Some(last) => last.events.extend(releases),
                None => self.snapshots.push(Snapshot::new(releases)),
            }
            return true;
        }

        let mut events = self.open.clone();
        // Taps that went down and up inside the batch still count as held
        for press in presses {
            if !events.contains(&press) {
                events.push(press);
            }
        }
        events.extend(releases);

        tracing::trace!(
            index = self.snapshots.len(),
            snapshot = %Snapshot::new(events.clone()).display_string(),
            "series: new snapshot"
        );
        self.snapshots.push(Snapshot::new(events));
        true
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Presses currently considered held
    pub fn open(&self) -> &[KeyEvent] {
        &self.open
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty() && self.batch.is_empty()
    }

    /// Stop carrying presses into later snapshots; recorded snapshots stay
    pub fn release_held(&mut self) {
        self.open.clear();
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.open.clear();
        self.batch.clear();
    }
}
