//! Shared input source that fans raw key events out to every subscriber
//!
//! Stands in for the one global keyboard listener a host exposes. Several
//! engines can subscribe at once and each decides on its own what an event
//! means; none of them gets exclusive access.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::event::{Millis, RawKeyEvent};

/// Something that wants raw key events and timer ticks
pub trait KeyListener {
    fn on_key(&self, raw: &RawKeyEvent, now: Millis);

    /// Fire any deadlines that expired at or before `now`
    fn on_tick(&self, now: Millis);
}

pub type ListenerId = u64;

#[derive(Default)]
pub struct InputHub {
    listeners: RefCell<Vec<(ListenerId, Rc<dyn KeyListener>)>>,
    next_id: Cell<ListenerId>,
}

impl InputHub {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Attach a listener; it stays attached until the subscription is cancelled or dropped
    pub fn subscribe(self: &Rc<Self>, listener: Rc<dyn KeyListener>) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));
        tracing::debug!(id, listeners = self.listener_count(), "hub: listener attached");

        Subscription {
            hub: Rc::downgrade(self),
            id,
        }
    }

    fn unsubscribe(&self, id: ListenerId) {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            listeners
                .iter()
                .position(|(lid, _)| *lid == id)
                .map(|idx| listeners.remove(idx))
        };
        // Dropped outside the borrow; the listener's own drop may touch the hub
        drop(removed);
        tracing::debug!(id, listeners = self.listener_count(), "hub: listener detached");
    }

    /// Deliver an event to every listener in subscription order
    pub fn dispatch(&self, raw: &RawKeyEvent, now: Millis) {
        // Listeners may subscribe or unsubscribe while handling the event
        for listener in self.snapshot() {
            listener.on_key(raw, now);
        }
    }

    /// Forward a timer tick to every listener
    pub fn poll(&self, now: Millis) {
        for listener in self.snapshot() {
            listener.on_tick(now);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn snapshot(&self) -> Vec<Rc<dyn KeyListener>> {
        self.listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect()
    }
}

/// Keeps a listener attached to an [`InputHub`]; detaches on cancel or drop
#[derive(Debug)]
pub struct Subscription {
    hub: Weak<InputHub>,
    id: ListenerId,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.hub
            .upgrade()
            .map(|hub| hub.listeners.borrow().iter().any(|(id, _)| *id == self.id))
            .unwrap_or(false)
    }

    pub fn cancel(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.id);
        }
    }
}
