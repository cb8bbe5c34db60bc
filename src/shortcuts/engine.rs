//! The matching engine: intake, batching, resolution and reset
//!
//! ```text
//! RawKeyEvent → Normalizer → History + SeriesBuilder → (batch flush) → Registry::winner → Handler
//! ```
//!
//! The engine is single-threaded and passive. Hosts feed it events with
//! [`Engine::handle_event`] (or through an [`InputHub`]) and drive its
//! deadlines with [`Engine::poll`]. Every event first fires the deadlines that
//! expired before it, so events and timers are always handled in time order.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::EngineConfig;

use super::command::Command;
use super::event::{KeyEvent, KeyEventKind, Millis, Normalizer, RawKeyEvent};
use super::history::History;
use super::hub::{InputHub, KeyListener, Subscription};
use super::registry::Registry;
use super::scheduler::{Scheduler, Timer};
use super::series::{SeriesBuilder, Snapshot};

/// Opaque handle marking the engine as allowed to act
///
/// While an engine has no target every incoming event is dropped untouched,
/// e.g. while a modal dialog owns focus.
#[derive(Clone, PartialEq, Eq)]
pub struct Target(Rc<str>);

impl Target {
    pub fn new(label: &str) -> Self {
        Target(Rc::from(label))
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({})", self.0)
    }
}

/// Outcome of one batch flush
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A command won and its handler ran
    Fired { uuid: String, priority: i32 },
    /// The batch was evaluated and nothing matched
    NoMatch,
    /// There was nothing to evaluate
    Empty,
}

impl Resolution {
    pub fn fired(&self) -> Option<&str> {
        match self {
            Resolution::Fired { uuid, .. } => Some(uuid.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No recorded state and no pending deadlines
    Idle,
    /// Events recorded or deadlines pending
    Accumulating,
}

#[derive(Debug)]
struct EngineState {
    normalizer: Normalizer,
    history: History,
    series: SeriesBuilder,
    registry: Registry,
    scheduler: Scheduler,
    target: Option<Target>,
    /// Set after a command fires; cleared by the next press
    suppressed: bool,
    /// Most recent recorded event, handed to the winning handler
    trigger: Option<KeyEvent>,
    disposed: bool,
}

impl EngineState {
    /// History and series are only ever cleared together
    fn reset(&mut self) {
        self.history.clear();
        self.series.clear();
        self.trigger = None;
    }
}

/// Shared engine internals; what the hub and [`EngineHandle`]s point at
#[derive(Debug)]
pub struct EngineCore {
    state: RefCell<EngineState>,
}

impl EngineCore {
    fn new(config: &EngineConfig) -> Self {
        Self {
            state: RefCell::new(EngineState {
                normalizer: Normalizer::new(),
                history: History::new(),
                series: SeriesBuilder::new(),
                registry: Registry::new(),
                scheduler: Scheduler::new(config.batch_window_ms, config.idle_timeout_ms),
                target: None,
                suppressed: false,
                trigger: None,
                disposed: false,
            }),
        }
    }

    fn receive(&self, raw: &RawKeyEvent, now: Millis) {
        if !self.accepts_input() {
            tracing::trace!(key = ?raw.key, "engine: no target, dropping event");
            return;
        }

        self.fire_due(now);

        // A handler fired above may have changed the target
        if !self.accepts_input() {
            return;
        }

        let mut guard = self.state.borrow_mut();
        let st = &mut *guard;
        let event = st.normalizer.normalize(raw, now);
        st.scheduler.track(&event);

        if event.kind == KeyEventKind::Release && st.scheduler.pending_clear() {
            tracing::debug!(key = %event.key, "engine: deferred idle clear on release");
            st.scheduler.set_pending_clear(false);
            st.scheduler.cancel(Timer::Batch);
            st.reset();
            return;
        }

        if st.suppressed {
            if event.kind == KeyEventKind::Release {
                tracing::trace!(key = %event.key, "engine: release after resolution ignored");
                return;
            }
            st.suppressed = false;
        }

        tracing::debug!(event = %event, "engine: recorded");
        st.history.record(event.clone());
        st.series.push(event.clone());
        st.scheduler.arm_for(&event);
        st.trigger = Some(event);
    }

    fn accepts_input(&self) -> bool {
        let st = self.state.borrow();
        !st.disposed && st.target.is_some()
    }

    /// Fire every deadline due at `now`, earliest first
    ///
    /// Returns the resolution of the last batch flushed, if any.
    fn fire_due(&self, now: Millis) -> Option<Resolution> {
        let mut last = None;
        loop {
            let due = {
                let st = self.state.borrow();
                if st.disposed {
                    return last;
                }
                st.scheduler.next_due(now)
            };
            match due {
                Some(Timer::Batch) => last = Some(self.flush()),
                Some(Timer::Idle) => self.expire_idle(),
                None => return last,
            }
        }
    }

    fn flush(&self) -> Resolution {
        let (handler, trigger, resolution) = {
            let mut guard = self.state.borrow_mut();
            let st = &mut *guard;
            st.scheduler.cancel(Timer::Batch);

            if !st.series.finalize_batch() {
                return Resolution::Empty;
            }
            let Some(trigger) = st.trigger.clone() else {
                return Resolution::Empty;
            };

            let winner = st
                .registry
                .winner(st.series.snapshots(), &st.history)
                .map(|c| (c.handler.clone(), c.uuid.clone(), c.priority, c.label().to_string()));

            let Some((handler, uuid, priority, label)) = winner else {
                tracing::debug!(
                    snapshots = st.series.len(),
                    commands = st.registry.len(),
                    "engine: batch resolved, no match"
                );
                return Resolution::NoMatch;
            };

            tracing::debug!(command = %label, priority, trigger = %trigger, "engine: command fired");
            st.reset();
            st.scheduler.cancel_all();
            st.suppressed = true;
            (handler, trigger, Resolution::Fired { uuid, priority })
        };

        // Called with no borrow held so the handler may re-enter the engine
        if let Some(handler) = handler {
            handler.call(&trigger);
        }
        resolution
    }

    fn expire_idle(&self) {
        let mut st = self.state.borrow_mut();
        st.scheduler.cancel(Timer::Idle);

        if st.scheduler.held_keys_outstanding() {
            tracing::debug!(
                held = ?st.scheduler.held_keys(),
                "engine: idle timeout with keys held, clear deferred"
            );
            st.scheduler.set_pending_clear(true);
        } else {
            tracing::debug!(events = st.history.len(), "engine: idle timeout, clearing");
            st.scheduler.cancel(Timer::Batch);
            st.reset();
        }
    }

    fn register_commands(&self, commands: Vec<Command>, scope: Option<&str>) {
        let mut st = self.state.borrow_mut();
        tracing::info!(count = commands.len(), scope = ?scope, "engine: commands registered");
        st.registry.replace(commands, scope);
    }

    fn deregister_commands(&self) {
        let mut st = self.state.borrow_mut();
        tracing::info!(scope = ?st.registry.scope(), "engine: commands deregistered");
        st.registry.clear();
    }

    fn set_target(&self, target: Option<Target>) {
        let mut guard = self.state.borrow_mut();
        let st = &mut *guard;
        if target.is_none() && st.target.is_some() {
            // Releases are dropped while untargeted, so held keys would never come up
            tracing::debug!(
                held = ?st.scheduler.held_keys(),
                "engine: target cleared, forgetting held keys"
            );
            st.scheduler.release_all();
            st.series.release_held();
            if st.scheduler.pending_clear() {
                st.scheduler.set_pending_clear(false);
                st.scheduler.cancel(Timer::Batch);
                st.reset();
            }
        }
        st.target = target;
    }
}

impl KeyListener for EngineCore {
    fn on_key(&self, raw: &RawKeyEvent, now: Millis) {
        self.receive(raw, now);
    }

    fn on_tick(&self, now: Millis) {
        self.fire_due(now);
    }
}

/// Shortcut matching engine, one per logical UI scope
///
/// Dropping the engine disposes it.
#[derive(Debug)]
pub struct Engine {
    core: Rc<EngineCore>,
    subscription: RefCell<Option<Subscription>>,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            core: Rc::new(EngineCore::new(config)),
            subscription: RefCell::new(None),
        }
    }

    pub fn with_target(self, target: Target) -> Self {
        self.set_target(Some(target));
        self
    }

    /// Weak handle for use inside handlers
    pub fn handle(&self) -> EngineHandle {
        EngineHandle(Rc::downgrade(&self.core))
    }

    /// Replace the active commands wholesale
    ///
    /// History is left alone. The change is seen by the next batch flush.
    pub fn register_commands(&self, commands: Vec<Command>, scope: Option<&str>) {
        self.core.register_commands(commands, scope);
    }

    pub fn deregister_commands(&self) {
        self.core.deregister_commands();
    }

    pub fn set_target(&self, target: Option<Target>) {
        self.core.set_target(target);
    }

    pub fn target(&self) -> Option<Target> {
        self.core.state.borrow().target.clone()
    }

    /// Feed one raw host event
    pub fn handle_event(&self, raw: &RawKeyEvent, now: Millis) {
        self.core.receive(raw, now);
    }

    /// Start an explicit batch; events until [`Engine::flush_batch`] form one unit
    pub fn begin_batch(&self) {
        self.core.state.borrow_mut().scheduler.begin_batch();
    }

    /// Close the current batch and resolve it now
    pub fn flush_batch(&self) -> Resolution {
        self.core.state.borrow_mut().scheduler.end_batch();
        self.core.flush()
    }

    /// Fire deadlines due at `now`
    pub fn poll(&self, now: Millis) -> Option<Resolution> {
        self.core.fire_due(now)
    }

    /// When the host should call [`Engine::poll`] next
    pub fn next_deadline(&self) -> Option<Millis> {
        self.core.state.borrow().scheduler.next_deadline()
    }

    /// Subscribe to a shared input source, replacing any previous subscription
    pub fn attach(&self, hub: &Rc<InputHub>) {
        let listener: Rc<dyn KeyListener> = self.core.clone();
        let subscription = hub.subscribe(listener);
        // The old subscription (if any) detaches when dropped here
        self.subscription.borrow_mut().replace(subscription);
    }

    pub fn detach(&self) {
        self.subscription.borrow_mut().take();
    }

    pub fn is_attached(&self) -> bool {
        self.subscription
            .borrow()
            .as_ref()
            .is_some_and(Subscription::is_active)
    }

    /// Detach from the hub, cancel every deadline and drop all state
    ///
    /// Idempotent. A disposed engine ignores further input.
    pub fn dispose(&self) {
        self.detach();
        let mut st = self.core.state.borrow_mut();
        if st.disposed {
            return;
        }
        st.disposed = true;
        st.reset();
        st.scheduler.cancel_all();
        st.scheduler.release_all();
        st.registry.clear();
        tracing::debug!("engine: disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.core.state.borrow().disposed
    }

    pub fn phase(&self) -> Phase {
        let st = self.core.state.borrow();
        if st.history.is_empty() && st.series.is_empty() && !st.scheduler.has_deadlines() {
            Phase::Idle
        } else {
            Phase::Accumulating
        }
    }

    /// Run `f` against the current history and snapshot series
    pub fn inspect<R>(&self, f: impl FnOnce(&History, &[Snapshot]) -> R) -> R {
        let st = self.core.state.borrow();
        f(&st.history, st.series.snapshots())
    }

    pub fn command_count(&self) -> usize {
        self.core.state.borrow().registry.len()
    }

    /// Key names currently held down, as far as the engine has seen
    pub fn held_keys(&self) -> Vec<String> {
        self.core.state.borrow().scheduler.held_keys().to_vec()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Non-owning handle to an [`Engine`], safe to capture in handlers
#[derive(Debug, Clone)]
pub struct EngineHandle(Weak<EngineCore>);

impl EngineHandle {
    pub fn is_alive(&self) -> bool {
        self.0.upgrade().is_some()
    }

    pub fn register_commands(&self, commands: Vec<Command>, scope: Option<&str>) {
        if let Some(core) = self.0.upgrade() {
            core.register_commands(commands, scope);
        }
    }

    pub fn deregister_commands(&self) {
        if let Some(core) = self.0.upgrade() {
            core.deregister_commands();
        }
    }

    pub fn set_target(&self, target: Option<Target>) {
        if let Some(core) = self.0.upgrade() {
            core.set_target(target);
        }
    }
}
