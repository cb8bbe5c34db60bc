//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chordmatch::config::EngineConfig;
use chordmatch::shortcuts::{
    Command, Engine, KeyEvent, Modifiers, Predicate, RawKeyEvent, Target,
};

/// Engine with default timing and an active target
pub fn test_engine() -> Engine {
    Engine::new(&EngineConfig::default()).with_target(Target::new("test"))
}

/// Engine with custom timing and an active target
pub fn test_engine_with(idle_timeout_ms: u64, batch_window_ms: u64) -> Engine {
    let config = EngineConfig::default()
        .with_idle_timeout(idle_timeout_ms)
        .with_batch_window(batch_window_ms);
    Engine::new(&config).with_target(Target::new("test"))
}

/// Handler that counts its invocations
pub fn counter() -> (Rc<Cell<usize>>, impl Fn(&KeyEvent) + 'static) {
    let count = Rc::new(Cell::new(0));
    let inner = count.clone();
    (count, move |_: &KeyEvent| inner.set(inner.get() + 1))
}

/// Shared log of fired command uuids, in firing order
#[derive(Clone, Default)]
pub struct FireLog(Rc<RefCell<Vec<String>>>);

impl FireLog {
    pub fn command(&self, uuid: &str, predicate: Predicate) -> Command {
        let log = self.0.clone();
        let name = uuid.to_string();
        Command::new(uuid, predicate, move |_| log.borrow_mut().push(name.clone()))
    }

    pub fn fired(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

pub fn press(key: &str) -> RawKeyEvent {
    RawKeyEvent::press(key, Modifiers::NONE)
}

pub fn release(key: &str) -> RawKeyEvent {
    RawKeyEvent::release(key, Modifiers::NONE)
}

pub fn press_with(key: &str, mods: Modifiers) -> RawKeyEvent {
    RawKeyEvent::press(key, mods)
}

pub fn release_with(key: &str, mods: Modifiers) -> RawKeyEvent {
    RawKeyEvent::release(key, mods)
}

/// Feed a press and let its batch resolve
pub fn tap(engine: &Engine, key: &str, at: u64) {
    engine.handle_event(&press(key), at);
    engine.poll(at + 1);
    engine.handle_event(&release(key), at + 2);
    engine.poll(at + 3);
}
