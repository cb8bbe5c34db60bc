//! Commands: a predicate, an opaque handler and a priority
//!
//! The engine never interprets what a handler does. A command missing either
//! its predicate or its handler is inert and is skipped during resolution.

use std::fmt;
use std::rc::Rc;

use super::event::KeyEvent;
use super::history::History;
use super::predicate::Predicate;
use super::series::Snapshot;

/// Callback invoked with the event that completed the match
///
/// Cheap to clone; the engine clones it out of the registry before calling so
/// the handler may re-enter the engine.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&KeyEvent)>);

impl Handler {
    pub fn new(f: impl Fn(&KeyEvent) + 'static) -> Self {
        Handler(Rc::new(f))
    }

    pub fn call(&self, event: &KeyEvent) {
        (self.0)(event)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

#[derive(Debug, Clone)]
pub struct Command {
    pub uuid: String,
    pub predicate: Option<Predicate>,
    pub handler: Option<Handler>,
    /// Lower value wins when several commands match
    pub priority: i32,
    /// Human readable label for logs and the CLI
    pub name: Option<String>,
}

impl Command {
    pub fn new(
        uuid: impl Into<String>,
        predicate: Predicate,
        handler: impl Fn(&KeyEvent) + 'static,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            predicate: Some(predicate),
            handler: Some(Handler::new(handler)),
            priority: 0,
            name: None,
        }
    }

    /// A command with neither predicate nor handler attached yet
    pub fn unbound(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            predicate: None,
            handler: None,
            priority: 0,
            name: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn with_handler(mut self, handler: impl Fn(&KeyEvent) + 'static) -> Self {
        self.handler = Some(Handler::new(handler));
        self
    }

    pub fn is_inert(&self) -> bool {
        self.predicate.is_none() || self.handler.is_none()
    }

    /// Whether this command is live and its predicate holds
    pub fn matches(&self, series: &[Snapshot], history: &History) -> bool {
        match (&self.predicate, &self.handler) {
            (Some(predicate), Some(_)) => predicate.matches(series, history),
            _ => false,
        }
    }

    /// Name if set, otherwise the uuid
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.uuid)
    }
}
