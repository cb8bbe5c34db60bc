//! Command registry and winner selection

use super::command::Command;
use super::history::History;
use super::series::Snapshot;

/// Ordered list of active commands
///
/// Order is significant: it breaks ties between equal priorities.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    commands: Vec<Command>,
    /// Caller-supplied label from the last registration
    scope: Option<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole command list; nothing from the previous list survives
    pub fn replace(&mut self, commands: Vec<Command>, scope: Option<&str>) {
        self.commands = commands;
        self.scope = scope.map(str::to_string);
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.scope = None;
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Every non-inert command whose predicate holds, in registry order
    pub fn matching(&self, series: &[Snapshot], history: &History) -> Vec<&Command> {
        self.commands
            .iter()
            .filter(|command| command.matches(series, history))
            .collect()
    }

    /// Lowest priority among the matches; the earliest registered wins a tie
    pub fn winner(&self, series: &[Snapshot], history: &History) -> Option<&Command> {
        let mut best: Option<&Command> = None;
        for command in &self.commands {
            if !command.matches(series, history) {
                continue;
            }
            if best.map_or(true, |b| command.priority < b.priority) {
                best = Some(command);
            }
        }
        best
    }
}
