//! Orchestrator operations and the handles of spawned runs.

use crate::error::MigrateError;
use st_core::{BoxError, PipeReader, Version};
use std::fmt;
use tokio::task::JoinHandle;

/// A top-level migration command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Apply every pending migration
    Up,
    /// Revert every applied migration
    Down,
    /// Move `n` steps forward (positive) or backward (negative)
    Migrate(i64),
    /// Move to an absolute version
    Goto(Version),
    /// Revert the most recent migration and apply it again
    Redo,
    /// Revert everything, then apply everything
    Reset,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Up => f.write_str("up"),
            Operation::Down => f.write_str("down"),
            Operation::Migrate(n) => write!(f, "migrate {n:+}"),
            Operation::Goto(v) => write!(f, "goto {v}"),
            Operation::Redo => f.write_str("redo"),
            Operation::Reset => f.write_str("reset"),
        }
    }
}

/// A running operation: its task and the read side of its pipe.
#[derive(Debug)]
pub struct MigrationHandle {
    task: JoinHandle<()>,
    events: PipeReader,
}

impl MigrationHandle {
    pub(crate) fn new(task: JoinHandle<()>, events: PipeReader) -> Self {
        Self { task, events }
    }

    /// Progress events, for callers that report as they go.
    pub fn events(&mut self) -> &mut PipeReader {
        &mut self.events
    }

    /// Split into the task handle and the event reader.
    pub fn into_parts(self) -> (JoinHandle<()>, PipeReader) {
        (self.task, self.events)
    }

    /// Drain the remaining events and wait for the task.
    ///
    /// Returns every error event seen, plus a task failure if the
    /// operation panicked.
    pub async fn wait(self) -> Result<(), Vec<BoxError>> {
        let Self { task, events } = self;
        let mut errors = events.read_errors().await;
        if let Err(e) = task.await {
            errors.push(Box::new(MigrateError::TaskFailed(e.to_string())));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
