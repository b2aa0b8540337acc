//! Progress pipe: the event stream from a running migration to its caller.
//!
//! A pipe carries [`PipeEvent`]s from a [`PipeWriter`] to a single
//! [`PipeReader`]. The channel holds at most one undelivered event, so a
//! writer advances only as fast as the reader consumes. Closing is
//! idempotent: the first [`PipeWriter::close`] wins and later calls are
//! no-ops. Dropping every writer handle also closes the pipe.

use crate::file::MigrationFile;
use crate::interrupt::Interrupt;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Error carried by a pipe event.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Message forwarded when the first interrupt arrives in graceful mode.
pub const ABORT_MESSAGE: &str = " Aborting after this migration ... Hit again to force quit.";

/// One progress event.
#[derive(Debug)]
pub enum PipeEvent {
    /// The file about to be processed
    File(MigrationFile),
    /// Informational text
    Message(String),
    /// Error that ended the current file
    Error(BoxError),
}

impl PipeEvent {
    pub fn is_error(&self) -> bool {
        matches!(self, PipeEvent::Error(_))
    }
}

impl fmt::Display for PipeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipeEvent::File(file) => write!(f, "{} {}", file.direction, file.file_name),
            PipeEvent::Message(msg) => f.write_str(msg),
            PipeEvent::Error(err) => write!(f, "{err}"),
        }
    }
}

/// Create a new open pipe.
pub fn pipe() -> (PipeWriter, PipeReader) {
    let (tx, rx) = mpsc::channel(1);
    (
        PipeWriter {
            tx: Arc::new(Mutex::new(Some(tx))),
        },
        PipeReader { rx },
    )
}

/// Writing half. Cheap to clone; all clones share one close state.
#[derive(Debug, Clone)]
pub struct PipeWriter {
    tx: Arc<Mutex<Option<mpsc::Sender<PipeEvent>>>>,
}

impl PipeWriter {
    fn slot(&self) -> MutexGuard<'_, Option<mpsc::Sender<PipeEvent>>> {
        // The slot only holds an Option; a panic while holding it cannot
        // leave it half-updated.
        self.tx.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Send an event. Returns `false` if the pipe is closed or the reader
    /// has gone away.
    pub async fn send(&self, event: PipeEvent) -> bool {
        let tx = self.slot().clone();
        match tx {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    pub async fn file(&self, file: MigrationFile) -> bool {
        self.send(PipeEvent::File(file)).await
    }

    pub async fn message(&self, message: impl Into<String>) -> bool {
        self.send(PipeEvent::Message(message.into())).await
    }

    pub async fn error(&self, error: impl Into<BoxError>) -> bool {
        self.send(PipeEvent::Error(error.into())).await
    }

    /// Close the pipe, sending `error` first when given.
    ///
    /// Returns `true` if this call closed the pipe, `false` if it was
    /// already closed (in which case `error` is discarded).
    pub async fn close(&self, error: Option<BoxError>) -> bool {
        let taken = self.slot().take();
        let Some(tx) = taken else {
            return false;
        };
        if let Some(err) = error {
            let _ = tx.send(PipeEvent::Error(err)).await;
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        match self.slot().as_ref() {
            Some(tx) => tx.is_closed(),
            None => true,
        }
    }
}

/// Reading half.
#[derive(Debug)]
pub struct PipeReader {
    rx: mpsc::Receiver<PipeEvent>,
}

impl PipeReader {
    /// Next event, or `None` once the pipe is closed and drained.
    pub async fn recv(&mut self) -> Option<PipeEvent> {
        self.rx.recv().await
    }

    /// Drain the pipe, keeping only error events.
    pub async fn read_errors(mut self) -> Vec<BoxError> {
        let mut errors = Vec::new();
        while let Some(event) = self.rx.recv().await {
            if let PipeEvent::Error(err) = event {
                errors.push(err);
            }
        }
        errors
    }

    /// Drain the pipe, keeping every event.
    pub async fn collect(mut self) -> Vec<PipeEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }
}

/// Forward every event from `inner` to `outer` until `inner` closes.
///
/// Returns `false` if an error event was seen or a stop was requested on
/// `interrupt`. A forced interrupt returns at once after forwarding the
/// events already queued on `inner`.
pub async fn wait_and_redirect(
    mut inner: PipeReader,
    outer: &PipeWriter,
    interrupt: &Interrupt,
) -> bool {
    let mut error_seen = false;
    let mut announced = false;

    loop {
        tokio::select! {
            biased;
            _ = interrupt.forced() => {
                while let Ok(event) = inner.rx.try_recv() {
                    outer.send(event).await;
                }
                log::warn!("Forced interrupt, no longer waiting for the current migration");
                return false;
            }
            _ = interrupt.requested(), if !announced => {
                announced = true;
                log::warn!("Interrupt received, stopping after the current migration");
                outer.message(ABORT_MESSAGE).await;
            }
            event = inner.recv() => match event {
                Some(event) => {
                    error_seen |= event.is_error();
                    outer.send(event).await;
                }
                None => return !error_seen && !interrupt.is_requested(),
            },
        }
    }
}

#[cfg(test)]
#[path = "pipe_test.rs"]
mod tests;
