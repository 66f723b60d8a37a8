//! In-memory sink for tests.
//!
//! Records every line so tests can assert on what an operation reported
//! without capturing stdout or installing a `tracing` subscriber.

use std::sync::Mutex;

use super::{LineType, TraceSink};

/// A [`TraceSink`] that keeps every line it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(LineType, String)>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded lines in arrival order.
    pub fn lines(&self) -> Vec<(LineType, String)> {
        self.lock().clone()
    }

    /// Returns the number of recorded lines of `line_type`.
    pub fn count(&self, line_type: LineType) -> usize {
        self.lock().iter().filter(|(t, _)| *t == line_type).count()
    }

    /// Returns the most recent closing line, if any.
    pub fn last_closing(&self) -> Option<(LineType, String)> {
        self.lock()
            .iter()
            .rev()
            .find(|(t, _)| t.is_closing())
            .cloned()
    }

    /// Forgets all recorded lines.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(LineType, String)>> {
        // The vector stays consistent even if a writer panicked mid-push.
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TraceSink for RecordingSink {
    fn write_line(&self, message: &str, line_type: LineType) {
        self.lock().push((line_type, message.to_string()));
    }
}
