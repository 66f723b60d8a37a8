//! Diagnostics line writer.
//!
//! Every store operation reports its progress as human-readable lines: one
//! [`LineType::Start`] line when it begins and exactly one closing
//! [`LineType::End`] or [`LineType::Failed`] line.  The lines are pure
//! observability; nothing reads them back.
//!
//! The store only sees the [`TraceSink`] trait.  Pick an implementation:
//!
//! | Sink            | Output                                             |
//! |-----------------|----------------------------------------------------|
//! | [`TracingSink`] | `tracing` events (the default)                     |
//! | [`ConsoleSink`] | stdout, with separator rules around each operation |
//! | [`NullSink`]    | nothing                                            |
//! | [`RecordingSink`] | kept in memory for assertions in tests           |

use std::io::Write;

pub mod recording;

pub use recording::RecordingSink;

/// Position of a line within an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineType {
    /// Intermediate progress.
    Default,
    /// First line of an operation.
    Start,
    /// Closing line of a successful operation.
    End,
    /// Closing line of a failed operation.
    Failed,
}

impl LineType {
    /// Whether this line closes an operation.
    pub fn is_closing(self) -> bool {
        matches!(self, LineType::End | LineType::Failed)
    }
}

/// Receives the diagnostics lines of store operations.
pub trait TraceSink: Send + Sync {
    fn write_line(&self, message: &str, line_type: LineType);
}

/// Emits lines as `tracing` events under the `regkv` target.
///
/// Start and intermediate lines are `TRACE`, successful ends `DEBUG`, and
/// failures `WARN`, so a default `info` filter shows only failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn write_line(&self, message: &str, line_type: LineType) {
        match line_type {
            LineType::Start => tracing::trace!(target: "regkv", phase = "start", "{message}"),
            LineType::Default => tracing::trace!(target: "regkv", "{message}"),
            LineType::End => tracing::debug!(target: "regkv", phase = "end", "{message}"),
            LineType::Failed => tracing::warn!(target: "regkv", phase = "failed", "{message}"),
        }
    }
}

/// Discards every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn write_line(&self, _message: &str, _line_type: LineType) {}
}

const RULE: &str = "--------------------------------------------------";

/// Writes lines to stdout, framing each operation between separator rules.
///
/// A rule precedes every start line and follows every closing line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Formats one line the way it appears on the console.
    pub fn frame(message: &str, line_type: LineType) -> String {
        let mut out = String::new();
        if line_type == LineType::Start {
            out.push_str(RULE);
            out.push('\n');
        }
        out.push_str(message);
        out.push('\n');
        if line_type.is_closing() {
            out.push_str(RULE);
            out.push('\n');
        }
        out
    }
}

impl TraceSink for ConsoleSink {
    fn write_line(&self, message: &str, line_type: LineType) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not turn observability into a failure.
        let _ = stdout.write_all(Self::frame(message, line_type).as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_frame_puts_rule_before_start() {
        let framed = ConsoleSink::frame("Saving value", LineType::Start);
        assert_eq!(framed, format!("{RULE}\nSaving value\n"));
    }

    #[test]
    fn test_console_frame_puts_rule_after_closing_lines() {
        assert_eq!(
            ConsoleSink::frame("done", LineType::End),
            format!("done\n{RULE}\n")
        );
        assert_eq!(
            ConsoleSink::frame("boom", LineType::Failed),
            format!("boom\n{RULE}\n")
        );
    }

    #[test]
    fn test_console_frame_plain_line_has_no_rule() {
        assert_eq!(ConsoleSink::frame("step", LineType::Default), "step\n");
    }

    #[test]
    fn test_closing_line_types() {
        assert!(LineType::End.is_closing());
        assert!(LineType::Failed.is_closing());
        assert!(!LineType::Start.is_closing());
        assert!(!LineType::Default.is_closing());
    }

    #[test]
    fn test_null_and_tracing_sinks_accept_lines() {
        // Neither sink has observable state; this guards against panics.
        NullSink.write_line("x", LineType::Failed);
        TracingSink.write_line("x", LineType::Start);
        TracingSink.write_line("x", LineType::Failed);
    }
}
