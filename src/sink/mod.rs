// src/sink/mod.rs

//! Reporting sink: where build output and diagnostics end up.
//!
//! - [`terminal`] prints to stdout for the CLI.
//! - [`memory`] records everything, for tests and embedding.

pub mod memory;
pub mod terminal;

use crate::diagnostic::DiagnosticRecord;

pub use memory::{MemorySink, SinkEvent};
pub use terminal::TerminalSink;

/// Category of a plain text line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Messages from bundlewatch itself (run started / finished).
    Info,
    /// A line the command wrote to stdout.
    Output,
    /// A line the command wrote to stderr that is not a diagnostic, or a
    /// failure reported by bundlewatch.
    Error,
}

/// Receiver of everything a build run reports.
///
/// Implementations are called concurrently from the output readers of
/// different runs and must not block for long.
pub trait Sink: Send + Sync {
    fn write_line(&self, kind: LineKind, text: &str);

    /// `text` is the cleaned stderr line; `record.line` is one-based.
    fn add_diagnostic(&self, text: &str, record: &DiagnosticRecord);
}
