// src/sink/terminal.rs

use std::io::Write;

use crate::diagnostic::DiagnosticRecord;

use super::{LineKind, Sink};

/// Prints build output to stdout, one line per call.
///
/// Command output is prefixed `OUT: ` and error text `ERR: `; a diagnostic is
/// printed as its `ERR: ` line followed by a `--> file:line` location.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalSink;

impl TerminalSink {
    pub fn new() -> Self {
        Self
    }
}

pub(crate) fn format_line(kind: LineKind, text: &str) -> String {
    match kind {
        LineKind::Info => text.to_string(),
        LineKind::Output => format!("OUT: {text}"),
        LineKind::Error => format!("ERR: {text}"),
    }
}

pub(crate) fn format_diagnostic(text: &str, record: &DiagnosticRecord) -> String {
    format!(
        "ERR: {text}\n  --> {}:{}",
        record.file_path.display(),
        record.line
    )
}

impl Sink for TerminalSink {
    fn write_line(&self, kind: LineKind, text: &str) {
        // Holding the lock keeps lines from concurrent runs whole.
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", format_line(kind, text));
    }

    fn add_diagnostic(&self, text: &str, record: &DiagnosticRecord) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", format_diagnostic(text, record));
    }
}
