// src/diagnostic/mod.rs

//! Turning a build command's stderr into diagnostics.
//!
//! - [`ansi`] strips colour codes.
//! - [`parser`] matches the `ParseError: ... in ... on line ..., column ...`
//!   template.
//! - [`route_error_line`] is what the process runner calls for every stderr
//!   line: it parses, checks that the referenced file exists, and forwards
//!   either a diagnostic or plain text to the sink.

pub mod ansi;
pub mod parser;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error};

use crate::fs::FileSystem;
use crate::sink::{LineKind, Sink};

pub use ansi::strip_ansi;
pub use parser::{extract_diagnostic, parse_error_line, DiagnosticRecord, ParsedLine, Severity};

/// Outcome of classifying one stderr line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLine {
    /// Matched the template and the referenced file exists.
    Diagnostic { text: String, record: DiagnosticRecord },
    /// Anything else, with colour codes removed.
    Plain(String),
}

/// Parse `raw` and keep the diagnostic only if its file exists on disk.
pub fn classify_error_line(raw: &str, fs: &dyn FileSystem) -> ErrorLine {
    let ParsedLine { text, diagnostic } = parse_error_line(raw);

    match diagnostic {
        Some(record) if fs.is_file(&record.file_path) => ErrorLine::Diagnostic { text, record },
        Some(record) => {
            debug!(
                path = ?record.file_path,
                "diagnostic refers to a file that does not exist; reporting as plain text"
            );
            ErrorLine::Plain(text)
        }
        None => ErrorLine::Plain(text),
    }
}

/// Classify one stderr line and hand the result to `sink`.
///
/// Never panics: a fault inside classification is reported to the sink and
/// the line goes out as plain text.
pub fn route_error_line(raw: &str, fs: &dyn FileSystem, sink: &dyn Sink) {
    match panic::catch_unwind(AssertUnwindSafe(|| classify_error_line(raw, fs))) {
        Ok(ErrorLine::Diagnostic { text, record }) => sink.add_diagnostic(&text, &record),
        Ok(ErrorLine::Plain(text)) => sink.write_line(LineKind::Error, &text),
        Err(payload) => {
            let detail = panic_detail(payload.as_ref());
            error!(%detail, line = %raw, "diagnostic parser failed");
            sink.write_line(
                LineKind::Error,
                &format!("diagnostic parser failed on this line: {detail}"),
            );
            sink.write_line(LineKind::Error, &strip_ansi(raw));
        }
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::sink::{MemorySink, SinkEvent};

    #[derive(Debug)]
    struct ExplodingFileSystem;

    impl FileSystem for ExplodingFileSystem {
        fn exists(&self, _path: &Path) -> bool {
            false
        }
        fn is_file(&self, _path: &Path) -> bool {
            panic!("disk on fire")
        }
        fn is_dir(&self, _path: &Path) -> bool {
            false
        }
        fn canonicalize(&self, path: &Path) -> anyhow::Result<PathBuf> {
            Ok(path.to_path_buf())
        }
        fn read_dir(&self, _path: &Path) -> anyhow::Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn existing_file_yields_a_diagnostic() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/site.less");
        let line = "ParseError: Unrecognised input in /proj/site.less on line 5, column 2";

        match classify_error_line(line, &fs) {
            ErrorLine::Diagnostic { text, record } => {
                assert_eq!(text, line);
                assert_eq!(record.message, "Unrecognised input");
                assert_eq!(record.line, 5);
            }
            other => panic!("expected diagnostic, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_demoted_to_plain_text() {
        let fs = MockFileSystem::new();
        let line = "ParseError: Unrecognised input in /gone/site.less on line 5, column 2";

        assert_eq!(
            classify_error_line(line, &fs),
            ErrorLine::Plain(line.to_string())
        );
    }

    #[test]
    fn directory_path_is_demoted_to_plain_text() {
        let fs = MockFileSystem::new();
        fs.add_dir("/proj/styles");
        let line = "ParseError: Unrecognised input in /proj/styles on line 5, column 2";

        assert_eq!(
            classify_error_line(line, &fs),
            ErrorLine::Plain(line.to_string())
        );
    }

    #[test]
    fn route_sends_plain_text_as_error_lines() {
        let fs = MockFileSystem::new();
        let sink = MemorySink::new();

        route_error_line("\x1b[33mwarning\x1b[0m: slow", &fs, &sink);

        assert_eq!(sink.lines(LineKind::Error), vec!["warning: slow".to_string()]);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn route_survives_a_fault_during_classification() {
        let sink = MemorySink::new();
        let line = "ParseError: x in /p/a.less on line 1, column 1";

        route_error_line(line, &ExplodingFileSystem, &sink);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        match &events[0] {
            SinkEvent::Line { kind, text } => {
                assert_eq!(*kind, LineKind::Error);
                assert!(text.contains("disk on fire"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(
            events[1],
            SinkEvent::Line {
                kind: LineKind::Error,
                text: line.to_string()
            }
        );
    }
}
