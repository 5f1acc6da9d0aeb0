// src/diagnostic/parser.rs

//! Parser for the compiler error lines emitted on a build command's stderr:
//!
//! ```text
//! ParseError: <message> in <file> on line <line>, column <column>
//! ```
//!
//! The scan is a single left-to-right pass over fixed delimiters. Anything
//! that does not fit comes back as plain text; the parser has no error path.

use std::path::PathBuf;

use thiserror::Error;
use tracing::trace;

use crate::diagnostic::ansi::strip_ansi;

pub const PREFIX: &str = "ParseError: ";
const IN: &str = " in ";
const ON_LINE: &str = " on line ";
const COLUMN: &str = ", column ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
}

/// A diagnostic addressed to a file and one-based line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub severity: Severity,
    pub message: String,
    pub file_path: PathBuf,
    pub line: u32,
}

/// Result of parsing one stderr line: the cleaned text, plus the structured
/// record when the text matched the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub text: String,
    pub diagnostic: Option<DiagnosticRecord>,
}

impl ParsedLine {
    fn plain(text: String) -> Self {
        Self {
            text,
            diagnostic: None,
        }
    }
}

/// Why a line did not yield a diagnostic. Only ever logged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("line does not start with \"ParseError: \"")]
    NotADiagnostic,

    #[error("missing delimiter {0:?}")]
    MissingDelimiter(&'static str),

    #[error("empty file path")]
    EmptyPath,

    #[error("invalid line number {0:?}")]
    InvalidLineNumber(String),

    #[error("invalid column number {0:?}")]
    InvalidColumn(String),
}

/// Strip colour codes from `raw` and try to read a diagnostic out of it.
pub fn parse_error_line(raw: &str) -> ParsedLine {
    let text = strip_ansi(raw).into_owned();

    match extract_diagnostic(&text) {
        Ok(record) => ParsedLine {
            text,
            diagnostic: Some(record),
        },
        Err(failure) => {
            trace!(%failure, line = %text, "stderr line is not a structured diagnostic");
            ParsedLine::plain(text)
        }
    }
}

/// Match an already-cleaned line against the diagnostic template.
pub fn extract_diagnostic(text: &str) -> Result<DiagnosticRecord, ParseFailure> {
    let body = text
        .strip_prefix(PREFIX)
        .ok_or(ParseFailure::NotADiagnostic)?;
    let (message, rest) = body
        .split_once(IN)
        .ok_or(ParseFailure::MissingDelimiter(IN))?;
    let (file_path, rest) = rest
        .split_once(ON_LINE)
        .ok_or(ParseFailure::MissingDelimiter(ON_LINE))?;
    let (line, column) = rest
        .split_once(COLUMN)
        .ok_or(ParseFailure::MissingDelimiter(COLUMN))?;

    if file_path.is_empty() {
        return Err(ParseFailure::EmptyPath);
    }

    let line = line
        .trim()
        .parse::<u32>()
        .map_err(|_| ParseFailure::InvalidLineNumber(line.to_string()))?;

    // The column is only checked, never kept; tools may append text after it.
    if !column.trim_start().starts_with(|c: char| c.is_ascii_digit()) {
        return Err(ParseFailure::InvalidColumn(column.to_string()));
    }

    Ok(DiagnosticRecord {
        severity: Severity::Error,
        message: message.to_string(),
        file_path: PathBuf::from(file_path),
        line,
    })
}
