// src/sink/memory.rs

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::diagnostic::DiagnosticRecord;

use super::{LineKind, Sink};

/// One call received by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Line { kind: LineKind, text: String },
    Diagnostic { text: String, record: DiagnosticRecord },
}

/// Sink that keeps every call in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SinkEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.lock().clone()
    }

    /// Text of every plain line of the given kind, in order.
    pub fn lines(&self, kind: LineKind) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Line { kind: k, text } if *k == kind => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn diagnostics(&self) -> Vec<DiagnosticRecord> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Diagnostic { record, .. } => Some(record.clone()),
                SinkEvent::Line { .. } => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SinkEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Sink for MemorySink {
    fn write_line(&self, kind: LineKind, text: &str) {
        self.lock().push(SinkEvent::Line {
            kind,
            text: text.to_string(),
        });
    }

    fn add_diagnostic(&self, text: &str, record: &DiagnosticRecord) {
        self.lock().push(SinkEvent::Diagnostic {
            text: text.to_string(),
            record: record.clone(),
        });
    }
}
