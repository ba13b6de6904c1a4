//! crates/test-support/src/lib.rs
//! Shared handlers and fixtures for the logtree workspace tests.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use logtree::{Handler, HandlerCore, Level, LogRecord};
use tempfile::TempDir;

/// Handler that keeps every emitted record and its formatted text.
#[derive(Debug, Default)]
pub struct CapturingHandler {
    core: HandlerCore,
    records: Mutex<Vec<LogRecord>>,
    lines: Mutex<Vec<String>>,
    closes: AtomicUsize,
}

impl CapturingHandler {
    /// Creates a handler admitting every level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handler with the given threshold, already wrapped in an `Arc`.
    #[must_use]
    pub fn shared(level: Level) -> Arc<Self> {
        let handler = Self::new();
        handler.set_level(level);
        Arc::new(handler)
    }

    /// Records emitted so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Formatted text of each emitted record.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Merged messages of each emitted record.
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(LogRecord::get_message)
            .collect()
    }

    /// Number of records emitted so far.
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// How many times `close` was called.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Forgets everything captured so far.
    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
        self.lines.lock().unwrap().clear();
    }
}

impl Handler for CapturingHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &LogRecord) {
        let line = self.format(record, None);
        self.lines.lock().unwrap().push(line);
        self.records.lock().unwrap().push(record.clone());
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handler whose every emit fails and is routed through `handle_error`.
#[derive(Debug, Default)]
pub struct FailingHandler {
    core: HandlerCore,
    attempts: AtomicUsize,
    errors: AtomicUsize,
}

impl FailingHandler {
    /// Creates a handler admitting every level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many records reached `emit`.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// How many failures were reported through `handle_error`.
    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }
}

impl Handler for FailingHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &LogRecord) {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.handle_error(record, &io::Error::other("sink unavailable"));
    }

    fn handle_error(&self, _record: &LogRecord, _error: &dyn std::error::Error) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

/// Temporary directory plus a path inside it for a log file.
#[derive(Debug)]
pub struct LogDir {
    dir: TempDir,
}

impl LogDir {
    /// Creates a fresh temporary directory.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Path of `name` inside the directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Contents of `name`, or an empty string when it does not exist.
    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).unwrap_or_default()
    }
}

impl Default for LogDir {
    fn default() -> Self {
        Self::new()
    }
}
