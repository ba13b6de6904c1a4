//! crates/logtree-sink/src/file.rs
//! Handler that appends formatted records to a file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use logtree::{Handler, HandlerCore, LogRecord, LoggingError, Result};

use crate::line_mode::LineMode;

/// How a [`FileHandler`] opens its destination.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FileOptions {
    /// Append to existing content instead of truncating it.
    pub append: bool,
    /// Create the file when it does not exist.
    pub create: bool,
    /// Newline policy for each record.
    pub line_mode: LineMode,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            append: true,
            create: true,
            line_mode: LineMode::WithNewline,
        }
    }
}

impl FileOptions {
    fn open(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .append(self.append)
            .truncate(!self.append)
            .create(self.create)
            .open(path)
    }
}

/// Writes each admitted record to a file.
///
/// [`FileHandler::new`] opens lazily on the first record, so open failures
/// are reported through [`Handler::handle_error`] like write failures.
/// [`FileHandler::open`] opens eagerly and returns the error instead.
/// After [`close`](Handler::close) the next record reopens the file.
#[derive(Debug)]
pub struct FileHandler {
    core: HandlerCore,
    path: PathBuf,
    options: FileOptions,
    file: Mutex<Option<File>>,
}

impl FileHandler {
    /// Creates a handler appending to `path` with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, FileOptions::default())
    }

    /// Creates a handler for `path` with explicit options.
    pub fn with_options(path: impl Into<PathBuf>, options: FileOptions) -> Self {
        Self {
            core: HandlerCore::new(),
            path: path.into(),
            options,
            file: Mutex::new(None),
        }
    }

    /// Creates a handler and opens `path` immediately.
    pub fn open(path: impl Into<PathBuf>, options: FileOptions) -> Result<Self> {
        let handler = Self::with_options(path, options);
        let file = options
            .open(&handler.path)
            .map_err(|error| LoggingError::io(format!("opening {}", handler.path.display()), error))?;
        *handler.slot() = Some(file);
        Ok(handler)
    }

    /// The destination path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.slot().is_some()
    }

    fn slot(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_text(&self, text: &str) -> io::Result<()> {
        let mut slot = self.slot();
        let file = match slot.take() {
            Some(file) => file,
            None => self.options.open(&self.path)?,
        };
        slot.insert(file).write_all(text.as_bytes())
    }
}

impl Handler for FileHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &LogRecord) {
        let text = self.options.line_mode.terminate(self.format(record, None));
        if let Err(error) = self.write_text(&text) {
            let error = LoggingError::io(format!("writing {}", self.path.display()), error);
            self.handle_error(record, &error);
        }
    }

    fn flush(&self) {
        if let Some(file) = self.slot().as_mut() {
            let _ = file.flush();
        }
    }

    fn close(&self) {
        if let Some(mut file) = self.slot().take() {
            let _ = file.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logtree::Level;

    #[test]
    fn default_options_append_and_create() {
        let options = FileOptions::default();
        assert!(options.append);
        assert!(options.create);
        assert_eq!(options.line_mode, LineMode::WithNewline);
    }

    #[test]
    fn lazy_handler_starts_closed() {
        let handler = FileHandler::new("/nonexistent/dir/app.log");
        assert!(!handler.is_open());
        assert_eq!(handler.path(), Path::new("/nonexistent/dir/app.log"));
    }

    #[test]
    fn open_failure_is_reported_eagerly() {
        let options = FileOptions {
            create: false,
            ..FileOptions::default()
        };
        let result = FileHandler::open("/nonexistent/dir/app.log", options);
        assert!(matches!(result, Err(LoggingError::Io { .. })));
    }

    #[test]
    fn lazy_open_failure_is_contained() {
        let handler = FileHandler::new("/nonexistent/dir/app.log");
        assert!(handler.handle(&LogRecord::new("a", Level::Error, "lost", ())));
        assert!(!handler.is_open());
    }
}
