//! crates/logtree-sink/src/writer.rs
//! Handler over an arbitrary [`Write`] implementor.

use std::fmt;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

use logtree::{Handler, HandlerCore, LogRecord};

use crate::line_mode::LineMode;

/// Formats admitted records and writes them to `W`.
///
/// Write failures are routed through [`Handler::handle_error`]; they never
/// reach the emitting logger.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use logtree::{Formatter, Handler, Level, LogRecord};
/// use logtree_sink::WriterHandler;
///
/// let sink = WriterHandler::new(Vec::new());
/// sink.set_formatter(Arc::new(Formatter::new("%(levelname)s %(message)s")));
/// sink.handle(&LogRecord::new("app", Level::Error, "code %d", logtree::args![7]));
///
/// assert_eq!(sink.into_inner(), b"ERROR code 7\n");
/// ```
pub struct WriterHandler<W> {
    core: HandlerCore,
    writer: Mutex<W>,
    line_mode: LineMode,
}

impl<W> WriterHandler<W>
where
    W: Write + Send,
{
    /// Wraps `writer`, terminating every record with a newline.
    pub fn new(writer: W) -> Self {
        Self::with_line_mode(writer, LineMode::WithNewline)
    }

    /// Wraps `writer` with an explicit [`LineMode`].
    pub fn with_line_mode(writer: W, line_mode: LineMode) -> Self {
        Self {
            core: HandlerCore::new(),
            writer: Mutex::new(writer),
            line_mode,
        }
    }

    /// The configured newline policy.
    #[must_use]
    pub const fn line_mode(&self) -> LineMode {
        self.line_mode
    }

    /// Runs `f` with exclusive access to the underlying writer.
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut writer)
    }

    /// Consumes the handler and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W> fmt::Debug for WriterHandler<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterHandler")
            .field("core", &self.core)
            .field("line_mode", &self.line_mode)
            .finish_non_exhaustive()
    }
}

impl<W> Handler for WriterHandler<W>
where
    W: Write + Send,
{
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &LogRecord) {
        let text = self.line_mode.terminate(self.format(record, None));
        let result = self.with_writer(|writer| writer.write_all(text.as_bytes()));
        if let Err(error) = result {
            self.handle_error(record, &error);
        }
    }

    fn flush(&self) {
        let _ = self.with_writer(|writer| writer.flush());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logtree::{Formatter, Level};
    use std::io;
    use std::sync::Arc;

    #[test]
    fn records_are_newline_terminated() {
        let sink = WriterHandler::new(Vec::new());
        sink.handle(&LogRecord::new("a", Level::Info, "one", ()));
        sink.handle(&LogRecord::new("a", Level::Info, "two", ()));
        assert_eq!(sink.into_inner(), b"one\ntwo\n");
    }

    #[test]
    fn default_template_is_not_doubled() {
        let sink = WriterHandler::new(Vec::new());
        sink.set_formatter(Arc::new(Formatter::default()));
        sink.handle(&LogRecord::new("a.b", Level::Warning, "w", ()));
        assert_eq!(sink.into_inner(), b"WARN:a.b:w\n");
    }

    #[test]
    fn without_newline_writes_verbatim() {
        let sink = WriterHandler::with_line_mode(Vec::new(), LineMode::WithoutNewline);
        sink.handle(&LogRecord::new("a", Level::Info, "x", ()));
        sink.handle(&LogRecord::new("a", Level::Info, "y", ()));
        assert_eq!(sink.into_inner(), b"xy");
    }

    #[test]
    fn write_failures_do_not_panic() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("broken pipe"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let sink = WriterHandler::new(Broken);
        assert!(sink.handle(&LogRecord::new("a", Level::Error, "lost", ())));
    }
}
