//! crates/logtree/src/console.rs
//! Console sink splitting records between standard output and standard error.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use crate::formatter::{Format, Formatter};
use crate::handler::{Handler, HandlerCore};
use crate::level::Level;
use crate::record::LogRecord;
use crate::sync;

/// Template used for records produced by [`Logger::exception`](crate::Logger::exception).
pub const EXCEPTION_FORMAT: &str = "%(levelname)s:%(name)s:%(message)s\n%(trace)s\n";

type Stream = Mutex<Box<dyn Write + Send>>;

/// Writes records above `INFO` to the error stream and the rest to the
/// output stream.
///
/// Exception records are rendered with [`EXCEPTION_FORMAT`], which appends
/// the captured call site. Every emitted line ends with a newline.
pub struct ConsoleHandler {
    core: HandlerCore,
    out: Stream,
    err: Stream,
}

impl ConsoleHandler {
    /// Creates a handler bound to the process's standard streams.
    #[must_use]
    pub fn new() -> Self {
        Self::with_streams(io::stdout(), io::stderr())
    }

    /// Creates a handler writing to caller-supplied streams.
    pub fn with_streams<O, E>(out: O, err: E) -> Self
    where
        O: Write + Send + 'static,
        E: Write + Send + 'static,
    {
        Self {
            core: HandlerCore::new(),
            out: Mutex::new(Box::new(out)),
            err: Mutex::new(Box::new(err)),
        }
    }

    fn render(&self, record: &LogRecord) -> String {
        let template = record.is_exception().then_some(EXCEPTION_FORMAT);
        let mut line = match (self.core.formatter(), template) {
            (Some(formatter), template) => formatter.format(record, template),
            (None, Some(template)) => Formatter::default().format(record, Some(template)),
            (None, None) => record.get_message(),
        };
        if !line.ends_with('\n') {
            line.push('\n');
        }
        line
    }

    fn stream_for(&self, level: Level) -> &Stream {
        if level > Level::Info { &self.err } else { &self.out }
    }
}

impl Default for ConsoleHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConsoleHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleHandler")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl Handler for ConsoleHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &LogRecord) {
        let line = self.render(record);
        let result = {
            let mut stream = sync::lock(self.stream_for(record.level()));
            stream.write_all(line.as_bytes()).and_then(|()| stream.flush())
        };
        if let Err(error) = result {
            self.handle_error(record, &error);
        }
    }

    fn flush(&self) {
        let _ = sync::lock(&self.out).flush();
        let _ = sync::lock(&self.err).flush();
    }
}
