//! crates/logtree/src/handler.rs
//! The sink contract: level gate, filter chain, formatter and emit.

use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

use crate::filter::{Filter, Filterer};
use crate::formatter::Format;
use crate::level::Level;
use crate::record::LogRecord;
use crate::sync;

/// State every handler carries: threshold, optional formatter and filters.
///
/// Concrete handlers embed one of these and expose it through
/// [`Handler::core`]; the provided trait methods do the rest.
#[derive(Default)]
pub struct HandlerCore {
    level: AtomicU8,
    formatter: RwLock<Option<Arc<dyn Format>>>,
    filterer: Filterer,
}

impl HandlerCore {
    /// Creates state that admits every level and has no formatter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates state with the given threshold.
    #[must_use]
    pub fn with_level(level: Level) -> Self {
        let core = Self::new();
        core.set_level(level);
        core
    }

    /// Current threshold.
    #[must_use]
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Replaces the threshold.
    pub fn set_level(&self, level: Level) {
        self.level.store(level.as_u8(), Ordering::Relaxed);
    }

    /// The attached formatter, if any.
    #[must_use]
    pub fn formatter(&self) -> Option<Arc<dyn Format>> {
        sync::read(&self.formatter).clone()
    }

    /// Attaches or replaces the formatter.
    pub fn set_formatter(&self, formatter: Arc<dyn Format>) {
        *sync::write(&self.formatter) = Some(formatter);
    }

    /// The handler's own filter chain.
    #[must_use]
    pub const fn filterer(&self) -> &Filterer {
        &self.filterer
    }
}

impl fmt::Debug for HandlerCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerCore")
            .field("level", &self.level())
            .field("has_formatter", &self.formatter().is_some())
            .field("filters", &self.filterer.filters())
            .finish()
    }
}

/// A level-gated sink that formats and delivers admitted records.
///
/// Implementors supply [`core`](Self::core) and [`emit`](Self::emit); every
/// other method has a working default. `emit` performs the actual I/O and
/// must route its own failures through [`handle_error`](Self::handle_error)
/// instead of panicking or returning them, so one broken sink never stops
/// delivery to its siblings.
pub trait Handler: Send + Sync {
    /// Shared handler state.
    fn core(&self) -> &HandlerCore;

    /// Writes an already admitted record to the destination.
    fn emit(&self, record: &LogRecord);

    /// Current threshold; records below it are not handed to this handler.
    fn level(&self) -> Level {
        self.core().level()
    }

    /// Replaces the threshold.
    fn set_level(&self, level: Level) {
        self.core().set_level(level);
    }

    /// Attaches or replaces the formatter.
    fn set_formatter(&self, formatter: Arc<dyn Format>) {
        self.core().set_formatter(formatter);
    }

    /// Attaches a filter to this handler's chain.
    fn add_filter(&self, filter: Arc<Filter>) {
        self.core().filterer().add_filter(filter);
    }

    /// Detaches a filter from this handler's chain.
    fn remove_filter(&self, filter: &Arc<Filter>) {
        self.core().filterer().remove_filter(filter);
    }

    /// Runs the handler's filter chain.
    fn filter(&self, record: &LogRecord) -> bool {
        self.core().filterer().filter(record)
    }

    /// Formats with the attached formatter, or falls back to the merged
    /// message when none is attached.
    fn format(&self, record: &LogRecord, template: Option<&str>) -> String {
        match self.core().formatter() {
            Some(formatter) => formatter.format(record, template),
            None => record.get_message(),
        }
    }

    /// Filters then emits. Returns whether the record was emitted.
    fn handle(&self, record: &LogRecord) -> bool {
        let admitted = self.filter(record);
        if admitted {
            self.emit(record);
        }
        admitted
    }

    /// Reports a failure that happened while emitting `record`.
    ///
    /// Writes a best-effort diagnostic, including the record's call site, to
    /// standard error. Never panics.
    fn handle_error(&self, record: &LogRecord, error: &dyn Error) {
        write_error_report(&mut io::stderr().lock(), record, error);
    }

    /// Flushes buffered output. No-op by default.
    fn flush(&self) {}

    /// Releases resources held by the sink. No-op by default.
    fn close(&self) {}
}

/// Writes the diagnostic used by [`Handler::handle_error`] to `out`.
///
/// Errors while writing the diagnostic itself are discarded.
pub fn write_error_report<W: Write + ?Sized>(out: &mut W, record: &LogRecord, error: &dyn Error) {
    let _ = writeln!(out, "--- Logging error ---");
    let _ = writeln!(out, "{error}");
    let _ = writeln!(out, "Logged from {} at {}", record.name(), record.trace());
    let _ = writeln!(out, "Message: {:?}", record.msg());
    let _ = out.flush();
}

/// Compares two handlers by identity.
pub(crate) fn same_handler(a: &Arc<dyn Handler>, b: &Arc<dyn Handler>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
