//! crates/logtree/src/logger.rs
//! Named tree nodes: level inheritance, record construction and handler
//! fan-out along the ancestor chain.

use std::fmt;
use std::io::{self, Write};
use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock, RwLock, Weak};

use crate::filter::{Filter, Filterer};
use crate::handler::{Handler, same_handler};
use crate::level::Level;
use crate::manager::Shared;
use crate::record::{Args, DefaultRecordFactory, LogRecord, RecordFactory, RecordParts};
use crate::sync;

/// Creates the [`Logger`] instances a manager hands out.
///
/// Installed through [`Manager::set_logger_class`](crate::Manager::set_logger_class).
/// The returned logger must carry the requested name. Closures with the
/// matching signature implement the trait, which makes it easy to pre-attach
/// handlers or preset levels on every new logger.
pub trait LoggerFactory: Send + Sync {
    /// Builds the logger for `name`.
    fn create(&self, name: &str) -> Logger;
}

impl<F> LoggerFactory for F
where
    F: Fn(&str) -> Logger + Send + Sync,
{
    fn create(&self, name: &str) -> Logger {
        self(name)
    }
}

/// Factory producing plain [`Logger::new`] instances.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultLoggerFactory;

impl LoggerFactory for DefaultLoggerFactory {
    fn create(&self, name: &str) -> Logger {
        Logger::new(name)
    }
}

/// A named node in the dotted logger namespace.
///
/// Loggers are obtained from a [`Manager`](crate::Manager), which owns them
/// and keeps their parent links consistent as new names are registered. The
/// parent link is weak; it exists for lookup only.
///
/// Emission is two-phase. [`is_enabled_for`](Self::is_enabled_for) makes one
/// cheap effective-level check, and only if it passes is a [`LogRecord`]
/// built and dispatched. Dispatch then visits this logger's handlers and
/// those of each ancestor until a logger with `propagate == false` has been
/// visited, and each handler applies its own threshold.
pub struct Logger {
    name: String,
    level: AtomicU8,
    propagate: AtomicBool,
    disabled: AtomicBool,
    warned: AtomicBool,
    parent: RwLock<Option<Weak<Logger>>>,
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
    filterer: Filterer,
    shared: OnceLock<Arc<Shared>>,
}

impl Logger {
    /// Creates a detached logger with level `NOTSET` that propagates.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: AtomicU8::new(Level::NotSet.as_u8()),
            propagate: AtomicBool::new(true),
            disabled: AtomicBool::new(false),
            warned: AtomicBool::new(false),
            parent: RwLock::new(None),
            handlers: RwLock::new(Vec::new()),
            filterer: Filterer::new(),
            shared: OnceLock::new(),
        }
    }

    pub(crate) fn attach(&self, shared: &Arc<Shared>) {
        let _ = self.shared.set(Arc::clone(shared));
    }

    /// The dotted name this logger is registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The level set on this logger, `NOTSET` when it inherits.
    #[must_use]
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Sets this logger's own level. `NOTSET` defers to the ancestors.
    pub fn set_level(&self, level: Level) {
        self.level.store(level.as_u8(), Ordering::Relaxed);
    }

    /// Whether records continue to ancestor handlers after this logger.
    #[must_use]
    pub fn propagate(&self) -> bool {
        self.propagate.load(Ordering::Relaxed)
    }

    /// Enables or disables propagation to ancestors.
    pub fn set_propagate(&self, propagate: bool) {
        self.propagate.store(propagate, Ordering::Relaxed);
    }

    /// Whether [`handle`](Self::handle) drops every record.
    #[must_use]
    pub fn disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    /// Turns record handling for this logger off or on.
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Relaxed);
    }

    /// The nearest registered ancestor, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Arc<Self>> {
        sync::read(&self.parent).as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn set_parent(&self, parent: Option<&Arc<Self>>) {
        *sync::write(&self.parent) = parent.map(Arc::downgrade);
    }

    /// Walks `self → parent → …` and returns the first level that is not
    /// `NOTSET`, or `NOTSET` when no logger on the chain sets one.
    #[must_use]
    pub fn get_effective_level(&self) -> Level {
        let own = self.level();
        if own != Level::NotSet {
            return own;
        }
        let mut next = self.parent();
        while let Some(logger) = next {
            let level = logger.level();
            if level != Level::NotSet {
                return level;
            }
            next = logger.parent();
        }
        Level::NotSet
    }

    /// Whether an event at `level` would be turned into a record.
    ///
    /// The manager's global disable floor wins over every local setting.
    #[must_use]
    pub fn is_enabled_for(&self, level: Level) -> bool {
        let floor = self
            .shared
            .get()
            .map_or(Level::NotSet, |shared| shared.disable_floor());
        if floor >= level {
            return false;
        }
        level >= self.get_effective_level()
    }

    /// Attaches a handler. Attaching the same handler twice is a no-op.
    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        let mut handlers = sync::write(&self.handlers);
        if !handlers.iter().any(|existing| same_handler(existing, &handler)) {
            handlers.push(handler);
        }
    }

    /// Detaches a handler; absent handlers are ignored.
    pub fn remove_handler(&self, handler: &Arc<dyn Handler>) {
        sync::write(&self.handlers).retain(|existing| !same_handler(existing, handler));
    }

    /// Snapshot of the attached handlers in attachment order.
    #[must_use]
    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        sync::read(&self.handlers).clone()
    }

    /// Whether this logger or any ancestor reachable through propagation
    /// has a handler attached.
    #[must_use]
    pub fn has_handlers(&self) -> bool {
        if !sync::read(&self.handlers).is_empty() {
            return true;
        }
        if !self.propagate() {
            return false;
        }
        let mut next = self.parent();
        while let Some(logger) = next {
            if !sync::read(&logger.handlers).is_empty() {
                return true;
            }
            if !logger.propagate() {
                break;
            }
            next = logger.parent();
        }
        false
    }

    /// Attaches a filter to this logger's own chain.
    pub fn add_filter(&self, filter: Arc<Filter>) {
        self.filterer.add_filter(filter);
    }

    /// Detaches a filter from this logger's own chain.
    pub fn remove_filter(&self, filter: &Arc<Filter>) {
        self.filterer.remove_filter(filter);
    }

    /// Runs this logger's own filter chain.
    #[must_use]
    pub fn filter(&self, record: &LogRecord) -> bool {
        self.filterer.filter(record)
    }

    /// Whether the one-time "no handlers" notice has been written.
    #[must_use]
    pub fn warned_no_handlers(&self) -> bool {
        self.warned.load(Ordering::Relaxed)
    }

    /// Emits `msg` at `level` if the logger is enabled for it.
    #[track_caller]
    pub fn log(&self, level: Level, msg: impl Into<String>, args: impl Into<Args>) {
        if self.is_enabled_for(level) {
            self.emit(level, msg.into(), args.into(), false, Location::caller());
        }
    }

    /// Emits at `DEBUG`.
    #[track_caller]
    pub fn debug(&self, msg: impl Into<String>, args: impl Into<Args>) {
        self.log(Level::Debug, msg, args);
    }

    /// Emits at `INFO`.
    #[track_caller]
    pub fn info(&self, msg: impl Into<String>, args: impl Into<Args>) {
        self.log(Level::Info, msg, args);
    }

    /// Emits at `WARN`.
    #[track_caller]
    pub fn warn(&self, msg: impl Into<String>, args: impl Into<Args>) {
        self.log(Level::Warning, msg, args);
    }

    /// Alias of [`warn`](Self::warn).
    #[track_caller]
    pub fn warning(&self, msg: impl Into<String>, args: impl Into<Args>) {
        self.log(Level::Warning, msg, args);
    }

    /// Emits at `ERROR`.
    #[track_caller]
    pub fn error(&self, msg: impl Into<String>, args: impl Into<Args>) {
        self.log(Level::Error, msg, args);
    }

    /// Emits at `ERROR` and marks the record as exception-flavoured, which
    /// sinks may render with the captured call site.
    #[track_caller]
    pub fn exception(&self, msg: impl Into<String>, args: impl Into<Args>) {
        if self.is_enabled_for(Level::Error) {
            self.emit(Level::Error, msg.into(), args.into(), true, Location::caller());
        }
    }

    /// Emits at `CRITICAL`.
    #[track_caller]
    pub fn critical(&self, msg: impl Into<String>, args: impl Into<Args>) {
        self.log(Level::Critical, msg, args);
    }

    /// Alias of [`critical`](Self::critical).
    #[track_caller]
    pub fn fatal(&self, msg: impl Into<String>, args: impl Into<Args>) {
        self.log(Level::Critical, msg, args);
    }

    fn emit(
        &self,
        level: Level,
        msg: String,
        args: Args,
        exception: bool,
        caller: &'static Location<'static>,
    ) {
        let parts = RecordParts {
            name: self.name.clone(),
            level,
            msg,
            args,
            trace: caller.to_string(),
            exception,
        };
        let record = self.make_record(parts);
        self.handle(&record);
    }

    /// Builds a record through the owning manager's record factory.
    ///
    /// Detached loggers use [`DefaultRecordFactory`]. Together with
    /// [`handle`](Self::handle) this lets bridges feed events that did not
    /// originate from the emission methods.
    #[must_use]
    pub fn make_record(&self, parts: RecordParts) -> LogRecord {
        match self.shared.get() {
            Some(shared) => shared.record_factory().make_record(parts),
            None => DefaultRecordFactory.make_record(parts),
        }
    }

    /// Dispatches `record` unless this logger is disabled or its own filters
    /// reject it.
    pub fn handle(&self, record: &LogRecord) {
        if !self.disabled() && self.filter(record) {
            self.call_handlers(record);
        }
    }

    /// Offers `record` to the handlers of this logger and its ancestors.
    ///
    /// Each visited handler whose threshold admits the record handles it.
    /// The walk stops after the first logger whose `propagate` flag is off.
    /// Returns how many handlers were visited; when none were, a one-time
    /// notice is written to standard error (if the manager allows it).
    pub fn call_handlers(&self, record: &LogRecord) -> usize {
        let mut found = self.offer(record);
        if self.propagate() {
            let mut next = self.parent();
            while let Some(logger) = next {
                found += logger.offer(record);
                if !logger.propagate() {
                    break;
                }
                next = logger.parent();
            }
        }

        if found == 0 {
            self.warn_no_handlers();
        }
        found
    }

    fn offer(&self, record: &LogRecord) -> usize {
        let handlers = self.handlers();
        for handler in &handlers {
            if record.level() >= handler.level() {
                handler.handle(record);
            }
        }
        handlers.len()
    }

    fn warn_no_handlers(&self) {
        let raise = self
            .shared
            .get()
            .is_none_or(|shared| shared.raise_exceptions());
        if raise && !self.warned.swap(true, Ordering::Relaxed) {
            let _ = writeln!(
                io::stderr().lock(),
                "No handlers could be found for logger \"{}\"",
                self.name
            );
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("propagate", &self.propagate())
            .field("disabled", &self.disabled())
            .field("parent", &self.parent().map(|parent| parent.name.clone()))
            .field("handlers", &sync::read(&self.handlers).len())
            .finish_non_exhaustive()
    }
}
