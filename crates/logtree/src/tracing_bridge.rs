//! crates/logtree/src/tracing_bridge.rs
//! Two-way bridge between the `tracing` ecosystem and the logger tree.
//!
//! - [`TracingHandler`] re-emits admitted records as `tracing` events so a
//!   tree can feed an existing subscriber.
//! - [`HierarchyLayer`] is a `tracing-subscriber` layer that turns `tracing`
//!   events into records dispatched through a [`Manager`]. Event targets map
//!   to logger names by replacing `::` with `.`, so `app::db` events reach
//!   the `app.db` logger and propagate to `app`.
//!
//! Events under the `logtree` target prefix are never routed back into the
//! tree, which keeps a [`TracingHandler`] and a [`HierarchyLayer`] from
//! feeding each other.
//!
//! # Usage
//!
//! ```rust,ignore
//! use logtree::{global, init_tracing};
//!
//! init_tracing(global()).expect("no other subscriber installed");
//! tracing::warn!(target: "app::db", "pool exhausted");
//! ```

use std::fmt;

use serde_json::{Map, Value};
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::Registry;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;

use crate::handler::{Handler, HandlerCore};
use crate::level::Level;
use crate::manager::Manager;
use crate::record::{Args, LogRecord, RecordParts};

/// Target used for events produced by [`TracingHandler`].
pub const RECORD_TARGET: &str = "logtree::record";

const OWN_PREFIX: &str = "logtree";

/// Handler that forwards records to the current `tracing` dispatcher.
///
/// Events carry the formatted message plus a `logger` field naming the
/// originating logger. Levels map `CRITICAL`/`ERROR` to `ERROR`, `WARN` to
/// `WARN`, `INFO` to `INFO` and everything lower to `DEBUG`.
#[derive(Debug, Default)]
pub struct TracingHandler {
    core: HandlerCore,
}

impl TracingHandler {
    /// Creates a handler admitting every level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Handler for TracingHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &LogRecord) {
        let message = self.format(record, None);
        let message = message.trim_end_matches('\n');
        let logger = record.name();
        match to_tracing_level(record.level()) {
            tracing::Level::ERROR => {
                tracing::error!(target: RECORD_TARGET, logger, "{message}");
            }
            tracing::Level::WARN => {
                tracing::warn!(target: RECORD_TARGET, logger, "{message}");
            }
            tracing::Level::INFO => {
                tracing::info!(target: RECORD_TARGET, logger, "{message}");
            }
            _ => {
                tracing::debug!(target: RECORD_TARGET, logger, "{message}");
            }
        }
    }
}

/// Maps a tree level onto the nearest `tracing` level.
#[must_use]
pub const fn to_tracing_level(level: Level) -> tracing::Level {
    match level {
        Level::Critical | Level::Error => tracing::Level::ERROR,
        Level::Warning => tracing::Level::WARN,
        Level::Info => tracing::Level::INFO,
        Level::Debug | Level::NotSet => tracing::Level::DEBUG,
    }
}

/// Maps a `tracing` level onto a tree level; `TRACE` folds into `DEBUG`.
#[must_use]
pub const fn from_tracing_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::ERROR => Level::Error,
        tracing::Level::WARN => Level::Warning,
        tracing::Level::INFO => Level::Info,
        tracing::Level::DEBUG | tracing::Level::TRACE => Level::Debug,
    }
}

/// Converts a `tracing` target into a dotted logger name.
#[must_use]
pub fn logger_name_for_target(target: &str) -> String {
    target.replace("::", ".")
}

/// Layer routing `tracing` events into the loggers of a [`Manager`].
///
/// The `message` field becomes the record message; every other field is
/// attached as an extra field. The event's source location, when known,
/// becomes the record's trace.
#[derive(Clone, Copy)]
pub struct HierarchyLayer {
    manager: &'static Manager,
}

impl HierarchyLayer {
    /// Creates a layer that dispatches into `manager`.
    #[must_use]
    pub const fn new(manager: &'static Manager) -> Self {
        Self { manager }
    }
}

impl fmt::Debug for HierarchyLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HierarchyLayer").finish_non_exhaustive()
    }
}

impl<S> Layer<S> for HierarchyLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();
        if target == OWN_PREFIX || target.starts_with("logtree::") {
            return;
        }

        let level = from_tracing_level(metadata.level());
        let logger = self.manager.get_logger(&logger_name_for_target(target));
        if !logger.is_enabled_for(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let trace = match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => format!("{file}:{line}"),
            (Some(file), None) => file.to_owned(),
            _ => metadata.module_path().unwrap_or(target).to_owned(),
        };
        let record = logger.make_record(RecordParts {
            name: logger.name().to_owned(),
            level,
            msg: visitor.message.unwrap_or_default(),
            args: Args::new().with_extra(visitor.fields),
            trace,
            exception: false,
        });
        logger.handle(&record);
    }
}

/// Collects the message and the remaining fields of an event.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_owned(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_owned()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }
}

/// Installs a [`HierarchyLayer`] over `manager` as the global subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(manager: &'static Manager) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(HierarchyLayer::new(manager))
        .try_init()
}

/// Like [`init_tracing`], with an additional filtering layer in front.
///
/// ```rust,ignore
/// use logtree::{global, init_tracing_with_filter};
/// use tracing_subscriber::EnvFilter;
///
/// init_tracing_with_filter(global(), EnvFilter::from_default_env())?;
/// ```
pub fn init_tracing_with_filter<F>(manager: &'static Manager, filter: F) -> Result<(), TryInitError>
where
    F: Layer<Registry> + Send + Sync + 'static,
{
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(filter)
        .with(HierarchyLayer::new(manager))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::Logger;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Default)]
    struct Capture {
        core: HandlerCore,
        records: Mutex<Vec<LogRecord>>,
    }

    impl Handler for Capture {
        fn core(&self) -> &HandlerCore {
            &self.core
        }

        fn emit(&self, record: &LogRecord) {
            self.records.lock().unwrap().push(record.clone());
        }
    }

    fn leaked_manager() -> &'static Manager {
        Box::leak(Box::new(Manager::new()))
    }

    #[test]
    fn level_mapping_round_trips_canonical_levels() {
        for level in [Level::Debug, Level::Info, Level::Warning, Level::Error] {
            assert_eq!(from_tracing_level(&to_tracing_level(level)), level);
        }
        assert_eq!(to_tracing_level(Level::Critical), tracing::Level::ERROR);
        assert_eq!(from_tracing_level(&tracing::Level::TRACE), Level::Debug);
    }

    #[test]
    fn targets_become_dotted_names() {
        assert_eq!(logger_name_for_target("app::db::pool"), "app.db.pool");
        assert_eq!(logger_name_for_target("plain"), "plain");
    }

    #[test]
    fn layer_dispatches_into_hierarchy() {
        let manager = leaked_manager();
        let top = manager.get_logger("app");
        let capture = Arc::new(Capture::default());
        top.add_handler(capture.clone());

        let subscriber = tracing_subscriber::registry().with(HierarchyLayer::new(manager));
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "app::db", rows = 3_u64, "slow query");
        });

        let records = capture.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "app.db");
        assert_eq!(records[0].level(), Level::Warning);
        assert_eq!(records[0].get_message(), "slow query");
        assert_eq!(records[0].field("rows").as_deref(), Some("3"));
    }

    #[test]
    fn layer_respects_logger_levels() {
        let manager = leaked_manager();
        let logger = manager.get_logger("quiet");
        logger.set_level(Level::Error);
        let capture = Arc::new(Capture::default());
        logger.add_handler(capture.clone());

        let subscriber = tracing_subscriber::registry().with(HierarchyLayer::new(manager));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "quiet", "dropped");
            tracing::error!(target: "quiet", "kept");
        });

        let records = capture.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get_message(), "kept");
    }

    #[test]
    fn own_events_are_not_routed_back() {
        let manager = leaked_manager();
        let capture = Arc::new(Capture::default());
        manager.get_logger("logtree").add_handler(capture.clone());

        let subscriber = tracing_subscriber::registry().with(HierarchyLayer::new(manager));
        tracing::subscriber::with_default(subscriber, || {
            let bridge = Logger::new("bridge");
            bridge.add_handler(Arc::new(TracingHandler::new()));
            bridge.error("looped?", ());
        });

        assert!(capture.records.lock().unwrap().is_empty());
    }
}
