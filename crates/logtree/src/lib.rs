#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logtree` is a hierarchical, level-filtered logging facility. Loggers are
//! named with dotted paths (`app.db.pool`) and arranged in a tree owned by a
//! [`Manager`]. Application code emits events through a [`Logger`]; each
//! event that passes the logger's effective level becomes a [`LogRecord`]
//! and is offered to the [`Handler`]s attached to that logger and to its
//! ancestors.
//!
//! # Design
//!
//! - [`Manager`] owns every logger in a single registry. Names requested
//!   before their ancestors are bridged by placeholders so parent links stay
//!   correct whatever the creation order.
//! - [`Logger`] resolves its effective level by walking parent links and
//!   dispatches records up the chain until a logger with propagation turned
//!   off has been visited.
//! - [`Handler`] is the sink contract. Implementors provide
//!   [`emit`](Handler::emit); thresholds, filters and formatting come from
//!   the embedded [`HandlerCore`].
//! - [`Formatter`] renders `%(field)s` templates; [`Filter`] admits records by
//!   logger-name prefix.
//! - [`global`] exposes a process-wide manager whose `"root"` logger writes
//!   warnings to the console.
//!
//! # Invariants
//!
//! - [`Manager::get_logger`] returns the same instance for the same name.
//! - A logger's parent is always its nearest existing dotted ancestor.
//!   Single-segment names have no parent.
//! - The manager's disable floor overrides every local level.
//! - Handler failures never reach the emitting caller; they are reported
//!   through [`Handler::handle_error`].
//!
//! # Errors
//!
//! Fallible operations return [`LoggingError`]: unknown level names,
//! malformed configuration directives, invalid date patterns, unknown
//! formatter fields, and I/O failures while opening sinks.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use logtree::{args, Formatter, Handler, Level, Manager};
//! # use logtree::{HandlerCore, LogRecord, Format};
//! # use std::sync::Mutex;
//! # #[derive(Default)]
//! # struct Lines { core: HandlerCore, out: Mutex<Vec<String>> }
//! # impl Handler for Lines {
//! #     fn core(&self) -> &HandlerCore { &self.core }
//! #     fn emit(&self, record: &LogRecord) {
//! #         self.out.lock().unwrap().push(self.format(record, None));
//! #     }
//! # }
//!
//! let manager = Manager::new();
//! let app = manager.get_logger("app");
//! app.set_level(Level::Info);
//!
//! let lines = Arc::new(Lines::default());
//! lines.set_formatter(Arc::new(Formatter::new("%(levelname)s:%(name)s:%(message)s")));
//! app.add_handler(lines.clone());
//!
//! manager.get_logger("app.sub").info("value=%s", args![42]);
//! manager.get_logger("app.sub").debug("hidden", ());
//!
//! assert_eq!(*lines.out.lock().unwrap(), vec!["INFO:app.sub:value=42".to_owned()]);
//! ```
//!
//! # See also
//!
//! - [`LoggingConfig`] for directive-based configuration such as
//!   `warn,app.db=debug`.
//! - The `logtree-sink` crate for file and writer sinks.

mod config;
mod console;
mod error;
mod filter;
mod formatter;
mod global;
mod handler;
mod level;
mod logger;
mod manager;
mod record;
mod sync;
#[cfg(feature = "tracing")]
mod tracing_bridge;

pub use config::LoggingConfig;
pub use console::{ConsoleHandler, EXCEPTION_FORMAT};
pub use error::{LoggingError, Result};
pub use filter::{Filter, Filterer};
pub use formatter::{DEFAULT_DATE_FORMAT, DEFAULT_FORMAT, Format, Formatter};
pub use global::{disable, get_logger, global, set_log_record_class, set_logger_class};
pub use handler::{Handler, HandlerCore, write_error_report};
pub use level::{
    AsLevel, CRITICAL, DEBUG, ERROR, EXCEPTION, FATAL, INFO, Level, NOTSET, WARN, WARNING,
    check_level, get_level_name,
};
pub use logger::{DefaultLoggerFactory, Logger, LoggerFactory};
pub use manager::{Manager, NodeKind, ROOT_NAME};
pub use record::{Args, DefaultRecordFactory, LogRecord, RecordFactory, RecordParts};
#[cfg(feature = "tracing")]
pub use tracing_bridge::{
    HierarchyLayer, RECORD_TARGET, TracingHandler, from_tracing_level, init_tracing,
    init_tracing_with_filter, logger_name_for_target, to_tracing_level,
};

#[doc(hidden)]
pub use serde_json as __serde_json;
