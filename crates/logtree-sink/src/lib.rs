#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/logtree-sink/src/lib.rs
//!
//! # Overview
//!
//! `logtree-sink` provides concrete [`logtree::Handler`] implementations that
//! are thin I/O wrappers: [`WriterHandler`] over any [`std::io::Write`]
//! implementor and [`FileHandler`] over a path on disk.
//!
//! # Design
//!
//! Both sinks embed a [`logtree::HandlerCore`] for threshold, filters and
//! formatter, render each admitted record with
//! [`Handler::format`](logtree::Handler::format), apply their [`LineMode`]
//! and write the result under a mutex so concurrent loggers never interleave
//! partial lines.
//!
//! # Errors
//!
//! Failures inside `emit` go to
//! [`Handler::handle_error`](logtree::Handler::handle_error).
//! [`FileHandler::open`] is the only constructor that returns an error.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use logtree::{Formatter, Handler, Manager};
//! use logtree_sink::FileHandler;
//!
//! let manager = Manager::new();
//! let file = FileHandler::new("/var/log/app.log");
//! file.set_formatter(Arc::new(Formatter::new("%(asctime)s %(levelname)s %(name)s: %(message)s")));
//! manager.get_logger("app").add_handler(Arc::new(file));
//! manager.get_logger("app.db").error("connection lost", ());
//! ```
//!
//! # See also
//!
//! - [`logtree::ConsoleHandler`] for the stdout/stderr sink.

mod file;
mod line_mode;
mod writer;

pub use file::{FileHandler, FileOptions};
pub use line_mode::LineMode;
pub use writer::WriterHandler;
