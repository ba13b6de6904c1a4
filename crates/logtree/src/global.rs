//! crates/logtree/src/global.rs
//! Process-wide default manager and the free functions that forward to it.

use std::sync::{Arc, OnceLock};

use crate::console::ConsoleHandler;
use crate::formatter::Formatter;
use crate::handler::Handler;
use crate::level::Level;
use crate::logger::{Logger, LoggerFactory};
use crate::manager::Manager;
use crate::record::RecordFactory;

static GLOBAL: OnceLock<Manager> = OnceLock::new();

/// The process-wide manager, initialised on first use.
///
/// Its `"root"` logger starts at `WARN` with one [`ConsoleHandler`] at
/// `WARN` using the default [`Formatter`].
pub fn global() -> &'static Manager {
    GLOBAL.get_or_init(|| {
        let manager = Manager::new();
        install_console_root(&manager);
        manager
    })
}

fn install_console_root(manager: &Manager) {
    let root = manager.root();
    root.set_level(Level::Warning);

    let console = ConsoleHandler::new();
    console.set_level(Level::Warning);
    console.set_formatter(Arc::new(Formatter::default()));
    root.add_handler(Arc::new(console));
}

/// Returns the named logger from the [`global`] manager.
pub fn get_logger(name: &str) -> Arc<Logger> {
    global().get_logger(name)
}

/// Sets the disable floor of the [`global`] manager.
pub fn disable(level: Level) {
    global().disable(level);
}

/// Installs the logger factory of the [`global`] manager.
pub fn set_logger_class(factory: impl LoggerFactory + 'static) {
    global().set_logger_class(factory);
}

/// Installs the record factory of the [`global`] manager.
pub fn set_log_record_class(factory: impl RecordFactory + 'static) {
    global().set_log_record_class(factory);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_root_is_preconfigured() {
        let manager = Manager::new();
        install_console_root(&manager);

        let root = manager.root();
        assert_eq!(root.level(), Level::Warning);
        let handlers = root.handlers();
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].level(), Level::Warning);
    }

    #[test]
    fn global_root_is_shared() {
        assert!(Arc::ptr_eq(&get_logger(""), &global().root()));
        assert_eq!(global().root().level(), Level::Warning);
    }
}
