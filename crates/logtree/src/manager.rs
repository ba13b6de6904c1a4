//! crates/logtree/src/manager.rs
//! Name registry that owns every logger and keeps parent links consistent
//! regardless of the order in which names are first requested.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::handler::{Handler, same_handler};
use crate::level::Level;
use crate::logger::{DefaultLoggerFactory, Logger, LoggerFactory};
use crate::record::{self, DefaultRecordFactory, RecordFactory};
use crate::sync;

/// Name used for the root logger; the empty name maps to it.
pub const ROOT_NAME: &str = "root";

#[cfg(feature = "tracing")]
const TARGET: &str = "logtree::manager";

/// State every logger of one manager reads at emission time.
pub(crate) struct Shared {
    disable: AtomicU8,
    raise_exceptions: AtomicBool,
    record_factory: RwLock<Arc<dyn RecordFactory>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            disable: AtomicU8::new(Level::NotSet.as_u8()),
            raise_exceptions: AtomicBool::new(true),
            record_factory: RwLock::new(Arc::new(DefaultRecordFactory)),
        }
    }

    pub(crate) fn disable_floor(&self) -> Level {
        Level::from_u8(self.disable.load(Ordering::Relaxed)).unwrap_or_default()
    }

    pub(crate) fn raise_exceptions(&self) -> bool {
        self.raise_exceptions.load(Ordering::Relaxed)
    }

    pub(crate) fn record_factory(&self) -> Arc<dyn RecordFactory> {
        Arc::clone(&sync::read(&self.record_factory))
    }
}

/// What currently occupies a registry slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A real logger handed out by [`Manager::get_logger`].
    Logger,
    /// A stand-in for a name that so far only appears as an ancestor.
    PlaceHolder,
}

/// Remembers the already created descendants of a name that has not been
/// requested yet.
#[derive(Debug, Default)]
struct PlaceHolder {
    children: BTreeSet<String>,
}

enum Node {
    Logger(Arc<Logger>),
    PlaceHolder(PlaceHolder),
}

/// Registry of loggers keyed by dotted name.
///
/// Requesting `"a.b.c.d"` before any of its ancestors exist creates the
/// logger plus placeholders for `"a.b.c"`, `"a.b"` and `"a"`, each recording
/// the new logger as a pending child. When one of those names is later
/// requested the placeholder is replaced by a real logger and the pending
/// children whose parent sits above it are re-pointed at it.
///
/// Single-segment names have no parent. The root logger (`"root"`, also
/// reachable through the empty name) is an ordinary top-level logger and is
/// not an implicit ancestor of other names.
///
/// All registry mutation happens under one mutex. Emission never takes it:
/// loggers walk their own weak parent links.
pub struct Manager {
    registry: Mutex<HashMap<String, Node>>,
    logger_factory: RwLock<Arc<dyn LoggerFactory>>,
    shared: Arc<Shared>,
}

impl Manager {
    /// Creates an empty registry with no disable floor.
    ///
    /// Also fixes the process-wide offset used for record timestamps.
    #[must_use]
    pub fn new() -> Self {
        record::local_offset();
        Self {
            registry: Mutex::new(HashMap::new()),
            logger_factory: RwLock::new(Arc::new(DefaultLoggerFactory)),
            shared: Arc::new(Shared::new()),
        }
    }

    /// Returns the logger registered under `name`, creating it on first use.
    ///
    /// Repeated calls with the same name return the same instance. The empty
    /// name resolves to the root logger.
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        let name = if name.is_empty() { ROOT_NAME } else { name };
        if let Some(Node::Logger(logger)) = sync::lock(&self.registry).get(name) {
            return Arc::clone(logger);
        }

        // The factory runs without the registry lock; it may call get_logger.
        let logger = Arc::new(self.create(name));

        let mut registry = sync::lock(&self.registry);
        let pending = match registry.get_mut(name) {
            Some(Node::Logger(existing)) => return Arc::clone(existing),
            Some(Node::PlaceHolder(holder)) => Some(std::mem::take(&mut holder.children)),
            None => None,
        };

        registry.insert(name.to_owned(), Node::Logger(Arc::clone(&logger)));
        if let Some(children) = pending {
            fixup_children(&registry, &logger, &children);
        }
        fixup_parents(&mut registry, &logger);
        drop(registry);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: TARGET,
            logger = name,
            parent = ?logger.parent().map(|parent| parent.name().to_owned()),
            "registered logger"
        );

        logger
    }

    /// The root logger.
    pub fn root(&self) -> Arc<Logger> {
        self.get_logger(ROOT_NAME)
    }

    fn create(&self, name: &str) -> Logger {
        let factory = Arc::clone(&sync::read(&self.logger_factory));
        let created = factory.create(name);
        let logger = if created.name() == name {
            created
        } else {
            let _ = writeln!(
                io::stderr().lock(),
                "logger factory returned \"{}\" for \"{name}\"; using a default logger",
                created.name()
            );

            #[cfg(feature = "tracing")]
            tracing::warn!(target: TARGET, requested = name, returned = created.name(), "misnamed logger replaced");

            Logger::new(name)
        };
        logger.attach(&self.shared);
        logger
    }

    /// Sets the global disable floor.
    ///
    /// Every logger of this manager rejects events at or below `level`
    /// regardless of its own settings. `NOTSET` lifts the floor.
    pub fn disable(&self, level: Level) {
        self.shared.disable.store(level.as_u8(), Ordering::Relaxed);

        #[cfg(feature = "tracing")]
        tracing::debug!(target: TARGET, floor = %level, "disable floor changed");
    }

    /// The current disable floor.
    #[must_use]
    pub fn disable_floor(&self) -> Level {
        self.shared.disable_floor()
    }

    /// Controls whether the one-time "no handlers" notice is written.
    pub fn set_raise_exceptions(&self, raise: bool) {
        self.shared.raise_exceptions.store(raise, Ordering::Relaxed);
    }

    /// Whether the one-time "no handlers" notice is enabled.
    #[must_use]
    pub fn raise_exceptions(&self) -> bool {
        self.shared.raise_exceptions()
    }

    /// Installs the factory used for loggers created from now on.
    ///
    /// Loggers that already exist keep their concrete construction.
    pub fn set_logger_class(&self, factory: impl LoggerFactory + 'static) {
        *sync::write(&self.logger_factory) = Arc::new(factory);
    }

    /// Installs the factory used for records built from now on, by every
    /// logger of this manager.
    pub fn set_log_record_class(&self, factory: impl RecordFactory + 'static) {
        *sync::write(&self.shared.record_factory) = Arc::new(factory);
    }

    /// What occupies the slot for `name`, if anything.
    #[must_use]
    pub fn node_kind(&self, name: &str) -> Option<NodeKind> {
        sync::lock(&self.registry).get(name).map(|node| match node {
            Node::Logger(_) => NodeKind::Logger,
            Node::PlaceHolder(_) => NodeKind::PlaceHolder,
        })
    }

    /// Names of the loggers a placeholder is waiting to adopt, sorted.
    ///
    /// Returns `None` when `name` is not a placeholder.
    #[must_use]
    pub fn placeholder_children(&self, name: &str) -> Option<Vec<String>> {
        match sync::lock(&self.registry).get(name) {
            Some(Node::PlaceHolder(holder)) => Some(holder.children.iter().cloned().collect()),
            _ => None,
        }
    }

    /// Names of every real logger, sorted.
    #[must_use]
    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = sync::lock(&self.registry)
            .iter()
            .filter(|(_, node)| matches!(node, Node::Logger(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Flushes and closes every handler attached to any logger, once each.
    pub fn shutdown(&self) {
        let loggers: Vec<Arc<Logger>> = sync::lock(&self.registry)
            .values()
            .filter_map(|node| match node {
                Node::Logger(logger) => Some(Arc::clone(logger)),
                Node::PlaceHolder(_) => None,
            })
            .collect();

        let mut seen: Vec<Arc<dyn Handler>> = Vec::new();
        for logger in &loggers {
            for handler in logger.handlers() {
                if seen.iter().any(|other| same_handler(other, &handler)) {
                    continue;
                }
                handler.flush();
                handler.close();
                seen.push(handler);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(target: TARGET, handlers = seen.len(), "logging shut down");
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("loggers", &self.logger_names())
            .field("disable", &self.disable_floor())
            .field("raise_exceptions", &self.raise_exceptions())
            .finish_non_exhaustive()
    }
}

/// Points `logger` at its nearest existing ancestor, registering it as a
/// pending child of every placeholder passed on the way up.
fn fixup_parents(registry: &mut HashMap<String, Node>, logger: &Arc<Logger>) {
    let name = logger.name();
    let mut parent = None;
    let mut cut = name.rfind('.');

    while let Some(index) = cut {
        let prefix = &name[..index];
        match registry.get_mut(prefix) {
            Some(Node::Logger(found)) => {
                parent = Some(Arc::clone(found));
                break;
            }
            Some(Node::PlaceHolder(holder)) => {
                holder.children.insert(name.to_owned());
            }
            None => {
                let mut holder = PlaceHolder::default();
                holder.children.insert(name.to_owned());
                registry.insert(prefix.to_owned(), Node::PlaceHolder(holder));

                #[cfg(feature = "tracing")]
                tracing::trace!(target: TARGET, placeholder = prefix, child = name, "inserted placeholder");
            }
        }
        cut = prefix.rfind('.');
    }

    logger.set_parent(parent.as_ref());
}

/// Adopts the pending children of a replaced placeholder.
///
/// A child whose current parent already lies below `logger` keeps it; the
/// rest are re-pointed at `logger`.
fn fixup_children(registry: &HashMap<String, Node>, logger: &Arc<Logger>, children: &BTreeSet<String>) {
    let name = logger.name();
    for child_name in children {
        let Some(Node::Logger(child)) = registry.get(child_name) else {
            continue;
        };
        let keeps_deeper_parent = child
            .parent()
            .is_some_and(|parent| is_descendant(parent.name(), name));
        if !keeps_deeper_parent {
            child.set_parent(Some(logger));

            #[cfg(feature = "tracing")]
            tracing::trace!(target: TARGET, child = child_name.as_str(), parent = name, "re-parented logger");
        }
    }
}

fn is_descendant(name: &str, ancestor: &str) -> bool {
    name.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent_name(logger: &Logger) -> Option<String> {
        logger.parent().map(|parent| parent.name().to_owned())
    }

    #[test]
    fn same_name_returns_same_instance() {
        let manager = Manager::new();
        let a = manager.get_logger("svc.db");
        let b = manager.get_logger("svc.db");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn empty_name_is_root() {
        let manager = Manager::new();
        assert!(Arc::ptr_eq(&manager.get_logger(""), &manager.root()));
        assert_eq!(manager.root().name(), ROOT_NAME);
    }

    #[test]
    fn top_level_names_have_no_parent() {
        let manager = Manager::new();
        manager.root();
        assert!(manager.get_logger("app").parent().is_none());
    }

    #[test]
    fn deep_name_creates_placeholders() {
        let manager = Manager::new();
        let leaf = manager.get_logger("a.b.c.d");

        assert!(leaf.parent().is_none());
        for prefix in ["a", "a.b", "a.b.c"] {
            assert_eq!(manager.node_kind(prefix), Some(NodeKind::PlaceHolder));
            assert_eq!(
                manager.placeholder_children(prefix),
                Some(vec!["a.b.c.d".to_owned()])
            );
        }
    }

    #[test]
    fn placeholder_is_replaced_and_children_adopted() {
        let manager = Manager::new();
        let leaf = manager.get_logger("a.b.c.d");
        let mid = manager.get_logger("a.b.c");

        assert_eq!(manager.node_kind("a.b.c"), Some(NodeKind::Logger));
        assert!(Arc::ptr_eq(&leaf.parent().unwrap(), &mid));
        assert!(mid.parent().is_none());
        assert_eq!(
            manager.placeholder_children("a.b"),
            Some(vec!["a.b.c".to_owned(), "a.b.c.d".to_owned()])
        );
    }

    #[test]
    fn adoption_keeps_deeper_parents() {
        let manager = Manager::new();
        let leaf = manager.get_logger("a.b.c.d");
        let mid = manager.get_logger("a.b.c");
        let top = manager.get_logger("a.b");

        assert_eq!(parent_name(&leaf).as_deref(), Some("a.b.c"));
        assert!(Arc::ptr_eq(&mid.parent().unwrap(), &top));
        assert_eq!(manager.placeholder_children("a"), Some(vec![
            "a.b".to_owned(),
            "a.b.c".to_owned(),
            "a.b.c.d".to_owned(),
        ]));
    }

    #[test]
    fn ancestor_first_links_directly() {
        let manager = Manager::new();
        let top = manager.get_logger("net");
        let leaf = manager.get_logger("net.http.client");

        assert!(Arc::ptr_eq(&leaf.parent().unwrap(), &top));
        assert_eq!(manager.node_kind("net.http"), Some(NodeKind::PlaceHolder));

        let mid = manager.get_logger("net.http");
        assert!(Arc::ptr_eq(&leaf.parent().unwrap(), &mid));
        assert!(Arc::ptr_eq(&mid.parent().unwrap(), &top));
    }

    #[test]
    fn lookalike_prefixes_are_not_ancestors() {
        let manager = Manager::new();
        manager.get_logger("ab");
        let leaf = manager.get_logger("a.b");
        assert!(leaf.parent().is_none());
    }

    #[test]
    fn disable_floor_blocks_levels_at_or_below() {
        let manager = Manager::new();
        let logger = manager.get_logger("svc");
        logger.set_level(Level::Debug);

        manager.disable(Level::Error);
        assert!(!logger.is_enabled_for(Level::Error));
        assert!(logger.is_enabled_for(Level::Critical));

        manager.disable(Level::NotSet);
        assert!(logger.is_enabled_for(Level::Debug));
    }

    #[test]
    fn logger_factory_applies_to_new_loggers_only() {
        let manager = Manager::new();
        let before = manager.get_logger("before");
        manager.set_logger_class(|name: &str| {
            let logger = Logger::new(name);
            logger.set_level(Level::Error);
            logger
        });
        let after = manager.get_logger("after");

        assert_eq!(before.level(), Level::NotSet);
        assert_eq!(after.level(), Level::Error);
    }

    #[test]
    fn logger_names_lists_real_loggers() {
        let manager = Manager::new();
        manager.get_logger("x.y");
        manager.get_logger("z");
        assert_eq!(manager.logger_names(), vec!["x.y".to_owned(), "z".to_owned()]);
    }

    #[test]
    fn factory_may_call_back_into_manager() {
        let manager = Arc::new(Manager::new());
        let shared = Arc::downgrade(&manager);
        manager.set_logger_class(move |name: &str| {
            let logger = Logger::new(name);
            if name != "shared"
                && let Some(manager) = shared.upgrade()
            {
                for handler in manager.get_logger("shared").handlers() {
                    logger.add_handler(handler);
                }
            }
            logger
        });

        let (done, wait) = std::sync::mpsc::channel();
        let worker = Arc::clone(&manager);
        std::thread::spawn(move || {
            let _ = done.send(worker.get_logger("svc.db").name().to_owned());
        });

        let name = wait
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("get_logger blocked while the factory used the manager");
        assert_eq!(name, "svc.db");
        assert_eq!(manager.node_kind("shared"), Some(NodeKind::Logger));
        assert_eq!(manager.node_kind("svc"), Some(NodeKind::PlaceHolder));
    }

    #[test]
    fn misnamed_factory_logger_is_replaced() {
        let manager = Manager::new();
        manager.set_logger_class(|_: &str| Logger::new("wrong"));

        let logger = manager.get_logger("app.db");
        assert_eq!(logger.name(), "app.db");
        assert!(Arc::ptr_eq(&logger, &manager.get_logger("app.db")));
        assert_eq!(manager.node_kind("app"), Some(NodeKind::PlaceHolder));
        assert_eq!(manager.node_kind("wrong"), None);
    }
}
