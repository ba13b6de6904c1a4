//! crates/logtree/src/filter.rs
//! Logger-name prefix filters and the ordered filter chain shared by loggers
//! and handlers.

use std::sync::{Arc, RwLock};

use crate::record::LogRecord;
use crate::sync;

/// Admits records whose logger name sits at or below a namespace prefix.
///
/// An empty prefix admits everything. A prefix of `"A.B"` admits `"A.B"` and
/// `"A.B.C"` but not `"A.BB"`: the character following the prefix in the
/// record's name must be a dot.
///
/// # Examples
///
/// ```
/// use logtree::{Filter, Level, LogRecord};
///
/// let filter = Filter::new("A.B");
/// assert!(filter.filter(&LogRecord::new("A.B.C", Level::Info, "x", ())));
/// assert!(!filter.filter(&LogRecord::new("A.BB", Level::Info, "x", ())));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    name: String,
}

impl Filter {
    /// Creates a filter for the given namespace prefix.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The namespace prefix captured at construction.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` when the record should be admitted.
    #[must_use]
    pub fn filter(&self, record: &LogRecord) -> bool {
        self.admits_name(record.name())
    }

    /// Applies the prefix rule to a bare logger name.
    #[must_use]
    pub fn admits_name(&self, name: &str) -> bool {
        if self.name.is_empty() || self.name == name {
            return true;
        }
        name.strip_prefix(self.name.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// Ordered set of [`Filter`]s evaluated as a conjunction.
///
/// Membership is by identity: attaching the same `Arc<Filter>` twice keeps a
/// single entry, and removing a filter that is not attached does nothing.
#[derive(Debug, Default)]
pub struct Filterer {
    filters: RwLock<Vec<Arc<Filter>>>,
}

impl Filterer {
    /// Creates an empty chain that admits every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a filter unless that exact filter is already attached.
    pub fn add_filter(&self, filter: Arc<Filter>) {
        let mut filters = sync::write(&self.filters);
        if !filters.iter().any(|existing| Arc::ptr_eq(existing, &filter)) {
            filters.push(filter);
        }
    }

    /// Detaches a filter; absent filters are ignored.
    pub fn remove_filter(&self, filter: &Arc<Filter>) {
        sync::write(&self.filters).retain(|existing| !Arc::ptr_eq(existing, filter));
    }

    /// Snapshot of the attached filters in attachment order.
    #[must_use]
    pub fn filters(&self) -> Vec<Arc<Filter>> {
        sync::read(&self.filters).clone()
    }

    /// Returns `true` only if every attached filter admits the record.
    ///
    /// Filters run in attachment order and evaluation stops at the first
    /// rejection.
    #[must_use]
    pub fn filter(&self, record: &LogRecord) -> bool {
        sync::read(&self.filters)
            .iter()
            .all(|filter| filter.filter(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use proptest::prelude::*;

    fn named(name: &str) -> LogRecord {
        LogRecord::new(name, Level::Info, "msg", ())
    }

    #[test]
    fn prefix_filter_accepts_self_and_descendants() {
        let filter = Filter::new("A.B");
        assert!(filter.filter(&named("A.B")));
        assert!(filter.filter(&named("A.B.C")));
    }

    #[test]
    fn prefix_filter_rejects_lookalikes_and_ancestors() {
        let filter = Filter::new("A.B");
        assert!(!filter.filter(&named("A.BB")));
        assert!(!filter.filter(&named("B.A.B")));
        assert!(!filter.filter(&named("A")));
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let filter = Filter::default();
        assert!(filter.filter(&named("anything.at.all")));
        assert!(filter.filter(&named("")));
    }

    #[test]
    fn filterer_without_filters_accepts() {
        assert!(Filterer::new().filter(&named("x")));
    }

    #[test]
    fn every_filter_must_accept() {
        let chain = Filterer::new();
        chain.add_filter(Arc::new(Filter::new("app")));
        chain.add_filter(Arc::new(Filter::new("app.db")));

        assert!(chain.filter(&named("app.db.pool")));
        assert!(!chain.filter(&named("app.http")));
    }

    #[test]
    fn second_filter_is_consulted_when_first_accepts() {
        let chain = Filterer::new();
        chain.add_filter(Arc::new(Filter::default()));
        chain.add_filter(Arc::new(Filter::new("only.this")));

        assert!(!chain.filter(&named("other")));
    }

    #[test]
    fn duplicate_add_and_absent_remove_are_no_ops() {
        let chain = Filterer::new();
        let filter = Arc::new(Filter::new("a"));
        chain.add_filter(Arc::clone(&filter));
        chain.add_filter(Arc::clone(&filter));
        assert_eq!(chain.filters().len(), 1);

        chain.remove_filter(&Arc::new(Filter::new("a")));
        assert_eq!(chain.filters().len(), 1);

        chain.remove_filter(&filter);
        assert!(chain.filters().is_empty());
    }

    proptest! {
        #[test]
        fn descendants_always_pass(prefix in "[a-z]{1,6}(\\.[a-z]{1,6}){0,3}", suffix in "[a-z]{1,6}") {
            let filter = Filter::new(prefix.clone());
            let child = format!("{prefix}.{suffix}");
            prop_assert!(filter.admits_name(&prefix));
            prop_assert!(filter.admits_name(&child));
        }

        #[test]
        fn extended_last_segment_never_passes(prefix in "[a-z]{1,6}(\\.[a-z]{1,6}){0,3}", tail in "[a-z0-9]{1,4}") {
            let filter = Filter::new(prefix.clone());
            let lookalike = format!("{prefix}{tail}");
            prop_assert!(!filter.admits_name(&lookalike));
        }
    }
}
