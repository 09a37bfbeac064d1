//! Hierarchical parameter databases.
//!
//! A [`ParameterDatabase`] is a graph of [`ParameterStore`]s. Each
//! store holds its own `key = value` pairs and an ordered list of
//! parent stores; a key missing from a store is looked up in its
//! parents, depth-first and in declaration order. Parent graphs may
//! share ancestors or even loop back on themselves: every lookup
//! visits each store at most once.
//!
//! Operators read their configuration in `setup` through the
//! database's accessors, which take a primary path and an optional
//! *default* path consulted only when the primary one is absent.
mod events;
mod loader;
mod parse;
mod path;
mod store;

pub use events::{ParameterEvent, ParameterEventKind, ParameterListener};
pub use loader::parse_line;
pub use parse::{parse_int, parse_long, ParamNumber};
pub use path::ParameterPath;
pub use store::{ParameterStore, StoreId, StoreRef, ANCHOR_PREFIX};

use crate::Result;
use events::ParameterEventKind::Set;

use log::info;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Root key that switches on resolution tracing.
pub const PRINT_PARAMS: &str = "print-params";

/// A graph of parameter stores with a distinguished root.
///
/// # Examples
/// ```
/// use oxiec::params::{ParameterDatabase, ParameterPath};
///
/// let db = ParameterDatabase::from_source(
///     "select.tournament.size = 2\n\
///      pop.subpop.0.species.pipe.source.0.size = 7\n",
/// );
///
/// let base = ParameterPath::new("pop.subpop.0.species.pipe.source.0");
/// let def = ParameterPath::new("select.tournament");
///
/// // Found directly.
/// assert_eq!(db.get_int_min(&base.push("size"), Some(&def.push("size")), 1), 7);
/// // Absent under `base`, found through the default path.
/// let other = ParameterPath::new("pop.subpop.1.species.pipe");
/// assert_eq!(db.get_int_min(&other.push("size"), Some(&def.push("size")), 1), 2);
/// ```
#[derive(Debug)]
pub struct ParameterDatabase {
    stores: Vec<ParameterStore>,
    root: StoreId,
    anchor: PathBuf,
    print_params: OnceLock<bool>,
}

impl ParameterDatabase {
    /// Returns a database holding a single, empty root store.
    pub fn new() -> ParameterDatabase {
        ParameterDatabase {
            stores: vec![ParameterStore::default()],
            root: StoreId(0),
            anchor: PathBuf::new(),
            print_params: OnceLock::new(),
        }
    }

    pub fn root(&self) -> StoreRef<'_> {
        self.store(self.root)
    }

    /// # Panics
    /// If `id` belongs to another database.
    pub fn store(&self, id: StoreId) -> StoreRef<'_> {
        assert!(id.0 < self.stores.len(), "unknown store {:?}", id);
        StoreRef { db: self, id }
    }

    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    /// Adds an empty store with no parents.
    pub fn add_store(&mut self) -> StoreId {
        self.stores.push(ParameterStore::default());
        StoreId(self.stores.len() - 1)
    }

    /// Adds an empty store recorded as defined by `file`, so that
    /// relative file parameters in it resolve against its directory.
    pub fn add_file_store(&mut self, file: &Path) -> StoreId {
        self.stores.push(ParameterStore::defined_by(file));
        StoreId(self.stores.len() - 1)
    }

    /// Appends `parent` to `child`'s parent list.
    pub fn add_parent(&mut self, child: StoreId, parent: StoreId) {
        self.stores[child.0].parents.push(parent);
    }

    /// Sets a local value on a store, notifying its listeners.
    pub fn set(&mut self, id: StoreId, path: &ParameterPath, value: impl Into<String>) {
        let value = value.into();
        let store = &mut self.stores[id.0];
        store.listeners.fire(Set, path, Some(&value));
        store.properties.insert(path.as_key().to_string(), value);
        if path.as_key() == PRINT_PARAMS {
            self.print_params = OnceLock::new();
        }
    }

    /// Removes a local value, returning it.
    pub fn remove(&mut self, id: StoreId, path: &ParameterPath) -> Option<String> {
        self.stores[id.0].properties.remove(path.as_key())
    }

    pub fn add_listener(&mut self, id: StoreId, listener: ParameterListener) {
        self.stores[id.0].listeners.add(listener);
    }

    /// Sets the directory that `$`-prefixed file parameters
    /// resolve against.
    pub fn set_anchor(&mut self, anchor: impl Into<PathBuf>) {
        self.anchor = anchor.into();
    }

    /// Stores reachable from the root, each once, in lookup order.
    fn reachable(&self) -> Vec<StoreId> {
        let mut visited = vec![false; self.stores.len()];
        let mut order = vec![];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut visited[id.0], true) {
                continue;
            }
            order.push(id);
            stack.extend(self.stores[id.0].parents.iter().rev());
        }
        order
    }

    /// Keys defined anywhere under the root that were never read
    /// through it. Parent declarations are not reported.
    pub fn unaccessed_keys(&self) -> Vec<String> {
        let root = &self.stores[self.root.0];
        self.defined_keys()
            .into_iter()
            .filter(|k| !root.was_accessed(k))
            .collect()
    }

    /// Keys defined anywhere under the root whose values were
    /// never fetched through it.
    pub fn ungotten_keys(&self) -> Vec<String> {
        let root = &self.stores[self.root.0];
        self.defined_keys()
            .into_iter()
            .filter(|k| !root.was_gotten(k))
            .collect()
    }

    fn defined_keys(&self) -> BTreeSet<String> {
        self.reachable()
            .into_iter()
            .flat_map(|id| self.stores[id.0].properties.keys())
            .filter(|k| !loader::is_parent_key(k))
            .cloned()
            .collect()
    }

    fn print_params(&self) -> bool {
        *self.print_params.get_or_init(|| {
            self.root()
                .resolve(&ParameterPath::new(PRINT_PARAMS))
                .map_or(false, |v| !v.eq_ignore_ascii_case("false"))
        })
    }

    /// Chooses between the primary and default path: the first
    /// one that resolves from the root, if any.
    fn pick<'p>(
        &self,
        path: &'p ParameterPath,
        default: Option<&'p ParameterPath>,
        tag: &str,
    ) -> Option<&'p ParameterPath> {
        let root = self.root();
        let direct = root.resolve(path);
        let fallback = match (&direct, default) {
            (None, Some(default)) => root.resolve(default),
            _ => None,
        };

        if self.print_params() {
            match (&direct, default, &fallback) {
                (Some(value), _, _) => {
                    info!(target: "oxiec::params", "\t {}: {} = {}", tag, path, value);
                    if let Some(default) = default {
                        info!(target: "oxiec::params", "\t<{}: {}", tag, default);
                    }
                }
                (None, Some(default), Some(value)) => {
                    info!(target: "oxiec::params", "\t!{}: {}", tag, path);
                    info!(target: "oxiec::params", "\t {}: {} = {}", tag, default, value);
                }
                (None, default, _) => {
                    info!(target: "oxiec::params", "\t!{}: {}", tag, path);
                    if let Some(default) = default {
                        info!(target: "oxiec::params", "\t!{}: {}", tag, default);
                    }
                }
            }
        }

        if direct.is_some() {
            Some(path)
        } else if fallback.is_some() {
            default
        } else {
            None
        }
    }

    pub fn exists(&self, path: &ParameterPath, default: Option<&ParameterPath>) -> bool {
        self.pick(path, default, "E")
            .map_or(false, |chosen| self.root().exists(chosen))
    }

    pub fn get_string(
        &self,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
    ) -> Option<String> {
        self.pick(path, default, "P")
            .and_then(|chosen| self.root().get_string(chosen))
    }

    pub fn get_string_with_default(
        &self,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
        value: &str,
    ) -> String {
        self.get_string(path, default)
            .unwrap_or_else(|| value.trim().to_string())
    }

    pub fn get_boolean(
        &self,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
        value: bool,
    ) -> bool {
        self.pick(path, default, "P")
            .map_or(value, |chosen| self.root().get_boolean(chosen, value))
    }

    pub fn get_file(
        &self,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
    ) -> Option<PathBuf> {
        self.pick(path, default, "P")
            .and_then(|chosen| self.root().get_file(chosen))
    }

    /// Strict numeric read.
    ///
    /// # Errors
    /// [`ParameterMissing`](crate::EcError::ParameterMissing) naming
    /// `path` if neither path resolves; [`BadFormat`](crate::EcError::BadFormat)
    /// if the value found does not parse.
    pub fn get_number<T: ParamNumber>(
        &self,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
    ) -> Result<T> {
        self.root()
            .get_number(self.pick(path, default, "P").unwrap_or(path))
    }

    /// Returns `min - 1` if missing, unparsable or outside `[min, max]`.
    pub fn get_number_bounded<T: ParamNumber>(
        &self,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
        min: T,
        max: Option<T>,
    ) -> T {
        match self.pick(path, default, "P") {
            Some(chosen) => self.root().get_number_bounded(chosen, min, max),
            None => T::below(min),
        }
    }

    pub fn get_number_with_default<T: ParamNumber>(
        &self,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
        value: T,
    ) -> T {
        match self.pick(path, default, "P") {
            Some(chosen) => self.root().get_number_with_default(chosen, value),
            None => value,
        }
    }

    pub fn get_int(&self, path: &ParameterPath, default: Option<&ParameterPath>) -> Result<i32> {
        self.get_number(path, default)
    }

    pub fn get_int_min(
        &self,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
        min: i32,
    ) -> i32 {
        self.get_number_bounded(path, default, min, None)
    }

    pub fn get_int_with_max(
        &self,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
        min: i32,
        max: i32,
    ) -> i32 {
        self.get_number_bounded(path, default, min, Some(max))
    }

    pub fn get_int_with_default(
        &self,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
        value: i32,
    ) -> i32 {
        self.get_number_with_default(path, default, value)
    }

    pub fn get_long(&self, path: &ParameterPath, default: Option<&ParameterPath>) -> Result<i64> {
        self.get_number(path, default)
    }

    pub fn get_long_with_default(
        &self,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
        value: i64,
    ) -> i64 {
        self.get_number_with_default(path, default, value)
    }

    pub fn get_double(&self, path: &ParameterPath, default: Option<&ParameterPath>) -> Result<f64> {
        self.get_number(path, default)
    }

    pub fn get_double_min(
        &self,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
        min: f64,
    ) -> f64 {
        self.get_number_bounded(path, default, min, None)
    }

    pub fn get_double_with_max(
        &self,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
        min: f64,
        max: f64,
    ) -> f64 {
        self.get_number_bounded(path, default, min, Some(max))
    }

    pub fn get_double_with_default(
        &self,
        path: &ParameterPath,
        default: Option<&ParameterPath>,
        value: f64,
    ) -> f64 {
        self.get_number_with_default(path, default, value)
    }

    pub fn get_float(&self, path: &ParameterPath, default: Option<&ParameterPath>) -> Result<f32> {
        self.get_number(path, default)
    }
}

impl Default for ParameterDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EcError;
    use std::sync::{Arc, Mutex};

    fn p(s: &str) -> ParameterPath {
        ParameterPath::new(s)
    }

    #[test]
    fn default_path_only_consulted_when_primary_missing() {
        let db = ParameterDatabase::from_source(
            "a.likelihood = 0.25\n\
             def.likelihood = 0.75\n\
             def.size = 3\n",
        );
        let def = p("def");
        assert_eq!(
            db.get_double(&p("a.likelihood"), Some(&def.push("likelihood")))
                .unwrap(),
            0.25
        );
        assert_eq!(db.get_int(&p("a.size"), Some(&def.push("size"))).unwrap(), 3);
        assert!(db.exists(&p("a.size"), Some(&def.push("size"))));
        assert!(!db.exists(&p("a.size"), None));
    }

    #[test]
    fn strict_missing_names_primary_path() {
        let db = ParameterDatabase::new();
        match db.get_int(&p("pop.subpops"), Some(&p("def.subpops"))) {
            Err(EcError::ParameterMissing { path }) => assert_eq!(path, p("pop.subpops")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bounded_and_defaulted_through_facade() {
        let db = ParameterDatabase::from_source("size = 0\nprob = 1.5\nbad = x\n");
        assert_eq!(db.get_int_min(&p("size"), None, 1), 0);
        assert_eq!(db.get_int_min(&p("missing"), None, 1), 0);
        assert_eq!(db.get_double_with_max(&p("prob"), None, 0.0, 1.0), -1.0);
        assert_eq!(db.get_int_with_default(&p("bad"), None, 5), 5);
        assert_eq!(db.get_string_with_default(&p("missing"), None, " same "), "same");
        assert!(db.get_boolean(&p("missing"), None, true));
    }

    #[test]
    fn listeners_see_sets_and_reads() {
        let seen = Arc::new(Mutex::new(vec![]));
        let mut db = ParameterDatabase::new();
        let root = db.root().id();
        let sink = Arc::clone(&seen);
        db.add_listener(
            root,
            Box::new(move |e: &ParameterEvent| sink.lock().unwrap().push(e.clone())),
        );
        db.set(root, &p("k"), "v");
        assert_eq!(db.get_string(&p("k"), None).as_deref(), Some("v"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].kind, ParameterEventKind::Set);
        assert_eq!(seen[1].kind, ParameterEventKind::Accessed);
        assert_eq!(seen[1].value.as_deref(), Some("v"));
    }

    #[test]
    fn unaccessed_keys_report_unused_configuration() {
        let mut db = ParameterDatabase::new();
        let root = db.root().id();
        let parent = db.add_store();
        db.add_parent(root, parent);
        db.add_parent(parent, root);
        db.set(parent, &p("used"), "1");
        db.set(parent, &p("unused"), "2");
        db.set(root, &p("checked"), "3");

        db.get_int(&p("used"), None).unwrap();
        assert!(db.exists(&p("checked"), None));

        assert_eq!(db.unaccessed_keys(), vec!["unused"]);
        assert_eq!(db.ungotten_keys(), vec!["checked", "unused"]);
    }

    #[test]
    fn print_params_toggle_is_reread_after_set() {
        let mut db = ParameterDatabase::new();
        assert!(!db.print_params());
        let root = db.root().id();
        db.set(root, &p(PRINT_PARAMS), "true");
        assert!(db.print_params());
        db.set(root, &p(PRINT_PARAMS), "False");
        assert!(!db.print_params());
    }
}
