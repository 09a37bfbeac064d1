use super::events::{Listeners, ParameterEventKind};
use super::{ParamNumber, ParameterDatabase, ParameterPath};
use crate::{EcError, Result};

use ahash::{AHashMap, AHashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Leading marker on file parameters that resolves the
/// rest of the value against the database anchor.
pub const ANCHOR_PREFIX: char = '$';

/// Identifies a store inside its [`ParameterDatabase`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreId(pub(super) usize);

/// A node of the parameter graph: local key/value pairs plus
/// an ordered list of parent stores consulted when a key is
/// absent locally. Parents may form diamonds and cycles.
#[derive(Debug, Default)]
pub struct ParameterStore {
    pub(super) properties: AHashMap<String, String>,
    pub(super) parents: Vec<StoreId>,
    pub(super) directory: Option<PathBuf>,
    pub(super) file_name: Option<String>,
    pub(super) listeners: Listeners,
    accessed: Mutex<AHashSet<String>>,
    gotten: Mutex<AHashSet<String>>,
}

impl ParameterStore {
    pub(super) fn defined_by(file: &Path) -> ParameterStore {
        ParameterStore {
            directory: file.parent().map(Path::to_path_buf),
            file_name: file.file_name().map(|n| n.to_string_lossy().into_owned()),
            ..ParameterStore::default()
        }
    }

    fn mark(&self, key: &str, gotten: bool) {
        self.accessed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string());
        if gotten {
            self.gotten
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key.to_string());
        }
    }

    pub(super) fn was_accessed(&self, key: &str) -> bool {
        self.accessed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    pub(super) fn was_gotten(&self, key: &str) -> bool {
        self.gotten
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// Depth-first, parent-ordered lookup. `visited` is private to one
/// outer call, so cyclic graphs terminate and concurrent lookups
/// never interfere.
pub(super) fn resolve_in(
    stores: &[ParameterStore],
    id: StoreId,
    key: &str,
    visited: &mut [bool],
) -> Option<String> {
    if std::mem::replace(&mut visited[id.0], true) {
        return None;
    }
    let store = &stores[id.0];
    match store.properties.get(key) {
        // A blank local value shadows the parents.
        Some(value) => Some(value.trim())
            .filter(|v| !v.is_empty())
            .map(String::from),
        None => store
            .parents
            .iter()
            .find_map(|parent| resolve_in(stores, *parent, key, visited)),
    }
}

/// Finds the store that defines `key` locally, with the same
/// traversal order as [`resolve_in`].
pub(super) fn definer_in(
    stores: &[ParameterStore],
    id: StoreId,
    key: &str,
    visited: &mut [bool],
) -> Option<StoreId> {
    if std::mem::replace(&mut visited[id.0], true) {
        return None;
    }
    let store = &stores[id.0];
    if store.properties.contains_key(key) {
        return Some(id);
    }
    store
        .parents
        .iter()
        .find_map(|parent| definer_in(stores, *parent, key, visited))
}

/// A borrowed view of one store, offering cascading lookup
/// and typed accessors.
///
/// # Examples
/// ```
/// use oxiec::params::{ParameterDatabase, ParameterPath};
///
/// let mut db = ParameterDatabase::new();
/// let a = db.root().id();
/// let b = db.add_store();
/// db.set(a, &"x".into(), "1");
/// db.set(b, &"x".into(), "2");
/// db.set(b, &"y".into(), "3");
/// db.add_parent(a, b);
///
/// let store = db.store(a);
/// assert_eq!(store.resolve(&"x".into()).as_deref(), Some("1"));
/// assert_eq!(store.resolve(&"y".into()).as_deref(), Some("3"));
/// assert!(!store.exists(&ParameterPath::new("z")));
/// ```
#[derive(Clone, Copy)]
pub struct StoreRef<'a> {
    pub(super) db: &'a ParameterDatabase,
    pub(super) id: StoreId,
}

impl<'a> StoreRef<'a> {
    pub fn id(&self) -> StoreId {
        self.id
    }

    fn node(&self) -> &'a ParameterStore {
        &self.db.stores[self.id.0]
    }

    pub fn parents(&self) -> &'a [StoreId] {
        &self.node().parents
    }

    /// Directory of the file that defined this store, if any.
    pub fn directory(&self) -> Option<&'a Path> {
        self.node().directory.as_deref()
    }

    /// The value stored locally under `path`, untrimmed.
    pub fn local(&self, path: &ParameterPath) -> Option<&'a str> {
        self.node().properties.get(path.as_key()).map(String::as_str)
    }

    pub fn local_keys(&self) -> impl Iterator<Item = &'a str> {
        self.node().properties.keys().map(String::as_str)
    }

    /// Resolves `path` through this store and its ancestors.
    /// Returns the trimmed value, or `None` if no store on the
    /// way holds a non-blank value. Does not touch bookkeeping.
    pub fn resolve(&self, path: &ParameterPath) -> Option<String> {
        let mut visited = vec![false; self.db.stores.len()];
        resolve_in(&self.db.stores, self.id, path.as_key(), &mut visited)
    }

    /// Whether `path` resolves to a value.
    pub fn exists(&self, path: &ParameterPath) -> bool {
        let found = self.resolve(path);
        if let Some(value) = &found {
            self.node().mark(path.as_key(), false);
            self.node()
                .listeners
                .fire(ParameterEventKind::Accessed, path, Some(value));
        }
        found.is_some()
    }

    /// Resolves `path`, recording it as accessed and gotten.
    fn take(&self, path: &ParameterPath) -> Option<String> {
        let found = self.resolve(path)?;
        self.node().mark(path.as_key(), true);
        self.node()
            .listeners
            .fire(ParameterEventKind::Accessed, path, Some(&found));
        Some(found)
    }

    /// Trimmed string value, or `None` if missing or blank.
    pub fn get_string(&self, path: &ParameterPath) -> Option<String> {
        self.take(path)
    }

    /// `false` iff the value is `"false"` (any case); `default`
    /// if the parameter is missing.
    pub fn get_boolean(&self, path: &ParameterPath, default: bool) -> bool {
        match self.take(path) {
            Some(value) => !value.eq_ignore_ascii_case("false"),
            None => default,
        }
    }

    /// Strict numeric read.
    ///
    /// # Errors
    /// [`EcError::ParameterMissing`] if nothing resolves,
    /// [`EcError::BadFormat`] if the value does not parse.
    pub fn get_number<T: ParamNumber>(&self, path: &ParameterPath) -> Result<T> {
        let value = self.take(path).ok_or_else(|| EcError::ParameterMissing {
            path: path.clone(),
        })?;
        T::parse_param(&value).ok_or_else(|| EcError::BadFormat {
            kind: T::KIND,
            value,
            path: path.clone(),
        })
    }

    /// Bounded numeric read: returns `min - 1` if the value is
    /// missing, does not parse, or lies outside `[min, max]`.
    /// With `max` set to `None` only the lower bound applies.
    pub fn get_number_bounded<T: ParamNumber>(
        &self,
        path: &ParameterPath,
        min: T,
        max: Option<T>,
    ) -> T {
        match self.take(path).and_then(|v| T::parse_param(&v)) {
            Some(value) if value >= min && max.map_or(true, |max| value <= max) => value,
            _ => T::below(min),
        }
    }

    /// Numeric read returning `default` if the value is
    /// missing or does not parse.
    pub fn get_number_with_default<T: ParamNumber>(&self, path: &ParameterPath, default: T) -> T {
        self.take(path)
            .and_then(|v| T::parse_param(&v))
            .unwrap_or(default)
    }

    /// Reads a file location.
    ///
    /// A value starting with `$` is taken relative to the database
    /// anchor; an absolute path is returned as-is; anything else is
    /// relative to the directory of the file that defined the key.
    pub fn get_file(&self, path: &ParameterPath) -> Option<PathBuf> {
        let value = self.take(path)?;
        if let Some(anchored) = value.strip_prefix(ANCHOR_PREFIX) {
            return Some(self.db.anchor.join(anchored));
        }
        let file = PathBuf::from(&value);
        if file.is_absolute() {
            return Some(file);
        }
        Some(match self.directory_for(path) {
            Some(directory) => directory.join(file),
            None => file,
        })
    }

    fn definer(&self, path: &ParameterPath) -> Option<&'a ParameterStore> {
        let mut visited = vec![false; self.db.stores.len()];
        definer_in(&self.db.stores, self.id, path.as_key(), &mut visited)
            .map(|id| &self.db.stores[id.0])
    }

    /// Directory of the file whose store defines `path`.
    pub fn directory_for(&self, path: &ParameterPath) -> Option<&'a Path> {
        self.definer(path)?.directory.as_deref()
    }

    /// The file whose store defines `path`.
    pub fn file_for(&self, path: &ParameterPath) -> Option<PathBuf> {
        let store = self.definer(path)?;
        let name = store.file_name.as_ref()?;
        Some(match &store.directory {
            Some(directory) => directory.join(name),
            None => PathBuf::from(name),
        })
    }

    /// Keys queried through this store that resolved.
    pub fn accessed_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .node()
            .accessed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Keys whose values were fetched through this store.
    pub fn gotten_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .node()
            .gotten
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> ParameterPath {
        ParameterPath::new(s)
    }

    /// Root `a` with parent `b`.
    fn two_level() -> (ParameterDatabase, StoreId, StoreId) {
        let mut db = ParameterDatabase::new();
        let a = db.root().id();
        let b = db.add_store();
        db.add_parent(a, b);
        (db, a, b)
    }

    #[test]
    fn local_shadows_parent() {
        let (mut db, a, b) = two_level();
        db.set(a, &p("x"), "1");
        db.set(b, &p("x"), "2");
        db.set(b, &p("y"), "3");

        let store = db.store(a);
        assert_eq!(store.resolve(&p("x")).as_deref(), Some("1"));
        assert_eq!(store.resolve(&p("y")).as_deref(), Some("3"));
        assert!(!store.exists(&p("z")));
        assert_eq!(db.store(b).resolve(&p("x")).as_deref(), Some("2"));
    }

    #[test]
    fn values_are_trimmed_and_blank_is_absent() {
        let (mut db, a, b) = two_level();
        db.set(a, &p("name"), "  tournament \t");
        db.set(a, &p("blank"), "   ");
        db.set(b, &p("blank"), "from parent");

        let store = db.store(a);
        assert_eq!(store.get_string(&p("name")).as_deref(), Some("tournament"));
        assert_eq!(store.get_string(&p("blank")), None);
        assert!(!store.exists(&p("blank")));
    }

    #[test]
    fn self_cycle_terminates() {
        let mut db = ParameterDatabase::new();
        let a = db.root().id();
        db.add_parent(a, a);
        assert!(!db.store(a).exists(&p("k")));
        assert_eq!(db.store(a).resolve(&p("k")), None);
    }

    #[test]
    fn parents_are_scanned_in_order_depth_first() {
        // a -> [b, c], b -> [d]; d and c both define k.
        let mut db = ParameterDatabase::new();
        let a = db.root().id();
        let (b, c, d) = (db.add_store(), db.add_store(), db.add_store());
        db.add_parent(a, b);
        db.add_parent(a, c);
        db.add_parent(b, d);
        db.set(d, &p("k"), "deep-first");
        db.set(c, &p("k"), "second-parent");
        assert_eq!(db.store(a).resolve(&p("k")).as_deref(), Some("deep-first"));
    }

    #[test]
    fn cycle_gives_same_answer_as_acyclic_graph() {
        let build = |with_cycle: bool| {
            let mut db = ParameterDatabase::new();
            let a = db.root().id();
            let (b, c) = (db.add_store(), db.add_store());
            db.add_parent(a, b);
            db.add_parent(b, c);
            if with_cycle {
                db.add_parent(c, a);
            }
            db.set(c, &p("found"), "yes");
            db
        };
        let acyclic = build(false);
        let cyclic = build(true);
        for key in ["found", "missing"] {
            assert_eq!(
                acyclic.root().resolve(&p(key)),
                cyclic.root().resolve(&p(key))
            );
        }
    }

    #[test]
    fn diamond_ancestor_visited_once() {
        // a -> [b, c], b -> [d], c -> [d]; d is the only definer.
        let mut db = ParameterDatabase::new();
        let a = db.root().id();
        let (b, c, d) = (db.add_store(), db.add_store(), db.add_store());
        db.add_parent(a, b);
        db.add_parent(a, c);
        db.add_parent(b, d);
        db.add_parent(c, d);
        db.set(d, &p("k"), "shared");
        assert_eq!(db.root().resolve(&p("k")).as_deref(), Some("shared"));

        let mut visited = vec![false; 4];
        assert_eq!(resolve_in(&db.stores, a, "missing", &mut visited), None);
        assert!(visited.iter().all(|v| *v));
    }

    #[test]
    fn strict_numbers() {
        let (mut db, a, _) = two_level();
        db.set(a, &p("n"), "x1A");
        db.set(a, &p("bad"), "4.5");
        let store = db.store(a);

        assert_eq!(store.get_number::<i32>(&p("n")).unwrap(), 26);
        assert!(matches!(
            store.get_number::<i32>(&p("missing")),
            Err(EcError::ParameterMissing { .. })
        ));
        assert!(matches!(
            store.get_number::<i64>(&p("bad")),
            Err(EcError::BadFormat { kind: "long", .. })
        ));
        assert_eq!(store.get_number::<f64>(&p("bad")).unwrap(), 4.5);
    }

    #[test]
    fn bounded_numbers_use_sentinel() {
        let (mut db, a, _) = two_level();
        db.set(a, &p("low"), "0");
        db.set(a, &p("edge-min"), "1");
        db.set(a, &p("edge-max"), "10");
        db.set(a, &p("high"), "11");
        db.set(a, &p("junk"), "ten");
        let store = db.store(a);

        let bounded = |key: &str| store.get_number_bounded(&p(key), 1, Some(10));
        assert_eq!(bounded("low"), 0);
        assert_eq!(bounded("edge-min"), 1);
        assert_eq!(bounded("edge-max"), 10);
        assert_eq!(bounded("high"), 0);
        assert_eq!(bounded("junk"), 0);
        assert_eq!(bounded("missing"), 0);

        assert_eq!(store.get_number_bounded(&p("high"), 1, None), 11);
        assert_eq!(store.get_number_bounded(&p("low"), 0.5, Some(1.0)), -0.5);
    }

    #[test]
    fn defaulted_numbers() {
        let (mut db, a, _) = two_level();
        db.set(a, &p("junk"), "ten");
        db.set(a, &p("ok"), "0.25");
        let store = db.store(a);
        assert_eq!(store.get_number_with_default(&p("junk"), 7), 7);
        assert_eq!(store.get_number_with_default(&p("missing"), 7i64), 7);
        assert_eq!(store.get_number_with_default(&p("ok"), 1.0f32), 0.25);
    }

    #[test]
    fn booleans() {
        let (mut db, a, _) = two_level();
        db.set(a, &p("f"), " FALSE ");
        db.set(a, &p("t"), "true");
        db.set(a, &p("other"), "no");
        let store = db.store(a);
        assert!(!store.get_boolean(&p("f"), true));
        assert!(store.get_boolean(&p("t"), false));
        assert!(store.get_boolean(&p("other"), false));
        assert!(store.get_boolean(&p("missing"), true));
        assert!(!store.get_boolean(&p("missing"), false));
    }

    #[test]
    fn files_resolve_against_defining_store() {
        let mut db = ParameterDatabase::new();
        let root = db.root().id();
        let file_store = db.add_file_store(Path::new("/configs/run/base.params"));
        db.add_parent(root, file_store);
        db.set(file_store, &p("stat.file"), "out.stat");
        db.set(file_store, &p("abs.file"), "/tmp/abs.stat");
        db.set(file_store, &p("here.file"), "$logs/run.stat");
        db.set(root, &p("cli.file"), "cli.stat");
        db.set_anchor("/work");

        let store = db.root();
        assert_eq!(
            store.get_file(&p("stat.file")),
            Some(PathBuf::from("/configs/run/out.stat"))
        );
        assert_eq!(store.get_file(&p("abs.file")), Some(PathBuf::from("/tmp/abs.stat")));
        assert_eq!(
            store.get_file(&p("here.file")),
            Some(PathBuf::from("/work/logs/run.stat"))
        );
        assert_eq!(store.get_file(&p("cli.file")), Some(PathBuf::from("cli.stat")));
        assert_eq!(store.get_file(&p("missing")), None);
        assert_eq!(
            store.file_for(&p("stat.file")),
            Some(PathBuf::from("/configs/run/base.params"))
        );
        assert_eq!(store.directory_for(&p("cli.file")), None);
    }

    #[test]
    fn bookkeeping_tracks_access() {
        let (mut db, a, b) = two_level();
        db.set(b, &p("checked"), "1");
        db.set(b, &p("fetched"), "2");
        let store = db.store(a);
        assert!(store.exists(&p("checked")));
        assert_eq!(store.get_number::<i32>(&p("fetched")).unwrap(), 2);
        assert!(!store.exists(&p("missing")));

        assert_eq!(store.accessed_keys(), vec!["checked", "fetched"]);
        assert_eq!(store.gotten_keys(), vec!["fetched"]);
    }

    #[test]
    fn concurrent_resolution() {
        let mut db = ParameterDatabase::new();
        let a = db.root().id();
        let b = db.add_store();
        db.add_parent(a, b);
        db.add_parent(b, a);
        for i in 0..50 {
            db.set(b, &p("k").push_index(i), &i.to_string());
        }
        let db = &db;
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(move || {
                    for i in 0..50 {
                        let v: i32 = db.root().get_number(&p("k").push_index(i)).unwrap();
                        assert_eq!(v, i as i32);
                        assert!(!db.root().exists(&p("absent").push_index(i)));
                    }
                });
            }
        });
    }
}
