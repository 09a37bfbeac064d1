use super::store::ANCHOR_PREFIX;
use super::{ParameterDatabase, ParameterPath, StoreId};
use crate::{EcError, Result};

use ahash::AHashMap;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

const PARENT: &str = "parent";

/// Splits one `key = value` line into its trimmed parts.
///
/// Blank lines, comments (`#`), lines without `=` and lines with
/// an empty key yield `None`.
///
/// # Examples
/// ```
/// use oxiec::params::parse_line;
///
/// assert_eq!(parse_line("  pop.subpops = 2 "), Some(("pop.subpops", "2")));
/// assert_eq!(parse_line("seed.0=x1F=raw"), Some(("seed.0", "x1F=raw")));
/// assert_eq!(parse_line("# a comment"), None);
/// assert_eq!(parse_line("no equals sign"), None);
/// ```
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

pub(super) fn is_parent_key(key: &str) -> bool {
    key.strip_prefix(PARENT)
        .and_then(|rest| rest.strip_prefix('.'))
        .map_or(false, |n| n.parse::<usize>().is_ok())
}

impl ParameterDatabase {
    /// Builds a database whose root holds the entries of `text`.
    /// `parent.N` entries are kept as plain values; no files are read.
    pub fn from_source(text: &str) -> ParameterDatabase {
        let mut db = ParameterDatabase::new();
        let root = db.root;
        db.read_into(root, text);
        db
    }

    /// Loads a parameter file and its `parent.N` ancestry under
    /// an empty root store.
    ///
    /// # Errors
    /// [`EcError::Io`] if any file in the hierarchy cannot be read.
    pub fn from_file(file: impl AsRef<Path>) -> Result<ParameterDatabase> {
        ParameterDatabase::load(file, std::iter::empty::<&str>())
    }

    /// Loads a parameter file hierarchy, then applies command-line
    /// style `key=value` overrides to the root store. Overrides win
    /// over any file value because they are local to the root.
    pub fn load<S: AsRef<str>>(
        file: impl AsRef<Path>,
        overrides: impl IntoIterator<Item = S>,
    ) -> Result<ParameterDatabase> {
        let mut db = ParameterDatabase::new();
        let top = db.load_file(file.as_ref())?;
        let root = db.root;
        db.add_parent(root, top);
        db.apply_overrides(overrides);
        Ok(db)
    }

    /// Loads `file` and its ancestry into new stores, returning
    /// the store of `file` itself. Each file is read once; a file
    /// referenced again becomes a shared parent.
    pub fn load_file(&mut self, file: &Path) -> Result<StoreId> {
        let mut loaded = AHashMap::new();
        self.load_file_once(file, &mut loaded)
    }

    fn load_file_once(
        &mut self,
        file: &Path,
        loaded: &mut AHashMap<PathBuf, StoreId>,
    ) -> Result<StoreId> {
        let io_error = |source| EcError::Io {
            path: file.to_path_buf(),
            source,
        };
        let canonical = fs::canonicalize(file).map_err(io_error)?;
        if let Some(id) = loaded.get(&canonical) {
            return Ok(*id);
        }
        let text = fs::read_to_string(&canonical).map_err(io_error)?;

        let id = self.add_file_store(&canonical);
        loaded.insert(canonical.clone(), id);
        self.read_into(id, &text);

        let directory = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
        let parent_base = ParameterPath::new(PARENT);
        for n in 0.. {
            let parent_file = match self.store(id).local(&parent_base.push_index(n)) {
                Some(value) => self.locate(value.trim(), &directory),
                None => break,
            };
            let parent = self.load_file_once(&parent_file, loaded)?;
            self.add_parent(id, parent);
        }
        debug!(
            "loaded parameter file {} ({} parents)",
            canonical.display(),
            self.store(id).parents().len()
        );
        Ok(id)
    }

    fn locate(&self, value: &str, directory: &Path) -> PathBuf {
        if let Some(anchored) = value.strip_prefix(ANCHOR_PREFIX) {
            return self.anchor.join(anchored);
        }
        let file = PathBuf::from(value);
        if file.is_absolute() {
            file
        } else {
            directory.join(file)
        }
    }

    fn read_into(&mut self, id: StoreId, text: &str) {
        for (number, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match parse_line(trimmed) {
                Some((key, value)) => {
                    self.stores[id.0]
                        .properties
                        .insert(ParameterPath::new(key).as_key().to_string(), value.to_string());
                }
                None => warn!("skipping malformed parameter line {}: {}", number + 1, trimmed),
            }
        }
    }

    /// Applies `key=value` overrides to the root store, returning
    /// how many were applied. Malformed entries are skipped.
    pub fn apply_overrides<S: AsRef<str>>(
        &mut self,
        overrides: impl IntoIterator<Item = S>,
    ) -> usize {
        let root = self.root;
        let mut applied = 0;
        for arg in overrides {
            match parse_line(arg.as_ref()) {
                Some((key, value)) => {
                    self.set(root, &ParameterPath::new(key), value);
                    applied += 1;
                }
                None => warn!("ignoring malformed parameter override `{}`", arg.as_ref()),
            }
        }
        applied
    }
}
