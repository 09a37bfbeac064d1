use serde::{Deserialize, Serialize};

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A hierarchical parameter key, such as `pop.subpop.0.size`.
///
/// Paths are immutable: [`push`] returns a new path with one
/// more segment, leaving the original untouched. Two paths are
/// equal iff their segment sequences are equal (case-sensitive).
///
/// [`push`]: ParameterPath::push
///
/// # Examples
/// ```
/// use oxiec::params::ParameterPath;
///
/// let base = ParameterPath::new("pop.subpop");
/// let size = base.push("0").push("size");
///
/// assert_eq!(size.to_string(), "pop.subpop.0.size");
/// assert_eq!(size, ParameterPath::new("pop.subpop.0.size"));
/// assert_eq!(base.to_string(), "pop.subpop");
/// ```
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct ParameterPath {
    segments: Vec<String>,
    // Cached dotted form; store lookups are keyed by it.
    key: String,
}

impl ParameterPath {
    /// Parses a dotted path. Empty segments are dropped.
    pub fn new(dotted: &str) -> ParameterPath {
        ParameterPath::from_segments(
            dotted
                .split('.')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    fn from_segments(segments: Vec<String>) -> ParameterPath {
        let key = segments.join(".");
        ParameterPath { segments, key }
    }

    /// Returns a new path with `segment` appended.
    /// A dotted segment appends each of its parts.
    pub fn push(&self, segment: impl AsRef<str>) -> ParameterPath {
        let mut segments = self.segments.clone();
        segments.extend(
            segment
                .as_ref()
                .split('.')
                .filter(|s| !s.is_empty())
                .map(String::from),
        );
        ParameterPath::from_segments(segments)
    }

    /// Returns a new path with a numeric segment appended.
    pub fn push_index(&self, index: usize) -> ParameterPath {
        self.push(index.to_string())
    }

    /// Returns the path without its last segment, or `None`
    /// if the path is empty.
    pub fn pop(&self) -> Option<ParameterPath> {
        let (_, rest) = self.segments.split_last()?;
        Some(ParameterPath::from_segments(rest.to_vec()))
    }

    /// Returns the last segment.
    pub fn top(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The dotted form used as a store key.
    pub fn as_key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ParameterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl fmt::Debug for ParameterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParameterPath({})", self.key)
    }
}

impl From<&str> for ParameterPath {
    fn from(dotted: &str) -> ParameterPath {
        ParameterPath::new(dotted)
    }
}

impl From<String> for ParameterPath {
    fn from(dotted: String) -> ParameterPath {
        ParameterPath::new(&dotted)
    }
}

impl From<ParameterPath> for String {
    fn from(path: ParameterPath) -> String {
        path.key
    }
}

impl FromStr for ParameterPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<ParameterPath, Infallible> {
        Ok(ParameterPath::new(s))
    }
}
