use super::ParameterPath;

use std::fmt;

/// What happened to a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterEventKind {
    /// The parameter was assigned with [`ParameterDatabase::set`].
    ///
    /// [`ParameterDatabase::set`]: super::ParameterDatabase::set
    Set,
    /// The parameter was successfully read through an accessor.
    Accessed,
}

/// A notification delivered to the listeners of one store.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterEvent {
    pub kind: ParameterEventKind,
    pub path: ParameterPath,
    pub value: Option<String>,
}

/// Callback registered on a single store.
pub type ParameterListener = Box<dyn Fn(&ParameterEvent) + Send + Sync>;

/// A store's registered listeners.
#[derive(Default)]
pub(super) struct Listeners(Vec<ParameterListener>);

impl Listeners {
    pub(super) fn add(&mut self, listener: ParameterListener) {
        self.0.push(listener);
    }

    pub(super) fn fire(&self, kind: ParameterEventKind, path: &ParameterPath, value: Option<&str>) {
        if self.0.is_empty() {
            return;
        }
        let event = ParameterEvent {
            kind,
            path: path.clone(),
            value: value.map(String::from),
        };
        for listener in &self.0 {
            listener(&event);
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listeners({})", self.0.len())
    }
}
