use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Content parts of one item, keyed by part name.
pub type Fields = BTreeMap<String, String>;

/// Variables handed to a renderer. Values may nest for dotted-path lookups.
pub type RenderData = Map<String, Value>;

/// A setting that is either a fixed value or a callback producing it.
///
/// Callbacks are evaluated on every [`Supplier::resolve`] call; results are
/// never cached, so per-request data (current user, base URL) stays fresh.
#[derive(Clone)]
pub enum Supplier<T> {
    Value(T),
    Func(Arc<dyn Fn() -> T + Send + Sync>),
}

impl<T: Clone> Supplier<T> {
    pub fn func<F>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Supplier::Func(Arc::new(f))
    }

    pub fn resolve(&self) -> T {
        match self {
            Supplier::Value(value) => value.clone(),
            Supplier::Func(f) => f(),
        }
    }
}

impl<T: Default> Default for Supplier<T> {
    fn default() -> Self {
        Supplier::Value(T::default())
    }
}

impl<T> From<T> for Supplier<T> {
    fn from(value: T) -> Self {
        Supplier::Value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Supplier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Supplier::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Supplier::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// Builds a [`Fields`] map from string pairs.
pub fn fields<K, V, I>(pairs: I) -> Fields
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
