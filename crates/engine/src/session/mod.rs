//! The session container
//!
//! A [`Session`] is an insertion-ordered map from names to heterogeneous
//! [`Value`]s. It behaves like a dictionary (`get`/`set`/`delete`), like an
//! attribute bag (`get_attr`/`set_attr`/`del_attr`), and like an array:
//! arithmetic and comparison operators apply per entry, aligned by name.
//!
//! ```ignore
//! use quiver::{Axis, LabeledArray, Session};
//!
//! let e = LabeledArray::sequence(vec![Axis::range("a", 2), Axis::range("b", 3)]);
//! let mut s = Session::new();
//! s.set("e", e);
//! s.set("note", "scratch");
//!
//! let diff = &s - &s;       // e: zeros, note: undefined
//! s.save("out.h5")?;
//! ```
//!
//! ## Modules
//!
//! - `store`: ordered storage
//! - `access`: lookup, mutation and selection
//! - `dispatch`: elementwise operators
//! - `persistence`: load/save through format engines
//! - `derived`: filter, apply, transpose, compact, comparison, summary

mod access;
mod derived;
mod dispatch;
mod persistence;
mod store;

pub use access::RESERVED_NAMES;
pub use derived::DEFAULT_SUMMARY_TEMPLATE;
pub use persistence::{LoadOptions, SaveOptions};
pub use store::NamedStore;

use crate::config::{FloatErrorHandler, SessionConfig};
use quiver_core::{NameLookup, Operand, Result, Value};
use quiver_durability::EngineRegistry;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Ordered, heterogeneous container of named values
///
/// Cloning a session is shallow: the mapping is duplicated, the values
/// (arrays, axes, opaque payloads) are shared.
#[derive(Clone)]
pub struct Session {
    entries: NamedStore,
    config: Arc<SessionConfig>,
    engines: Arc<EngineRegistry>,
    float_handler: Option<FloatErrorHandler>,
}

impl Session {
    /// Create an empty session with the default configuration
    pub fn new() -> Self {
        Self {
            entries: NamedStore::new(),
            config: Arc::new(SessionConfig::default()),
            engines: Arc::new(EngineRegistry::with_defaults()),
            float_handler: None,
        }
    }

    /// Create an empty session with `config`
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration does not validate.
    pub fn with_config(config: SessionConfig) -> Result<Self> {
        let engines = EngineRegistry::from_options(config.engine_options()?);
        Ok(Self {
            entries: NamedStore::new(),
            config: Arc::new(config),
            engines: Arc::new(engines),
            float_handler: None,
        })
    }

    /// Create a session from `(name, value)` pairs; later duplicates win
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut session = Self::new();
        for (name, value) in pairs {
            session.set(name, value);
        }
        session
    }

    /// Load a session from a file, a csv directory or a csv pattern
    ///
    /// A `quiver.toml` next to the source configures the new session (see
    /// [`SessionConfig::discover`]).
    pub fn open(source: impl AsRef<Path>) -> Result<Self> {
        let source = source.as_ref();
        let mut session = Self::with_config(SessionConfig::discover(source)?)?;
        session.load(source)?;
        Ok(session)
    }

    /// New session with this session's configuration, engines and handler
    pub(crate) fn derive(&self, entries: NamedStore) -> Self {
        Self {
            entries,
            config: Arc::clone(&self.config),
            engines: Arc::clone(&self.engines),
            float_handler: self.float_handler.clone(),
        }
    }

    /// Shallow copy of the mapping; values are shared
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Active configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Format engines used by load and save
    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    /// Replace the engine registry (e.g. to register a custom engine)
    pub fn set_engines(&mut self, engines: EngineRegistry) {
        self.engines = Arc::new(engines);
    }

    /// Route floating-point errors of elementwise operations to `handler`
    /// instead of the configured policy
    pub fn set_float_error_handler(&mut self, handler: FloatErrorHandler) {
        self.float_handler = Some(handler);
    }

    /// Go back to the configured floating-point error policy
    pub fn clear_float_error_handler(&mut self) {
        self.float_handler = None;
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the session holds nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if `name` is stored
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(name)
    }

    /// Names sorted alphabetically
    ///
    /// Recomputed on every call; does not follow the storage order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.sorted_names()
    }

    /// Names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys()
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.entries.values()
    }

    /// Entries in insertion order
    pub fn items(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.entries.iter()
    }

    /// Alias of [`items`](Self::items)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.entries.iter()
    }

    /// Consume into owned pairs in insertion order
    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.entries.into_pairs()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session(")?;
        for (i, name) in self.keys().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.items()).finish()
    }
}

impl NameLookup for Session {
    fn lookup_names(&self) -> Vec<&str> {
        self.keys().collect()
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }
}

impl<'a> From<&'a Session> for Operand<'a> {
    fn from(session: &'a Session) -> Self {
        Operand::Keyed(session)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Session {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for Session {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Self::from_pairs(pairs)
    }
}

impl From<BTreeMap<String, Value>> for Session {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::from_pairs(map)
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Session {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.set(name, value);
        }
    }
}

impl<'a> IntoIterator for &'a Session {
    type Item = (&'a str, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Value)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.entries.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_core::{Axis, LabeledArray};

    #[test]
    fn test_display_lists_insertion_order() {
        let s = Session::from_pairs([("b", 1i64), ("a", 2i64)]);
        assert_eq!(s.to_string(), "Session(b, a)");
        assert_eq!(Session::new().to_string(), "Session()");
    }

    #[test]
    fn test_names_sorted_keys_ordered() {
        let s = Session::from_pairs([("arr2", 1i64), ("arr1", 2i64), ("arr3", 3i64)]);
        assert_eq!(s.names(), vec!["arr1", "arr2", "arr3"]);
        assert_eq!(s.keys().collect::<Vec<_>>(), vec!["arr2", "arr1", "arr3"]);
    }

    #[test]
    fn test_copy_is_shallow() {
        let array = Arc::new(LabeledArray::sequence(vec![Axis::range("a", 3)]));
        let mut s = Session::new();
        s.set("x", Value::Array(Arc::clone(&array)));

        let mut c = s.copy();
        c.set("y", 1i64);
        assert!(!s.contains("y"));
        assert!(Arc::ptr_eq(c.get("x").unwrap().as_array().unwrap(), &array));
    }

    #[test]
    fn test_conversions() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), Value::Int(1));
        map.insert("a".to_string(), Value::Int(2));
        let s = Session::from(map);
        assert_eq!(s.keys().collect::<Vec<_>>(), vec!["a", "b"]);

        let s: Session = vec![("x", 1.5), ("y", 2.5)].into_iter().collect();
        assert_eq!(s.len(), 2);

        let mut s = Session::from(vec![("x", "hello")]);
        s.extend([("z", true)]);
        assert_eq!(s.keys().collect::<Vec<_>>(), vec!["x", "z"]);
        assert_eq!((&s).into_iter().count(), 2);
    }

    #[test]
    fn test_with_config_validates() {
        let mut config = SessionConfig::default();
        config.csv.delimiter = String::new();
        assert!(Session::with_config(config).is_err());
    }

    #[test]
    fn test_derived_sessions_share_config() {
        let mut config = SessionConfig::default();
        config.skip_invalid_sources = true;
        let s = Session::with_config(config).unwrap();
        let d = s.filter(None, None).unwrap();
        assert!(d.config().skip_invalid_sources);
    }
}
