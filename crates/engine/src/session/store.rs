//! Insertion-ordered name → value storage
//!
//! # Design
//!
//! - `Vec<(String, Value)>`: entries in insertion order
//! - FxHashMap: name → position, O(1) lookups
//!
//! Overwriting a name keeps its slot. Removing a name shifts the entries
//! after it down by one and re-indexes them, so removal is O(n).

use quiver_core::Value;
use rustc_hash::FxHashMap;

/// Ordered map from unique names to values
#[derive(Debug, Clone, Default)]
pub struct NamedStore {
    entries: Vec<(String, Value)>,
    index: FxHashMap<String, usize>,
}

impl NamedStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the store holds nothing
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if `name` is stored
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Value stored under `name`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    /// Position of `name` in insertion order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Entry at `pos` in insertion order
    pub fn get_index(&self, pos: usize) -> Option<(&str, &Value)> {
        self.entries.get(pos).map(|(k, v)| (k.as_str(), v))
    }

    /// Insert or overwrite; an overwritten entry keeps its position
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, name: String, value: Value) -> Option<Value> {
        match self.index.get(&name) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Remove `name`, keeping the order of the remaining entries
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.index.remove(name)?;
        let (_, value) = self.entries.remove(pos);
        for (name, _) in &self.entries[pos..] {
            if let Some(slot) = self.index.get_mut(name) {
                *slot -= 1;
            }
        }
        Some(value)
    }

    /// Names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names sorted alphabetically; storage order is untouched
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.keys().collect();
        names.sort_unstable();
        names
    }

    /// Consume into owned pairs in insertion order
    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.entries
    }
}

impl FromIterator<(String, Value)> for NamedStore {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut store = NamedStore::with_capacity(iter.size_hint().0);
        for (name, value) in iter {
            store.insert(name, value);
        }
        store
    }
}
