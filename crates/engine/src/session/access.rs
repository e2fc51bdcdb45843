//! Lookup, mutation and selection
//!
//! Index-style (`get`/`set`/`delete`) and attribute-style
//! (`get_attr`/`set_attr`/`del_attr`) access address the same entries.
//! Attribute-style access never resolves the container's own field names
//! (see [`RESERVED_NAMES`]) and reports misses as `AttributeNotFound`.

use super::{NamedStore, Session};
use quiver_core::{Error, LabeledArray, Result, Value};
use std::ops::Index;
use std::sync::Arc;

/// Names used by the container's own bookkeeping
pub const RESERVED_NAMES: &[&str] = &["_entries", "_config", "_engines", "_float_handler"];

const TYPE_NAME: &str = "Session";

fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

impl Session {
    /// Value stored under `name`
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if absent.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::KeyNotFound(name.to_string()))
    }

    /// Value stored under `name`, or `default`
    pub fn get_or<'a>(&'a self, name: &str, default: &'a Value) -> &'a Value {
        self.entries.get(name).unwrap_or(default)
    }

    /// Array stored under `name`
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if absent, `TypeMismatch` if the entry is not an array.
    pub fn get_array(&self, name: &str) -> Result<&Arc<LabeledArray>> {
        let value = self.get(name)?;
        value.as_array().ok_or_else(|| {
            Error::type_mismatch(format!(
                "entry '{}' is {}, not an array",
                name,
                value.type_name()
            ))
        })
    }

    /// Insert or overwrite; an overwritten entry keeps its position
    ///
    /// Returns the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    /// Remove `name`
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if absent.
    pub fn delete(&mut self, name: &str) -> Result<Value> {
        self.entries
            .remove(name)
            .ok_or_else(|| Error::KeyNotFound(name.to_string()))
    }

    /// Attribute-style read
    ///
    /// # Errors
    ///
    /// `AttributeNotFound` if absent or reserved.
    pub fn get_attr(&self, name: &str) -> Result<&Value> {
        if is_reserved(name) {
            return Err(attribute_not_found(name));
        }
        self.entries.get(name).ok_or_else(|| attribute_not_found(name))
    }

    /// Attribute-style write
    ///
    /// # Errors
    ///
    /// `ReservedName` for the container's own field names.
    pub fn set_attr(&mut self, name: &str, value: impl Into<Value>) -> Result<Option<Value>> {
        if is_reserved(name) {
            return Err(Error::ReservedName(name.to_string()));
        }
        Ok(self.set(name, value))
    }

    /// Attribute-style delete
    ///
    /// # Errors
    ///
    /// `AttributeNotFound` if absent or reserved.
    pub fn del_attr(&mut self, name: &str) -> Result<Value> {
        if is_reserved(name) {
            return Err(attribute_not_found(name));
        }
        self.entries.remove(name).ok_or_else(|| attribute_not_found(name))
    }

    /// Entry at `index` in insertion order
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` past the end.
    pub fn get_index(&self, index: usize) -> Result<(&str, &Value)> {
        self.entries.get_index(index).ok_or(Error::IndexOutOfBounds {
            index,
            len: self.len(),
        })
    }

    /// Value at `index` in insertion order
    pub fn at(&self, index: usize) -> Result<&Value> {
        self.get_index(index).map(|(_, v)| v)
    }

    /// New session holding exactly `names`, in the requested order
    ///
    /// # Errors
    ///
    /// `KeyNotFound` for the first missing name.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Session> {
        let mut out = NamedStore::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            out.insert(name.to_string(), self.get(name)?.clone());
        }
        Ok(self.derive(out))
    }

    /// New session holding the entries whose label is true in `mask`
    ///
    /// `mask` must be a one-dimensional boolean array whose labels are
    /// entry names, e.g. the result of [`array_equals`](Self::array_equals).
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if `mask` is not a one-dimensional boolean array,
    /// `KeyNotFound` if a selected label is not an entry.
    pub fn select_mask(&self, mask: &Value) -> Result<Session> {
        let array = mask.as_array().ok_or_else(|| {
            Error::type_mismatch(format!(
                "selection mask must be a boolean array, got {}",
                mask.type_name()
            ))
        })?;
        let names = array.true_labels()?;
        self.select(&names)
    }

    /// Add values that carry their own name (axes)
    ///
    /// # Errors
    ///
    /// `Unnamed` for a value without a name; values before it are kept.
    pub fn add<I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        for value in values {
            let value = value.into();
            let name = value
                .name()
                .ok_or_else(|| Error::Unnamed(value.type_name()))?
                .to_string();
            self.entries.insert(name, value);
        }
        Ok(())
    }

    /// Add `(name, value)` pairs
    pub fn add_named<K, V, I>(&mut self, pairs: I)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.extend(pairs);
    }
}

fn attribute_not_found(name: &str) -> Error {
    Error::AttributeNotFound {
        type_name: TYPE_NAME,
        name: name.to_string(),
    }
}

impl Index<&str> for Session {
    type Output = Value;

    /// # Panics
    ///
    /// Panics if `name` is not stored.
    fn index(&self, name: &str) -> &Value {
        match self.entries.get(name) {
            Some(value) => value,
            None => panic!("no entry named '{}' in session", name),
        }
    }
}
