//! Lookup capability consumed by elementwise dispatch
//!
//! The right operand of a session operator is either keyed (it can be
//! asked for a value by name) or broadcast (the same value is used for
//! every name). [`NameLookup`] is the keyed capability.

use crate::value::Value;
use std::collections::{BTreeMap, HashMap};

/// Anything that can be asked for a value by name
pub trait NameLookup {
    /// Names in the implementor's own iteration order
    fn lookup_names(&self) -> Vec<&str>;

    /// Value stored under `name`
    fn lookup(&self, name: &str) -> Option<&Value>;
}

impl NameLookup for BTreeMap<String, Value> {
    fn lookup_names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl<S: std::hash::BuildHasher> NameLookup for HashMap<String, Value, S> {
    fn lookup_names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl NameLookup for Vec<(String, Value)> {
    fn lookup_names(&self) -> Vec<&str> {
        self.iter().map(|(k, _)| k.as_str()).collect()
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

/// Right operand of a binary session operator
#[derive(Clone, Copy)]
pub enum Operand<'a> {
    /// Fetch per name; absent names use the undefined sentinel
    Keyed(&'a dyn NameLookup),
    /// Same value for every name
    Broadcast(&'a Value),
}

impl<'a> From<&'a Value> for Operand<'a> {
    fn from(value: &'a Value) -> Self {
        Operand::Broadcast(value)
    }
}

impl<'a> From<&'a BTreeMap<String, Value>> for Operand<'a> {
    fn from(map: &'a BTreeMap<String, Value>) -> Self {
        Operand::Keyed(map)
    }
}

impl<'a> From<&'a HashMap<String, Value>> for Operand<'a> {
    fn from(map: &'a HashMap<String, Value>) -> Self {
        Operand::Keyed(map)
    }
}

impl<'a> From<&'a Vec<(String, Value)>> for Operand<'a> {
    fn from(pairs: &'a Vec<(String, Value)>) -> Self {
        Operand::Keyed(pairs)
    }
}
