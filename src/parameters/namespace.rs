//! Ordered name-keyed containers
//!
//! [`NamespaceDict`] is an insertion-ordered map from string keys to values.
//! Its two-level form, [`NestedNamespaceDict`], groups values by module name
//! and can be flattened into a single level keyed by `"module.param"`.

use crate::error::{CausticsError, Result};
use std::collections::HashMap;

/// Separator between module and parameter names in qualified keys.
pub const SEPARATOR: char = '.';

/// Check that a module or parameter name is usable as a key component.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(SEPARATOR) {
        return Err(CausticsError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Join a module name and a parameter name into a qualified key.
pub fn qualified(module: &str, param: &str) -> String {
    format!("{}{}{}", module, SEPARATOR, param)
}

/// An insertion-ordered map with string keys
///
/// Equality is order-sensitive: two dicts are equal when they hold the same
/// entries in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDict<V> {
    keys: Vec<String>,
    entries: HashMap<String, V>,
}

/// Module name to parameter name to value.
pub type NestedNamespaceDict<V> = NamespaceDict<NamespaceDict<V>>;

impl<V> Default for NamespaceDict<V> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            entries: HashMap::new(),
        }
    }
}

impl<V> NamespaceDict<V> {
    /// Create an empty dict
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. Replacing an existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        if !self.entries.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a key, shifting later keys forward.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let value = self.entries.remove(key)?;
        self.keys.retain(|k| k != key);
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.keys.iter()
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.keys.iter().filter_map(|k| self.entries.get(k))
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.keys
            .iter()
            .filter_map(|k| self.entries.get(k).map(|v| (k, v)))
    }

    /// Apply `f` to every value, keeping keys and order.
    pub fn map_values<U>(&self, mut f: impl FnMut(&V) -> U) -> NamespaceDict<U> {
        self.iter().map(|(k, v)| (k.clone(), f(v))).collect()
    }
}

impl<V> FromIterator<(String, V)> for NamespaceDict<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}

impl<V> IntoIterator for NamespaceDict<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(mut self) -> Self::IntoIter {
        let keys = std::mem::take(&mut self.keys);
        keys.into_iter()
            .filter_map(|k| self.entries.remove(&k).map(|v| (k, v)))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl<V: Clone> NamespaceDict<NamespaceDict<V>> {
    /// Collapse module grouping into `"module.param"` keys.
    ///
    /// Entries appear module by module in the outer order, and within each
    /// module in its inner order.
    pub fn flatten(&self) -> NamespaceDict<V> {
        let mut flat = NamespaceDict::new();
        for (module, params) in self.iter() {
            for (param, value) in params.iter() {
                flat.insert(qualified(module, param), value.clone());
            }
        }
        flat
    }
}

impl<V: Clone> NamespaceDict<V> {
    /// Regroup `"module.param"` keys by module.
    ///
    /// Keys are split at the first separator. Module order follows the first
    /// appearance of each module. A key without a separator is an error.
    pub fn unflatten(&self) -> Result<NestedNamespaceDict<V>> {
        let mut nested: NestedNamespaceDict<V> = NamespaceDict::new();
        for (key, value) in self.iter() {
            let (module, param) = key
                .split_once(SEPARATOR)
                .ok_or_else(|| CausticsError::InvalidName(key.clone()))?;
            match nested.get_mut(module) {
                Some(group) => {
                    group.insert(param, value.clone());
                }
                None => {
                    let mut group = NamespaceDict::new();
                    group.insert(param, value.clone());
                    nested.insert(module, group);
                }
            }
        }
        Ok(nested)
    }
}
