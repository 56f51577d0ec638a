//! Read-only wrapper for finalized containers.

use crate::error::{CausticsError, Result};
use crate::parameters::namespace::NamespaceDict;
use std::ops::Deref;

/// Wraps a value so that only shared access is possible after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Frozen<T>(T);

impl<T> Frozen<T> {
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Frozen<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<V> Frozen<NamespaceDict<V>> {
    /// Always fails; frozen dicts cannot gain keys.
    pub fn insert(&mut self, _key: impl Into<String>, _value: V) -> Result<()> {
        Err(CausticsError::ImmutableState)
    }

    /// Always fails; frozen dicts cannot lose keys.
    pub fn remove(&mut self, _key: &str) -> Result<V> {
        Err(CausticsError::ImmutableState)
    }
}
