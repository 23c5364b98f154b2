//! The container of values grouped under one map key.

use std::fmt;
use std::slice;

use crate::cardinality::Cardinality;

/// A small insertion-ordered bag of values.
/// With [`Cardinality::Distinct`] a value `==` to a stored one is rejected.
#[derive(Clone, PartialEq, Eq)]
pub struct ValueBag<V> {
    values: Vec<V>,
    cardinality: Cardinality,
}

impl<V> ValueBag<V> {
    pub fn new(cardinality: Cardinality) -> Self {
        Self {
            values: Vec::new(),
            cardinality,
        }
    }

    /// Creates a bag holding a single value.
    pub fn with_value(value: V, cardinality: Cardinality) -> Self {
        Self {
            values: vec![value],
            cardinality,
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> Option<&V> {
        self.values.first()
    }

    pub fn as_slice(&self) -> &[V] {
        &self.values
    }

    pub fn iter(&self) -> slice::Iter<'_, V> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<V> {
        self.values
    }

    /// Replaces all values by the given one and returns the previous values.
    pub fn replace_with(&mut self, value: V) -> Vec<V> {
        std::mem::replace(&mut self.values, vec![value])
    }
}

impl<V: PartialEq> ValueBag<V> {
    pub fn contains(&self, value: &V) -> bool {
        self.values.contains(value)
    }

    /// Appends a value unless the cardinality rejects it.
    /// Returns whether the bag changed.
    pub fn push(&mut self, value: V) -> bool {
        if !self.cardinality.allows_duplicates() && self.contains(&value) {
            return false;
        }
        self.values.push(value);
        true
    }

    /// Removes the first value equal to the given one.
    pub fn remove(&mut self, value: &V) -> Option<V> {
        let position = self.values.iter().position(|stored| stored == value)?;
        Some(self.values.remove(position))
    }
}

impl<V: fmt::Debug> fmt::Debug for ValueBag<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

impl<'a, V> IntoIterator for &'a ValueBag<V> {
    type Item = &'a V;
    type IntoIter = slice::Iter<'a, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
