//! Sorted multimaps: each key maps to a bag of values held by a single tree node.

use std::fmt;
use std::slice;

use crate::cardinality::DuplicatePolicy;
use crate::compare::{Comparator, NaturalOrder};
use crate::error::{Error, Result};
use crate::snapshot::Snapshot;
use crate::tree::{self, AvlTree, Node};
use crate::values::ValueBag;

mod compact;
mod mutable;

pub use mutable::{AvlTreeMap, UpdatableAvlTreeMap};

/// A read-only sorted multimap, built once from key/value pairs.
///
/// Equal keys share one tree node whose values are kept in insertion order.
/// How repeated keys and values are treated is set by the [`DuplicatePolicy`].
///
/// ```
/// use avl_rank::{DuplicatePolicy, FrozenAvlTreeMap};
/// let map = FrozenAvlTreeMap::from_pairs(
///     vec![(1, "one"), (1, "bis"), (3, "three")],
///     DuplicatePolicy::DuplicateKeysDistinctValues,
/// );
/// assert_eq!(map.len(), 3);
/// assert_eq!(map.get_all(&1), Ok(&["one", "bis"][..]));
/// ```
#[derive(Clone)]
pub struct FrozenAvlTreeMap<K, V, Cmp = NaturalOrder> {
    tree: AvlTree<K, ValueBag<V>, Cmp>,
    policy: DuplicatePolicy,
    num_entries: usize,
    entries: Snapshot<(K, V)>,
    key_list: Snapshot<K>,
}

/// An iterator over the key/value pairs of a map, in key order.
/// Values of one key are yielded in insertion order.
pub struct Iter<'a, K, V> {
    nodes: tree::Iter<'a, K, ValueBag<V>>,
    current: Option<(&'a K, slice::Iter<'a, V>)>,
}

/// An iterator over the distinct keys of a map.
pub struct Keys<'a, K, V> {
    nodes: tree::Iter<'a, K, ValueBag<V>>,
}

impl<K: Ord, V: PartialEq> FrozenAvlTreeMap<K, V> {
    /// Builds a map ordered by the keys' [`Ord`] implementation.
    pub fn from_pairs<I>(pairs: I, policy: DuplicatePolicy) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_pairs_by(pairs, policy, NaturalOrder)
    }
}

impl<K, V, Cmp: Comparator<K>> FrozenAvlTreeMap<K, V, Cmp> {
    /// Builds a map ordered by the given comparator.
    ///
    /// The pairs are sorted and grouped by key once, then the tree is built bottom-up.
    pub fn from_pairs_by<I>(pairs: I, policy: DuplicatePolicy, cmp: Cmp) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        V: PartialEq,
    {
        let groups = compact::compact(pairs.into_iter().collect(), policy, &cmp);
        let num_entries = groups.iter().map(|(_, bag)| bag.len()).sum();
        Self {
            tree: AvlTree::from_sorted_unchecked(groups, cmp, DuplicatePolicy::DistinctKeys),
            policy,
            num_entries,
            entries: Snapshot::new(),
            key_list: Snapshot::new(),
        }
    }

    fn empty(cmp: Cmp, policy: DuplicatePolicy) -> Self {
        Self {
            tree: AvlTree::new(cmp, DuplicatePolicy::DistinctKeys),
            policy,
            num_entries: 0,
            entries: Snapshot::new(),
            key_list: Snapshot::new(),
        }
    }

    /// Returns true if the map contains a value for the given key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.tree.contains_key(key)
    }

    /// Returns true if every probe key is present.
    /// A key probed `n` times needs at least `n` values.
    pub fn contains_all_keys<'a, I>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        let keys: Vec<&K> = keys.into_iter().collect();
        if keys.len() > self.num_entries {
            return false;
        }
        let mut used = vec![0; self.tree.len()];
        keys.into_iter().all(|key| match self.tree.index_of(key) {
            Some(rank) => {
                used[rank] += 1;
                matches!(self.tree.get_at(rank), Ok(node) if used[rank] <= node.content().len())
            }
            None => false,
        })
    }

    /// Returns the first value stored under the key.
    pub fn get(&self, key: &K) -> Result<&V> {
        self.bag(key)?.first().ok_or(Error::KeyNotFound)
    }

    /// Returns all values stored under the key, in insertion order.
    pub fn get_all(&self, key: &K) -> Result<&[V]> {
        self.bag(key).map(ValueBag::as_slice)
    }

    /// Returns the key of the given rank among the distinct keys.
    pub fn key_at(&self, index: usize) -> Result<&K> {
        self.tree.get_at(index).map(Node::key)
    }

    /// Returns the key and values of the given rank among the distinct keys.
    pub fn entry_at(&self, index: usize) -> Result<(&K, &[V])> {
        self.tree.get_at(index).map(Self::entry)
    }

    /// Returns the rank of the key among the distinct keys.
    pub fn index_of_key(&self, key: &K) -> Option<usize> {
        self.tree.index_of(key)
    }

    pub fn first_key_value(&self) -> Result<(&K, &[V])> {
        self.tree.first().map(Self::entry).ok_or(Error::Empty)
    }

    pub fn last_key_value(&self) -> Result<(&K, &[V])> {
        self.tree.last().map(Self::entry).ok_or(Error::Empty)
    }

    /// Returns the entry with the smallest key greater than the given key.
    pub fn greater_than(&self, key: &K) -> Result<(&K, &[V])> {
        let boundary = self.tree.boundary_search(key);
        boundary.above.map(Self::entry).ok_or(Error::NoElementGreaterThan)
    }

    /// Returns the entry with the smallest key greater than or equal to the given key.
    pub fn greater_or_equal(&self, key: &K) -> Result<(&K, &[V])> {
        let boundary = self.tree.boundary_search(key);
        boundary
            .first_equal
            .or(boundary.above)
            .map(Self::entry)
            .ok_or(Error::NoElementGreaterOrEqual)
    }

    /// Returns the entry with the greatest key less than the given key.
    pub fn less_than(&self, key: &K) -> Result<(&K, &[V])> {
        let boundary = self.tree.boundary_search(key);
        boundary.below.map(Self::entry).ok_or(Error::NoElementLessThan)
    }

    /// Returns the entry with the greatest key less than or equal to the given key.
    pub fn less_or_equal(&self, key: &K) -> Result<(&K, &[V])> {
        let boundary = self.tree.boundary_search(key);
        boundary
            .last_equal
            .or(boundary.below)
            .map(Self::entry)
            .ok_or(Error::NoElementLessOrEqual)
    }

    fn bag(&self, key: &K) -> Result<&ValueBag<V>> {
        self.tree
            .search(key)
            .map(Node::content)
            .ok_or(Error::KeyNotFound)
    }

    /// Replaces the values of an existing key by the given value.
    fn replace_values(&mut self, key: &K, value: V) -> Result<Vec<V>> {
        let bag = self.tree.search_mut(key).ok_or(Error::KeyNotFound)?;
        let previous = bag.replace_with(value);
        self.num_entries = self.num_entries + 1 - previous.len();
        self.invalidate();
        Ok(previous)
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        self.tree.check_consistency();
        let num_entries: usize = self.tree.iter().map(|node| node.content().len()).sum();
        assert_eq!(num_entries, self.num_entries);
        assert!(self.tree.iter().all(|node| !node.content().is_empty()));
    }
}

impl<K, V, Cmp> FrozenAvlTreeMap<K, V, Cmp> {
    /// Returns the number of key/value pairs in the map.
    pub fn len(&self) -> usize {
        self.num_entries
    }

    /// Returns the number of distinct keys in the map.
    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Gets an iterator over the key/value pairs of the map in sorted order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: self.tree.iter(),
            current: None,
        }
    }

    /// Gets an iterator over the distinct keys of the map in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            nodes: self.tree.iter(),
        }
    }

    /// Returns all key/value pairs in sorted order as a slice.
    /// The slice is rebuilt on first use after a modification.
    pub fn as_slice(&self) -> &[(K, V)]
    where
        K: Clone,
        V: Clone,
    {
        self.entries.get_or_build(|| {
            self.iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
    }

    /// Returns the distinct keys in sorted order as a slice.
    /// The slice is rebuilt on first use after a modification.
    pub fn keys_slice(&self) -> &[K]
    where
        K: Clone,
    {
        self.key_list.get_or_build(|| self.keys().cloned().collect())
    }

    fn invalidate(&mut self) {
        self.entries.invalidate();
        self.key_list.invalidate();
    }

    fn entry(node: &Node<K, ValueBag<V>>) -> (&K, &[V]) {
        (node.key(), node.content().as_slice())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, Cmp> fmt::Debug for FrozenAvlTreeMap<K, V, Cmp> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, Cmp> IntoIterator for &'a FrozenAvlTreeMap<K, V, Cmp> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((key, values)) = &mut self.current {
                if let Some(value) = values.next() {
                    return Some((*key, value));
                }
            }
            let node = self.nodes.next()?;
            self.current = Some((node.key(), node.content().iter()));
        }
    }
}

// Auto derived clone seems to have an invalid type bound of K: Clone
impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            current: self.current.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.next().map(Node::key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::FrozenAvlTreeMap;
    use crate::cardinality::DuplicatePolicy;
    use crate::error::Error;

    fn sample() -> FrozenAvlTreeMap<i32, &'static str> {
        FrozenAvlTreeMap::from_pairs(
            vec![(5, "five"), (1, "one"), (3, "three"), (1, "bis"), (3, "three")],
            DuplicatePolicy::DuplicateKeysDistinctValues,
        )
    }

    #[test]
    fn test_from_pairs() {
        let map = sample();
        map.check_consistency();
        assert_eq!(map.len(), 4);
        assert_eq!(map.key_count(), 3);
        assert_eq!(map.get(&1), Ok(&"one"));
        assert_eq!(map.get_all(&1), Ok(&["one", "bis"][..]));
        assert_eq!(map.get_all(&3), Ok(&["three"][..]));
        assert_eq!(map.get(&2), Err(Error::KeyNotFound));
    }

    #[test]
    fn test_ranks() {
        let map = sample();
        assert_eq!(map.key_at(1), Ok(&3));
        assert_eq!(map.entry_at(2), Ok((&5, &["five"][..])));
        assert_eq!(map.key_at(3), Err(Error::IndexOutOfBounds { index: 3, len: 3 }));
        assert_eq!(map.index_of_key(&5), Some(2));
        assert_eq!(map.index_of_key(&4), None);
    }

    #[test]
    fn test_boundaries() {
        let map = sample();
        assert_eq!(map.greater_than(&1).map(|e| *e.0), Ok(3));
        assert_eq!(map.greater_or_equal(&3).map(|e| *e.0), Ok(3));
        assert_eq!(map.greater_than(&5), Err(Error::NoElementGreaterThan));
        assert_eq!(map.less_than(&3).map(|e| *e.0), Ok(1));
        assert_eq!(map.less_or_equal(&4).map(|e| *e.0), Ok(3));
        assert_eq!(map.less_than(&1), Err(Error::NoElementLessThan));
        assert_eq!(map.less_or_equal(&0), Err(Error::NoElementLessOrEqual));
        assert_eq!(map.greater_or_equal(&6), Err(Error::NoElementGreaterOrEqual));
    }

    #[test]
    fn test_iter_and_slice() {
        let map = sample();
        let pairs: Vec<(i32, &str)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(pairs, vec![(1, "one"), (1, "bis"), (3, "three"), (5, "five")]);
        assert_eq!(map.as_slice(), &pairs[..]);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 3, 5]);
        assert_eq!(map.keys_slice(), &[1, 3, 5]);
        assert_eq!(map.first_key_value().map(|e| *e.0), Ok(1));
        assert_eq!(map.last_key_value().map(|e| *e.0), Ok(5));
    }

    #[test]
    fn test_empty() {
        let map = FrozenAvlTreeMap::<i32, i32>::from_pairs(vec![], DuplicatePolicy::DistinctKeys);
        assert!(map.is_empty());
        assert_eq!(map.first_key_value(), Err(Error::Empty));
        assert_eq!(map.greater_than(&2), Err(Error::NoElementGreaterThan));
        assert_eq!(
            map.greater_than(&2).unwrap_err().to_string(),
            "no element greater than the provided value"
        );
    }

    #[test]
    fn test_contains_all_keys() {
        let map = sample();
        assert!(map.contains_all_keys(&[1, 5]));
        assert!(!map.contains_all_keys(&[1, 2]));
        assert!(map.contains_all_keys(&[1, 1]));
        assert!(map.contains_all_keys(&[1, 1, 3]));
        assert!(!map.contains_all_keys(&[1, 1, 1]));
        assert!(!map.contains_all_keys(&[3, 3]));
        assert!(!map.contains_all_keys(&[1, 1, 3, 5, 5]));
    }
}
