//! Maps that can be written to after construction.

use std::fmt;
use std::ops::Deref;

use super::FrozenAvlTreeMap;
use crate::cardinality::DuplicatePolicy;
use crate::compare::{Comparator, NaturalOrder};
use crate::error::{Error, Result};
use crate::values::ValueBag;

/// A sorted multimap whose keys are fixed at construction.
/// Values may be replaced, keys are neither added nor removed.
///
/// All read operations of [`FrozenAvlTreeMap`] are available through `Deref`.
#[derive(Clone)]
pub struct UpdatableAvlTreeMap<K, V, Cmp = NaturalOrder> {
    map: FrozenAvlTreeMap<K, V, Cmp>,
}

/// A sorted multimap supporting insertion and removal of keys and values.
///
/// All read operations of [`FrozenAvlTreeMap`] are available through `Deref`.
///
/// ```
/// use avl_rank::{AvlTreeMap, DuplicatePolicy};
/// let mut map = AvlTreeMap::new(DuplicatePolicy::DuplicateKeysDuplicateValues);
/// map.add(2, "two");
/// map.add(1, "one");
/// map.add(2, "two");
/// assert_eq!(map.len(), 3);
/// assert_eq!(map.get_all(&2), Ok(&["two", "two"][..]));
/// assert_eq!(map.remove(&2), Ok(vec!["two", "two"]));
/// assert!(!map.contains_key(&2));
/// ```
#[derive(Clone)]
pub struct AvlTreeMap<K, V, Cmp = NaturalOrder> {
    map: FrozenAvlTreeMap<K, V, Cmp>,
}

impl<K: Ord, V: PartialEq> UpdatableAvlTreeMap<K, V> {
    pub fn from_pairs<I>(pairs: I, policy: DuplicatePolicy) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_pairs_by(pairs, policy, NaturalOrder)
    }
}

impl<K, V, Cmp: Comparator<K>> UpdatableAvlTreeMap<K, V, Cmp> {
    pub fn from_pairs_by<I>(pairs: I, policy: DuplicatePolicy, cmp: Cmp) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        V: PartialEq,
    {
        Self {
            map: FrozenAvlTreeMap::from_pairs_by(pairs, policy, cmp),
        }
    }

    /// Replaces the values stored under an existing key by the given value.
    /// Returns the previous values, or [`Error::KeyNotFound`] if the key is absent.
    pub fn update(&mut self, key: &K, value: V) -> Result<Vec<V>> {
        self.map.replace_values(key, value)
    }

    /// Returns a read-only view of the map.
    pub fn freeze(self) -> FrozenAvlTreeMap<K, V, Cmp> {
        self.map
    }
}

impl<K: Ord, V> AvlTreeMap<K, V> {
    /// Creates an empty map ordered by the keys' [`Ord`] implementation.
    /// No memory is allocated until the first pair is added.
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self::with_comparator(NaturalOrder, policy)
    }
}

impl<K: Ord, V: PartialEq> AvlTreeMap<K, V> {
    pub fn from_pairs<I>(pairs: I, policy: DuplicatePolicy) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_pairs_by(pairs, policy, NaturalOrder)
    }
}

impl<K, V, Cmp: Comparator<K>> AvlTreeMap<K, V, Cmp> {
    /// Creates an empty map ordered by the given comparator.
    pub fn with_comparator(cmp: Cmp, policy: DuplicatePolicy) -> Self {
        Self {
            map: FrozenAvlTreeMap::empty(cmp, policy),
        }
    }

    pub fn from_pairs_by<I>(pairs: I, policy: DuplicatePolicy, cmp: Cmp) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        V: PartialEq,
    {
        Self {
            map: FrozenAvlTreeMap::from_pairs_by(pairs, policy, cmp),
        }
    }

    /// Adds a key/value pair.
    ///
    /// An existing key takes the value into its bag, as far as the duplicate policy permits.
    /// A new key gets a node of its own. Returns whether the map changed.
    pub fn add(&mut self, key: K, value: V) -> bool
    where
        V: PartialEq,
    {
        let policy = self.map.policy;
        let changed = match self.map.tree.search_mut(&key) {
            Some(bag) => policy.allows_duplicate_keys() && bag.push(value),
            None => {
                let bag = ValueBag::with_value(value, policy.value_cardinality());
                self.map.tree.insert_unchecked(key, bag);
                true
            }
        };
        if changed {
            self.map.num_entries += 1;
            self.map.invalidate();
        }
        changed
    }

    /// Replaces the values stored under an existing key by the given value.
    /// Returns the previous values, or [`Error::KeyNotFound`] if the key is absent.
    pub fn update(&mut self, key: &K, value: V) -> Result<Vec<V>> {
        self.map.replace_values(key, value)
    }

    /// Removes a key and returns all of its values.
    pub fn remove(&mut self, key: &K) -> Result<Vec<V>> {
        let (_, bag) = self
            .map
            .tree
            .delete_where(key, |_, _| true)
            .ok_or(Error::KeyNotFound)?;
        self.map.num_entries -= bag.len();
        self.map.invalidate();
        Ok(bag.into_vec())
    }

    /// Removes one occurrence of a value from a key's bag.
    /// The key goes away with its last value. Returns whether a value was removed.
    pub fn remove_value(&mut self, key: &K, value: &V) -> bool
    where
        V: PartialEq,
    {
        let now_empty = match self.map.tree.search_mut(key) {
            Some(bag) => match bag.remove(value) {
                Some(_) => bag.is_empty(),
                None => return false,
            },
            None => return false,
        };
        if now_empty {
            self.map.tree.delete(key);
        }
        self.map.num_entries -= 1;
        self.map.invalidate();
        true
    }

    /// Removes every key, with its values, for which the predicate holds.
    /// Returns the number of keys removed.
    pub fn remove_keys_if<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        let mut removed_entries = 0;
        let removed = self.map.tree.remove_if(|key, bag| {
            let remove = pred(key);
            if remove {
                removed_entries += bag.len();
            }
            remove
        });
        self.map.num_entries -= removed_entries;
        if removed > 0 {
            self.map.invalidate();
        }
        removed
    }

    /// Removes every key, with its values, that is not among the given keys.
    /// Returns the number of keys removed.
    pub fn retain_keys<'a, I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        let removed = self.map.tree.retain_all_keys(keys);
        if removed > 0 {
            self.map.num_entries = self.map.tree.iter().map(|node| node.content().len()).sum();
            self.map.invalidate();
        }
        removed
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        self.map.tree.clear();
        self.map.num_entries = 0;
        self.map.invalidate();
    }

    /// Returns a read-only view of the map.
    pub fn freeze(self) -> FrozenAvlTreeMap<K, V, Cmp> {
        self.map
    }
}

impl<K, V, Cmp> Deref for UpdatableAvlTreeMap<K, V, Cmp> {
    type Target = FrozenAvlTreeMap<K, V, Cmp>;
    fn deref(&self) -> &Self::Target {
        &self.map
    }
}

impl<K, V, Cmp> Deref for AvlTreeMap<K, V, Cmp> {
    type Target = FrozenAvlTreeMap<K, V, Cmp>;
    fn deref(&self) -> &Self::Target {
        &self.map
    }
}

impl<K: Ord, V> Default for AvlTreeMap<K, V> {
    /// Creates an empty map with distinct keys.
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}

impl<K: Ord, V: PartialEq> FromIterator<(K, V)> for AvlTreeMap<K, V> {
    /// Builds a map with distinct keys; the first value of each key wins.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter, DuplicatePolicy::default())
    }
}

impl<K, V, Cmp> Extend<(K, V)> for AvlTreeMap<K, V, Cmp>
where
    Cmp: Comparator<K>,
    V: PartialEq,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        iter.into_iter().for_each(move |(key, value)| {
            self.add(key, value);
        });
    }
}

impl<K: fmt::Debug, V: fmt::Debug, Cmp> fmt::Debug for UpdatableAvlTreeMap<K, V, Cmp> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.map, f)
    }
}

impl<K: fmt::Debug, V: fmt::Debug, Cmp> fmt::Debug for AvlTreeMap<K, V, Cmp> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.map, f)
    }
}

impl<'a, K, V, Cmp> IntoIterator for &'a UpdatableAvlTreeMap<K, V, Cmp> {
    type Item = (&'a K, &'a V);
    type IntoIter = super::Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

impl<'a, K, V, Cmp> IntoIterator for &'a AvlTreeMap<K, V, Cmp> {
    type Item = (&'a K, &'a V);
    type IntoIter = super::Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{AvlTreeMap, UpdatableAvlTreeMap};
    use crate::cardinality::DuplicatePolicy;
    use crate::error::Error;

    #[test]
    fn test_add_distinct_keys() {
        let mut map = AvlTreeMap::new(DuplicatePolicy::DistinctKeys);
        assert!(map.add(1, "one"));
        assert!(!map.add(1, "uno"));
        assert_eq!(map.get_all(&1), Ok(&["one"][..]));
        assert_eq!(map.len(), 1);
        map.check_consistency();
    }

    #[test]
    fn test_add_new_keys_in_order() {
        use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

        let mut keys: Vec<i32> = (0..500).collect();
        keys.shuffle(&mut StdRng::seed_from_u64(0));

        let mut map = AvlTreeMap::new(DuplicatePolicy::DistinctKeys);
        for key in &keys {
            assert!(map.add(*key, key * 2));
            map.check_consistency();
        }
        for key in &keys {
            assert!(!map.add(*key, 0));
        }
        assert_eq!(map.key_count(), keys.len());
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), (0..500).collect::<Vec<_>>());
        assert_eq!(map.get(&7), Ok(&14));
    }

    #[test]
    fn test_add_distinct_values() {
        let mut map = AvlTreeMap::new(DuplicatePolicy::DuplicateKeysDistinctValues);
        assert!(map.add(1, "one"));
        assert!(map.add(1, "bis"));
        assert!(!map.add(1, "one"));
        assert!(map.add(3, "three"));
        assert_eq!(map.len(), 3);
        assert_eq!(map.key_count(), 2);
        map.check_consistency();
    }

    #[test]
    fn test_update() {
        let mut map = AvlTreeMap::from_pairs(
            vec![(1, "one"), (1, "bis"), (2, "two")],
            DuplicatePolicy::DuplicateKeysDuplicateValues,
        );
        assert_eq!(map.as_slice().len(), 3);
        assert_eq!(map.update(&1, "uno"), Ok(vec!["one", "bis"]));
        assert_eq!(map.len(), 2);
        assert_eq!(map.as_slice(), &[(1, "uno"), (2, "two")]);
        assert_eq!(map.update(&5, "five"), Err(Error::KeyNotFound));
        map.check_consistency();
    }

    #[test]
    fn test_updatable_map() {
        let mut map =
            UpdatableAvlTreeMap::from_pairs(vec![(1, 10), (2, 20)], DuplicatePolicy::DistinctKeys);
        assert_eq!(map.update(&2, 21), Ok(vec![20]));
        assert_eq!(map.get(&2), Ok(&21));
        assert_eq!(map.update(&3, 30), Err(Error::KeyNotFound));
        assert_eq!(map.key_count(), 2);

        let mut pairs = Vec::new();
        for (key, value) in &map {
            pairs.push((*key, *value));
        }
        assert_eq!(pairs, vec![(1, 10), (2, 21)]);
        let frozen = map.freeze();
        assert_eq!(frozen.get(&1), Ok(&10));
    }

    #[test]
    fn test_remove() {
        let mut map = AvlTreeMap::from_pairs(
            (0..100).map(|key| (key % 10, key)),
            DuplicatePolicy::DuplicateKeysDuplicateValues,
        );
        assert_eq!(map.len(), 100);
        assert_eq!(map.keys_slice().len(), 10);
        assert_eq!(map.remove(&3), Ok(vec![3, 13, 23, 33, 43, 53, 63, 73, 83, 93]));
        assert_eq!(map.remove(&3), Err(Error::KeyNotFound));
        assert_eq!(map.len(), 90);
        assert_eq!(map.keys_slice(), &[0, 1, 2, 4, 5, 6, 7, 8, 9]);
        map.check_consistency();

        assert!(map.remove_value(&4, &14));
        assert!(!map.remove_value(&4, &14));
        assert_eq!(map.get_all(&4).map(<[i32]>::len), Ok(9));
        map.check_consistency();
    }

    #[test]
    fn test_remove_last_value_removes_key() {
        let mut map = AvlTreeMap::new(DuplicatePolicy::DistinctKeys);
        map.add("a", 1);
        map.add("b", 2);
        assert!(map.remove_value(&"a", &1));
        assert!(!map.contains_key(&"a"));
        assert_eq!(map.len(), 1);
        map.check_consistency();
    }

    #[test]
    fn test_remove_keys_if_and_retain() {
        let mut map = AvlTreeMap::from_pairs(
            (0..100).map(|key| (key % 10, key)),
            DuplicatePolicy::DuplicateKeysDuplicateValues,
        );
        assert_eq!(map.remove_keys_if(|key| key % 2 == 0), 5);
        assert_eq!(map.len(), 50);
        map.check_consistency();

        assert_eq!(map.retain_keys(&[1, 3, 42]), 3);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(map.len(), 20);
        map.check_consistency();
    }

    #[test]
    fn test_clear_and_extend() {
        let mut map: AvlTreeMap<i32, i32> = (0..10).map(|key| (key, key)).collect();
        assert_eq!(map.len(), 10);
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        map.extend(vec![(2, 2), (1, 1), (2, 3)]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&2), Ok(&2));
        map.check_consistency();
    }

    #[test]
    fn test_custom_comparator() {
        let mut map = AvlTreeMap::with_comparator(
            |a: &&str, b: &&str| a.len().cmp(&b.len()),
            DuplicatePolicy::DuplicateKeysDuplicateValues,
        );
        map.add("ab", 1);
        map.add("cd", 2);
        map.add("x", 3);
        assert_eq!(map.key_count(), 2);
        assert_eq!(map.first_key_value(), Ok((&"x", &[3][..])));
        assert_eq!(map.get_all(&"zz"), Ok(&[1, 2][..]));
    }
}
