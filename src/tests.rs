use std::collections::BTreeMap;

use super::{
    AvlTree, AvlTreeCollection, AvlTreeMap, Cardinality, DuplicatePolicy, Error, FrozenAvlTreeMap,
    NaturalOrder,
};

const N: i32 = 1_000;
const LARGE_N: i32 = 10_000_000;

fn distinct_tree() -> AvlTree<i32, ()> {
    AvlTree::new(NaturalOrder, DuplicatePolicy::DistinctKeys)
}

#[test]
fn test_new() {
    let collection_i32 = AvlTreeCollection::<i32>::new(Cardinality::Distinct);
    assert!(collection_i32.is_empty());
    collection_i32.check_consistency();

    let collection_i8 = AvlTreeCollection::<i8>::new(Cardinality::Duplicate);
    assert!(collection_i8.is_empty());
    collection_i8.check_consistency();

    let map_string = AvlTreeMap::<String, String>::new(DuplicatePolicy::DistinctKeys);
    assert!(map_string.is_empty());
    map_string.check_consistency();
}

#[test]
fn test_rebalance() {
    {
        //     3 ->   2
        //    /      / \
        //   2      1   3
        //  /
        // 1
        let mut tree = distinct_tree();
        tree.insert(3, ());
        tree.insert(2, ());
        tree.insert(1, ());
        tree.check_consistency();
        assert_eq!(tree.height(), 1);
    }
    {
        //     3   ->     3 ->   2
        //    / \        /      / \
        //   2   4      2      1   3
        //  /          /
        // 1          1
        let mut tree = distinct_tree();
        tree.insert(3, ());
        tree.insert(2, ());
        tree.insert(4, ());
        tree.insert(1, ());
        assert!(tree.delete(&4));
        tree.check_consistency();
        assert_eq!(tree.height(), 1);
    }
    {
        //   1 ->     2
        //    \      / \
        //     2    1   3
        //      \
        //       3
        let mut tree = distinct_tree();
        tree.insert(1, ());
        tree.insert(2, ());
        tree.insert(3, ());
        tree.check_consistency();
        assert_eq!(tree.height(), 1);
    }
    {
        //   1 ->   1   ->   2
        //    \      \      / \
        //     3      2    1   3
        //    /        \
        //   2          3
        let mut tree = distinct_tree();
        tree.insert(1, ());
        tree.insert(3, ());
        tree.insert(2, ());
        tree.check_consistency();
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.root().map(|node| *node.key()), Some(2));
    }
}

#[test]
fn test_insert() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0);
    let mut values: Vec<i32> = (0..N).map(|_| rng.gen()).collect();
    values.sort();
    values.dedup();

    let mut collection = AvlTreeCollection::new(Cardinality::Distinct);
    for value in &values {
        assert!(collection.add(*value));
        collection.check_consistency();
    }
    assert!(collection.len() == values.len());

    for value in &values {
        assert!(!collection.add(*value));
    }
    assert!(collection.len() == values.len());
    assert_eq!(collection.as_slice(), values.as_slice());
}

#[test]
fn test_insert_sorted_range() {
    let mut tree = distinct_tree();
    for value in 0..N {
        assert!(tree.insert(value, ()));
        tree.check_consistency();
    }
    assert!(tree.len() == N as usize);
    assert!(tree.height() > 0);
    assert!(tree.height() < N as usize / 2);
    assert!(tree.search(&-42).is_none());
}

#[test]
fn test_insert_shuffled_range() {
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

    let mut values: Vec<i32> = (0..N).collect();
    let mut rng = StdRng::seed_from_u64(0);
    values.shuffle(&mut rng);

    let mut map = AvlTreeMap::new(DuplicatePolicy::DistinctKeys);
    for value in &values {
        assert!(map.add(*value, "foo"));
        map.check_consistency();
    }
    assert!(map.len() == values.len());

    for value in &values {
        assert!(!map.add(*value, "bar"));
    }
    assert!(map.len() == values.len());
    assert_eq!(map.get(&-42), Err(Error::KeyNotFound));
    assert_eq!(map.get(&42), Ok(&"foo"));
}

#[test]
fn test_duplicates_keep_insertion_order() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0);
    let values: Vec<(i32, usize)> = (0..N as usize)
        .map(|seq| (rng.gen_range(0..N / 10), seq))
        .collect();

    let mut collection = AvlTreeCollection::with_comparator(
        |lhs: &(i32, usize), rhs: &(i32, usize)| lhs.0.cmp(&rhs.0),
        Cardinality::Duplicate,
    );
    for value in &values {
        assert!(collection.add(*value));
    }
    collection.check_consistency();

    let mut expected = values.clone();
    expected.sort_by_key(|&(key, _)| key);
    assert_eq!(collection.as_slice(), expected.as_slice());
}

#[test]
fn test_get_at_and_index_of() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0);
    let mut values: Vec<i32> = (0..N).map(|_| rng.gen_range(0..N / 4)).collect();

    let collection = AvlTreeCollection::from_vec(values.clone(), Cardinality::Duplicate);
    collection.check_consistency();
    values.sort();

    for (index, value) in values.iter().enumerate() {
        assert_eq!(collection.get_at(index), Ok(value));
        let first = values.partition_point(|other| other < value);
        let last = values.partition_point(|other| other <= value) - 1;
        assert_eq!(collection.first_index_of(value), Some(first));
        assert_eq!(collection.last_index_of(value), Some(last));
        let found = collection.index_of(value).unwrap();
        assert_eq!(collection.get_at(found), Ok(value));
    }
    assert_eq!(
        collection.get_at(values.len()),
        Err(Error::IndexOutOfBounds {
            index: values.len(),
            len: values.len()
        })
    );
    assert_eq!(collection.index_of(&N), None);
}

#[test]
fn test_boundaries() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0);
    let mut values: Vec<i32> = (0..N).map(|_| 2 * rng.gen_range(0..N / 2)).collect();

    let collection: AvlTreeCollection<i32> =
        AvlTreeCollection::from_vec(values.clone(), Cardinality::Duplicate);
    values.sort();

    for probe in -1..=N {
        let lower = values.partition_point(|value| *value < probe);
        let upper = values.partition_point(|value| *value <= probe);

        assert_eq!(collection.greater_than(&probe).ok(), values.get(upper));
        assert_eq!(collection.greater_or_equal(&probe).ok(), values.get(lower));
        assert_eq!(
            collection.less_than(&probe).ok(),
            lower.checked_sub(1).and_then(|index| values.get(index))
        );
        assert_eq!(
            collection.less_or_equal(&probe).ok(),
            upper.checked_sub(1).and_then(|index| values.get(index))
        );
    }
}

#[test]
fn test_clear() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0);
    let mut values: Vec<i32> = (0..N).map(|_| rng.gen()).collect();
    values.sort();
    values.dedup();

    let mut map = AvlTreeMap::new(DuplicatePolicy::DistinctKeys);
    for value in &values {
        map.add(*value, String::from("foo"));
    }
    assert!(!map.is_empty());
    assert!(map.len() == values.len());

    map.clear();
    assert!(map.is_empty());
    assert!(map.len() == 0);

    for value in &values {
        assert!(map.add(*value, String::from("bar")));
    }
    assert!(!map.is_empty());
    assert!(map.len() == values.len());
    map.check_consistency();
}

#[test]
fn test_remove() {
    use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0);
    let mut values: Vec<i32> = (0..N).map(|_| rng.gen()).collect();
    values.sort();
    values.dedup();

    let mut collection = AvlTreeCollection::from_vec(values.clone(), Cardinality::Distinct);

    values.shuffle(&mut rng);
    for value in &values {
        assert!(collection.contains(value));
        assert!(collection.remove(value));
        assert!(!collection.contains(value));
        collection.check_consistency();
    }
    assert!(collection.is_empty());
    assert!(collection.len() == 0);
}

#[test]
fn test_remove_duplicates() {
    use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0);
    let mut values: Vec<i32> = (0..N).map(|_| rng.gen_range(0..N / 10)).collect();

    let mut collection = AvlTreeCollection::from_vec(values.clone(), Cardinality::Duplicate);
    values.shuffle(&mut rng);
    values.truncate(values.len() / 2);
    for value in &values {
        assert!(collection.remove(value));
        collection.check_consistency();
    }
    assert_eq!(collection.len(), N as usize - values.len());
}

#[test]
fn test_map_aggregation() {
    let pairs = vec![(1, "one"), (1, "bis"), (3, "three")];

    let map =
        FrozenAvlTreeMap::from_pairs(pairs.clone(), DuplicatePolicy::DuplicateKeysDistinctValues);
    assert_eq!(map.len(), 3);
    assert_eq!(map.key_count(), 2);
    assert_eq!(map.get_all(&1), Ok(&["one", "bis"][..]));
    assert_eq!(map.as_slice(), pairs.as_slice());
    assert!(map.contains_all_keys(&[1, 1]));
    assert!(map.contains_all_keys(&[1, 1, 3]));
    assert!(!map.contains_all_keys(&[1, 1, 3, 3]));

    let map = FrozenAvlTreeMap::from_pairs(pairs, DuplicatePolicy::DistinctKeys);
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&1), Ok(&"one"));
}

#[test]
fn test_map_against_reference() {
    use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0);
    let mut map = AvlTreeMap::new(DuplicatePolicy::DuplicateKeysDuplicateValues);
    let mut reference: BTreeMap<i32, Vec<i32>> = BTreeMap::new();
    for _ in 0..N {
        let key = rng.gen_range(0..N / 10);
        let value = rng.gen_range(0..3);
        assert!(map.add(key, value));
        reference.entry(key).or_default().push(value);
    }
    map.check_consistency();
    assert_eq!(map.len(), N as usize);
    assert_eq!(map.key_count(), reference.len());

    for (index, (key, values)) in reference.iter().enumerate() {
        assert_eq!(map.entry_at(index), Ok((key, values.as_slice())));
        assert_eq!(map.index_of_key(key), Some(index));
    }

    let mut keys: Vec<i32> = reference.keys().copied().collect();
    keys.shuffle(&mut rng);
    for key in keys.iter().take(keys.len() / 2) {
        let expected = reference.remove(key);
        assert_eq!(map.remove(key).ok(), expected);
        map.check_consistency();
    }
    let flattened: Vec<(i32, i32)> = reference
        .iter()
        .flat_map(|(key, values)| values.iter().map(move |value| (*key, *value)))
        .collect();
    assert_eq!(map.as_slice(), flattened.as_slice());
    assert_eq!(map.iter().count(), map.len());
}

#[test]
fn test_collection_iter() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0);
    let values: Vec<i32> = (0..N).map(|_| rng.gen_range(0..N)).collect();

    let collection: AvlTreeCollection<i32> = values.iter().copied().collect();
    let mut expected = values;
    expected.sort();
    expected.dedup();

    let mut value_iter = expected.iter();
    for value in &collection {
        assert_eq!(Some(value), value_iter.next());
    }
    assert!(value_iter.next().is_none());
    assert_eq!(collection.iter().len(), expected.len());
}

#[test]
#[ignore]
fn test_large() {
    use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0);
    let mut values: Vec<i32> = (0..LARGE_N).map(|_| rng.gen_range(0..LARGE_N)).collect();

    let mut collection = AvlTreeCollection::new(Cardinality::Duplicate);
    for value in &values {
        collection.add(*value);
    }
    collection.check_consistency();

    values.shuffle(&mut rng);
    values.resize(values.len() / 2, 0);
    for value in &values {
        collection.remove(value);
    }
    collection.check_consistency();
}
