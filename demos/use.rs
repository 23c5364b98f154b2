use avl_rank::{AvlTreeCollection, AvlTreeMap, Cardinality, DuplicatePolicy};

fn main() {
    let mut map = AvlTreeMap::new(DuplicatePolicy::DuplicateKeysDistinctValues);
    map.add(0, "zero");
    map.add(1, "one");
    map.add(1, "uno");
    map.add(2, "two");
    map.add(2, "two");
    map.add(3, "three");
    assert_eq!(map.len(), 5);
    assert_eq!(map.get(&1), Ok(&"one"));
    assert_eq!(map.get_all(&1), Ok(&["one", "uno"][..]));
    map.remove(&1).ok();
    assert!(map.get(&1).is_err());

    for (k, v) in &map {
        println!("{k} => {v}");
    }
    if let Ok((key, values)) = map.greater_than(&0) {
        println!("first key above 0: {key} => {values:?}");
    }

    // Ordered by last digit, ties keep insertion order.
    let mut by_digit = AvlTreeCollection::with_comparator(
        |a: &u32, b: &u32| (a % 10).cmp(&(b % 10)),
        Cardinality::Duplicate,
    );
    for x in [21, 13, 3, 41, 1, 33] {
        by_digit.add(x);
    }
    assert_eq!(by_digit.first_index_of(&3), Some(3));
    assert_eq!(by_digit.remove_at(0), Ok(21));

    print!("[ ");
    for x in &by_digit {
        print!("{x}, ");
    }
    println!("]");
    println!("rank 2 is {:?}", by_digit.get_at(2));
}
