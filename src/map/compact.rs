//! Grouping of raw key/value pairs ahead of a bulk tree build.

use std::cmp::Ordering;

use crate::cardinality::DuplicatePolicy;
use crate::compare::Comparator;
use crate::values::ValueBag;

/// Sorts the pairs by key and groups the values of equal keys into one bag each.
///
/// The sort is stable, so values keep their input order within a key.
/// Under [`DuplicatePolicy::DistinctKeys`] only the first value of a key survives,
/// under [`DuplicatePolicy::DuplicateKeysDistinctValues`] repeated values are dropped.
/// The result is sorted with strictly increasing keys.
pub(crate) fn compact<K, V, Cmp>(
    mut pairs: Vec<(K, V)>,
    policy: DuplicatePolicy,
    cmp: &Cmp,
) -> Vec<(K, ValueBag<V>)>
where
    Cmp: Comparator<K>,
    V: PartialEq,
{
    let num_pairs = pairs.len();
    pairs.sort_by(|lhs, rhs| cmp.compare(&lhs.0, &rhs.0));

    let cardinality = policy.value_cardinality();
    let mut groups: Vec<(K, ValueBag<V>)> = Vec::new();
    for (key, value) in pairs {
        let same_key = groups
            .last()
            .map_or(false, |(last_key, _)| cmp.compare(last_key, &key) == Ordering::Equal);
        if !same_key {
            groups.push((key, ValueBag::with_value(value, cardinality)));
        } else if let Some((_, bag)) = groups.last_mut() {
            if policy.allows_duplicate_keys() {
                bag.push(value);
            }
        }
    }
    tracing::debug!(num_pairs, num_groups = groups.len(), "compacted key/value pairs");
    groups
}
