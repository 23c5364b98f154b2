//! Sorted collections and multimaps implemented with an AVL tree.
//!
//! Every tree node caches the length of its subtree, so besides ordered search
//! the containers support access by rank, the rank of an element, and searches
//! for the nearest element below or above a given one, all in O(log n).
//!
//! - [`AvlTreeCollection`] stores one node per element and admits
//!   equal-comparing elements according to its [`Cardinality`].
//! - [`AvlTreeMap`], [`UpdatableAvlTreeMap`] and [`FrozenAvlTreeMap`] store one node
//!   per key, holding all values of that key, as selected by a [`DuplicatePolicy`].
//!
//! Ordering is given by a [`Comparator`]: any `Fn(&K, &K) -> Ordering` closure,
//! or [`NaturalOrder`] for keys implementing [`Ord`].
//!
//! ```
//! use avl_rank::{AvlTreeMap, DuplicatePolicy};
//!
//! let mut map = AvlTreeMap::new(DuplicatePolicy::DuplicateKeysDistinctValues);
//! map.add(1, "one");
//! map.add(1, "bis");
//! map.add(3, "three");
//! assert_eq!(map.len(), 3);
//! assert_eq!(map.get_all(&1).unwrap(), &["one", "bis"]);
//! assert_eq!(map.greater_than(&1).unwrap(), (&3, &["three"][..]));
//! ```

mod cardinality;
pub mod collection;
mod compare;
mod error;
pub mod map;
mod snapshot;
pub mod tree;
mod values;

pub use cardinality::{Cardinality, DuplicatePolicy};
pub use collection::AvlTreeCollection;
pub use compare::{Comparator, NaturalOrder};
pub use error::{Error, Result};
pub use map::{AvlTreeMap, FrozenAvlTreeMap, UpdatableAvlTreeMap};
pub use tree::{AvlTree, Boundary, Node};
pub use values::ValueBag;

#[cfg(test)]
mod tests;
