//! A sorted collection of elements, one tree node per element.

use std::cmp::Ordering;
use std::fmt;

use crate::cardinality::{Cardinality, DuplicatePolicy};
use crate::compare::{Comparator, NaturalOrder};
use crate::error::{Error, Result};
use crate::snapshot::Snapshot;
use crate::tree::{self, AvlTree, Node};

/// A sorted collection implemented with an AVL tree, with rank access.
///
/// Elements comparing equal are kept in insertion order. With [`Cardinality::Distinct`]
/// an element `==` to a stored one is rejected; elements that merely compare equal
/// are still accepted, so with a comparator on a projection of the element
/// the collection behaves like a multiset of keys.
///
/// ```
/// use avl_rank::{AvlTreeCollection, Cardinality};
/// let set = AvlTreeCollection::from_vec(vec![1, 2, 2, 3, 2, 3], Cardinality::Distinct);
/// assert_eq!(set.len(), 3);
/// assert_eq!(set.get_at(1), Ok(&2));
/// assert_eq!(set.greater_than(&2), Ok(&3));
/// ```
#[derive(Clone)]
pub struct AvlTreeCollection<T, Cmp = NaturalOrder> {
    tree: AvlTree<T, (), Cmp>,
    elements: Snapshot<T>,
}

/// An iterator over the elements of a collection, in sorted order.
pub struct Iter<'a, T> {
    nodes: tree::Iter<'a, T, ()>,
}

impl<T: Ord> AvlTreeCollection<T> {
    /// Creates an empty collection ordered by the elements' [`Ord`] implementation.
    /// No memory is allocated until the first element is added.
    pub fn new(cardinality: Cardinality) -> Self {
        Self::with_comparator(NaturalOrder, cardinality)
    }

    /// Builds a collection from unsorted elements.
    pub fn from_vec(values: Vec<T>, cardinality: Cardinality) -> Self {
        Self::from_vec_by(values, cardinality, NaturalOrder)
    }
}

impl<T, Cmp: Comparator<T>> AvlTreeCollection<T, Cmp> {
    /// Creates an empty collection ordered by the given comparator.
    pub fn with_comparator(cmp: Cmp, cardinality: Cardinality) -> Self {
        Self {
            tree: AvlTree::new(cmp, cardinality.into()),
            elements: Snapshot::new(),
        }
    }

    /// Builds a collection from unsorted elements ordered by the given comparator.
    ///
    /// The elements are sorted once (stably) and the tree is built bottom-up.
    pub fn from_vec_by(mut values: Vec<T>, cardinality: Cardinality, cmp: Cmp) -> Self
    where
        T: PartialEq,
    {
        values.sort_by(|lhs, rhs| cmp.compare(lhs, rhs));
        Self::from_sorted(values, cardinality, cmp)
    }

    /// Builds a collection from elements already sorted by the given comparator.
    ///
    /// Fails with [`Error::Unsorted`] before building anything if an element is out of order.
    pub fn try_from_sorted_by(values: Vec<T>, cardinality: Cardinality, cmp: Cmp) -> Result<Self>
    where
        T: PartialEq,
    {
        if let Some(position) = values
            .windows(2)
            .position(|pair| cmp.compare(&pair[0], &pair[1]) == Ordering::Greater)
        {
            return Err(Error::Unsorted {
                position: position + 1,
            });
        }
        Ok(Self::from_sorted(values, cardinality, cmp))
    }

    fn from_sorted(values: Vec<T>, cardinality: Cardinality, cmp: Cmp) -> Self
    where
        T: PartialEq,
    {
        let values = match cardinality {
            Cardinality::Distinct => dedup_ties(values, &cmp),
            Cardinality::Duplicate => values,
        };
        let entries = values.into_iter().map(|value| (value, ())).collect();
        Self {
            tree: AvlTree::from_sorted_unchecked(entries, cmp, cardinality.into()),
            elements: Snapshot::new(),
        }
    }

    /// Adds an element. Returns whether the collection changed.
    pub fn add(&mut self, value: T) -> bool
    where
        T: PartialEq,
    {
        let added = self.tree.insert(value, ());
        if added {
            self.elements.invalidate();
        }
        added
    }

    /// Removes the first element `==` to the given one.
    /// Returns whether an element was removed.
    pub fn remove(&mut self, value: &T) -> bool
    where
        T: PartialEq,
    {
        let removed = self.tree.delete_where(value, |stored, _| stored == value).is_some();
        if removed {
            self.elements.invalidate();
        }
        removed
    }

    /// Removes the element at the given rank.
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        let (value, ()) = self.tree.remove_at(index)?;
        self.elements.invalidate();
        Ok(value)
    }

    /// Removes every element for which the predicate holds.
    /// Returns the number of elements removed.
    pub fn remove_if<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let removed = self.tree.remove_if(|value, _| pred(value));
        if removed > 0 {
            self.elements.invalidate();
        }
        removed
    }

    /// Removes every element not matched by one of the given elements.
    /// Each given element matches at most one stored element.
    /// Returns the number of elements removed.
    pub fn retain_all<'a, I>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = &'a T>,
        T: PartialEq + 'a,
    {
        let removed = self.tree.retain_all_by(values, |probe, stored| probe == stored);
        if removed > 0 {
            self.elements.invalidate();
        }
        removed
    }

    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.index_of(value).is_some()
    }

    /// Returns true if every given element is matched by a distinct stored element.
    pub fn contains_all<'a, I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: PartialEq + 'a,
    {
        self.tree.contains_all_by(values, |probe, stored| probe == stored)
    }

    /// Returns the element at the given rank.
    pub fn get_at(&self, index: usize) -> Result<&T> {
        self.tree.get_at(index).map(Node::key)
    }

    /// Returns the rank of the first element `==` to the given one.
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.tree.index_of_where(value, |stored, _| stored == value)
    }

    /// Returns the rank of the first element comparing equal to the given one.
    pub fn first_index_of(&self, value: &T) -> Option<usize> {
        self.tree.first_index_of(value)
    }

    /// Returns the rank of the last element comparing equal to the given one.
    pub fn last_index_of(&self, value: &T) -> Option<usize> {
        self.tree.last_index_of(value)
    }

    /// Returns the rank of the last element `==` to the given one.
    pub fn last_index_of_equal(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.tree.last_index_of_where(value, |stored, _| stored == value)
    }

    /// Returns the smallest element greater than the given one.
    pub fn greater_than(&self, value: &T) -> Result<&T> {
        let boundary = self.tree.boundary_search(value);
        boundary
            .above
            .map(Node::key)
            .ok_or(Error::NoElementGreaterThan)
    }

    /// Returns the first of the smallest elements greater than or equal to the given one.
    pub fn greater_or_equal(&self, value: &T) -> Result<&T> {
        let boundary = self.tree.boundary_search(value);
        boundary
            .first_equal
            .or(boundary.above)
            .map(Node::key)
            .ok_or(Error::NoElementGreaterOrEqual)
    }

    /// Returns the greatest element less than the given one.
    pub fn less_than(&self, value: &T) -> Result<&T> {
        let boundary = self.tree.boundary_search(value);
        boundary
            .below
            .map(Node::key)
            .ok_or(Error::NoElementLessThan)
    }

    /// Returns the last of the greatest elements less than or equal to the given one.
    pub fn less_or_equal(&self, value: &T) -> Result<&T> {
        let boundary = self.tree.boundary_search(value);
        boundary
            .last_equal
            .or(boundary.below)
            .map(Node::key)
            .ok_or(Error::NoElementLessOrEqual)
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        self.tree.check_consistency()
    }
}

impl<T, Cmp> AvlTreeCollection<T, Cmp> {
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the collection.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn cardinality(&self) -> Cardinality {
        match self.tree.policy() {
            DuplicatePolicy::DuplicateKeysDuplicateValues => Cardinality::Duplicate,
            _ => Cardinality::Distinct,
        }
    }

    /// Clears the collection, deallocating all memory.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.elements.invalidate();
    }

    pub fn first(&self) -> Result<&T> {
        self.tree.first().map(Node::key).ok_or(Error::Empty)
    }

    pub fn last(&self) -> Result<&T> {
        self.tree.last().map(Node::key).ok_or(Error::Empty)
    }

    /// Gets an iterator over the elements in sorted order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            nodes: self.tree.iter(),
        }
    }

    /// Returns the elements in sorted order as a slice.
    /// The slice is rebuilt on first use after a modification.
    pub fn as_slice(&self) -> &[T]
    where
        T: Clone,
    {
        self.elements
            .get_or_build(|| self.iter().cloned().collect())
    }
}

// Drops elements `==` to an earlier element of the same run of equal-comparing elements.
fn dedup_ties<T, Cmp>(values: Vec<T>, cmp: &Cmp) -> Vec<T>
where
    T: PartialEq,
    Cmp: Comparator<T>,
{
    let mut distinct: Vec<T> = Vec::with_capacity(values.len());
    let mut run_start = 0;
    for value in values {
        if let Some(last) = distinct.last() {
            if cmp.compare(last, &value) != Ordering::Equal {
                run_start = distinct.len();
            }
        }
        if !distinct[run_start..].contains(&value) {
            distinct.push(value);
        }
    }
    distinct
}

impl<T: Ord> Default for AvlTreeCollection<T> {
    /// Creates an empty collection of distinct elements.
    fn default() -> Self {
        Self::new(Cardinality::default())
    }
}

impl<T: Ord> FromIterator<T> for AvlTreeCollection<T> {
    /// Builds a collection of distinct elements.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect(), Cardinality::default())
    }
}

impl<T, Cmp> Extend<T> for AvlTreeCollection<T, Cmp>
where
    T: PartialEq,
    Cmp: Comparator<T>,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        iter.into_iter().for_each(move |value| {
            self.add(value);
        });
    }
}

impl<T: fmt::Debug, Cmp> fmt::Debug for AvlTreeCollection<T, Cmp> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T, Cmp> IntoIterator for &'a AvlTreeCollection<T, Cmp> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// Auto derived clone seems to have an invalid type bound of T: Clone
impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.next().map(Node::key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
