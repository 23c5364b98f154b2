//! The AVL tree engine shared by the collections and maps of this crate.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use crate::cardinality::DuplicatePolicy;
use crate::compare::{Comparator, NaturalOrder};
use crate::error::{Error, Result};

mod node;

use node::Link;
pub use node::Node;

/// An AVL tree of nodes holding a sort key `K` and a content `C`.
///
/// Keys are ordered by the comparator `Cmp`. Depending on the [`DuplicatePolicy`],
/// equal-comparing keys are rejected or stored in separate nodes, in which case
/// a new key is placed after all keys comparing equal to it.
/// Every node caches its subtree length, so rank queries take O(log n).
#[derive(Clone)]
pub struct AvlTree<K, C, Cmp = NaturalOrder> {
    root: Link<K, C>,
    num_nodes: usize,
    cmp: Cmp,
    policy: DuplicatePolicy,
}

/// Result of a [`AvlTree::boundary_search`].
pub struct Boundary<'a, K, C> {
    /// The greatest node with a key less than the probe.
    pub below: Option<&'a Node<K, C>>,
    /// The first node with a key equal to the probe.
    pub first_equal: Option<&'a Node<K, C>>,
    /// The last node with a key equal to the probe.
    pub last_equal: Option<&'a Node<K, C>>,
    /// The smallest node with a key greater than the probe.
    pub above: Option<&'a Node<K, C>>,
}

/// An in-order iterator over the nodes of a tree.
pub struct Iter<'a, K, C> {
    stack: Vec<&'a Node<K, C>>,
    remaining: usize,
}

impl<K, C, Cmp> AvlTree<K, C, Cmp> {
    /// Creates an empty tree.
    /// No memory is allocated until the first node is inserted.
    pub fn new(cmp: Cmp, policy: DuplicatePolicy) -> Self {
        Self {
            root: None,
            num_nodes: 0,
            cmp,
            policy,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    pub fn height(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.height())
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn comparator(&self) -> &Cmp {
        &self.cmp
    }

    pub fn root(&self) -> Option<&Node<K, C>> {
        self.root.as_deref()
    }

    /// Removes all nodes.
    pub fn clear(&mut self) {
        self.root = None;
        self.num_nodes = 0;
    }

    pub fn first(&self) -> Option<&Node<K, C>> {
        self.root().map(Node::leftmost_descendant)
    }

    pub fn last(&self) -> Option<&Node<K, C>> {
        self.root().map(Node::rightmost_descendant)
    }

    /// Returns the node at the given 0-based rank.
    pub fn get_at(&self, index: usize) -> Result<&Node<K, C>> {
        let out_of_bounds = Error::IndexOutOfBounds {
            index,
            len: self.num_nodes,
        };
        let mut current = self.root.as_deref();
        let mut rank = index;
        while let Some(node) = current {
            let left_len = node.left_len();
            match rank.cmp(&left_len) {
                Ordering::Less => current = node.left(),
                Ordering::Equal => return Ok(node),
                Ordering::Greater => {
                    rank -= left_len + 1;
                    current = node.right();
                }
            }
        }
        Err(out_of_bounds)
    }

    /// Removes the node at the given rank and returns its key and content.
    pub fn remove_at(&mut self, index: usize) -> Result<(K, C)> {
        if index >= self.num_nodes {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.num_nodes,
            });
        }
        match Self::remove_node_at(&mut self.root, index) {
            Some(node) => {
                self.num_nodes -= 1;
                let node = *node;
                Ok((node.key, node.content))
            }
            None => Err(Error::IndexOutOfBounds {
                index,
                len: self.num_nodes,
            }),
        }
    }

    /// Removes every node for which the predicate holds and returns how many were removed.
    ///
    /// The tree is scanned completely before the first removal.
    pub fn remove_if<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&K, &C) -> bool,
    {
        let ranks: Vec<usize> = self
            .iter()
            .enumerate()
            .filter(|(_, node)| pred(&node.key, &node.content))
            .map(|(rank, _)| rank)
            .collect();
        self.remove_ranks(ranks)
    }

    /// Gets an iterator over the nodes in sorted order.
    pub fn iter(&self) -> Iter<'_, K, C> {
        Iter::new(self.root.as_deref(), self.num_nodes)
    }

    /// Returns the nodes in sorted order.
    pub fn to_vec(&self) -> Vec<&Node<K, C>> {
        self.iter().collect()
    }

    // Removes the nodes at the given ascending ranks, last one first,
    // so that the remaining ranks stay valid.
    fn remove_ranks(&mut self, ranks: Vec<usize>) -> usize {
        let mut removed = 0;
        for rank in ranks.into_iter().rev() {
            if self.remove_at(rank).is_ok() {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!(removed, remaining = self.num_nodes, "removed nodes in batch");
        }
        removed
    }

    fn remove_node_at(link: &mut Link<K, C>, index: usize) -> Option<Box<Node<K, C>>> {
        let mut node = link.take()?;
        let left_len = node.left_len();
        match index.cmp(&left_len) {
            Ordering::Less => {
                let removed = Self::remove_node_at(&mut node.left, index);
                *link = Some(node.rebalance());
                removed
            }
            Ordering::Greater => {
                let removed = Self::remove_node_at(&mut node.right, index - left_len - 1);
                *link = Some(node.rebalance());
                removed
            }
            Ordering::Equal => {
                *link = Self::unlink(&mut node);
                Some(node)
            }
        }
    }

    // Detaches both children of the node and returns the subtree replacing it.
    fn unlink(node: &mut Node<K, C>) -> Link<K, C> {
        let left = node.left.take();
        match node.right.take() {
            // Node is stem or leaf, its only child moves up
            None => left,
            Some(right) => {
                // In-order successor takes the place of the node
                let (rest, mut successor) = Self::take_min(right);
                successor.left = left;
                successor.right = rest;
                Some(successor.rebalance())
            }
        }
    }

    // Detaches the smallest node of the subtree.
    // Returns the rebalanced remainder and the detached node.
    fn take_min(mut node: Box<Node<K, C>>) -> (Link<K, C>, Box<Node<K, C>>) {
        match node.left.take() {
            None => {
                let rest = node.right.take();
                (rest, node)
            }
            Some(left) => {
                let (rest, min) = Self::take_min(left);
                node.left = rest;
                (Some(node.rebalance()), min)
            }
        }
    }

    fn build(len: usize, items: &mut impl Iterator<Item = (K, C)>) -> Link<K, C> {
        if len == 0 {
            return None;
        }
        let left_len = len / 2;
        let left = Self::build(left_len, items);
        let (key, content) = items.next()?;
        let right = Self::build(len - left_len - 1, items);
        let mut node = Node::create(key, content);
        node.left = left;
        node.right = right;
        node.update_height();
        Some(node)
    }
}

impl<K, C, Cmp> AvlTree<K, C, Cmp>
where
    Cmp: Comparator<K>,
{
    /// Builds a tree from entries already sorted by key, without any rotation.
    ///
    /// Fails with [`Error::Unsorted`] before building any node if an entry is out of order,
    /// or if two keys compare equal under [`DuplicatePolicy::DistinctKeys`].
    pub fn try_from_sorted(
        entries: Vec<(K, C)>,
        cmp: Cmp,
        policy: DuplicatePolicy,
    ) -> Result<Self> {
        for (position, pair) in entries.windows(2).enumerate() {
            let order = cmp.compare(&pair[0].0, &pair[1].0);
            let in_order = match policy {
                DuplicatePolicy::DistinctKeys => order == Ordering::Less,
                _ => order != Ordering::Greater,
            };
            if !in_order {
                return Err(Error::Unsorted {
                    position: position + 1,
                });
            }
        }
        Ok(Self::from_sorted_unchecked(entries, cmp, policy))
    }

    /// Builds a tree from entries already sorted by key.
    /// The middle entry of each span becomes the subtree root.
    pub(crate) fn from_sorted_unchecked(
        entries: Vec<(K, C)>,
        cmp: Cmp,
        policy: DuplicatePolicy,
    ) -> Self {
        let num_nodes = entries.len();
        let root = Self::build(num_nodes, &mut entries.into_iter());
        let tree = Self {
            root,
            num_nodes,
            cmp,
            policy,
        };
        tracing::debug!(
            len = tree.num_nodes,
            height = tree.height(),
            "built tree from sorted entries"
        );
        tree
    }

    /// Returns a node with a key equal to the given key.
    /// Among several equal keys, any one of them may be returned.
    pub fn search(&self, key: &K) -> Option<&Node<K, C>> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match self.cmp.compare(key, &node.key) {
                Ordering::Equal => return Some(node),
                Ordering::Less => node.left(),
                Ordering::Greater => node.right(),
            }
        }
        None
    }

    /// Returns a mutable reference to the content of a node with a key equal to the given key.
    pub fn search_mut(&mut self, key: &K) -> Option<&mut C> {
        let mut current = self.root.as_deref_mut();
        while let Some(node) = current {
            current = match self.cmp.compare(key, &node.key) {
                Ordering::Equal => return Some(node.content_mut()),
                Ordering::Less => node.left.as_deref_mut(),
                Ordering::Greater => node.right.as_deref_mut(),
            }
        }
        None
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Inserts a node, using `==` on keys and contents to detect equal entries.
    pub fn insert(&mut self, key: K, content: C) -> bool
    where
        K: PartialEq,
        C: PartialEq,
    {
        self.insert_by(key, content, |lhs, rhs| lhs == rhs)
    }

    /// Inserts a node unless the duplicate policy rejects it.
    ///
    /// `same` decides whether a stored entry and the new one, with equal-comparing keys,
    /// count as the same entry. It is only consulted under
    /// [`DuplicatePolicy::DuplicateKeysDistinctValues`].
    /// Returns whether the tree changed.
    pub fn insert_by<F>(&mut self, key: K, content: C, mut same: F) -> bool
    where
        F: FnMut((&K, &C), (&K, &C)) -> bool,
    {
        let rejected = match self.policy {
            DuplicatePolicy::DistinctKeys => self.contains_key(&key),
            DuplicatePolicy::DuplicateKeysDistinctValues => self
                .index_of_where(&key, |stored_key, stored| {
                    same((stored_key, stored), (&key, &content))
                })
                .is_some(),
            DuplicatePolicy::DuplicateKeysDuplicateValues => false,
        };
        if rejected {
            return false;
        }
        self.insert_unchecked(key, content);
        true
    }

    /// Inserts a node without consulting the duplicate policy.
    /// The caller has already ruled out a rejection.
    pub(crate) fn insert_unchecked(&mut self, key: K, content: C) {
        let root = self.root.take();
        self.root = Some(Self::insert_node(&self.cmp, root, Node::create(key, content)));
        self.num_nodes += 1;
    }

    /// Removes the first node with a key equal to the given key.
    /// Returns whether a node was removed.
    pub fn delete(&mut self, key: &K) -> bool {
        match self.first_index_of(key) {
            Some(rank) => self.remove_at(rank).is_ok(),
            None => false,
        }
    }

    /// Removes the first node with an equal key for which the predicate holds.
    pub fn delete_where<P>(&mut self, key: &K, pred: P) -> Option<(K, C)>
    where
        P: FnMut(&K, &C) -> bool,
    {
        let rank = self.index_of_where(key, pred)?;
        self.remove_at(rank).ok()
    }

    /// Number of keys less than the given key.
    pub fn lower_rank(&self, key: &K) -> usize {
        self.rank_by(|node_key| self.cmp.compare(node_key, key) == Ordering::Less)
    }

    /// Number of keys less than or equal to the given key.
    pub fn upper_rank(&self, key: &K) -> usize {
        self.rank_by(|node_key| self.cmp.compare(node_key, key) != Ordering::Greater)
    }

    /// Ranks of all nodes with a key equal to the given key.
    pub fn equal_range(&self, key: &K) -> Range<usize> {
        self.lower_rank(key)..self.upper_rank(key)
    }

    /// Returns the rank of a node with a key equal to the given key.
    pub fn index_of(&self, key: &K) -> Option<usize> {
        let mut rank = 0;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match self.cmp.compare(key, &node.key) {
                Ordering::Equal => return Some(rank + node.left_len()),
                Ordering::Less => node.left(),
                Ordering::Greater => {
                    rank += node.left_len() + 1;
                    node.right()
                }
            }
        }
        None
    }

    /// Returns the rank of the first node with a key equal to the given key.
    pub fn first_index_of(&self, key: &K) -> Option<usize> {
        let rank = self.lower_rank(key);
        match self.get_at(rank) {
            Ok(node) if self.cmp.compare(&node.key, key) == Ordering::Equal => Some(rank),
            _ => None,
        }
    }

    /// Returns the rank of the last node with a key equal to the given key.
    pub fn last_index_of(&self, key: &K) -> Option<usize> {
        let rank = self.upper_rank(key).checked_sub(1)?;
        match self.get_at(rank) {
            Ok(node) if self.cmp.compare(&node.key, key) == Ordering::Equal => Some(rank),
            _ => None,
        }
    }

    /// Returns the rank of the first node with an equal key for which the predicate holds.
    pub fn index_of_where<P>(&self, key: &K, mut pred: P) -> Option<usize>
    where
        P: FnMut(&K, &C) -> bool,
    {
        self.equal_range(key)
            .find(|&rank| matches!(self.get_at(rank), Ok(node) if pred(&node.key, &node.content)))
    }

    /// Returns the rank of the last node with an equal key for which the predicate holds.
    pub fn last_index_of_where<P>(&self, key: &K, mut pred: P) -> Option<usize>
    where
        P: FnMut(&K, &C) -> bool,
    {
        self.equal_range(key)
            .rev()
            .find(|&rank| matches!(self.get_at(rank), Ok(node) if pred(&node.key, &node.content)))
    }

    /// Finds the nearest nodes below and above the given key and the nodes equal to it,
    /// in a single descent that forks at the first equal node.
    pub fn boundary_search(&self, key: &K) -> Boundary<'_, K, C> {
        let mut boundary = Boundary {
            below: None,
            first_equal: None,
            last_equal: None,
            above: None,
        };
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match self.cmp.compare(&node.key, key) {
                Ordering::Less => {
                    boundary.below = Some(node);
                    current = node.right();
                }
                Ordering::Greater => {
                    boundary.above = Some(node);
                    current = node.left();
                }
                Ordering::Equal => {
                    boundary.first_equal = Some(node);
                    boundary.last_equal = Some(node);

                    // Left subtree holds no greater keys
                    let mut left = node.left();
                    while let Some(node) = left {
                        if self.cmp.compare(&node.key, key) == Ordering::Less {
                            boundary.below = Some(node);
                            left = node.right();
                        } else {
                            boundary.first_equal = Some(node);
                            left = node.left();
                        }
                    }

                    // Right subtree holds no smaller keys
                    let mut right = node.right();
                    while let Some(node) = right {
                        if self.cmp.compare(&node.key, key) == Ordering::Greater {
                            boundary.above = Some(node);
                            right = node.left();
                        } else {
                            boundary.last_equal = Some(node);
                            right = node.right();
                        }
                    }
                    break;
                }
            }
        }
        boundary
    }

    /// Returns whether every probe key matches a distinct node with an equal key.
    /// A key probed `n` times needs `n` equal nodes.
    pub fn contains_all_keys<'a, I>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        self.contains_all_by(keys, |_, _| true)
    }

    /// Like [`contains_all_keys`](Self::contains_all_keys), but a node only matches a probe
    /// with an equal key if `same(probe, stored_key)` holds as well.
    pub fn contains_all_by<'a, I, F>(&self, probes: I, same: F) -> bool
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
        F: FnMut(&K, &K) -> bool,
    {
        let probes: Vec<&K> = probes.into_iter().collect();
        if probes.len() > self.num_nodes {
            return false;
        }
        let (_, all_matched) = self.mark_matches(probes, same);
        all_matched
    }

    /// Removes every node with a key not matched by the probe keys, each probe matching
    /// at most one node. Returns how many nodes were removed.
    pub fn retain_all_keys<'a, I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        self.retain_all_by(keys, |_, _| true)
    }

    /// Like [`retain_all_keys`](Self::retain_all_keys) with an additional key match.
    pub fn retain_all_by<'a, I, F>(&mut self, probes: I, same: F) -> usize
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
        F: FnMut(&K, &K) -> bool,
    {
        let (matched, _) = self.mark_matches(probes.into_iter().collect(), same);
        let ranks = matched
            .iter()
            .enumerate()
            .filter(|&(_, &is_matched)| !is_matched)
            .map(|(rank, _)| rank)
            .collect();
        self.remove_ranks(ranks)
    }

    // Marks one unmatched node per probe, by in-order position.
    // Returns the marks and whether every probe found a node.
    fn mark_matches<F>(&self, probes: Vec<&K>, mut same: F) -> (Vec<bool>, bool)
    where
        F: FnMut(&K, &K) -> bool,
    {
        let nodes = self.to_vec();
        let mut matched = vec![false; nodes.len()];
        let mut all_matched = true;
        for probe in probes {
            let found = self
                .equal_range(probe)
                .find(|&rank| !matched[rank] && same(probe, &nodes[rank].key));
            match found {
                Some(rank) => matched[rank] = true,
                None => all_matched = false,
            }
        }
        (matched, all_matched)
    }

    fn rank_by<F>(&self, mut goes_before: F) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        let mut rank = 0;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            if goes_before(&node.key) {
                rank += node.left_len() + 1;
                current = node.right();
            } else {
                current = node.left();
            }
        }
        rank
    }

    fn insert_node(cmp: &Cmp, link: Link<K, C>, new_node: Box<Node<K, C>>) -> Box<Node<K, C>> {
        match link {
            None => new_node,
            Some(mut node) => {
                // Equal keys go right to keep insertion order
                if cmp.compare(&new_node.key, &node.key) == Ordering::Less {
                    node.left = Some(Self::insert_node(cmp, node.left.take(), new_node));
                } else {
                    node.right = Some(Self::insert_node(cmp, node.right.take(), new_node));
                }
                node.rebalance()
            }
        }
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        fn check<K, C, Cmp: Comparator<K>>(
            node: &Node<K, C>,
            cmp: &Cmp,
            strict: bool,
            num_nodes: &mut usize,
        ) -> usize {
            let mut height = 0;
            let mut left_height = 0;
            let mut right_height = 0;
            let mut len = 1;

            // Check left child node
            if let Some(left) = node.left() {
                let order = cmp.compare(&left.key, &node.key);
                assert!(order == Ordering::Less || (!strict && order == Ordering::Equal));
                left_height = check(left, cmp, strict, num_nodes) + 1;
                height = height.max(left_height);
                len += left.len();
            }

            // Check right child node
            if let Some(right) = node.right() {
                let order = cmp.compare(&right.key, &node.key);
                assert!(order == Ordering::Greater || (!strict && order == Ordering::Equal));
                right_height = check(right, cmp, strict, num_nodes) + 1;
                height = height.max(right_height);
                len += right.len();
            }

            // Check cached height and length
            assert_eq!(node.height(), height);
            assert_eq!(node.len(), len);

            // Check AVL condition (nearly balance)
            assert!(left_height <= right_height + 1);
            assert!(right_height <= left_height + 1);

            *num_nodes += 1;
            node.height()
        }

        let strict = self.policy == DuplicatePolicy::DistinctKeys;
        let mut num_nodes = 0;
        if let Some(root) = self.root() {
            check(root, &self.cmp, strict, &mut num_nodes);
        }
        assert_eq!(num_nodes, self.num_nodes);

        // Check in-order sequence
        let nodes = self.to_vec();
        assert_eq!(nodes.len(), self.num_nodes);
        for pair in nodes.windows(2) {
            let order = self.cmp.compare(&pair[0].key, &pair[1].key);
            assert!(order == Ordering::Less || (!strict && order == Ordering::Equal));
        }
    }
}

impl<K, C, Cmp: Default> Default for AvlTree<K, C, Cmp> {
    fn default() -> Self {
        Self::new(Cmp::default(), DuplicatePolicy::default())
    }
}

impl<K: fmt::Debug, C: fmt::Debug, Cmp> fmt::Debug for AvlTree<K, C, Cmp> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|node| (&node.key, &node.content)))
            .finish()
    }
}

impl<'a, K, C, Cmp> IntoIterator for &'a AvlTree<K, C, Cmp> {
    type Item = &'a Node<K, C>;
    type IntoIter = Iter<'a, K, C>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, C> Iter<'a, K, C> {
    fn new(root: Option<&'a Node<K, C>>, len: usize) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            remaining: len,
        };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut current: Option<&'a Node<K, C>>) {
        while let Some(node) = current {
            self.stack.push(node);
            current = node.left();
        }
    }
}

// Auto derived clone seems to have an invalid type bound of K: Clone
impl<'a, K, C> Clone for Iter<'a, K, C> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, C> Iterator for Iter<'a, K, C> {
    type Item = &'a Node<K, C>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right());
        self.remaining -= 1;
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, C> ExactSizeIterator for Iter<'_, K, C> {}
