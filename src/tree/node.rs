use std::cmp;

pub(crate) type Link<K, C> = Option<Box<Node<K, C>>>;

/// A tree node holding a sort key, its content and two exclusively owned subtrees.
///
/// Heights count edges: a leaf has height 0.
/// Each node also caches the number of nodes in its subtree for rank queries.
#[derive(Clone)]
pub struct Node<K, C> {
    pub(crate) key: K,
    pub(crate) content: C,
    pub(crate) left: Link<K, C>,
    pub(crate) right: Link<K, C>,
    height: usize,
    len: usize,
}

impl<K, C> Node<K, C> {
    pub(crate) fn create(key: K, content: C) -> Box<Self> {
        Box::new(Node {
            key,
            content,
            left: None,
            right: None,
            height: 0,
            len: 1,
        })
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut C {
        &mut self.content
    }

    pub fn left(&self) -> Option<&Node<K, C>> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&Node<K, C>> {
        self.right.as_deref()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of nodes in the subtree rooted here, this node included.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the node reached by following left links from here.
    pub fn leftmost_descendant(&self) -> &Node<K, C> {
        let mut node = self;
        while let Some(left) = node.left() {
            node = left;
        }
        node
    }

    /// Returns the node reached by following right links from here.
    pub fn rightmost_descendant(&self) -> &Node<K, C> {
        let mut node = self;
        while let Some(right) = node.right() {
            node = right;
        }
        node
    }

    /// Height difference `right - left`; within `-1..=1` for a balanced node.
    pub fn balance_factor(&self) -> isize {
        self.right_height() as isize - self.left_height() as isize
    }

    pub(crate) fn left_len(&self) -> usize {
        self.left.as_ref().map_or(0, |left| left.len)
    }

    pub(crate) fn left_height(&self) -> usize {
        match &self.left {
            None => 0,
            Some(left) => left.height + 1,
        }
    }

    pub(crate) fn right_height(&self) -> usize {
        match &self.right {
            None => 0,
            Some(right) => right.height + 1,
        }
    }

    /// Recomputes the cached height and subtree length from the children.
    pub(crate) fn update_height(&mut self) {
        self.height = cmp::max(self.left_height(), self.right_height());
        self.len = 1 + self.left_len() + self.right.as_ref().map_or(0, |right| right.len);
    }

    /// Promotes the right child and returns it as the new subtree root.
    /// The right child's left subtree becomes this node's right subtree.
    pub(crate) fn rotate_left(mut self: Box<Self>) -> Box<Self> {
        match self.right.take() {
            None => self,
            Some(mut right) => {
                self.right = right.left.take();
                self.update_height();
                right.left = Some(self);
                right.update_height();
                right
            }
        }
    }

    /// Promotes the left child and returns it as the new subtree root.
    /// The left child's right subtree becomes this node's left subtree.
    pub(crate) fn rotate_right(mut self: Box<Self>) -> Box<Self> {
        match self.left.take() {
            None => self,
            Some(mut left) => {
                self.left = left.right.take();
                self.update_height();
                left.right = Some(self);
                left.update_height();
                left
            }
        }
    }

    /// Restores the AVL condition at this node if necessary and refreshes its caches.
    /// Initial imbalance must not exceed two levels, which holds after a single update.
    /// Returns the new subtree root.
    pub(crate) fn rebalance(mut self: Box<Self>) -> Box<Self> {
        let left_height = self.left_height();
        let right_height = self.right_height();
        debug_assert!(left_height <= right_height + 2);
        debug_assert!(right_height <= left_height + 2);
        if left_height > right_height + 1 {
            // Left-right case needs the left child straightened first
            if let Some(left) = self.left.take() {
                self.left = Some(if left.balance_factor() > 0 {
                    tracing::trace!("rotate left-right");
                    left.rotate_left()
                } else {
                    tracing::trace!("rotate left-left");
                    left
                });
            }
            self.rotate_right()
        } else if right_height > left_height + 1 {
            // Right-left case needs the right child straightened first
            if let Some(right) = self.right.take() {
                self.right = Some(if right.balance_factor() < 0 {
                    tracing::trace!("rotate right-left");
                    right.rotate_right()
                } else {
                    tracing::trace!("rotate right-right");
                    right
                });
            }
            self.rotate_left()
        } else {
            self.update_height();
            self
        }
    }
}
