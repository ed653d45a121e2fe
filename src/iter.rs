use core::iter::FusedIterator;

use crate::{bst::RawTree, Dir, Link, Links, TreeNode};

/// An in-order iterator over the elements of an [`AvlTree`] or [`BinarySearchTree`].
///
/// Iterates from both ends; the two ends never cross.
///
/// [`AvlTree`]: crate::AvlTree
/// [`BinarySearchTree`]: crate::BinarySearchTree
pub struct Iter<'tree, T: TreeNode<Links<T>> + ?Sized> {
    tree: &'tree RawTree<T>,

    // Next element to yield from each end.
    front: Link<T>,
    back: Link<T>,

    // Elements not yet yielded from either end.
    remaining: usize,
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> Iter<'tree, T> {
    pub(crate) fn new(tree: &'tree RawTree<T>) -> Self {
        Iter {
            tree,
            front: tree.first_raw(),
            back: tree.last_raw(),
            remaining: tree.len,
        }
    }

    // Yields the element at the `dir`-facing end and advances that end one step toward the
    // other.
    fn step(&mut self, dir: Dir) -> Option<&'tree T> {
        if self.remaining == 0 {
            return None;
        }

        let end = match dir {
            Dir::Left => &mut self.front,
            Dir::Right => &mut self.back,
        };

        let cur = (*end)?;

        // Moving the front end goes right through the tree, and vice versa.
        *end = unsafe { self.tree.neighbor_raw(cur, !dir) };
        self.remaining -= 1;

        Some(unsafe { cur.as_ref() })
    }
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> Iterator for Iter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        self.step(Dir::Left)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> DoubleEndedIterator for Iter<'tree, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.step(Dir::Right)
    }
}

impl<T: TreeNode<Links<T>> + ?Sized> ExactSizeIterator for Iter<'_, T> {}

impl<T: TreeNode<Links<T>> + ?Sized> FusedIterator for Iter<'_, T> {}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::prelude::v1::*;

    use crate::{model::TestNode, AvlTree};

    #[test]
    fn both_ends_meet() {
        let mut tree: AvlTree<TestNode> = AvlTree::new();
        for key in [4, 2, 6, 1, 3, 5, 7] {
            tree.insert(TestNode::new(key));
        }

        let mut iter = tree.iter();
        assert_eq!(iter.len(), 7);
        assert_eq!(iter.next().map(|n| n.key), Some(1));
        assert_eq!(iter.next_back().map(|n| n.key), Some(7));
        assert_eq!(iter.next_back().map(|n| n.key), Some(6));

        let middle: Vec<u32> = iter.by_ref().map(|n| n.key).collect();
        assert_eq!(middle, [2, 3, 4, 5]);
        assert!(iter.next().is_none());
        assert!(iter.next_back().is_none());
    }

    #[test]
    fn reversed() {
        let mut tree: AvlTree<TestNode> = AvlTree::new();
        for key in 0..50 {
            tree.insert(TestNode::new(key));
        }

        let keys: Vec<u32> = tree.iter().rev().map(|n| n.key).collect();
        assert_eq!(keys, (0..50).rev().collect::<Vec<_>>());
        assert!(AvlTree::<TestNode>::new().iter().next().is_none());
    }
}
