//! An intrusive AVL tree.
//!
//! Conventions used in comments:
//! - The height of an empty subtree is 0; the height of a leaf is 1.
//! - The balance of a node `x` is `h(left(x)) - h(right(x))`, so positive balances lean left.
//! - A node is _left-heavy_ (_right-heavy_) when its balance is +2 (-2).
//!
//! The fundamental invariant of an AVL tree is that between operations every balance is -1, 0
//! or +1. A single insertion or removal can push the balance of an ancestor of the affected node
//! to ±2, which is repaired with a single or double rotation.
//!
//! The tree is built in two layers. [`BinarySearchTree`] (and the `RawTree` skeleton it shares
//! with [`AvlTree`]) places, splices and swaps nodes without looking at balances; [`AvlTree`]
//! delegates all of that structural work to the skeleton and only walks the affected path
//! afterwards, updating balances and rotating where needed.

use core::{
    borrow::Borrow, cell::UnsafeCell, fmt, marker::PhantomPinned, mem, ops::Not, pin::Pin,
    ptr::NonNull,
};

use cordyceps::Linked;
use tracing::trace;

mod bst;
mod debug;
mod entry;
mod error;
mod iter;

#[cfg(any(test, feature = "alloc"))]
pub mod map;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

use bst::{RawTree, Search};

pub use bst::BinarySearchTree;
pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use error::KeyError;
pub use iter::Iter;

pub trait TreeNode<L>: Linked<L> {
    type Key: Ord + fmt::Debug;

    fn key(&self) -> &Self::Key;
}

/// An intrusive AVL tree.
///
/// Elements are owned by the tree through their [`Linked::Handle`] from the moment they are
/// inserted until they are removed, at which point the handle is given back. Dropping the tree
/// drops every element still linked into it.
///
/// Lookups, insertions and removals complete in _O(log(n))_ time.
pub struct AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    raw: RawTree<T>,
}

/// Links embedded in every element of an [`AvlTree`] or [`BinarySearchTree`].
///
/// Child links are owning; the parent link is a plain back-reference used for navigation only.
pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    // Returns the change in a node's balance when its subtree on this side grows by one level.
    #[inline]
    fn balance_sign(self) -> i8 {
        match self {
            Dir::Left => 1,
            Dir::Right => -1,
        }
    }

    // Returns the heavy side of a node with the given balance, if it violates the AVL invariant.
    #[inline]
    fn heavy_side(balance: i8) -> Option<Dir> {
        match balance {
            2 => Some(Dir::Left),
            -2 => Some(Dir::Right),
            _ => None,
        }
    }
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    balance: i8,
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<T> {
        AvlTree {
            raw: RawTree::new(),
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.raw.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.raw.len
    }

    /// Returns the number of nodes on the longest path from the root to a leaf.
    ///
    /// An AVL tree of `n` elements is never taller than about `1.44 * log2(n + 2)`.
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns `true` if all leaves of the tree are at the same depth.
    pub fn leaves_at_equal_depth(&self) -> bool {
        self.raw.leaves_at_equal_depth()
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.raw.assert_structure();

        if let Some(root) = self.raw.root {
            unsafe { self.assert_balanced_at(root) };
        }
    }

    // Checks the stored balance of every node in the subtree and returns the subtree's height.
    unsafe fn assert_balanced_at(&self, node: NonNull<T>) -> i32 {
        unsafe {
            let links = self.raw.links(node);
            let left = links.left().map_or(0, |l| self.assert_balanced_at(l));
            let right = links.right().map_or(0, |r| self.assert_balanced_at(r));
            let balance = links.balance();

            assert_eq!(
                i32::from(balance),
                left - right,
                "stored balance of {:?} does not match its subtree heights",
                node.as_ref().key()
            );
            assert!(
                (-1..=1).contains(&balance),
                "{:?} is out of balance: {balance}",
                node.as_ref().key()
            );

            1 + left.max(right)
        }
    }

    /// Returns `true` if the tree contains an element with the given key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.get_raw(key).is_some()
    }

    /// Returns a reference to the element corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.get(key)
    }

    /// Returns a pinned mutable reference to the element corresponding to `key`.
    ///
    /// The caller must not change the outcome of comparisons between the element's key and the
    /// keys of other elements.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.get_mut(key)
    }

    /// Returns a reference to the element corresponding to `key`, or [`KeyError`] if there is
    /// none.
    pub fn find<Q>(&self, key: &Q) -> Result<Pin<&T>, KeyError>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.find(key)
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        self.raw.first()
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        self.raw.last()
    }

    /// Returns the element immediately preceding the element with the given key.
    ///
    /// Returns `None` if `key` is not in the tree or its element is the minimum.
    pub fn predecessor<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.neighbor(key, Dir::Left)
    }

    /// Returns the element immediately following the element with the given key.
    ///
    /// Returns `None` if `key` is not in the tree or its element is the maximum.
    pub fn successor<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.neighbor(key, Dir::Right)
    }

    /// Returns an in-order iterator over the elements of the tree.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.raw)
    }

    /// Returns the entry for `key`, which may be vacant or occupied.
    pub fn entry<Q>(&mut self, key: &Q) -> Entry<'_, T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        unsafe {
            match self.raw.search(key) {
                Search::Empty => Entry::vacant_root(self),
                Search::Vacant { parent, dir } => Entry::vacant_child(self, parent, dir),
                Search::Found(node) => Entry::occupied(self, node),
            }
        }
    }

    /// Inserts an item into the tree.
    ///
    /// If an element with an equal key is already present, `item` takes over its position in
    /// place, without any rebalancing, and the old element is returned.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, item: T::Handle) -> Option<T::Handle> {
        let ptr = T::into_ptr(item);

        unsafe {
            match self.raw.search(ptr.as_ref().key()) {
                Search::Empty => self.insert_as_root(ptr),
                Search::Vacant { parent, dir } => self.insert_as_child(parent, dir, ptr),
                Search::Found(existing) => return Some(self.raw.replace_node(existing, ptr)),
            }
        }

        None
    }

    pub(crate) unsafe fn insert_as_root(&mut self, ptr: NonNull<T>) {
        unsafe { self.raw.attach(None, Dir::Left, ptr) };
    }

    pub(crate) unsafe fn insert_as_child(&mut self, parent: NonNull<T>, dir: Dir, ptr: NonNull<T>) {
        unsafe {
            self.raw.attach(Some(parent), dir, ptr);
            self.rebalance_inserted(parent, ptr);
        }
    }

    pub(crate) unsafe fn replace_at(&mut self, old: NonNull<T>, new: NonNull<T>) -> T::Handle {
        unsafe { self.raw.replace_node(old, new) }
    }

    // Walks up from the parent of a newly attached leaf, accounting for the extra level of height
    // below each ancestor.
    //
    // Invariants:
    // - `child` is a child of `parent`.
    // - The subtree rooted at `child` has just grown by one level.
    fn rebalance_inserted(&mut self, parent: NonNull<T>, child: NonNull<T>) {
        let mut child = child;
        let mut opt_parent = Some(parent);

        while let Some(parent) = opt_parent {
            unsafe {
                let side = self.raw.which_child(parent, Some(child));
                let links = self.raw.links_mut(parent);
                links.update_balance(side.balance_sign());

                match links.balance() {
                    // The shorter side caught up. The subtree height is unchanged.
                    0 => {
                        trace!("insert rebalance absorbed");
                        break;
                    }

                    // The subtree grew by one level. Ascend.
                    1 | -1 => {
                        child = parent;
                        opt_parent = links.parent();
                    }

                    // One rotation restores the subtree to its height before the insertion.
                    _ => {
                        self.fix_inserted(parent);
                        break;
                    }
                }
            }
        }
    }

    // Walks up from the former parent of a spliced node, accounting for the lost level of height
    // on `side`.
    fn rebalance_removed(&mut self, parent: NonNull<T>, side: Dir) {
        let mut parent = parent;
        let mut side = side;

        loop {
            unsafe {
                // Losing height on one side tips the balance toward the other.
                self.raw
                    .links_mut(parent)
                    .update_balance(-side.balance_sign());

                let shrunk = match self.raw.links(parent).balance() {
                    // The node used to be balanced. The subtree height is unchanged.
                    1 | -1 => break,

                    // The taller side was shortened, so the subtree lost a level.
                    0 => parent,

                    _ => {
                        let subtree = self.fix_removed(parent);

                        // A rotated subtree whose root leans to one side kept its height.
                        if self.raw.links(subtree).balance() != 0 {
                            break;
                        }

                        subtree
                    }
                };

                let Some(grandparent) = self.raw.links(shrunk).parent() else {
                    break;
                };

                side = self.raw.which_child(grandparent, Some(shrunk));
                parent = grandparent;
            }
        }

        trace!("remove rebalance settled");
    }

    // Repairs a node with balance ±2 reached while walking up after an insertion.
    //
    // Returns the root of the repaired subtree.
    //
    // On this path the heavy child is the child the walk came from, whose balance is never 0.
    unsafe fn fix_inserted(&mut self, node: NonNull<T>) -> NonNull<T> {
        unsafe {
            let balance = self.raw.links(node).balance();
            let Some(heavy) = Dir::heavy_side(balance) else {
                return node;
            };
            let sign = heavy.balance_sign();

            let heavy_child = self.raw.links(node).child(heavy);
            debug_assert!(heavy_child.is_some(), "heavy side must have a child");
            let Some(child) = heavy_child else {
                return node;
            };

            let child_balance = self.raw.links(child).balance();
            trace!(balance, child_balance, "rebalancing after insert");

            if child_balance * sign >= 0 {
                debug_assert_eq!(child_balance, sign);

                self.rotate(node, !heavy);

                self.raw.links_mut(child).set_balance(0);
                self.raw.links_mut(node).set_balance(0);

                return child;
            }

            let inner_child = self.raw.links(child).child(!heavy);
            debug_assert!(inner_child.is_some(), "inner side must have a child");
            let Some(grandchild) = inner_child else {
                return node;
            };

            let grandchild_balance = self.raw.links(grandchild).balance();

            self.rotate(child, heavy);
            self.rotate(node, !heavy);

            let (node_balance, child_balance) = if grandchild_balance == sign {
                (-sign, 0)
            } else if grandchild_balance == 0 {
                (0, 0)
            } else {
                (0, sign)
            };

            self.raw.links_mut(node).set_balance(node_balance);
            self.raw.links_mut(child).set_balance(child_balance);
            self.raw.links_mut(grandchild).set_balance(0);

            grandchild
        }
    }

    // Repairs a node with balance ±2 reached while walking up after a removal.
    //
    // Returns the root of the repaired subtree. Its balance is 0 iff the subtree is now one level
    // shorter than before the removal.
    //
    // Unlike on the insert path, the heavy child may be balanced here.
    unsafe fn fix_removed(&mut self, node: NonNull<T>) -> NonNull<T> {
        unsafe {
            let balance = self.raw.links(node).balance();
            let Some(heavy) = Dir::heavy_side(balance) else {
                return node;
            };
            let sign = heavy.balance_sign();

            let heavy_child = self.raw.links(node).child(heavy);
            debug_assert!(heavy_child.is_some(), "heavy side must have a child");
            let Some(child) = heavy_child else {
                return node;
            };

            let child_balance = self.raw.links(child).balance();
            trace!(balance, child_balance, "rebalancing after remove");

            if child_balance * sign >= 0 {
                self.rotate(node, !heavy);

                if child_balance == 0 {
                    self.raw.links_mut(child).set_balance(-sign);
                    self.raw.links_mut(node).set_balance(sign);
                } else {
                    self.raw.links_mut(child).set_balance(0);
                    self.raw.links_mut(node).set_balance(0);
                }

                return child;
            }

            let inner_child = self.raw.links(child).child(!heavy);
            debug_assert!(inner_child.is_some(), "inner side must have a child");
            let Some(grandchild) = inner_child else {
                return node;
            };

            let grandchild_balance = self.raw.links(grandchild).balance();

            self.rotate(child, heavy);
            self.rotate(node, !heavy);

            let (node_balance, child_balance) = if grandchild_balance == 0 {
                (0, 0)
            } else if grandchild_balance == sign {
                (-sign, 0)
            } else {
                (0, sign)
            };

            self.raw.links_mut(node).set_balance(node_balance);
            self.raw.links_mut(child).set_balance(child_balance);
            self.raw.links_mut(grandchild).set_balance(0);

            grandchild
        }
    }

    // Performs a rotation moving `node` down in direction `dir` (`Dir::Left` is a left rotation):
    // its `!dir` child takes its place and `node` becomes that child's `dir` child. The promoted child's inner (`dir`) subtree
    // moves across to become `node`'s `!dir` subtree.
    //
    // Balances are not updated.
    //
    // Does nothing if `node` has no `!dir` child; debug builds panic instead.
    unsafe fn rotate(&mut self, node: NonNull<T>, dir: Dir) {
        unsafe {
            let promoted = self.raw.links(node).child(!dir);
            debug_assert!(promoted.is_some(), "rotation requires a child to promote");
            let Some(up) = promoted else {
                return;
            };

            let across = self.raw.links(up).child(dir);
            let parent = self.raw.links(node).parent();

            self.raw.replace_child_or_set_root(parent, node, Some(up));
            self.raw.links_mut(up).set_parent(parent);
            self.raw.links_mut(up).set_child(dir, Some(node));

            self.raw.links_mut(node).set_parent(Some(up));
            self.raw.links_mut(node).set_child(!dir, across);
            self.raw.maybe_set_parent(across, Some(node));

            trace!(?dir, "rotate");
        }
    }

    // Exchanges the tree positions of `a` and `b` along with their balances, since a balance
    // describes a position rather than an element.
    unsafe fn swap_nodes(&mut self, a: NonNull<T>, b: NonNull<T>) {
        unsafe {
            self.raw.swap_nodes(a, b);

            let a_balance = self.raw.links(a).balance();
            let b_balance = self.raw.links(b).balance();
            self.raw.links_mut(a).set_balance(b_balance);
            self.raw.links_mut(b).set_balance(a_balance);
        }
    }

    /// Removes the element with the given key, if any.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.raw.get_raw(key)?;
        unsafe { Some(self.remove_at(node)) }
    }

    /// Removes an arbitrary node from the tree.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        // A node with two children first trades places with its predecessor, the maximum of its
        // left subtree. The predecessor has no right child, so after the swap `node` has at most
        // one child and can be spliced out directly.
        unsafe {
            let links = self.raw.links(node);
            if links.left().is_some() && links.right().is_some() {
                if let Some(pred) = self.raw.predecessor_raw(node) {
                    self.swap_nodes(node, pred);
                }
            }

            if let Some((parent, side)) = self.raw.splice(node) {
                self.rebalance_removed(parent, side);
            }

            self.raw.links_mut(node).clear();

            T::from_ptr(node)
        }
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let first = self.raw.first_raw()?;
        unsafe { Some(self.remove_at(first)) }
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let last = self.raw.last_raw()?;
        unsafe { Some(self.remove_at(last)) }
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        self.raw.clear();
    }
}

impl<T> Default for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                balance: 0,
                _unpin: PhantomPinned,
            }),
        }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.left().is_none() && self.right().is_none()
    }

    #[inline]
    fn balance(&self) -> i8 {
        unsafe { (*self.inner.get()).balance }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    fn set_right(&mut self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    fn set_balance(&mut self, balance: i8) {
        self.inner.get_mut().balance = balance;
    }

    #[inline]
    fn update_balance(&mut self, diff: i8) {
        let inner = self.inner.get_mut();
        inner.balance = inner.balance.wrapping_add(diff);
        debug_assert!((-2..=2).contains(&inner.balance));
    }

    // Resets the links to their unlinked state.
    #[inline]
    fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.balance = 0;
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .field("balance", &self.balance())
            .finish()
    }
}
