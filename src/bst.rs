use core::{borrow::Borrow, cmp::Ordering, pin::Pin, ptr::NonNull};

use crate::{iter::Iter, Dir, KeyError, Link, Links, TreeNode};

// The outcome of descending the tree in search of a key.
pub(crate) enum Search<T: ?Sized> {
    // The tree has no elements.
    Empty,
    // An element with the key exists.
    Found(NonNull<T>),
    // The key is absent and belongs in the `dir` child slot of `parent`, which is empty.
    Vacant { parent: NonNull<T>, dir: Dir },
}

/// The ordered-tree skeleton shared by [`BinarySearchTree`] and [`AvlTree`].
///
/// `RawTree` owns the root and knows how to search, attach, splice and swap elements, but never
/// rebalances. Balance factors stored in the links are ignored here, except that [`attach`]
/// resets them; keeping them meaningful is left to the balancing layer.
///
/// [`AvlTree`]: crate::AvlTree
/// [`attach`]: RawTree::attach
pub(crate) struct RawTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) root: Link<T>,
    pub(crate) len: usize,
}

impl<T> RawTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) const fn new() -> RawTree<T> {
        RawTree { root: None, len: 0 }
    }

    #[inline]
    pub(crate) unsafe fn links<'a>(&self, node: NonNull<T>) -> &'a Links<T> {
        unsafe { T::links(node).as_ref() }
    }

    #[inline]
    pub(crate) unsafe fn links_mut<'a>(&mut self, node: NonNull<T>) -> &'a mut Links<T> {
        unsafe { T::links(node).as_mut() }
    }

    pub(crate) fn search<Q>(&self, key: &Q) -> Search<T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(mut cur) = self.root else {
            return Search::Empty;
        };

        loop {
            let dir = match key.cmp(unsafe { cur.as_ref() }.key().borrow()) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return Search::Found(cur),
                Ordering::Greater => Dir::Right,
            };

            match unsafe { self.links(cur).child(dir) } {
                Some(child) => cur = child,
                None => return Search::Vacant { parent: cur, dir },
            }
        }
    }

    pub(crate) fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            Search::Found(node) => Some(node),
            Search::Empty | Search::Vacant { .. } => None,
        }
    }

    /// Strict lookup: fails with [`KeyError`] instead of returning `None`.
    pub(crate) fn find_raw<Q>(&self, key: &Q) -> Result<NonNull<T>, KeyError>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).ok_or(KeyError)
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    pub(crate) fn find<Q>(&self, key: &Q) -> Result<Pin<&T>, KeyError>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.find_raw(key)?;
        unsafe { Ok(Pin::new_unchecked(ptr.as_ref())) }
    }

    pub(crate) fn first(&self) -> Option<Pin<&T>> {
        self.first_raw()
            .map(|ptr| unsafe { Pin::new_unchecked(ptr.as_ref()) })
    }

    pub(crate) fn last(&self) -> Option<Pin<&T>> {
        self.last_raw()
            .map(|ptr| unsafe { Pin::new_unchecked(ptr.as_ref()) })
    }

    // Returns the in-order neighbour in direction `dir` of the element stored under `key`.
    pub(crate) fn neighbor<Q>(&self, key: &Q, dir: Dir) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.get_raw(key)?;
        let neighbor = unsafe { self.neighbor_raw(node, dir)? };
        unsafe { Some(Pin::new_unchecked(neighbor.as_ref())) }
    }

    pub(crate) fn first_raw(&self) -> Link<T> {
        self.root
            .map(|root| unsafe { self.extreme_in_subtree(root, Dir::Left) })
    }

    pub(crate) fn last_raw(&self) -> Link<T> {
        self.root
            .map(|root| unsafe { self.extreme_in_subtree(root, Dir::Right) })
    }

    // Returns the node reached by following `dir` links from `root` until none remain.
    #[inline]
    pub(crate) unsafe fn extreme_in_subtree(&self, root: NonNull<T>, dir: Dir) -> NonNull<T> {
        let mut cur = root;

        while let Some(next) = unsafe { self.links(cur).child(dir) } {
            cur = next;
        }

        cur
    }

    // Returns the in-order neighbour of `node` in direction `dir`: the predecessor for
    // `Dir::Left`, the successor for `Dir::Right`.
    pub(crate) unsafe fn neighbor_raw(&self, node: NonNull<T>, dir: Dir) -> Link<T> {
        unsafe {
            // The neighbour is the nearest node of the `dir` subtree, if there is one.
            if let Some(child) = self.links(node).child(dir) {
                return Some(self.extreme_in_subtree(child, !dir));
            }

            // Otherwise it is the first ancestor reached from its `!dir` side.
            let mut cur = node;
            while let Some(parent) = self.links(cur).parent() {
                if self.links(parent).child(!dir) == Some(cur) {
                    return Some(parent);
                }

                cur = parent;
            }

            None
        }
    }

    #[inline]
    pub(crate) unsafe fn predecessor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.neighbor_raw(node, Dir::Left) }
    }

    #[inline]
    pub(crate) unsafe fn which_child(&self, parent: NonNull<T>, child: Link<T>) -> Dir {
        if unsafe { self.links(parent).left() } == child {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    #[inline]
    pub(crate) unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { self.links_mut(node).set_parent(parent) };
    }

    #[inline]
    pub(crate) unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { self.replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that `old_child` is a child node of `parent`.
    unsafe fn replace_child(
        &mut self,
        parent: NonNull<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        unsafe {
            let links = self.links_mut(parent);

            if links.left() == Some(old_child) {
                links.set_left(new_child);
            } else {
                debug_assert_eq!(
                    links.right(),
                    Some(old_child),
                    "`old_child` must be a child of `parent`"
                );

                links.set_right(new_child);
            }
        }
    }

    // Links `node` into the empty `dir` slot of `parent`, or as the root if `parent` is `None`.
    //
    // The node's links are reset, so it enters the tree as a leaf with balance 0.
    //
    // # Safety
    //
    // `node` must not be linked into any tree, and the slot must be empty and ordered correctly
    // for the node's key.
    pub(crate) unsafe fn attach(&mut self, parent: Link<T>, dir: Dir, node: NonNull<T>) {
        unsafe {
            self.links_mut(node).clear();
            self.links_mut(node).set_parent(parent);

            match parent {
                Some(parent) => {
                    debug_assert!(self.links(parent).child(dir).is_none());
                    self.links_mut(parent).set_child(dir, Some(node));
                }

                None => {
                    debug_assert!(self.root.is_none());
                    self.root = Some(node);
                }
            }
        }

        self.len += 1;
    }

    // Unlinks `node`, which has at most one child, by elevating that child (or nothing) into its
    // place.
    //
    // Returns the former parent of `node` together with the side of the parent `node` hung from,
    // or `None` if `node` was the root. The node's own links are left untouched.
    pub(crate) unsafe fn splice(&mut self, node: NonNull<T>) -> Option<(NonNull<T>, Dir)> {
        unsafe {
            let links = self.links(node);
            debug_assert!(
                links.left().is_none() || links.right().is_none(),
                "cannot splice a node with two children"
            );

            let parent = links.parent();
            let child = links.left().or(links.right());
            let side = parent.map(|p| self.which_child(p, Some(node)));

            self.replace_child_or_set_root(parent, node, child);
            self.maybe_set_parent(child, parent);
            self.len -= 1;

            parent.zip(side)
        }
    }

    // Exchanges the structural positions of `a` and `b`: each takes over the other's parent and
    // children. Adjacent nodes are handled. Balance factors stay with their nodes.
    pub(crate) unsafe fn swap_nodes(&mut self, a: NonNull<T>, b: NonNull<T>) {
        debug_assert_ne!(a, b, "cannot swap a node with itself");
        if a == b {
            return;
        }

        unsafe {
            let a_parent = self.links(a).parent();
            let a_left = self.links(a).left();
            let a_right = self.links(a).right();
            let a_side = a_parent.map(|p| self.which_child(p, Some(a)));

            let b_parent = self.links(b).parent();
            let b_left = self.links(b).left();
            let b_right = self.links(b).right();
            let b_side = b_parent.map(|p| self.which_child(p, Some(b)));

            // A link to one of the pair becomes a link to the other.
            let flip = |link: Link<T>| match link {
                Some(n) if n == a => Some(b),
                Some(n) if n == b => Some(a),
                other => other,
            };

            let links = self.links_mut(a);
            links.set_parent(flip(b_parent));
            links.set_left(flip(b_left));
            links.set_right(flip(b_right));

            let links = self.links_mut(b);
            links.set_parent(flip(a_parent));
            links.set_left(flip(a_left));
            links.set_right(flip(a_right));

            for node in [a, b] {
                for dir in [Dir::Left, Dir::Right] {
                    let child = self.links(node).child(dir);
                    self.maybe_set_parent(child, Some(node));
                }
            }

            // Re-point the outer parents. A parent that is the other node of the pair was already
            // fixed above.
            match (b_parent, b_side) {
                (Some(p), Some(side)) if p != a => {
                    self.links_mut(p).set_child(side, Some(a));
                }
                (None, _) => self.root = Some(a),
                _ => (),
            }

            match (a_parent, a_side) {
                (Some(p), Some(side)) if p != b => {
                    self.links_mut(p).set_child(side, Some(b));
                }
                (None, _) => self.root = Some(b),
                _ => (),
            }
        }
    }

    // Puts `new` in the exact position of `old` (links and balance), unlinking `old`.
    //
    // # Safety
    //
    // `old` must be an element of this tree and `new` must compare equal to it and not be linked
    // into any tree.
    pub(crate) unsafe fn replace_node(&mut self, old: NonNull<T>, new: NonNull<T>) -> T::Handle {
        unsafe {
            let old_links = self.links(old);
            let balance = old_links.balance();
            let parent = old_links.parent();
            let left = old_links.left();
            let right = old_links.right();

            self.replace_child_or_set_root(parent, old, Some(new));
            self.maybe_set_parent(left, Some(new));
            self.maybe_set_parent(right, Some(new));

            let new_links = self.links_mut(new);
            new_links.set_parent(parent);
            new_links.set_left(left);
            new_links.set_right(right);
            new_links.set_balance(balance);

            self.links_mut(old).clear();

            T::from_ptr(old)
        }
    }

    /// Clears the tree, dropping all elements.
    pub(crate) fn clear(&mut self) {
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node.
                let cur = self.extreme_in_subtree(cur, Dir::Left);
                let parent = self.links(cur).parent();
                let right = self.links(cur).right();

                // Elevate the node's right child (which may be None).
                self.replace_child_or_set_root(parent, cur, right);
                self.maybe_set_parent(right, parent);

                // Drop the node.
                self.links_mut(cur).clear();
                drop(T::from_ptr(cur));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If the node had no parent,
                // the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len, 0);
    }

    /// Returns the number of nodes on the longest root-to-leaf path.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(NonNull<T>, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();

        while let Some((node, depth)) = stack.pop() {
            height = height.max(depth);

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = unsafe { self.links(node).child(dir) } {
                    stack.push((child, depth + 1));
                }
            }
        }

        height
    }

    /// Returns `true` if every leaf sits at the same depth.
    pub(crate) fn leaves_at_equal_depth(&self) -> bool {
        let mut leaf_depth = None;
        let mut stack: Vec<(NonNull<T>, usize)> = self.root.map(|r| (r, 0)).into_iter().collect();

        while let Some((node, depth)) = stack.pop() {
            let links = unsafe { self.links(node) };

            if links.is_leaf() {
                match leaf_depth {
                    None => leaf_depth = Some(depth),
                    Some(d) if d != depth => return false,
                    Some(_) => (),
                }

                continue;
            }

            for child in [links.left(), links.right()].into_iter().flatten() {
                stack.push((child, depth + 1));
            }
        }

        true
    }

    // Checks parent links, the element count and strict in-order key ordering.
    pub(crate) fn assert_structure(&self) {
        if let Some(root) = self.root {
            assert_eq!(
                unsafe { self.links(root).parent() },
                None,
                "root must not have a parent"
            );
        }

        let mut stack: Vec<NonNull<T>> = self.root.into_iter().collect();
        let mut count = 0;

        while let Some(node) = stack.pop() {
            count += 1;

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = unsafe { self.links(node).child(dir) } {
                    let parent = unsafe { self.links(child).parent() };
                    assert_eq!(parent, Some(node), "child's parent pointer must point back");

                    stack.push(child);
                }
            }
        }

        assert_eq!(count, self.len, "element count does not match the tree");

        let mut prev: Option<&T::Key> = None;
        for item in Iter::new(self) {
            if let Some(prev) = prev {
                assert!(
                    prev < item.key(),
                    "keys out of order: {:?} then {:?}",
                    prev,
                    item.key()
                );
            }

            prev = Some(item.key());
        }
    }
}

impl<T> Drop for RawTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

/// An intrusive binary search tree without any balancing.
///
/// Elements are placed by plain descent and removed by splicing, swapping a two-child element
/// with its in-order predecessor first. Operations are _O(h)_ where _h_ is the height of the tree,
/// which degrades to _O(n)_ for sorted input. See [`AvlTree`] for the self-balancing variant.
///
/// [`AvlTree`]: crate::AvlTree
pub struct BinarySearchTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    raw: RawTree<T>,
}

impl<T> BinarySearchTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> BinarySearchTree<T> {
        BinarySearchTree {
            raw: RawTree::new(),
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        self.raw.len == 0
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.raw.len
    }

    /// Returns the number of nodes on the longest path from the root to a leaf.
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

    /// Inserts an element into the tree.
    ///
    /// If an element with an equal key is already present, `item` takes its place and the old
    /// element is returned.
    pub fn insert(&mut self, item: T::Handle) -> Option<T::Handle> {
        let ptr = T::into_ptr(item);

        unsafe {
            match self.raw.search(ptr.as_ref().key()) {
                Search::Empty => self.raw.attach(None, Dir::Left, ptr),
                Search::Vacant { parent, dir } => self.raw.attach(Some(parent), dir, ptr),
                Search::Found(existing) => return Some(self.raw.replace_node(existing, ptr)),
            }
        }

        None
    }

    /// Removes the element with the given key, if any.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.raw.get_raw(key)?;
        unsafe { Some(self.remove_at(node)) }
    }

    /// Removes an arbitrary element from the tree.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        unsafe {
            let links = self.raw.links(node);
            if links.left().is_some() && links.right().is_some() {
                if let Some(pred) = self.raw.predecessor_raw(node) {
                    self.raw.swap_nodes(node, pred);
                }
            }

            self.raw.splice(node);
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

    pub(crate) fn raw(&self) -> &RawTree<T> {
        &self.raw
    }
}

impl<T> Default for BinarySearchTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::prelude::v1::*;

    use super::*;
    use crate::model::TestNode;

    fn build(keys: &[u32]) -> BinarySearchTree<TestNode> {
        let mut tree = BinarySearchTree::new();

        for &key in keys {
            assert!(tree.insert(TestNode::new(key)).is_none());
            tree.assert_invariants();
        }

        tree
    }

    fn keys(tree: &BinarySearchTree<TestNode>) -> Vec<u32> {
        tree.iter().map(|node| node.key).collect()
    }

    #[test]
    fn sorted_insert_degenerates() {
        let tree = build(&[1, 2, 3, 4, 5]);

        assert_eq!(tree.height(), 5);
        assert!(tree.leaves_at_equal_depth());
        assert_eq!(keys(&tree), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn remove_two_child_root_uses_predecessor() {
        let mut tree = build(&[4, 2, 6, 1, 3, 5, 7]);

        let removed = tree.remove(&4).expect("key 4 present");
        assert_eq!(removed.key, 4);
        tree.assert_invariants();

        let root = tree.raw().root.expect("tree not empty");
        assert_eq!(unsafe { root.as_ref().key }, 3);
        assert_eq!(keys(&tree), [1, 2, 3, 5, 6, 7]);
    }

    #[test]
    fn remove_with_adjacent_predecessor() {
        // 2's predecessor 1 is its direct left child.
        let mut tree = build(&[2, 1, 3]);

        tree.remove(&2);
        tree.assert_invariants();
        assert_eq!(keys(&tree), [1, 3]);

        let root = tree.raw().root.expect("tree not empty");
        assert_eq!(unsafe { root.as_ref().key }, 1);
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut tree = build(&[2, 1, 3]);

        assert!(tree.remove(&9).is_none());
        tree.assert_invariants();
        assert_eq!(keys(&tree), [1, 2, 3]);
    }

    #[test]
    fn duplicate_insert_replaces() {
        let mut tree = build(&[2, 1, 3]);

        let old = tree
            .insert(TestNode::with_value(2, 20))
            .expect("old element returned");
        assert_eq!((old.key, old.value), (2, 0));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get(&2).map(|n| n.value), Some(20));
        tree.assert_invariants();
    }

    #[test]
    fn find_reports_missing_key() {
        let tree = build(&[2, 1, 3]);

        assert_eq!(tree.find(&1).map(|n| n.key), Ok(1));
        assert_eq!(tree.find(&4).map(|n| n.key), Err(KeyError));
    }

    #[test]
    fn neighbours() {
        let tree = build(&[4, 2, 6, 1, 3, 5, 7]);

        assert_eq!(tree.predecessor(&5).map(|n| n.key), Some(4));
        assert_eq!(tree.successor(&3).map(|n| n.key), Some(4));
        assert_eq!(tree.predecessor(&1).map(|n| n.key), None);
        assert_eq!(tree.successor(&7).map(|n| n.key), None);
        assert_eq!(tree.successor(&8).map(|n| n.key), None);
    }

    #[test]
    fn uneven_leaves() {
        let tree = build(&[2, 1, 3, 4]);

        assert!(!tree.leaves_at_equal_depth());
    }

    #[test]
    fn pop_until_empty() {
        let mut tree = build(&[3, 1, 4, 5, 9, 2, 6]);

        let mut popped = Vec::new();
        while let Some(node) = tree.pop_first() {
            popped.push(node.key);
            tree.assert_invariants();
        }

        assert_eq!(popped, [1, 2, 3, 4, 5, 6, 9]);
        assert!(tree.is_empty());
        assert!(tree.raw().root.is_none());
    }
}
