use core::{pin::Pin, ptr::NonNull};

use crate::{AvlTree, Dir, Links, TreeNode};

/// A view into a single entry in an [`AvlTree`], which may be either vacant or occupied.
pub enum Entry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    Vacant(VacantEntry<'tree, T>),
    Occupied(OccupiedEntry<'tree, T>),
}

impl<'tree, T> Entry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) unsafe fn vacant_root(tree: &'tree mut AvlTree<T>) -> Self {
        Entry::Vacant(VacantEntry {
            tree,
            insert_as: InsertAs::Root,
        })
    }

    pub(crate) unsafe fn vacant_child(
        tree: &'tree mut AvlTree<T>,
        parent: NonNull<T>,
        dir: Dir,
    ) -> Self {
        Entry::Vacant(VacantEntry {
            tree,
            insert_as: InsertAs::Child { parent, dir },
        })
    }

    pub(crate) unsafe fn occupied(tree: &'tree mut AvlTree<T>, node: NonNull<T>) -> Self {
        Entry::Occupied(OccupiedEntry { tree, node })
    }
}

pub(crate) enum InsertAs<T: ?Sized> {
    Root,
    Child { parent: NonNull<T>, dir: Dir },
}

pub struct VacantEntry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) tree: &'tree mut AvlTree<T>,
    pub(crate) insert_as: InsertAs<T>,
}

impl<'tree, T> VacantEntry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Inserts `item` at the position of this entry and rebalances the tree.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the key returned by `item.key()` is equal to the key used to
    /// retrieve this entry.
    pub unsafe fn insert(self, item: T::Handle) -> Pin<&'tree mut T> {
        let mut ptr = T::into_ptr(item);

        unsafe {
            match self.insert_as {
                InsertAs::Root => self.tree.insert_as_root(ptr),
                InsertAs::Child { parent, dir } => self.tree.insert_as_child(parent, dir, ptr),
            }

            Pin::new_unchecked(ptr.as_mut())
        }
    }
}

pub struct OccupiedEntry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) tree: &'tree mut AvlTree<T>,
    pub(crate) node: NonNull<T>,
}

impl<'tree, T> OccupiedEntry<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a reference to the item in the entry.
    pub fn get(&self) -> &T {
        // SAFETY: `self.tree` is mutably borrowed for `'tree`
        unsafe { self.node.as_ref() }
    }

    /// Returns a pinned mutable reference to the item in the entry.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the key of the mutably borrowed item is not modified, as doing
    /// so may break the ordering of the tree.
    pub unsafe fn get_mut(&mut self) -> Pin<&mut T> {
        // SAFETY: `self.tree` is mutably borrowed for `'tree`, and `self.node` is guaranteed pinned
        // by contract with `Linked`.
        unsafe { Pin::new_unchecked(self.node.as_mut()) }
    }

    /// Converts the entry into a pinned mutable reference to its item, bound to the tree borrow.
    ///
    /// # Safety
    ///
    /// See [`OccupiedEntry::get_mut`].
    pub unsafe fn into_mut(self) -> Pin<&'tree mut T> {
        let mut node = self.node;
        unsafe { Pin::new_unchecked(node.as_mut()) }
    }

    /// Inserts a new item into the entry, returning the previous item.
    ///
    /// The new item takes over the position and balance of the old one, so the tree is not
    /// rebalanced.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `item`'s key is equivalent to the key of the existing item.
    pub unsafe fn insert(&mut self, item: T::Handle) -> T::Handle {
        let new_ptr = T::into_ptr(item);
        let old_ptr = self.node;

        // Point this entry at the new item.
        self.node = new_ptr;

        unsafe { self.tree.replace_at(old_ptr, new_ptr) }
    }

    /// Removes and returns the item pointed to by this entry.
    pub fn remove(self) -> T::Handle {
        unsafe { self.tree.remove_at(self.node) }
    }
}
