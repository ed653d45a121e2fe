extern crate alloc;

use alloc::boxed::Box;
use core::{borrow::Borrow, fmt, marker::PhantomPinned, mem, ptr::NonNull};

use cordyceps::Linked;

use crate::{AvlTree, Entry, Iter, Links, TreeNode};

/// An ordered map based on an [AVL tree].
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct AvlMap<K: Ord + fmt::Debug, V> {
    tree: AvlTree<MapNode<K, V>>,
}

struct MapNode<K, V> {
    links: Links<MapNode<K, V>>,
    key: K,
    value: V,
    _unpin: PhantomPinned,
}

impl<K, V> MapNode<K, V> {
    fn new(key: K, value: V) -> Box<Self> {
        Box::new(MapNode {
            links: Links::new(),
            key,
            value,
            _unpin: PhantomPinned,
        })
    }
}

unsafe impl<K, V> Linked<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<MapNode<K, V>>> {
        let ptr = ptr.as_ptr();
        unsafe { NonNull::new_unchecked(core::ptr::addr_of_mut!((*ptr).links)) }
    }
}

impl<K: Ord + fmt::Debug, V> TreeNode<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

impl<K: Ord + fmt::Debug, V> AvlMap<K, V> {
    /// Creates a new, empty `AvlMap`.
    pub const fn new() -> Self {
        Self {
            tree: AvlTree::new(),
        }
    }

    /// Returns `true` if the map contains no elements.
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the map contains a value associated with `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Returns a reference to the value associated with `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get(key).map(|node| &node.get_ref().value)
    }

    /// Returns a mutable reference to the value associated with `key`.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree
            .get_mut(key)
            // SAFETY: Pinning is not structural for `node.value`.
            .map(|node| unsafe { &mut node.get_unchecked_mut().value })
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already held a value for `key`, it is overwritten in place and returned; the
    /// stored key is left untouched.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.tree.entry(&key) {
            Entry::Occupied(mut entry) => {
                // SAFETY: Only the value is replaced; the key keeps its position in the order.
                let node = unsafe { entry.get_mut().get_unchecked_mut() };
                Some(mem::replace(&mut node.value, value))
            }

            Entry::Vacant(entry) => {
                // SAFETY: The node is built from the key the entry was looked up with.
                unsafe { entry.insert(MapNode::new(key, value)) };
                None
            }
        }
    }

    /// Returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first().map(|node| {
            let MapNode { key, value, .. } = *node;
            (key, value)
        })
    }

    /// Returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last().map(|node| {
            let MapNode { key, value, .. } = *node;
            (key, value)
        })
    }

    /// Removes the value associated with `key` from the map.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove(key).map(|node| node.value)
    }

    /// Clears the map, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns an iterator over the key-value pairs of the map, in key order.
    pub fn iter(&self) -> MapIter<'_, K, V> {
        MapIter {
            inner: self.tree.iter(),
        }
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();
    }
}

impl<K: Ord + fmt::Debug, V> Default for AvlMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for AvlMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// An iterator over the key-value pairs of an [`AvlMap`].
pub struct MapIter<'map, K: Ord + fmt::Debug, V> {
    inner: Iter<'map, MapNode<K, V>>,
}

impl<'map, K: Ord + fmt::Debug, V> Iterator for MapIter<'map, K, V> {
    type Item = (&'map K, &'map V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|node| (&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'map, K: Ord + fmt::Debug, V> DoubleEndedIterator for MapIter<'map, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|node| (&node.key, &node.value))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::{string::String, vec::Vec};

    use super::*;

    #[test]
    fn insert_overwrites_in_place() {
        let mut map = AvlMap::new();

        assert_eq!(map.insert(1, "one"), None);
        assert_eq!(map.insert(2, "two"), None);
        assert_eq!(map.insert(1, "uno"), Some("one"));
        map.assert_invariants();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&1), Some(&"uno"));
    }

    #[test]
    fn get_mut_and_remove() {
        let mut map: AvlMap<u32, String> = AvlMap::new();

        for i in 0..32 {
            map.insert(i, String::new());
        }

        if let Some(v) = map.get_mut(&7) {
            v.push_str("seven");
        }

        assert_eq!(map.get(&7).map(String::as_str), Some("seven"));
        assert_eq!(map.remove(&7).as_deref(), Some("seven"));
        assert_eq!(map.remove(&7), None);
        assert!(!map.contains_key(&7));
        map.assert_invariants();
    }

    #[test]
    fn ordered_views() {
        let mut map = AvlMap::new();

        for k in [5, 3, 8, 1, 4, 7, 9] {
            map.insert(k, k * 10);
        }

        assert_eq!(map.first_key_value(), Some((&1, &10)));
        assert_eq!(map.last_key_value(), Some((&9, &90)));

        let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, [1, 3, 4, 5, 7, 8, 9]);

        assert_eq!(map.pop_first(), Some((1, 10)));
        assert_eq!(map.pop_last(), Some((9, 90)));
        map.assert_invariants();

        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.pop_first(), None);
    }
}
