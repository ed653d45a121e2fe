extern crate std;

use std::{ops::Range, prelude::v1::*};

use proptest::prelude::*;

use crate::model::{self, TestNode};

use super::*;

fn build(keys: &[u32]) -> AvlTree<TestNode> {
    let mut tree: AvlTree<TestNode> = AvlTree::new();

    for &key in keys {
        assert!(tree.insert(TestNode::new(key)).is_none());
        tree.assert_invariants();
    }

    tree
}

fn keys(tree: &AvlTree<TestNode>) -> Vec<u32> {
    tree.iter().map(|node| node.key).collect()
}

fn root(tree: &AvlTree<TestNode>) -> &TestNode {
    let root = tree.raw.root.expect("tree is empty");
    unsafe { root.as_ref() }
}

fn child(node: &TestNode, dir: Dir) -> Option<&TestNode> {
    node.links.child(dir).map(|c| unsafe { c.as_ref() })
}

fn insert_find_all(keys: &[u32]) {
    let tree = build(keys);

    for key in keys {
        let node = tree.raw.get_raw(key).expect("item not found");
        assert_eq!(unsafe { node.as_ref().key() }, key);
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

// Calls `f` with every permutation of `items`.
fn for_each_permutation(items: &mut Vec<u32>, k: usize, f: &mut impl FnMut(&[u32])) {
    if k == items.len() {
        f(items.as_slice());
        return;
    }

    for i in k..items.len() {
        items.swap(k, i);
        for_each_permutation(items, k + 1, f);
        items.swap(k, i);
    }
}

#[test]
fn four_elems_find() {
    for_each_permutation(&mut vec![0, 1, 2, 3], 0, &mut |keys| insert_find_all(keys));
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree = build(keys);

    for key in keys {
        let node = tree.raw.get_raw(key).expect("item not found");
        unsafe { tree.remove_at(node) };
        tree.assert_invariants();
    }

    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        let removed = tree.remove(key).expect("item not found");
        assert_eq!(removed.key, *key);
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
    assert!(tree.raw.root.is_none());
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_four() {
    for_each_permutation(&mut vec![0, 1, 2, 3], 0, &mut |keys| insert_remove_all(keys));
}

#[test]
fn remove_six() {
    for_each_permutation(&mut vec![0, 1, 2, 3, 4, 5], 0, &mut |keys| {
        insert_remove_all(keys)
    });
}

#[test]
fn ascending_seven_is_complete() {
    let tree = build(&[1, 2, 3, 4, 5, 6, 7]);

    assert_eq!(tree.height(), 3);
    assert!(tree.leaves_at_equal_depth());
    assert_eq!(root(&tree).key, 4);
    assert!(tree.iter().all(|node| node.links.balance() == 0));
    assert_eq!(keys(&tree), [1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn remove_two_child_root_promotes_predecessor() {
    let mut tree = build(&[1, 2, 3, 4, 5, 6, 7]);

    let removed = tree.remove(&4).expect("key 4 present");
    assert_eq!(removed.key, 4);
    tree.assert_invariants();

    assert_eq!(root(&tree).key, 3);
    assert_eq!(keys(&tree), [1, 2, 3, 5, 6, 7]);
    assert!(tree.get(&4).is_none());
}

#[test]
fn right_left_double_rotation() {
    let tree = build(&[1, 3, 2]);

    let root = root(&tree);
    assert_eq!(root.key, 2);
    assert_eq!(child(root, Dir::Left).map(|n| n.key), Some(1));
    assert_eq!(child(root, Dir::Right).map(|n| n.key), Some(3));
    assert!(tree.iter().all(|node| node.links.balance() == 0));
}

#[test]
fn left_right_double_rotation() {
    let tree = build(&[3, 1, 2]);

    let root = root(&tree);
    assert_eq!(root.key, 2);
    assert_eq!(child(root, Dir::Left).map(|n| n.key), Some(1));
    assert_eq!(child(root, Dir::Right).map(|n| n.key), Some(3));
}

#[test]
fn remove_rotation_with_balanced_sibling() {
    // Removing 1 leaves 2 right-heavy with a balanced right child, the case only the remove
    // path sees.
    let mut tree = build(&[2, 1, 4, 3, 5]);

    tree.remove(&1);
    tree.assert_invariants();

    let root = root(&tree);
    assert_eq!(root.key, 4);
    assert_eq!(root.links.balance(), 1);
    assert_eq!(child(root, Dir::Left).map(|n| n.links.balance()), Some(-1));
}

#[test]
fn remove_shrinks_and_rotates_root() {
    let mut tree = build(&[8, 4, 11, 2, 6, 9, 12, 1, 3, 5, 7, 10]);

    // Double rotation at 11.
    tree.remove(&12);
    tree.assert_invariants();
    assert_eq!(root(&tree).key, 8);

    // Two children: 10 trades places with its adjacent predecessor 9.
    tree.remove(&10);
    tree.assert_invariants();

    // 9 shrinks to a leaf, leaving the root left-heavy with a balanced left child.
    tree.remove(&11);
    tree.assert_invariants();

    let root = root(&tree);
    assert_eq!(root.key, 4);
    assert_eq!(root.links.balance(), -1);
    assert_eq!(keys(&tree), [1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn duplicate_insert_overwrites() {
    let mut tree = build(&[2, 1, 3]);

    let old = tree
        .insert(TestNode::with_value(3, 30))
        .expect("previous element returned");
    assert_eq!((old.key, old.value), (3, 0));

    assert_eq!(tree.len(), 3);
    assert_eq!(tree.get(&3).map(|n| n.value), Some(30));
    tree.assert_invariants();
}

#[test]
fn remove_missing_is_noop() {
    let mut tree = build(&[4, 2, 6, 1, 3, 5, 7]);

    let mut before = String::new();
    tree.dotgraph("t", &mut before).unwrap();

    assert!(tree.remove(&8).is_none());

    let mut after = String::new();
    tree.dotgraph("t", &mut after).unwrap();

    assert_eq!(before, after);
    assert_eq!(tree.len(), 7);
}

#[test]
fn find_reports_missing_key() {
    let tree = build(&[2, 1, 3]);

    assert_eq!(tree.find(&2).map(|n| n.key), Ok(2));
    assert_eq!(tree.find(&0).map(|n| n.key), Err(KeyError));
}

#[test]
fn entry_inserts_and_rebalances() {
    let mut tree: AvlTree<TestNode> = AvlTree::new();

    for key in [1, 2, 3] {
        match tree.entry(&key) {
            Entry::Vacant(entry) => {
                unsafe { entry.insert(TestNode::new(key)) };
            }
            Entry::Occupied(_) => panic!("{key} should be vacant"),
        }
        tree.assert_invariants();
    }

    assert_eq!(root(&tree).key, 2);

    match tree.entry(&2) {
        Entry::Occupied(entry) => {
            assert_eq!(entry.get().key, 2);
            assert_eq!(entry.remove().key, 2);
        }
        Entry::Vacant(_) => panic!("2 should be occupied"),
    }

    tree.assert_invariants();
    assert_eq!(keys(&tree), [1, 3]);
}

#[test]
fn neighbours() {
    let tree = build(&(0..20).collect::<Vec<_>>());

    for key in 1..19 {
        assert_eq!(tree.predecessor(&key).map(|n| n.key), Some(key - 1));
        assert_eq!(tree.successor(&key).map(|n| n.key), Some(key + 1));
    }

    assert!(tree.predecessor(&0).is_none());
    assert!(tree.successor(&19).is_none());
    assert!(tree.successor(&20).is_none());
}

#[test]
fn pop_first_and_last() {
    let mut tree = build(&[5, 2, 8, 1, 9]);

    assert_eq!(tree.first().map(|n| n.key), Some(1));
    assert_eq!(tree.last().map(|n| n.key), Some(9));
    assert_eq!(tree.pop_first().map(|n| n.key), Some(1));
    assert_eq!(tree.pop_last().map(|n| n.key), Some(9));
    tree.assert_invariants();
    assert_eq!(keys(&tree), [2, 5, 8]);

    tree.clear();
    assert!(tree.is_empty());
    assert!(tree.pop_first().is_none());
}

fn height_bound(n: usize) -> usize {
    (1.4405 * ((n + 2) as f64).log2()).floor() as usize
}

#[test]
fn ascending_inserts_stay_logarithmic() {
    let mut tree: AvlTree<TestNode> = AvlTree::new();

    for key in 0..4096 {
        tree.insert(TestNode::new(key));
        assert!(tree.height() <= height_bound(tree.len()));
    }

    tree.assert_invariants();
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn unbalanced_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_unbalanced_equivalence(ops);
    }

    #[test]
    fn permutation_round_trip(
        (inserts, removes) in (1usize..200).prop_flat_map(|n| {
            let keys: Vec<u32> = (0..n as u32).collect();
            (Just(keys.clone()).prop_shuffle(), Just(keys).prop_shuffle())
        })
    ) {
        let mut tree: AvlTree<TestNode> = AvlTree::new();

        for &key in &inserts {
            tree.insert(TestNode::new(key));
            tree.assert_invariants();
        }

        prop_assert!(tree.height() <= height_bound(tree.len()));

        for &key in &removes {
            let removed = tree.remove(&key).map(|n| n.key);
            prop_assert_eq!(removed, Some(key));
            tree.assert_invariants();
        }

        prop_assert!(tree.is_empty());
        prop_assert!(tree.raw.root.is_none());
    }
}
