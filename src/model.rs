extern crate std;

use std::{
    collections::BTreeMap,
    ops::Bound::{Excluded, Unbounded},
    prelude::v1::*,
    ptr::NonNull,
};

use arbitrary::Arbitrary;
use cordyceps::Linked;
use proptest::strategy::{Just, Strategy};

use crate::{AvlTree, BinarySearchTree, Links, TreeNode};

#[derive(Debug)]
#[repr(C)]
pub struct TestNode {
    pub links: Links<TestNode>,
    pub key: u32,
    pub value: u32,
}

impl TestNode {
    pub fn new(key: u32) -> Box<TestNode> {
        TestNode::with_value(key, 0)
    }

    pub fn with_value(key: u32, value: u32) -> Box<TestNode> {
        Box::new(TestNode {
            links: Links::new(),
            key,
            value,
        })
    }
}

unsafe impl Linked<Links<TestNode>> for TestNode {
    type Handle = Box<TestNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::from(Box::leak(r))
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<TestNode>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<TestNode>> for TestNode {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue, u32),
    Get(ItemValue),
    Find(ItemValue),
    Remove(ItemValue),
    Predecessor(ItemValue),
    Successor(ItemValue),
    First,
    PopFirst,
    Last,
    PopLast,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        fn get_value(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len()]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item, value) => FinalOp::Insert(get_value(sorted, item), value),
            Op::Get(item) => FinalOp::Get(get_value(sorted, item)),
            Op::Find(item) => FinalOp::Find(get_value(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(get_value(sorted, item)),
            Op::Predecessor(item) => FinalOp::Predecessor(get_value(sorted, item)),
            Op::Successor(item) => FinalOp::Successor(get_value(sorted, item)),
            Op::First => FinalOp::First,
            Op::PopFirst => FinalOp::PopFirst,
            Op::Last => FinalOp::Last,
            Op::PopLast => FinalOp::PopLast,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32, u32),
    Get(u32),
    Find(u32),
    Remove(u32),
    Predecessor(u32),
    Successor(u32),
    First,
    PopFirst,
    Last,
    PopLast,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        (value_strategy(), 0u32..1000).prop_map(|(item, value)| Op::Insert(item, value)),
        value_strategy().prop_map(Op::Get),
        value_strategy().prop_map(Op::Find),
        value_strategy().prop_map(Op::Remove),
        value_strategy().prop_map(Op::Predecessor),
        value_strategy().prop_map(Op::Successor),
        Just(Op::First),
        Just(Op::PopFirst),
        Just(Op::Last),
        Just(Op::PopLast),
    ]
}

/// The operations shared by the trees under test, so one model drives both.
pub trait ModelTree: Default {
    fn insert(&mut self, node: Box<TestNode>) -> Option<Box<TestNode>>;
    fn get(&self, key: u32) -> Option<&TestNode>;
    fn find(&self, key: u32) -> Option<&TestNode>;
    fn remove(&mut self, key: u32) -> Option<Box<TestNode>>;
    fn predecessor(&self, key: u32) -> Option<&TestNode>;
    fn successor(&self, key: u32) -> Option<&TestNode>;
    fn first(&self) -> Option<&TestNode>;
    fn pop_first(&mut self) -> Option<Box<TestNode>>;
    fn last(&self) -> Option<&TestNode>;
    fn pop_last(&mut self) -> Option<Box<TestNode>>;
    fn len(&self) -> usize;
    fn entries(&self) -> Vec<(u32, u32)>;
    fn assert_invariants(&self);
}

macro_rules! impl_model_tree {
    ($tree:ident) => {
        impl ModelTree for $tree<TestNode> {
            fn insert(&mut self, node: Box<TestNode>) -> Option<Box<TestNode>> {
                $tree::insert(self, node)
            }

            fn get(&self, key: u32) -> Option<&TestNode> {
                $tree::get(self, &key).map(|n| n.get_ref())
            }

            fn find(&self, key: u32) -> Option<&TestNode> {
                $tree::find(self, &key).ok().map(|n| n.get_ref())
            }

            fn remove(&mut self, key: u32) -> Option<Box<TestNode>> {
                $tree::remove(self, &key)
            }

            fn predecessor(&self, key: u32) -> Option<&TestNode> {
                $tree::predecessor(self, &key).map(|n| n.get_ref())
            }

            fn successor(&self, key: u32) -> Option<&TestNode> {
                $tree::successor(self, &key).map(|n| n.get_ref())
            }

            fn first(&self) -> Option<&TestNode> {
                $tree::first(self).map(|n| n.get_ref())
            }

            fn pop_first(&mut self) -> Option<Box<TestNode>> {
                $tree::pop_first(self)
            }

            fn last(&self) -> Option<&TestNode> {
                $tree::last(self).map(|n| n.get_ref())
            }

            fn pop_last(&mut self) -> Option<Box<TestNode>> {
                $tree::pop_last(self)
            }

            fn len(&self) -> usize {
                $tree::len(self)
            }

            fn entries(&self) -> Vec<(u32, u32)> {
                $tree::iter(self).map(|n| (n.key, n.value)).collect()
            }

            fn assert_invariants(&self) {
                $tree::assert_invariants(self)
            }
        }
    };
}

impl_model_tree!(AvlTree);
impl_model_tree!(BinarySearchTree);

pub fn run_btree_equivalence(ops: Vec<Op>) {
    run_equivalence::<AvlTree<TestNode>>(ops)
}

pub fn run_unbalanced_equivalence(ops: Vec<Op>) {
    run_equivalence::<BinarySearchTree<TestNode>>(ops)
}

pub fn run_equivalence<M: ModelTree>(ops: Vec<Op>) {
    let mut sorted_values = Vec::with_capacity(ops.len());
    let mut btree = BTreeMap::new();
    let mut tree = M::default();

    fn insert_sorted(v: &mut Vec<u32>, value: u32) {
        if let Err(idx) = v.binary_search(&value) {
            v.insert(idx, value);
        }
    }

    fn remove_sorted(v: &mut Vec<u32>, value: u32) {
        if let Ok(idx) = v.binary_search(&value) {
            v.remove(idx);
        }
    }

    #[inline]
    #[allow(clippy::boxed_local)]
    fn node_entry(node: Box<TestNode>) -> (u32, u32) {
        (node.key, node.value)
    }

    #[inline]
    fn ref_entry(node: &TestNode) -> (u32, u32) {
        (node.key, node.value)
    }

    fn entry((k, v): (&u32, &u32)) -> (u32, u32) {
        (*k, *v)
    }

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_values);

        match final_op {
            FinalOp::Insert(key, value) => {
                insert_sorted(&mut sorted_values, key);

                let from_btree = btree.insert(key, value).map(|old| (key, old));
                let from_tree = tree
                    .insert(TestNode::with_value(key, value))
                    .map(node_entry);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Get(key) => {
                let from_btree = btree.get(&key).map(|&v| (key, v));
                let from_tree = tree.get(key).map(ref_entry);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Find(key) => {
                let from_btree = btree.get(&key).map(|&v| (key, v));
                let from_tree = tree.find(key).map(ref_entry);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Remove(key) => {
                remove_sorted(&mut sorted_values, key);

                let from_btree = btree.remove(&key).map(|v| (key, v));
                let from_tree = tree.remove(key).map(node_entry);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Predecessor(key) => {
                let from_btree = btree
                    .contains_key(&key)
                    .then(|| btree.range(..key).next_back().map(entry))
                    .flatten();
                let from_tree = tree.predecessor(key).map(ref_entry);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Successor(key) => {
                let from_btree = btree
                    .contains_key(&key)
                    .then(|| btree.range((Excluded(key), Unbounded)).next().map(entry))
                    .flatten();
                let from_tree = tree.successor(key).map(ref_entry);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::First => {
                let from_btree = btree.first_key_value().map(entry);
                let from_tree = tree.first().map(ref_entry);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::PopFirst => {
                let from_btree = btree.pop_first();
                if let Some((key, _)) = from_btree {
                    remove_sorted(&mut sorted_values, key);
                }
                let from_tree = tree.pop_first().map(node_entry);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last_key_value().map(entry);
                let from_tree = tree.last().map(ref_entry);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::PopLast => {
                let from_btree = btree.pop_last();
                if let Some((key, _)) = from_btree {
                    remove_sorted(&mut sorted_values, key);
                }
                let from_tree = tree.pop_last().map(node_entry);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }
        }

        tree.assert_invariants();
        assert_eq!(btree.len(), tree.len());
        assert_eq!(btree.iter().map(entry).collect::<Vec<_>>(), tree.entries());
    }
}
