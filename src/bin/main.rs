use std::ptr::NonNull;

use cordyceps::Linked;
use cordyceps_avl::{AvlTree, Links, TreeNode};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
#[repr(C)]
struct DemoNode {
    links: Links<DemoNode>,
    key: u32,
}

impl DemoNode {
    fn new(key: u32) -> Box<DemoNode> {
        Box::new(DemoNode {
            links: Links::new(),
            key,
        })
    }
}

unsafe impl Linked<Links<DemoNode>> for DemoNode {
    type Handle = Box<DemoNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::from(Box::leak(r))
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<DemoNode>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<DemoNode>> for DemoNode {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

fn keys(tree: &AvlTree<DemoNode>) -> Vec<u32> {
    tree.iter().map(|node| node.key).collect()
}

fn main() -> std::fmt::Result {
    // RUST_LOG=cordyceps_avl=trace shows every rotation.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut tree: AvlTree<DemoNode> = AvlTree::new();

    for key in 1..=7 {
        tree.insert(DemoNode::new(key));
        tree.assert_invariants();
        println!("{:?} height={}", keys(&tree), tree.height());
    }

    let mut out = String::new();
    tree.dotgraph("ascending", &mut out)?;
    println!("{out}");

    if let Some(removed) = tree.remove(&4) {
        println!("removed {}", removed.key);
    }
    tree.assert_invariants();

    let mut out = String::new();
    tree.dotgraph("removed", &mut out)?;
    println!("{out}");

    println!(
        "find(4) = {:?}",
        tree.find(&4).map(|node| node.key).map_err(|e| e.to_string())
    );

    Ok(())
}
