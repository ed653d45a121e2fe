use core::{fmt, ptr::NonNull};
use std::{collections::VecDeque, string::String};

use crate::{bst::RawTree, AvlTree, BinarySearchTree, Links, TreeNode};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>>,
{
    /// Writes the tree as a Graphviz digraph, labelling each node with its key and balance.
    pub fn dotgraph<W>(&self, name: &str, w: W) -> fmt::Result
    where
        W: fmt::Write,
        T::Key: fmt::Display,
    {
        self.raw.dotgraph(name, w)
    }
}

impl<T> BinarySearchTree<T>
where
    T: TreeNode<Links<T>>,
{
    /// Writes the tree as a Graphviz digraph, labelling each node with its key.
    pub fn dotgraph<W>(&self, name: &str, w: W) -> fmt::Result
    where
        W: fmt::Write,
        T::Key: fmt::Display,
    {
        self.raw().dotgraph(name, w)
    }
}

impl<T> RawTree<T>
where
    T: TreeNode<Links<T>>,
{
    pub(crate) fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
        T::Key: fmt::Display,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<T> {
            Node(NonNull<T>),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        loop {
            use fmt::Write;
            let remaining = queue.len();
            if remaining == 0 {
                break;
            }

            write!(w, "{{rank=same; ")?;

            for _ in 0..remaining {
                let Some(item) = queue.pop_front() else {
                    break;
                };

                let node = match item {
                    Item::Node(node) => node,
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let key = unsafe { node.as_ref().key() };
                let balance = unsafe { self.links(node).balance() };
                write!(w, "\"graph{name}-{key}\" [label=\"{key}:{balance}\"]; ")?;

                for child in unsafe { [self.links(node).left(), self.links(node).right()] } {
                    match child {
                        Some(child) => {
                            let child_key = unsafe { child.as_ref().key() };

                            queue.push_back(Item::Node(child));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                            )?;
                        }

                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}

#[cfg(test)]
mod tests {
    use std::string::String;

    use crate::{model::TestNode, AvlTree};

    #[test]
    fn dotgraph_labels_balances() {
        let mut tree: AvlTree<TestNode> = AvlTree::new();
        for key in [2, 1, 3] {
            tree.insert(TestNode::new(key));
        }

        let mut out = String::new();
        tree.dotgraph("t", &mut out).unwrap();

        assert!(out.starts_with("digraph \"graph-t\""));
        assert!(out.contains("\"grapht-2\" [label=\"2:0\"]"));
        assert!(out.contains("\"grapht-2\" -> \"grapht-1\";"));
        assert!(out.contains("\"grapht-2\" -> \"grapht-3\";"));
    }

    #[test]
    fn dotgraph_empty() {
        let tree: AvlTree<TestNode> = AvlTree::new();

        let mut out = String::new();
        tree.dotgraph("e", &mut out).unwrap();

        assert_eq!(out, "digraph \"graph-e\" {}");
    }
}
