//! Traversals over the feature arena.
//!
//! All iterators are lazy, borrow the arena and can be restarted by cloning.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::feature::Feature;

/// Depth-first pre-order traversal, children visited left to right.
#[derive(Debug, Clone)]
pub struct PreOrder<'a> {
    arena: &'a Arena<Feature>,
    stack: Vec<Index>,
}

impl<'a> PreOrder<'a> {
    #[instrument(level = "trace", skip(arena))]
    pub(crate) fn new(arena: &'a Arena<Feature>, start: Index) -> Self {
        Self {
            arena,
            stack: vec![start],
        }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Feature;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let node = self.arena.get(current)?;
        // reverse so the leftmost child is popped first
        self.stack.extend(node.children.iter().rev().copied());
        Some(node)
    }
}

/// Level-order traversal.
#[derive(Debug, Clone)]
pub struct BreadthFirst<'a> {
    arena: &'a Arena<Feature>,
    queue: VecDeque<Index>,
}

impl<'a> BreadthFirst<'a> {
    #[instrument(level = "trace", skip(arena))]
    pub(crate) fn new(arena: &'a Arena<Feature>, start: Index) -> Self {
        Self {
            arena,
            queue: VecDeque::from([start]),
        }
    }
}

impl<'a> Iterator for BreadthFirst<'a> {
    type Item = &'a Feature;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.queue.pop_front()?;
        let node = self.arena.get(current)?;
        self.queue.extend(node.children.iter().copied());
        Some(node)
    }
}

/// Parent chain, nearest ancestor first.
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    arena: &'a Arena<Feature>,
    next: Option<Index>,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(arena: &'a Arena<Feature>, start: Index) -> Self {
        let next = arena.get(start).and_then(|node| node.parent);
        Self { arena, next }
    }
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Feature;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.arena.get(self.next?)?;
        self.next = node.parent;
        Some(node)
    }
}

/// Indices of the subtree below `start` in depth-first pre-order.
pub(crate) fn pre_order_indices(arena: &Arena<Feature>, start: Index) -> Vec<Index> {
    let mut order = Vec::new();
    let mut stack = vec![start];
    while let Some(current) = stack.pop() {
        if let Some(node) = arena.get(current) {
            order.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
    }
    order
}

/// Number of levels below and including `start`.
#[instrument(level = "trace", skip(arena))]
pub(crate) fn depth(arena: &Arena<Feature>, start: Index) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(start, 1)];
    while let Some((current, level)) = stack.pop() {
        if let Some(node) = arena.get(current) {
            deepest = deepest.max(level);
            stack.extend(node.children.iter().map(|&child| (child, level + 1)));
        }
    }
    deepest
}

/// Whether `candidate` is `start` or one of its ancestors.
pub(crate) fn is_ancestor_or_self(arena: &Arena<Feature>, candidate: Index, start: Index) -> bool {
    let mut current = Some(start);
    while let Some(index) = current {
        if index == candidate {
            return true;
        }
        current = arena.get(index).and_then(|node| node.parent);
    }
    false
}

/// Renders the subtree below `start` with feature names as labels.
///
/// Built bottom-up, children before their parent.
pub(crate) fn to_tree(arena: &Arena<Feature>, start: Index) -> termtree::Tree<String> {
    let mut built: HashMap<Index, termtree::Tree<String>> = HashMap::new();
    for index in pre_order_indices(arena, start).into_iter().rev() {
        if let Some(node) = arena.get(index) {
            let leaves: Vec<_> = node
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(index, termtree::Tree::new(node.name()).with_leaves(leaves));
        }
    }
    built
        .remove(&start)
        .unwrap_or_else(|| termtree::Tree::new(String::new()))
}

/// Writes the same layout as [`to_tree`] without building the nested tree first.
pub(crate) fn render(arena: &Arena<Feature>, start: Index, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Some(root) = arena.get(start) else {
        return Ok(());
    };
    writeln!(f, "{}", root.name())?;
    // (node, level below start, last among its siblings)
    let mut stack: Vec<(Index, usize, bool)> = children_of(root, 1);
    let mut indents: Vec<&'static str> = Vec::new();
    while let Some((current, level, last)) = stack.pop() {
        let Some(node) = arena.get(current) else {
            continue;
        };
        indents.truncate(level - 1);
        for indent in &indents {
            f.write_str(indent)?;
        }
        f.write_str(if last { "└── " } else { "├── " })?;
        writeln!(f, "{}", node.name())?;
        indents.push(if last { "    " } else { "│   " });
        stack.extend(children_of(node, level + 1));
    }
    Ok(())
}

/// Children in pop order for a stack: the last child comes first.
fn children_of(node: &Feature, level: usize) -> Vec<(Index, usize, bool)> {
    node.children
        .iter()
        .rev()
        .enumerate()
        .map(|(position, &child)| (child, level, position == 0))
        .collect()
}
