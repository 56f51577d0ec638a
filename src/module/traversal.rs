//! Deterministic walks over a module tree.

use super::Module;
use std::collections::VecDeque;

/// Dependency traversal order of the tree rooted at `root`.
///
/// A FIFO queue is seeded with the root. Each dequeued module is pushed to
/// the front of the output and its children are enqueued in attachment
/// order. The output is therefore the breadth-first order reversed: the
/// deepest, last-attached modules come first and the root comes last.
///
/// Snapshot `module_order` metadata and the slot order of packed values both
/// use this exact sequence.
pub fn traversal_modules(root: &Module) -> Vec<Module> {
    let mut queue = VecDeque::new();
    queue.push_back(root.clone());
    let mut order = VecDeque::new();
    while let Some(node) = queue.pop_front() {
        queue.extend(node.children());
        order.push_front(node);
    }
    order.into()
}

/// Names of [`traversal_modules`].
pub fn traversal_order(root: &Module) -> Vec<String> {
    traversal_modules(root).iter().map(Module::name).collect()
}

/// Breadth-first order, root first.
pub fn breadth_first(root: &Module) -> Vec<Module> {
    let mut queue = VecDeque::new();
    queue.push_back(root.clone());
    let mut out = Vec::new();
    while let Some(node) = queue.pop_front() {
        queue.extend(node.children());
        out.push(node);
    }
    out
}

/// Depth-first preorder, root first.
pub fn preorder(root: &Module) -> Vec<Module> {
    let mut out = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        stack.extend(node.children().into_iter().rev());
        out.push(node);
    }
    out
}
