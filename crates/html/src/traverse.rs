//! Iterative tree walks.
//!
//! None of these recurse: documents scraped from the wild nest thousands of
//! levels deep, so every walk keeps its own explicit stack.

use crate::Node;

/// What a mutable visitor wants done after it has seen a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Walk {
    Continue,
    SkipChildren,
}

/// Preorder (document order) walk that may rewrite nodes in place.
///
/// A visitor that replaces a node should usually return
/// [`Walk::SkipChildren`] so the replacement's own children are not visited.
pub fn walk_mut(root: &mut Node, mut visit: impl FnMut(&mut Node) -> Walk) {
    let mut stack: Vec<&mut Node> = vec![root];
    while let Some(node) = stack.pop() {
        if visit(node) == Walk::SkipChildren {
            continue;
        }
        if let Some(children) = node.children_mut() {
            // reverse so the leftmost child is popped first
            stack.extend(children.iter_mut().rev());
        }
    }
}

/// Preorder walk over shared references.
pub fn walk(root: &Node, mut visit: impl FnMut(&Node) -> Walk) {
    let mut stack: Vec<&Node> = vec![root];
    while let Some(node) = stack.pop() {
        if visit(node) == Walk::SkipChildren {
            continue;
        }
        stack.extend(node.children().iter().rev());
    }
}

/// Removes every comment node from the tree and returns how many were dropped.
pub fn strip_comments(root: &mut Node) -> usize {
    let mut removed = 0;
    walk_mut(root, |node| {
        if let Some(children) = node.children_mut() {
            let before = children.len();
            children.retain(|c| !c.is_comment());
            removed += before - children.len();
        }
        Walk::Continue
    });
    removed
}

/// First node in document order matching `pred`.
pub fn find_first<'a>(root: &'a Node, pred: impl Fn(&Node) -> bool) -> Option<&'a Node> {
    let mut stack: Vec<&'a Node> = vec![root];
    while let Some(node) = stack.pop() {
        if pred(node) {
            return Some(node);
        }
        stack.extend(node.children().iter().rev());
    }
    None
}

/// Every text node in document order, paired with the node that directly
/// contains it (an element or the document itself).
pub fn texts_with_parent(root: &Node) -> Vec<(&Node, &str)> {
    let mut out = Vec::new();
    let mut stack: Vec<(&Node, &Node)> = root.children().iter().rev().map(|c| (root, c)).collect();
    while let Some((parent, node)) = stack.pop() {
        match node {
            Node::Text { text } => out.push((parent, text.as_str())),
            _ => stack.extend(node.children().iter().rev().map(|c| (node, c))),
        }
    }
    out
}

/// Number of element nodes, handy for logging pipeline sizes.
pub fn count_elements(root: &Node) -> usize {
    let mut count = 0;
    walk(root, |node| {
        if matches!(node, Node::Element { .. }) {
            count += 1;
        }
        Walk::Continue
    });
    count
}
