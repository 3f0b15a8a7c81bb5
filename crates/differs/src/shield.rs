//! Swapping `<script>`/`<style>` out of a document before diffing and back in
//! afterwards.
//!
//! Their content is not markup, so instead of letting the structural diff
//! pick it apart each element is replaced by a stand-in of the same tag:
//!
//! ```html
//! <script wm-diff-replacement="old-0">$[old-0]$</script>
//! ```
//!
//! The `$[…]$` token is a single word to the markup tokenizer, so a stand-in
//! is either kept, inserted or deleted as a whole.

use std::collections::BTreeMap;
use std::mem;

use html::Node;
use html::traverse::{Walk, walk_mut};

pub const REPLACEMENT_ATTR: &str = "wm-diff-replacement";

fn is_shielded(node: &Node) -> bool {
    node.is_element_named("script") || node.is_element_named("style")
}

pub fn placeholder_id(prefix: &str, index: usize) -> String {
    format!("{prefix}-{index}")
}

pub fn placeholder_token(id: &str) -> String {
    format!("$[{id}]$")
}

/// Placeholder id to the element it stands in for.
#[derive(Debug, Default)]
pub struct Replacements {
    entries: BTreeMap<String, Node>,
}

impl Replacements {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.entries.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Moves every entry of `other` into `self`. Ids from distinct prefixes
    /// never collide; on a collision `other` wins.
    pub fn merge(&mut self, other: Replacements) {
        self.entries.extend(other.entries);
    }
}

/// Replaces every script and style element, in document order, with a
/// stand-in whose id is `{prefix}-{index}`.
pub fn shield(mut document: Node, prefix: &str) -> (Node, Replacements) {
    let mut table = Replacements::default();
    walk_mut(&mut document, |node| {
        if !is_shielded(node) {
            return Walk::Continue;
        }
        let id = placeholder_id(prefix, table.len());
        let name = node.name().unwrap_or("script").to_string();
        let stand_in = Node::element(
            &name,
            vec![(REPLACEMENT_ATTR.to_string(), id.clone())],
            vec![Node::text(placeholder_token(&id))],
        );
        let original = mem::replace(node, stand_in);
        log::trace!(target: "differs.shield", "shielded <{name}> as {id}");
        table.entries.insert(id, original);
        Walk::SkipChildren
    });
    log::debug!(
        target: "differs.shield",
        "{prefix}: shielded {} script/style elements",
        table.len()
    );
    (document, table)
}

/// Puts shielded elements back. Each entry is used at most once; a
/// stand-in whose id is not in the table is left as it is.
pub fn unshield(mut document: Node, mut table: Replacements) -> Node {
    let mut missing = 0usize;
    walk_mut(&mut document, |node| {
        let Some(id) = node.attr(REPLACEMENT_ATTR).map(str::to_string) else {
            return Walk::Continue;
        };
        match table.entries.remove(&id) {
            Some(original) => {
                *node = original;
            }
            None => {
                log::warn!(target: "differs.shield", "no original for placeholder {id}; leaving it in place");
                missing += 1;
            }
        }
        Walk::SkipChildren
    });
    if !table.is_empty() {
        log::debug!(
            target: "differs.shield",
            "{} shielded elements were not referenced by the document",
            table.len()
        );
    }
    if missing > 0 {
        log::debug!(target: "differs.shield", "{missing} placeholders left unresolved");
    }
    document
}
