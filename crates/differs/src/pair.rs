//! Diff of one element pair found on both sides.

use html::{Node, inner_html};
use markup_diff::{MarkerStyle, diff_markup_with};
use std::time::Duration;

/// Diffs the content of two corresponding elements (both heads or both
/// bodies).
///
/// The result is a copy of `new`'s tag and attributes holding the diffed
/// inner markup as a single [`Node::Markup`]. If either side is missing
/// nothing is diffed and `None` comes back.
pub fn diff_elements(
    old: Option<&Node>,
    new: Option<&Node>,
    style: &MarkerStyle,
    time_budget: Duration,
) -> Option<Node> {
    let (old, new) = match (old, new) {
        (Some(old), Some(new)) => (old, new),
        (old, new) => {
            log::debug!(
                target: "differs.pair",
                "skipping element diff: old {}, new {}",
                if old.is_some() { "present" } else { "absent" },
                if new.is_some() { "present" } else { "absent" }
            );
            return None;
        }
    };
    let Node::Element {
        name, attributes, ..
    } = new
    else {
        return None;
    };

    let diffed = diff_markup_with(&inner_html(old), &inner_html(new), style, Some(time_budget));
    log::trace!(target: "differs.pair", "<{name}> diff is {} bytes", diffed.len());
    Some(Node::Element {
        name: name.clone(),
        attributes: attributes.clone(),
        children: vec![Node::Markup { html: diffed }],
    })
}
