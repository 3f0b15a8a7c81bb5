use crate::Node;

/// Returns the document's `<head>`, creating an empty one as the first child
/// of the root element when it is missing. `None` only when the document has
/// no root element at all.
pub fn ensure_head(dom: &mut Node) -> Option<&mut Node> {
    let root = dom.root_element_mut()?;
    let children = root.children_mut()?;
    let idx = match children.iter().position(|c| c.is_element_named("head")) {
        Some(idx) => idx,
        None => {
            log::debug!(target: "html.head", "document has no head; inserting an empty one");
            children.insert(0, Node::element("head", Vec::new(), Vec::new()));
            0
        }
    };
    children.get_mut(idx)
}
