/// Owned DOM tree.
///
/// Every document handled by the differs is parsed into this shape and owned
/// exclusively by whichever pipeline step is transforming it. Elements and text
/// are told apart by matching on the variant, never by probing for a tag name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Document {
        doctype: Option<String>,
        children: Vec<Node>,
    },
    Element {
        name: String,
        attributes: Vec<(String, String)>,
        children: Vec<Node>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
    /// Already-serialized markup spliced into a tree. Written out verbatim, so a
    /// tree holding one is only navigable again after a serialize/reparse pass.
    Markup {
        html: String,
    },
}

impl Node {
    pub fn element(name: &str, attributes: Vec<(String, String)>, children: Vec<Node>) -> Node {
        Node::Element {
            name: name.to_string(),
            attributes,
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Node {
        Node::Text { text: text.into() }
    }

    /// Tag name for elements, `None` for everything else.
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_element_named(&self, target: &str) -> bool {
        matches!(self, Node::Element { name, .. } if name.eq_ignore_ascii_case(target))
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Node::Comment { .. })
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            Node::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document { children, .. } | Node::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document { children, .. } => Some(children),
            Node::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    /// The top-level element of a document (normally `<html>`).
    pub fn root_element(&self) -> Option<&Node> {
        match self {
            Node::Document { children, .. } => {
                children.iter().find(|c| matches!(c, Node::Element { .. }))
            }
            _ => None,
        }
    }

    pub fn root_element_mut(&mut self) -> Option<&mut Node> {
        match self {
            Node::Document { children, .. } => children
                .iter_mut()
                .find(|c| matches!(c, Node::Element { .. })),
            _ => None,
        }
    }

    /// First direct child element with the given tag name.
    pub fn child_element(&self, target: &str) -> Option<&Node> {
        self.children().iter().find(|c| c.is_element_named(target))
    }
}

// The derived drop glue recurses once per nesting level; deep documents
// would overflow the stack on the way out.
impl Drop for Node {
    fn drop(&mut self) {
        let Some(children) = self.children_mut() else {
            return;
        };
        if children.iter().all(|c| c.children().is_empty()) {
            return;
        }
        let mut stack = std::mem::take(children);
        while let Some(mut node) = stack.pop() {
            if let Some(grandchildren) = node.children_mut() {
                stack.append(grandchildren);
            }
        }
    }
}
