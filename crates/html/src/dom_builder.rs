use crate::types::Node;
use scraper::Html;
use std::fmt;
use std::ops::Deref;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The parser produced no top-level element to hang regions off.
    MissingRoot,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingRoot => f.write_str("parsed document has no root element"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses `markup` as a full HTML document into an owned [`Node::Document`].
///
/// Malformed markup is repaired by the HTML5 tree builder, so missing
/// `<html>`, `<head>` and `<body>` elements are synthesized rather than
/// reported. The only failure is a tree without a root element.
pub fn build_dom(markup: &str) -> Result<Node, ParseError> {
    let parsed = Html::parse_document(markup);
    if !parsed.errors.is_empty() {
        log::trace!(
            target: "html.parse",
            "recovered from {} parse errors",
            parsed.errors.len()
        );
    }

    enum Frame<N> {
        Enter(N),
        // Second visit: `mark` is where this node's children start on `built`.
        Exit(N, usize),
    }

    let mut doctype: Option<String> = None;
    let mut built: Vec<Node> = Vec::new();
    let mut stack = vec![Frame::Enter(parsed.tree.root())];

    // Iterative postorder walk so deeply nested input cannot exhaust the call stack.
    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter(node) => match node.value() {
                scraper::Node::Document | scraper::Node::Fragment | scraper::Node::Element(_) => {
                    stack.push(Frame::Exit(node, built.len()));
                    for child in node.children().rev() {
                        stack.push(Frame::Enter(child));
                    }
                }
                scraper::Node::Doctype(dt) => {
                    if doctype.is_none() {
                        doctype = Some(format_doctype(dt.name(), dt.public_id(), dt.system_id()));
                    }
                }
                scraper::Node::Text(text) => built.push(Node::Text {
                    text: text.deref().to_string(),
                }),
                scraper::Node::Comment(comment) => built.push(Node::Comment {
                    text: comment.deref().to_string(),
                }),
                scraper::Node::ProcessingInstruction(_) => {}
            },
            Frame::Exit(node, mark) => {
                let children = built.split_off(mark);
                let node = match node.value() {
                    scraper::Node::Element(el) => Node::Element {
                        name: el.name().to_string(),
                        attributes: el
                            .attrs
                            .iter()
                            .map(|(name, value)| {
                                (qualified_name(name.prefix.as_deref(), &name.local), value.to_string())
                            })
                            .collect(),
                        children,
                    },
                    _ => Node::Document {
                        doctype: doctype.take(),
                        children,
                    },
                };
                built.push(node);
            }
        }
    }

    let Some(document) = built.pop() else {
        return Err(ParseError::MissingRoot);
    };
    if document.root_element().is_none() {
        return Err(ParseError::MissingRoot);
    }
    Ok(document)
}

/// Attribute name as written in the source. Foreign content (SVG, MathML)
/// splits `xlink:href` and `xmlns:xlink` into prefix and local name.
fn qualified_name(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_string(),
    }
}

fn format_doctype(name: &str, public_id: &str, system_id: &str) -> String {
    let mut out = String::from(name);
    if !public_id.is_empty() {
        out.push_str(" PUBLIC \"");
        out.push_str(public_id);
        out.push('"');
        if !system_id.is_empty() {
            out.push_str(" \"");
            out.push_str(system_id);
            out.push('"');
        }
    } else if !system_id.is_empty() {
        out.push_str(" SYSTEM \"");
        out.push_str(system_id);
        out.push('"');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child_names(node: &Node) -> Vec<&str> {
        node.children().iter().filter_map(Node::name).collect()
    }

    #[test]
    fn fragment_input_gets_full_document_shape() {
        let dom = build_dom("<p>Deleted</p>").expect("parse");
        let root = dom.root_element().expect("root");
        assert_eq!(root.name(), Some("html"));
        assert_eq!(child_names(root), vec!["head", "body"]);
        let body = root.child_element("body").expect("body");
        assert_eq!(child_names(body), vec!["p"]);
    }

    #[test]
    fn doctype_is_lifted_onto_document() {
        let dom = build_dom("<!DOCTYPE html><html><head></head><body></body></html>")
            .expect("parse");
        assert!(matches!(
            &dom,
            Node::Document { doctype: Some(dt), .. } if dt == "html"
        ));
    }

    #[test]
    fn legacy_doctype_keeps_identifiers() {
        assert_eq!(
            format_doctype("html", "-//W3C//DTD HTML 4.01//EN", "http://www.w3.org/TR/html4/strict.dtd"),
            "html PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \"http://www.w3.org/TR/html4/strict.dtd\""
        );
        assert_eq!(format_doctype("html", "", "about:legacy-compat"), "html SYSTEM \"about:legacy-compat\"");
    }

    #[test]
    fn comments_and_attributes_survive_conversion() {
        let dom = build_dom(r#"<div id="main" class="a b"><!-- note -->text</div>"#).expect("parse");
        let body = dom
            .root_element()
            .and_then(|r| r.child_element("body"))
            .expect("body");
        let div = &body.children()[0];
        assert_eq!(div.attr("id"), Some("main"));
        assert_eq!(div.attr("class"), Some("a b"));
        assert!(div.children()[0].is_comment());
        assert_eq!(div.children()[1], Node::text("text"));
    }

    #[test]
    fn svg_attributes_keep_their_namespace_prefix() {
        let dom = build_dom(
            r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="#i"></use></svg>"##,
        )
        .expect("parse");
        let body = dom
            .root_element()
            .and_then(|r| r.child_element("body"))
            .expect("body");
        let svg = body.child_element("svg").expect("svg");
        assert_eq!(svg.attr("xmlns:xlink"), Some("http://www.w3.org/1999/xlink"));
        assert_eq!(svg.attr("xlink"), None);
        let use_el = svg.child_element("use").expect("use");
        assert_eq!(use_el.attr("xlink:href"), Some("#i"));
        assert_eq!(use_el.attr("href"), None);
    }

    #[test]
    fn script_content_stays_raw_text() {
        let dom = build_dom("<script>if (a < b) { go(); }</script>").expect("parse");
        let head = dom
            .root_element()
            .and_then(|r| r.child_element("head"))
            .expect("head");
        let script = head.child_element("script").expect("script");
        assert_eq!(script.children(), &[Node::text("if (a < b) { go(); }")]);
    }
}
