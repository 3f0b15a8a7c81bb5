//! Markup serialization for [`Node`] trees, compact and pretty.
//!
//! Both writers are iterative. Raw-text element content (script, style, ...)
//! and [`Node::Markup`] are written verbatim; everything else is escaped.

use crate::Node;

const PRETTY_INDENT: &str = " ";

pub fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements whose text children are not markup and must not be escaped.
pub fn is_raw_text_element(name: &str) -> bool {
    matches!(
        name,
        "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" | "plaintext"
    )
}

fn preserves_whitespace(name: &str) -> bool {
    name == "pre" || name == "textarea" || is_raw_text_element(name)
}

/// Serializes a node and its subtree.
pub fn to_html(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, false, &mut out);
    out
}

/// Serializes only the children of `node`.
pub fn inner_html(node: &Node) -> String {
    let raw = node.name().is_some_and(is_raw_text_element);
    let mut out = String::new();
    for child in node.children() {
        write_node(child, raw, &mut out);
    }
    out
}

/// Indented serialization: one tag or text run per line, one space per level.
/// Whitespace-only text is dropped and other text is trimmed, except inside
/// `pre`, `textarea` and raw-text elements which are written as-is.
pub fn to_pretty_html(node: &Node) -> String {
    enum Step<'a> {
        Open(&'a Node, usize),
        Close(&'a str, usize),
    }

    let mut out = String::new();
    let mut stack = vec![Step::Open(node, 0)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Close(name, depth) => {
                push_indent(&mut out, depth);
                write_end_tag(&mut out, name);
                out.push('\n');
            }
            Step::Open(node, depth) => match node {
                Node::Document { doctype, children } => {
                    if let Some(dt) = doctype {
                        write_doctype(&mut out, dt);
                        out.push('\n');
                    }
                    stack.extend(children.iter().rev().map(|c| Step::Open(c, depth)));
                }
                Node::Element {
                    name,
                    attributes,
                    children,
                } => {
                    push_indent(&mut out, depth);
                    write_start_tag(&mut out, name, attributes);
                    if is_void_element(name) {
                        out.push('\n');
                        continue;
                    }
                    if preserves_whitespace(name) {
                        let raw = is_raw_text_element(name);
                        for child in children {
                            write_node(child, raw, &mut out);
                        }
                        write_end_tag(&mut out, name);
                        out.push('\n');
                        continue;
                    }
                    out.push('\n');
                    stack.push(Step::Close(name, depth));
                    stack.extend(children.iter().rev().map(|c| Step::Open(c, depth + 1)));
                }
                Node::Text { text } => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    push_indent(&mut out, depth);
                    escape_text_into(&mut out, trimmed);
                    out.push('\n');
                }
                Node::Comment { text } => {
                    push_indent(&mut out, depth);
                    write_comment(&mut out, text);
                    out.push('\n');
                }
                Node::Markup { html } => {
                    if html.trim().is_empty() {
                        continue;
                    }
                    push_indent(&mut out, depth);
                    out.push_str(html);
                    out.push('\n');
                }
            },
        }
    }
    out
}

fn write_node(root: &Node, raw_parent: bool, out: &mut String) {
    enum Step<'a> {
        Open(&'a Node, bool),
        Close(&'a str),
    }

    let mut stack = vec![Step::Open(root, raw_parent)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Close(name) => write_end_tag(out, name),
            Step::Open(node, raw) => match node {
                Node::Document { doctype, children } => {
                    if let Some(dt) = doctype {
                        write_doctype(out, dt);
                    }
                    stack.extend(children.iter().rev().map(|c| Step::Open(c, false)));
                }
                Node::Element {
                    name,
                    attributes,
                    children,
                } => {
                    write_start_tag(out, name, attributes);
                    if is_void_element(name) {
                        continue;
                    }
                    stack.push(Step::Close(name));
                    let raw_children = is_raw_text_element(name);
                    stack.extend(children.iter().rev().map(|c| Step::Open(c, raw_children)));
                }
                Node::Text { text } => {
                    if raw {
                        out.push_str(text);
                    } else {
                        escape_text_into(out, text);
                    }
                }
                Node::Comment { text } => write_comment(out, text),
                Node::Markup { html } => out.push_str(html),
            },
        }
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(PRETTY_INDENT);
    }
}

fn write_doctype(out: &mut String, doctype: &str) {
    out.push_str("<!DOCTYPE ");
    out.push_str(doctype);
    out.push('>');
}

fn write_comment(out: &mut String, text: &str) {
    out.push_str("<!--");
    out.push_str(text);
    out.push_str("-->");
}

fn write_start_tag(out: &mut String, name: &str, attributes: &[(String, String)]) {
    out.push('<');
    out.push_str(name);
    for (key, value) in attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_attr_into(out, value);
        out.push('"');
    }
    out.push('>');
}

fn write_end_tag(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape_text_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr_into(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(children: Vec<Node>) -> Node {
        Node::Document {
            doctype: Some("html".to_string()),
            children: vec![Node::element("html", Vec::new(), children)],
        }
    }

    #[test]
    fn compact_escapes_text_but_not_script() {
        let tree = doc(vec![
            Node::element(
                "head",
                Vec::new(),
                vec![Node::element("script", Vec::new(), vec![Node::text("a < b && c")])],
            ),
            Node::element("body", Vec::new(), vec![Node::text("a < b & c")]),
        ]);
        assert_eq!(
            to_html(&tree),
            "<!DOCTYPE html><html><head><script>a < b && c</script></head>\
             <body>a &lt; b &amp; c</body></html>"
        );
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let img = Node::element(
            "img",
            vec![("alt".to_string(), "say \"hi\" & bye".to_string())],
            Vec::new(),
        );
        assert_eq!(to_html(&img), r#"<img alt="say &quot;hi&quot; &amp; bye">"#);
    }

    #[test]
    fn markup_nodes_are_written_verbatim() {
        let body = Node::element(
            "body",
            Vec::new(),
            vec![Node::Markup {
                html: "<ins>new</ins>".to_string(),
            }],
        );
        assert_eq!(to_html(&body), "<body><ins>new</ins></body>");
        assert_eq!(inner_html(&body), "<ins>new</ins>");
    }

    #[test]
    fn pretty_indents_one_space_per_level() {
        let tree = doc(vec![
            Node::element("head", Vec::new(), Vec::new()),
            Node::element(
                "body",
                Vec::new(),
                vec![
                    Node::text("\n  "),
                    Node::element("p", Vec::new(), vec![Node::text("  Hello ")]),
                ],
            ),
        ]);
        assert_eq!(
            to_pretty_html(&tree),
            "<!DOCTYPE html>\n<html>\n <head>\n </head>\n <body>\n  <p>\n   Hello\n  </p>\n </body>\n</html>\n"
        );
    }

    #[test]
    fn pretty_keeps_preformatted_content() {
        let pre = Node::element("pre", Vec::new(), vec![Node::text("  a\n    b")]);
        assert_eq!(to_pretty_html(&pre), "<pre>  a\n    b</pre>\n");
    }
}
