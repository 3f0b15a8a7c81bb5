use crate::Node;
use std::fmt::{self, Write};
use std::sync::OnceLock;

/// Deterministic DOM serialization and equality rules for tests.
/// Not a public stable format; intended for comparisons in test suites.
///
/// Equivalence rules:
/// - Node kinds must match.
/// - Element names must match.
/// - Attribute list order is significant; names and values must match.
/// - Text nodes must match exactly (post entity decode).
/// - Comments, doctypes and spliced markup must match exactly.
/// - Whitespace-only text nodes can be ignored by options.
#[derive(Clone, Copy, Debug, Default)]
pub struct DomSnapshotOptions {
    pub ignore_blank_text: bool,
    pub trim_text: bool,
}

impl DomSnapshotOptions {
    /// Rules for comparing a tree against its pretty-printed reparse.
    pub fn layout_insensitive() -> Self {
        Self {
            ignore_blank_text: true,
            trim_text: true,
        }
    }

    fn keeps(&self, node: &Node) -> bool {
        match node {
            Node::Text { text } => !(self.ignore_blank_text && text.trim().is_empty()),
            _ => true,
        }
    }

    fn text<'a>(&self, text: &'a str) -> &'a str {
        if self.trim_text { text.trim() } else { text }
    }
}

#[derive(Debug)]
pub struct DomSnapshot {
    lines: Vec<String>,
}

impl DomSnapshot {
    pub fn new(root: &Node, options: DomSnapshotOptions) -> Self {
        const INDENT_STEP: usize = 2;
        let mut lines = Vec::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let mut line = " ".repeat(depth * INDENT_STEP);
            write_node_line(&mut line, node, &options);
            lines.push(line);
            stack.extend(
                node.children()
                    .iter()
                    .rev()
                    .filter(|c| options.keeps(c))
                    .map(|c| (c, depth + 1)),
            );
        }
        Self { lines }
    }

    pub fn as_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for DomSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i != 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct DomMismatch<'a> {
    path: String,
    detail: String,
    expected: String,
    actual: String,
    expected_node: &'a Node,
    actual_node: &'a Node,
    options: DomSnapshotOptions,
    expected_subtree: OnceLock<String>,
    actual_subtree: OnceLock<String>,
}

impl fmt::Display for DomMismatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected_subtree = self
            .expected_subtree
            .get_or_init(|| DomSnapshot::new(self.expected_node, self.options).render());
        let actual_subtree = self
            .actual_subtree
            .get_or_init(|| DomSnapshot::new(self.actual_node, self.options).render());
        writeln!(f, "DOM mismatch at {}: {}", self.path, self.detail)?;
        writeln!(f, "expected: {}", self.expected)?;
        writeln!(f, "actual:   {}", self.actual)?;
        writeln!(f, "expected subtree:\n{}", expected_subtree)?;
        writeln!(f, "actual subtree:\n{}", actual_subtree)?;
        Ok(())
    }
}

impl std::error::Error for DomMismatch<'_> {}

pub fn assert_dom_eq(expected: &Node, actual: &Node, options: DomSnapshotOptions) {
    if let Err(mismatch) = compare_dom(expected, actual, options) {
        panic!("{mismatch}");
    }
}

pub fn compare_dom<'a>(
    expected: &'a Node,
    actual: &'a Node,
    options: DomSnapshotOptions,
) -> Result<(), Box<DomMismatch<'a>>> {
    // (expected, actual, path)
    let mut stack = vec![(expected, actual, format!("/{}", node_label(expected)))];
    while let Some((exp, act, path)) = stack.pop() {
        compare_shallow(exp, act, &options, &path)?;
        let exp_children: Vec<&Node> = exp.children().iter().filter(|c| options.keeps(c)).collect();
        let act_children: Vec<&Node> = act.children().iter().filter(|c| options.keeps(c)).collect();
        if exp_children.len() != act_children.len() {
            return Err(Box::new(mismatch(
                &path,
                &format!(
                    "child count (expected {}, actual {})",
                    exp_children.len(),
                    act_children.len()
                ),
                exp,
                act,
                &options,
            )));
        }
        for (idx, (e, a)) in exp_children.into_iter().zip(act_children).enumerate().rev() {
            stack.push((e, a, format!("{path}/{}[{idx}]", node_label(e))));
        }
    }
    Ok(())
}

fn compare_shallow<'a>(
    expected: &'a Node,
    actual: &'a Node,
    options: &DomSnapshotOptions,
    path: &str,
) -> Result<(), Box<DomMismatch<'a>>> {
    let fail = |detail: &str| -> Result<(), Box<DomMismatch<'a>>> {
        Err(Box::new(mismatch(path, detail, expected, actual, options)))
    };
    match (expected, actual) {
        (
            Node::Document {
                doctype: expected_doctype,
                ..
            },
            Node::Document {
                doctype: actual_doctype,
                ..
            },
        ) => {
            if expected_doctype != actual_doctype {
                return fail("doctype");
            }
            Ok(())
        }
        (
            Node::Element {
                name: expected_name,
                attributes: expected_attrs,
                ..
            },
            Node::Element {
                name: actual_name,
                attributes: actual_attrs,
                ..
            },
        ) => {
            if expected_name != actual_name {
                return fail("element name");
            }
            if expected_attrs.len() != actual_attrs.len() {
                return fail("attribute count");
            }
            for (i, (exp, act)) in expected_attrs.iter().zip(actual_attrs.iter()).enumerate() {
                if exp.0 != act.0 {
                    return fail(&format!("attribute name at index {i}"));
                }
                if exp.1 != act.1 {
                    return fail(&format!("attribute value at index {i}"));
                }
            }
            Ok(())
        }
        (Node::Text { text: expected_text }, Node::Text { text: actual_text }) => {
            if options.text(expected_text) != options.text(actual_text) {
                return fail("text");
            }
            Ok(())
        }
        (Node::Comment { text: expected_text }, Node::Comment { text: actual_text }) => {
            if expected_text != actual_text {
                return fail("comment");
            }
            Ok(())
        }
        (Node::Markup { html: expected_html }, Node::Markup { html: actual_html }) => {
            if expected_html != actual_html {
                return fail("markup");
            }
            Ok(())
        }
        _ => fail("node kind"),
    }
}

fn mismatch<'a>(
    path: &str,
    detail: &str,
    expected: &'a Node,
    actual: &'a Node,
    options: &DomSnapshotOptions,
) -> DomMismatch<'a> {
    let expected_line = format_node_line(expected, options);
    let actual_line = format_node_line(actual, options);
    DomMismatch {
        path: path.to_string(),
        detail: detail.to_string(),
        expected: truncate_line(expected_line, 160),
        actual: truncate_line(actual_line, 160),
        expected_node: expected,
        actual_node: actual,
        options: *options,
        expected_subtree: OnceLock::new(),
        actual_subtree: OnceLock::new(),
    }
}

fn node_label(node: &Node) -> String {
    match node {
        Node::Document { .. } => "#document".to_string(),
        Node::Element { name, .. } => {
            let mut label = name.clone();
            if let Some(id_value) = node.attr("id").filter(|v| !v.is_empty()) {
                label.push('#');
                write_escaped(&mut label, id_value);
            } else if let Some(class_value) = node.attr("class").filter(|v| !v.is_empty()) {
                label.push_str(".class=");
                write_escaped(&mut label, class_value);
            }
            label
        }
        Node::Text { .. } => "#text".to_string(),
        Node::Comment { .. } => "#comment".to_string(),
        Node::Markup { .. } => "#markup".to_string(),
    }
}

fn truncate_line(mut line: String, max_len: usize) -> String {
    if line.len() > max_len {
        let mut cut = max_len.saturating_sub(3);
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        line.truncate(cut);
        line.push_str("...");
    }
    line
}

fn format_node_line(node: &Node, options: &DomSnapshotOptions) -> String {
    let mut line = String::new();
    write_node_line(&mut line, node, options);
    line
}

fn write_node_line(out: &mut String, node: &Node, options: &DomSnapshotOptions) {
    match node {
        Node::Document { doctype, .. } => {
            out.push_str("#document");
            if let Some(dt) = doctype {
                out.push_str(" doctype=\"");
                write_escaped(out, dt);
                out.push('"');
            }
        }
        Node::Element {
            name, attributes, ..
        } => {
            out.push('<');
            out.push_str(name);
            for (attr, value) in attributes {
                out.push(' ');
                out.push_str(attr);
                out.push_str("=\"");
                write_escaped(out, value);
                out.push('"');
            }
            out.push('>');
        }
        Node::Text { text } => {
            out.push('"');
            write_escaped(out, options.text(text));
            out.push('"');
        }
        Node::Comment { text } => {
            out.push_str("<!-- ");
            write_escaped(out, text);
            out.push_str(" -->");
        }
        Node::Markup { html } => {
            out.push_str("#markup \"");
            write_escaped(out, html);
            out.push('"');
        }
    }
}

fn write_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ if ch.is_ascii() => out.push(ch),
            _ => {
                let _ = write!(out, "\\u{{{:X}}}", ch as u32);
            }
        }
    }
}
