use crate::Node;
use crate::traverse::{strip_comments, texts_with_parent};
use regex::Regex;
use std::sync::OnceLock;

static REPEATED_BLANK_LINES: OnceLock<Regex> = OnceLock::new();

/// Two or more lines that are empty or hold only whitespace.
fn repeated_blank_lines() -> &'static Regex {
    REPEATED_BLANK_LINES.get_or_init(|| {
        Regex::new(r"([^\S\n]*\n\s*){2,}").expect("Failed to compile blank-line regex")
    })
}

/// Containers whose direct text never renders. The document node itself
/// counts too (stray top-level text, the doctype).
fn is_invisible_parent(node: &Node) -> bool {
    match node {
        Node::Document { .. } => true,
        Node::Element { name, .. } => {
            let n = name.to_ascii_lowercase();
            matches!(n.as_str(), "style" | "script" | "head" | "title")
        }
        _ => false,
    }
}

/// Best-effort visible text of an already parsed document.
///
/// Comments are removed first; text directly inside style, script, head,
/// title or the document node is skipped. CSS or script driven hiding is not
/// detected. Fragments are joined with single spaces, runs of blank lines
/// collapse to one empty line, and the result is trimmed.
pub fn visible_text(mut dom: Node) -> String {
    let dropped = strip_comments(&mut dom);
    log::trace!(target: "html.text", "dropped {dropped} comments before text extraction");

    let joined = texts_with_parent(&dom)
        .into_iter()
        .filter(|(parent, _)| !is_invisible_parent(parent))
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join(" ");
    collapse_blank_lines(&joined).trim().to_string()
}

pub fn collapse_blank_lines(text: &str) -> String {
    repeated_blank_lines().replace_all(text, "\n\n").into_owned()
}
