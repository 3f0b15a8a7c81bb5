//! Whole-document rendered diff.
//!
//! Both documents are cut into regions around `<head>` and `<body>`, each
//! pair of regions is diffed on its own, and the results are stitched into
//! the new document so the output is always a complete page: doctype, one
//! `<head>` carrying the change stylesheet, and the diffed body.

use html::head::ensure_head;
use html::traverse::strip_comments;
use html::{Node, ParseError, build_dom, to_html, to_pretty_html};
use markup_diff::{Marker, MarkerStyle, diff_markup_with};

use crate::config::DiffConfig;
use crate::error::DiffError;
use crate::pair::diff_elements;
use crate::regions::split_regions;
use crate::shield::{shield, unshield};

const OLD_PREFIX: &str = "old";
const NEW_PREFIX: &str = "new";

fn selector(marker: &Marker) -> String {
    match marker {
        Marker::Tag(name) => name.clone(),
        Marker::Class(class) => format!(".{class}"),
    }
}

/// CSS for a marker convention: one rule family for insertions and one for
/// deletions, each covering the marker and everything inside it.
pub fn change_stylesheet(style: &MarkerStyle, insert_color: &str, delete_color: &str) -> String {
    let ins = selector(&style.insert);
    let del = selector(&style.delete);
    let rule = |sel: &str, color: &str| {
        format!("{sel} {{text-decoration : none; background-color: {color};}}\n")
    };
    let mut css = String::from("\n");
    css.push_str(&rule(&ins, insert_color));
    css.push_str(&rule(&del, delete_color));
    css.push_str(&rule(&format!("{ins} *"), insert_color));
    css.push_str(&rule(&format!("{del} *"), delete_color));
    css
}

/// Appends `<style type="text/css">` holding `css` to the document's head,
/// creating the head first when there is none.
pub fn append_style(document: &mut Node, css: &str) -> Result<(), ParseError> {
    let head = ensure_head(document).ok_or(ParseError::MissingRoot)?;
    let children = head.children_mut().ok_or(ParseError::MissingRoot)?;
    children.push(Node::element(
        "style",
        vec![("type".to_string(), "text/css".to_string())],
        vec![Node::text(css)],
    ));
    Ok(())
}

/// Parses `html`, adds a stylesheet to its head and serializes it again.
pub fn insert_style(html: &str, css: &str, pretty: bool) -> Result<String, DiffError> {
    let mut document = build_dom(html)?;
    append_style(&mut document, css)?;
    Ok(serialize(&document, pretty))
}

fn serialize(document: &Node, pretty: bool) -> String {
    if pretty {
        to_pretty_html(document)
    } else {
        to_html(document)
    }
}

fn push_markup(out: &mut Vec<Node>, html: String) {
    if !html.is_empty() {
        out.push(Node::Markup { html });
    }
}

/// Renders `b` with the differences from `a` marked up as `<ins>`/`<del>`.
///
/// Script and style elements are never diffed: both versions are carried
/// through untouched. Not meant to be shown as-is in a browser, since old
/// and new scripts or stylesheets can end up on the same page.
pub fn render_diff(a: &str, b: &str, config: &DiffConfig) -> Result<String, DiffError> {
    let mut old = build_dom(a)?;
    let mut new = build_dom(b)?;
    let comments = strip_comments(&mut old) + strip_comments(&mut new);
    log::debug!(target: "differs.render", "stripped {comments} comments");

    let (mut old, old_table) = shield(old, OLD_PREFIX);
    let (mut new, mut table) = shield(new, NEW_PREFIX);

    let old_regions = split_regions(&mut old)?;
    let new_regions = split_regions(&mut new)?;
    drop(old);

    let style = MarkerStyle::default();
    let budget = config.markup_budget();
    let mut diffed = Vec::with_capacity(5);
    push_markup(
        &mut diffed,
        diff_markup_with(&old_regions.pre_head, &new_regions.pre_head, &style, Some(budget)),
    );
    diffed.extend(diff_elements(
        old_regions.head.as_ref(),
        new_regions.head.as_ref(),
        &style,
        budget,
    ));
    push_markup(
        &mut diffed,
        diff_markup_with(&old_regions.pre_body, &new_regions.pre_body, &style, Some(budget)),
    );
    diffed.extend(diff_elements(
        old_regions.body.as_ref(),
        new_regions.body.as_ref(),
        &style,
        budget,
    ));
    push_markup(
        &mut diffed,
        diff_markup_with(&old_regions.post_body, &new_regions.post_body, &style, Some(budget)),
    );
    log::debug!(target: "differs.render", "{} diffed regions", diffed.len());

    // split_regions left the root empty.
    new.root_element_mut()
        .and_then(Node::children_mut)
        .ok_or(ParseError::MissingRoot)?
        .extend(diffed);
    append_style(
        &mut new,
        &change_stylesheet(&style, &config.insert_color, &config.delete_color),
    )?;

    // Markup nodes are opaque until the tree is parsed again.
    let spliced = to_html(&new);
    drop(new);
    let reparsed = build_dom(&spliced)?;

    table.merge(old_table);
    log::debug!(target: "differs.render", "restoring {} shielded elements", table.len());
    let restored = unshield(reparsed, table);
    Ok(serialize(&restored, config.pretty_output))
}
