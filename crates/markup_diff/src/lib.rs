//! Structural diff of two markup fragments.
//!
//! Both sides are split into words, whitespace, tags and indivisible blocks
//! (see [`tokenizer`]), the token sequences are aligned with Myers, and the
//! result is rebuilt as markup in which inserted words are wrapped in an
//! insert marker and deleted words in a delete marker. Equal stretches are
//! copied from the new side, so the output follows the new document's
//! structure.
//!
//! Alignment runs under a time budget. Past it the engine settles for a
//! coarser alignment, which is still a correct diff.

pub mod tokenizer;

use similar::{Algorithm, DiffTag, capture_diff_slices_deadline};
use std::time::{Duration, Instant};
use tokenizer::{Token, TokenKind, tokenize};

/// Budget used by [`diff_markup`].
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(4);

/// How changed content is wrapped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Marker {
    /// `<name>…</name>`
    Tag(String),
    /// `<span class="name">…</span>`
    Class(String),
}

impl Marker {
    fn open(&self) -> String {
        match self {
            Marker::Tag(name) => format!("<{name}>"),
            Marker::Class(class) => format!("<span class=\"{class}\">"),
        }
    }

    fn close(&self) -> String {
        match self {
            Marker::Tag(name) => format!("</{name}>"),
            Marker::Class(_) => "</span>".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkerStyle {
    pub insert: Marker,
    pub delete: Marker,
}

impl MarkerStyle {
    pub fn tags(insert: &str, delete: &str) -> Self {
        Self {
            insert: Marker::Tag(insert.to_string()),
            delete: Marker::Tag(delete.to_string()),
        }
    }

    pub fn classes(insert: &str, delete: &str) -> Self {
        Self {
            insert: Marker::Class(insert.to_string()),
            delete: Marker::Class(delete.to_string()),
        }
    }
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self::tags("ins", "del")
    }
}

/// [`diff_markup_with`] using `<ins>`/`<del>` and the default budget.
pub fn diff_markup(old: &str, new: &str) -> String {
    diff_markup_with(old, new, &MarkerStyle::default(), Some(DEFAULT_TIME_BUDGET))
}

/// `time_budget` of `None` aligns to completion however long that takes.
pub fn diff_markup_with(
    old: &str,
    new: &str,
    style: &MarkerStyle,
    time_budget: Option<Duration>,
) -> String {
    let old_tokens = tokenize(old);
    let new_tokens = tokenize(new);
    let old_keys: Vec<&str> = old_tokens.iter().map(Token::key).collect();
    let new_keys: Vec<&str> = new_tokens.iter().map(Token::key).collect();
    let deadline = time_budget.map(|budget| Instant::now() + budget);
    let ops = capture_diff_slices_deadline(Algorithm::Myers, &old_keys, &new_keys, deadline);
    if deadline.is_some_and(|d| Instant::now() > d) {
        log::warn!(
            target: "markup_diff",
            "alignment exceeded its {:?} budget; markers may cover more than changed",
            time_budget.unwrap_or_default()
        );
    }

    let mut out = Emitter {
        out: String::with_capacity(old.len().max(new.len()) + 64),
        style,
    };
    let (mut inserted, mut deleted) = (0usize, 0usize);
    for op in &ops {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                for token in &new_tokens[new_range] {
                    out.out.push_str(token.raw);
                }
            }
            DiffTag::Delete => {
                deleted += old_range.len();
                out.deleted(&old_tokens[old_range]);
            }
            DiffTag::Insert => {
                inserted += new_range.len();
                out.inserted(&new_tokens[new_range]);
            }
            DiffTag::Replace => {
                deleted += old_range.len();
                inserted += new_range.len();
                out.deleted(&old_tokens[old_range]);
                out.inserted(&new_tokens[new_range]);
            }
        }
    }
    log::debug!(
        target: "markup_diff",
        "{} -> {} tokens: {deleted} deleted, {inserted} inserted",
        old_tokens.len(),
        new_tokens.len()
    );
    out.out
}

/// Embedded media shown inside a marker instead of beside it.
fn is_media(name: &str) -> bool {
    matches!(name, "img" | "video" | "audio" | "picture" | "svg" | "embed" | "object")
}

struct Emitter<'s> {
    out: String,
    style: &'s MarkerStyle,
}

impl Emitter<'_> {
    /// New-side tokens: every tag is kept, text and media are marked.
    fn inserted(&mut self, tokens: &[Token<'_>]) {
        let style = self.style;
        let marker = &style.insert;
        let mut open = false;
        for token in tokens {
            let wrap = match &token.kind {
                TokenKind::Word => true,
                // Leading whitespace does not open a marker.
                TokenKind::Space => open,
                TokenKind::Void { name } => is_media(name),
                _ => false,
            };
            self.emit(token, wrap, &mut open, marker);
        }
        if open {
            self.out.push_str(&marker.close());
        }
    }

    /// Old-side tokens: text is marked, and only tags that open and close
    /// within the run survive so the new structure stays well nested.
    fn deleted(&mut self, tokens: &[Token<'_>]) {
        let style = self.style;
        let marker = &style.delete;
        let keep = balanced_tags(tokens);
        let mut open = false;
        for (idx, token) in tokens.iter().enumerate() {
            match &token.kind {
                TokenKind::StartTag { .. } | TokenKind::EndTag { .. } if !keep[idx] => {
                    log::trace!(target: "markup_diff", "dropping unbalanced deleted tag {}", token.raw);
                }
                // Cannot carry a marker; the new side's version stands alone.
                TokenKind::Escapable { name } => {
                    log::trace!(target: "markup_diff", "dropping deleted <{name}>");
                }
                TokenKind::Word => self.emit(token, true, &mut open, marker),
                TokenKind::Space => self.emit(token, open, &mut open, marker),
                TokenKind::Void { name } => self.emit(token, is_media(name), &mut open, marker),
                _ => self.emit(token, false, &mut open, marker),
            }
        }
        if open {
            self.out.push_str(&marker.close());
        }
    }

    fn emit(&mut self, token: &Token<'_>, wrap: bool, open: &mut bool, marker: &Marker) {
        if wrap && !*open {
            self.out.push_str(&marker.open());
            *open = true;
        } else if !wrap && *open {
            self.out.push_str(&marker.close());
            *open = false;
        }
        self.out.push_str(token.raw);
    }
}

/// Marks start/end tag pairs that match up inside `tokens`.
fn balanced_tags(tokens: &[Token<'_>]) -> Vec<bool> {
    let mut keep = vec![false; tokens.len()];
    let mut open: Vec<(&str, usize)> = Vec::new();
    for (idx, token) in tokens.iter().enumerate() {
        match &token.kind {
            TokenKind::StartTag { name } => open.push((name.as_str(), idx)),
            TokenKind::EndTag { name } => {
                if let Some(pos) = open.iter().rposition(|(n, _)| *n == name.as_str()) {
                    keep[open[pos].1] = true;
                    keep[idx] = true;
                    // Anything opened inside and never closed stays dropped.
                    open.truncate(pos);
                }
            }
            _ => {}
        }
    }
    keep
}
