//! Span tokenizer for diffing markup.
//!
//! Every token borrows its exact source text, so concatenating the `raw` of
//! all tokens gives the input back byte for byte. Tags are not parsed into
//! attributes; a changed attribute simply makes the whole tag differ.
//!
//! Tag names use the ASCII character class `[A-Za-z0-9:_-]`. A `<` that
//! does not open a tag, comment or declaration is ordinary text.
use html::serialize::{is_raw_text_element, is_void_element};
use memchr::memchr;

const HTML_COMMENT_START: &str = "<!--";
const HTML_COMMENT_END: &str = "-->";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Non-whitespace run plus the whitespace that trails it.
    Word,
    /// Whitespace not preceded by a word (start of input or after a tag).
    Space,
    StartTag { name: String },
    EndTag { name: String },
    /// Void element or explicitly self-closed tag.
    Void { name: String },
    /// Indivisible unit: comment, declaration, or a whole raw-text element
    /// (`<script>…</script>`) including its content.
    Block,
    /// A whole `<title>` or `<textarea>` with its content. Markup inside is
    /// shown literally, so no marker may go in there.
    Escapable { name: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub raw: &'a str,
}

impl Token<'_> {
    /// What the diff compares. Words ignore their trailing whitespace and
    /// every whitespace run compares equal to every other.
    pub fn key(&self) -> &str {
        match self.kind {
            TokenKind::Word => self.raw.trim_end_matches(|c: char| c.is_ascii_whitespace()),
            TokenKind::Space => " ",
            _ => self.raw,
        }
    }
}

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

fn is_escapable_raw_text_element(name: &str) -> bool {
    name == "title" || name == "textarea"
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':'
}

/// Whether the `<` at `i` opens markup rather than being literal text.
fn opens_markup(bytes: &[u8], i: usize) -> bool {
    match bytes.get(i + 1) {
        Some(c) if c.is_ascii_alphabetic() => true,
        Some(b'!') | Some(b'?') => true,
        Some(b'/') => bytes.get(i + 2).is_some_and(|c| c.is_ascii_alphabetic()),
        _ => false,
    }
}

// Only ASCII `<` starts a match, and `<` never appears inside a UTF-8
// continuation byte, so returned offsets are char boundaries.
fn find_rawtext_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
    let hay_bytes = haystack.as_bytes();
    let len = hay_bytes.len();
    let n = name.len() + 2;
    let mut i = 0;
    while i + n <= len {
        let rel = memchr(b'<', &hay_bytes[i..])?;
        i += rel;
        if i + n > len {
            return None;
        }
        if hay_bytes[i + 1] == b'/'
            && starts_with_ignore_ascii_case_at(hay_bytes, i + 2, name.as_bytes())
        {
            let mut k = i + n;
            // Only ASCII whitespace may sit between the name and `>`.
            while k < len && hay_bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < len && hay_bytes[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

/// End of a tag starting at `start` (just past the name): the index after
/// its `>`, skipping quoted attribute values. Also reports a `/>` ending.
fn scan_tag_end(bytes: &[u8], start: usize) -> (usize, bool) {
    let len = bytes.len();
    let mut k = start;
    while k < len {
        match bytes[k] {
            b'>' => return (k + 1, k > start && bytes[k - 1] == b'/'),
            quote @ (b'"' | b'\'') => {
                k += 1;
                match memchr(quote, &bytes[k..]) {
                    Some(rel) => k += rel + 1,
                    None => return (len, false),
                }
            }
            _ => k += 1,
        }
    }
    (len, false)
}

pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    // Invariant: every cut is made next to an ASCII byte, so all slice
    // endpoints are UTF-8 char boundaries.
    while i < len {
        let start = i;
        if bytes[i] == b'<' && opens_markup(bytes, i) {
            if input[i..].starts_with(HTML_COMMENT_START) {
                let body = i + HTML_COMMENT_START.len();
                i = match input[body..].find(HTML_COMMENT_END) {
                    Some(end) => body + end + HTML_COMMENT_END.len(),
                    None => len,
                };
                out.push(Token {
                    kind: TokenKind::Block,
                    raw: &input[start..i],
                });
                continue;
            }
            if matches!(bytes[i + 1], b'!' | b'?') {
                // doctype, CDATA, processing instruction
                i = memchr(b'>', &bytes[i..]).map_or(len, |rel| i + rel + 1);
                out.push(Token {
                    kind: TokenKind::Block,
                    raw: &input[start..i],
                });
                continue;
            }
            let closing = bytes[i + 1] == b'/';
            let name_start = if closing { i + 2 } else { i + 1 };
            let mut j = name_start;
            while j < len && is_name_char(bytes[j]) {
                j += 1;
            }
            let name = input[name_start..j].to_ascii_lowercase();
            let (end, self_closing) = scan_tag_end(bytes, j);
            i = end;
            if closing {
                out.push(Token {
                    kind: TokenKind::EndTag { name },
                    raw: &input[start..i],
                });
                continue;
            }
            if self_closing || is_void_element(&name) {
                out.push(Token {
                    kind: TokenKind::Void { name },
                    raw: &input[start..i],
                });
                continue;
            }
            if is_raw_text_element(&name) || is_escapable_raw_text_element(&name) {
                // Swallow the content and the close tag; a missing close tag
                // runs to the end of input.
                i = find_rawtext_close_tag(&input[i..], &name).map_or(len, |(_, rel_end)| i + rel_end);
                let kind = if is_raw_text_element(&name) {
                    TokenKind::Block
                } else {
                    TokenKind::Escapable { name }
                };
                out.push(Token {
                    kind,
                    raw: &input[start..i],
                });
                continue;
            }
            out.push(Token {
                kind: TokenKind::StartTag { name },
                raw: &input[start..i],
            });
            continue;
        }

        if bytes[i].is_ascii_whitespace() {
            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            out.push(Token {
                kind: TokenKind::Space,
                raw: &input[start..i],
            });
            continue;
        }

        while i < len
            && !bytes[i].is_ascii_whitespace()
            && !(bytes[i] == b'<' && opens_markup(bytes, i))
        {
            i += 1;
        }
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        debug_assert!(input.is_char_boundary(i));
        out.push(Token {
            kind: TokenKind::Word,
            raw: &input[start..i],
        });
    }
    out
}
