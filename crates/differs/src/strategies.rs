//! The operations callers pick from, by name or through [`run_strategy`].

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::string::FromUtf8Error;
use std::time::Duration;

use html::{build_dom, visible_text};
use markup_diff::{MarkerStyle, diff_markup_with};
use net::PageFreezer;
use text_diff::{DiffOp, DiffOptions, Payload, diff_payloads, diff_text};

use crate::config::DiffConfig;
use crate::error::DiffError;
use crate::render::{change_stylesheet, insert_style, render_diff};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    Length,
    IdenticalBytes,
    SideBySideText,
    HtmlTextDiff,
    HtmlSourceDiff,
    HtmlDiffRender,
    HtmlTreeDiff,
    HtmlDiffer,
    PageFreezer,
}

impl Strategy {
    pub const ALL: [Strategy; 9] = [
        Strategy::Length,
        Strategy::IdenticalBytes,
        Strategy::SideBySideText,
        Strategy::HtmlTextDiff,
        Strategy::HtmlSourceDiff,
        Strategy::HtmlDiffRender,
        Strategy::HtmlTreeDiff,
        Strategy::HtmlDiffer,
        Strategy::PageFreezer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Length => "length",
            Strategy::IdenticalBytes => "identical_bytes",
            Strategy::SideBySideText => "side_by_side_text",
            Strategy::HtmlTextDiff => "html_text_diff",
            Strategy::HtmlSourceDiff => "html_source_diff",
            Strategy::HtmlDiffRender => "html_diff_render",
            Strategy::HtmlTreeDiff => "html_tree_diff",
            Strategy::HtmlDiffer => "html_differ",
            Strategy::PageFreezer => "pagefreezer",
        }
    }

    /// Inputs are URLs rather than page bodies.
    pub fn takes_urls(self) -> bool {
        self == Strategy::PageFreezer
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownStrategy(pub String);

impl fmt::Display for UnknownStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Strategy::ALL.iter().map(|s| s.name()).collect();
        write!(f, "unknown strategy {:?} (expected one of: {})", self.0, names.join(", "))
    }
}

impl std::error::Error for UnknownStrategy {}

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == wanted)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SideBySideText {
    pub a_text: String,
    pub b_text: String,
}

/// What a strategy produced. Serializes to the bare value: a number, a
/// boolean, an `{a_text, b_text}` object, a list of `[code, segment]`
/// pairs, an HTML string, or the remote service's JSON.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DiffOutput {
    Length(i64),
    Identical(bool),
    SideBySide(SideBySideText),
    Ops(Vec<DiffOp>),
    Html(String),
    Remote(Value),
}

impl DiffOutput {
    pub fn as_html(&self) -> Option<&str> {
        match self {
            DiffOutput::Html(html) => Some(html),
            _ => None,
        }
    }
}

/// An owned page body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Bytes(Vec<u8>),
}

impl Body {
    pub fn payload(&self) -> Payload<'_> {
        match self {
            Body::Text(text) => Payload::Text(text),
            Body::Bytes(bytes) => Payload::Bytes(bytes),
        }
    }
}

/// Decodes two raw bodies for `strategy`, always into the same variant.
///
/// `length` and `identical_bytes` compare bodies byte for byte. Everything
/// else gets text when both sides are UTF-8 and bytes otherwise, so a
/// single undecodable side never turns into a text/bytes mismatch.
pub fn decode_bodies(strategy: Strategy, a: Vec<u8>, b: Vec<u8>) -> (Body, Body) {
    if matches!(strategy, Strategy::Length | Strategy::IdenticalBytes) {
        return (Body::Bytes(a), Body::Bytes(b));
    }
    match (String::from_utf8(a), String::from_utf8(b)) {
        (Ok(a), Ok(b)) => (Body::Text(a), Body::Text(b)),
        (a, b) => {
            log::debug!(target: "differs.strategy", "{strategy}: input is not UTF-8; using bytes");
            let bytes = |side: Result<String, FromUtf8Error>| match side {
                Ok(text) => text.into_bytes(),
                Err(err) => err.into_bytes(),
            };
            (Body::Bytes(bytes(a)), Body::Bytes(bytes(b)))
        }
    }
}

fn char_or_byte_len(payload: &Payload<'_>) -> i64 {
    let len = match payload {
        Payload::Text(text) => text.chars().count(),
        Payload::Bytes(bytes) => bytes.len(),
    };
    i64::try_from(len).unwrap_or(i64::MAX)
}

/// `len(b) - len(a)`, in characters for text and bytes for bytes. Says
/// nothing about content.
pub fn compare_length(a: Payload<'_>, b: Payload<'_>) -> i64 {
    char_or_byte_len(&b) - char_or_byte_len(&a)
}

/// Exact equality. Text never equals bytes.
pub fn identical_bytes(a: Payload<'_>, b: Payload<'_>) -> bool {
    match (a, b) {
        (Payload::Text(a), Payload::Text(b)) => a == b,
        (Payload::Bytes(a), Payload::Bytes(b)) => a == b,
        _ => false,
    }
}

/// Text a reader would see on the page. Best effort: anything hidden by
/// CSS or script still counts as visible.
pub fn extract_visible_text(html: &str) -> Result<String, DiffError> {
    Ok(visible_text(build_dom(html)?))
}

pub fn side_by_side_text(a: &str, b: &str) -> Result<SideBySideText, DiffError> {
    Ok(SideBySideText {
        a_text: extract_visible_text(a)?,
        b_text: extract_visible_text(b)?,
    })
}

/// Character diff of two texts or byte diff of two byte strings, with
/// semantic cleanup. Running out of `budget` is not an error.
pub fn compute_dmp_diff(
    a: Payload<'_>,
    b: Payload<'_>,
    budget: Duration,
) -> Result<Vec<DiffOp>, DiffError> {
    Ok(diff_payloads(a, b, &DiffOptions::with_budget(budget))?)
}

/// Diff of the visible text of two pages.
pub fn html_text_diff(a: &str, b: &str, config: &DiffConfig) -> Result<Vec<DiffOp>, DiffError> {
    let a_text = extract_visible_text(a)?;
    let b_text = extract_visible_text(b)?;
    log::debug!(
        target: "differs.strategy",
        "visible text: {} -> {} chars",
        a_text.chars().count(),
        b_text.chars().count()
    );
    Ok(diff_text(
        &a_text,
        &b_text,
        &DiffOptions::with_budget(config.text_budget()),
    ))
}

/// Diff of the raw markup, unparsed.
pub fn html_source_diff(
    a: Payload<'_>,
    b: Payload<'_>,
    config: &DiffConfig,
) -> Result<Vec<DiffOp>, DiffError> {
    compute_dmp_diff(a, b, config.source_budget())
}

/// Region-aware rendered diff with `<ins>`/`<del>` markers.
pub fn html_diff_render(a: &str, b: &str, config: &DiffConfig) -> Result<String, DiffError> {
    render_diff(a, b, config)
}

fn whole_document_diff(
    a: &str,
    b: &str,
    style: &MarkerStyle,
    config: &DiffConfig,
) -> Result<String, DiffError> {
    let diffed = diff_markup_with(a, b, style, Some(config.markup_budget()));
    let css = change_stylesheet(style, &config.insert_color, &config.delete_color);
    insert_style(&diffed, &css, config.pretty_output)
}

/// Whole-document structural diff marked with `<diffins>`/`<diffdel>`.
pub fn html_tree_diff(a: &str, b: &str, config: &DiffConfig) -> Result<String, DiffError> {
    whole_document_diff(a, b, &MarkerStyle::tags("diffins", "diffdel"), config)
}

/// Whole-document structural diff marked with `htmldiffer_insert` /
/// `htmldiffer_delete` spans.
pub fn html_differ(a: &str, b: &str, config: &DiffConfig) -> Result<String, DiffError> {
    let style = MarkerStyle::classes("htmldiffer_insert", "htmldiffer_delete");
    whole_document_diff(a, b, &style, config)
}

/// Hands the two URLs to PageFreezer and returns its answer as-is.
pub fn pagefreezer(a_url: &str, b_url: &str, config: &DiffConfig) -> Result<Value, DiffError> {
    let client = PageFreezer::from_config(&config.pagefreezer)?;
    Ok(client.compare(a_url, b_url)?)
}

fn require_text<'a>(strategy: Strategy, payload: Payload<'a>) -> Result<&'a str, DiffError> {
    match payload {
        Payload::Text(text) => Ok(text),
        Payload::Bytes(bytes) => {
            std::str::from_utf8(bytes).map_err(|err| DiffError::UnsupportedInput {
                strategy: strategy.name(),
                reason: format!("input is not UTF-8 text ({err})"),
            })
        }
    }
}

pub fn run_strategy(
    strategy: Strategy,
    a: Payload<'_>,
    b: Payload<'_>,
    config: &DiffConfig,
) -> Result<DiffOutput, DiffError> {
    log::debug!(
        target: "differs.strategy",
        "{strategy}: {} vs {} input bytes",
        a.len(),
        b.len()
    );
    let output = match strategy {
        Strategy::Length => DiffOutput::Length(compare_length(a, b)),
        Strategy::IdenticalBytes => DiffOutput::Identical(identical_bytes(a, b)),
        Strategy::HtmlSourceDiff => DiffOutput::Ops(html_source_diff(a, b, config)?),
        Strategy::SideBySideText => DiffOutput::SideBySide(side_by_side_text(
            require_text(strategy, a)?,
            require_text(strategy, b)?,
        )?),
        Strategy::HtmlTextDiff => DiffOutput::Ops(html_text_diff(
            require_text(strategy, a)?,
            require_text(strategy, b)?,
            config,
        )?),
        Strategy::HtmlDiffRender => DiffOutput::Html(html_diff_render(
            require_text(strategy, a)?,
            require_text(strategy, b)?,
            config,
        )?),
        Strategy::HtmlTreeDiff => DiffOutput::Html(html_tree_diff(
            require_text(strategy, a)?,
            require_text(strategy, b)?,
            config,
        )?),
        Strategy::HtmlDiffer => DiffOutput::Html(html_differ(
            require_text(strategy, a)?,
            require_text(strategy, b)?,
            config,
        )?),
        Strategy::PageFreezer => DiffOutput::Remote(pagefreezer(
            require_text(strategy, a)?,
            require_text(strategy, b)?,
            config,
        )?),
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_diff::ChangeKind;

    #[test]
    fn names_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.name().parse::<Strategy>(), Ok(strategy));
        }
        assert_eq!("HTML-DIFF-RENDER".parse::<Strategy>(), Ok(Strategy::HtmlDiffRender));
        let err = "nope".parse::<Strategy>().expect_err("unknown");
        assert!(err.to_string().contains("html_source_diff"));
    }

    #[test]
    fn length_counts_chars_for_text() {
        assert_eq!(compare_length(Payload::Text("ab"), Payload::Text("abcé")), 2);
        assert_eq!(compare_length(Payload::Bytes(b"abcd"), Payload::Bytes(b"a")), -3);
    }

    #[test]
    fn identical_bytes_sees_what_length_misses() {
        let (a, b) = (Payload::Text("abc"), Payload::Text("abd"));
        assert_eq!(compare_length(a, b), 0);
        assert!(!identical_bytes(a, b));
        assert!(identical_bytes(a, a));
        assert!(!identical_bytes(Payload::Text("a"), Payload::Bytes(b"a")));
    }

    #[test]
    fn text_diff_matches_the_documented_example() {
        let ops = html_text_diff(
            "<p>Deleted</p><p>Unchanged</p>",
            "<p>Added</p><p>Unchanged</p>",
            &DiffConfig::default(),
        )
        .expect("diff");
        assert_eq!(
            ops,
            vec![
                DiffOp::text(ChangeKind::Delete, "Delet"),
                DiffOp::text(ChangeKind::Insert, "Add"),
                DiffOp::text(ChangeKind::Equal, "ed Unchanged"),
            ]
        );
    }

    #[test]
    fn source_diff_matches_the_documented_example() {
        let ops = html_source_diff(
            Payload::Text("<p>Deleted</p><p>Unchanged</p>"),
            Payload::Text("<p>Added</p><p>Unchanged</p>"),
            &DiffConfig::default(),
        )
        .expect("diff");
        assert_eq!(
            ops,
            vec![
                DiffOp::text(ChangeKind::Equal, "<p>"),
                DiffOp::text(ChangeKind::Delete, "Delet"),
                DiffOp::text(ChangeKind::Insert, "Add"),
                DiffOp::text(ChangeKind::Equal, "ed</p><p>Unchanged</p>"),
            ]
        );
    }

    #[test]
    fn source_diff_rejects_mixed_inputs() {
        let err = html_source_diff(
            Payload::Text("<p>"),
            Payload::Bytes(b"<p>"),
            &DiffConfig::default(),
        )
        .expect_err("mismatch");
        assert!(matches!(err, DiffError::TypeMismatch(_)));
    }

    #[test]
    fn bodies_decode_to_matching_kinds() {
        let latin1 = b"<p>caf\xe9</p>".to_vec();
        let (a, b) = decode_bodies(Strategy::HtmlSourceDiff, b"<p>cafe</p>".to_vec(), latin1.clone());
        assert!(matches!((&a, &b), (Body::Bytes(_), Body::Bytes(_))));
        let ops = html_source_diff(a.payload(), b.payload(), &DiffConfig::default()).expect("diff");
        assert_eq!(text_diff::reconstruct(&ops, ChangeKind::Insert), latin1);

        let (a, b) = decode_bodies(Strategy::HtmlTextDiff, b"<p>a</p>".to_vec(), b"<p>b</p>".to_vec());
        assert_eq!(a, Body::Text("<p>a</p>".to_string()));
        assert_eq!(b, Body::Text("<p>b</p>".to_string()));

        let (a, b) = decode_bodies(Strategy::Length, "\u{e9}".as_bytes().to_vec(), b"e".to_vec());
        assert_eq!(compare_length(a.payload(), b.payload()), -1);
    }

    #[test]
    fn tree_diff_honors_the_markup_budget() {
        let config = DiffConfig {
            markup_time_budget_ms: 1,
            pretty_output: false,
            ..DiffConfig::default()
        };
        let old: String = (0..2000).map(|n| format!("<p>before {n}</p>")).collect();
        let new: String = (0..2000).map(|n| format!("<p>after {n}</p>")).collect();
        let out = html_tree_diff(&old, &new, &config).expect("diff");
        assert_eq!(out.matches("after ").count(), 2000);
        assert_eq!(out.matches("before ").count(), 2000);
        assert_eq!(out.matches("<diffins>").count(), out.matches("</diffins>").count());
    }

    #[test]
    fn side_by_side_returns_both_texts() {
        let out = side_by_side_text(
            "<title>T</title><p>one</p><script>x()</script>",
            "<p>two</p><!-- c -->",
        )
        .expect("texts");
        assert_eq!(
            out,
            SideBySideText {
                a_text: "one".to_string(),
                b_text: "two".to_string(),
            }
        );
    }

    #[test]
    fn html_strategies_refuse_binary_input() {
        let err = run_strategy(
            Strategy::HtmlTextDiff,
            Payload::Bytes(b"\xff\xfe"),
            Payload::Bytes(b"<p>x</p>"),
            &DiffConfig::default(),
        )
        .expect_err("binary");
        assert!(matches!(
            err,
            DiffError::UnsupportedInput {
                strategy: "html_text_diff",
                ..
            }
        ));
    }

    #[test]
    fn utf8_bytes_are_accepted_as_text() {
        let out = run_strategy(
            Strategy::SideBySideText,
            Payload::Bytes("<p>caf\u{e9}</p>".as_bytes()),
            Payload::Text("<p>tea</p>"),
            &DiffConfig::default(),
        )
        .expect("texts");
        assert_eq!(
            out,
            DiffOutput::SideBySide(SideBySideText {
                a_text: "caf\u{e9}".to_string(),
                b_text: "tea".to_string(),
            })
        );
    }

    #[test]
    fn pagefreezer_without_key_fails_before_the_network() {
        let err = run_strategy(
            Strategy::PageFreezer,
            Payload::Text("https://example.com/a"),
            Payload::Text("https://example.com/b"),
            &DiffConfig::default(),
        )
        .expect_err("no key");
        assert!(matches!(
            err,
            DiffError::Verification(net::VerifyError::MissingApiKey)
        ));
    }

    #[test]
    fn outputs_serialize_to_bare_values() {
        let json = |out: DiffOutput| serde_json::to_string(&out).expect("json");
        assert_eq!(json(DiffOutput::Length(-3)), "-3");
        assert_eq!(json(DiffOutput::Identical(true)), "true");
        assert_eq!(
            json(DiffOutput::Ops(vec![DiffOp::text(ChangeKind::Equal, "x")])),
            r#"[[0,"x"]]"#
        );
        assert_eq!(
            json(DiffOutput::SideBySide(SideBySideText {
                a_text: "a".to_string(),
                b_text: "b".to_string(),
            })),
            r#"{"a_text":"a","b_text":"b"}"#
        );
    }
}
