use html::dom_snapshot::{DomSnapshotOptions, assert_dom_eq};
use html::{build_dom, to_html, to_pretty_html};
use html_test_support::diff_lines;

const CASES: &[(&str, &str)] = &[
    ("plain", "<p>Hello <b>world</b> &amp; friends</p>"),
    (
        "doctype_and_head",
        "<!DOCTYPE html><html><head><title>T</title><meta charset=\"utf-8\"></head>\
         <body><h1>Title</h1></body></html>",
    ),
    (
        "raw_text",
        "<head><style>p > a { color: red; }</style></head>\
         <body><script>if (a < b && c) { go(); }</script></body>",
    ),
    (
        "attributes",
        r#"<a href="/x?a=1&amp;b=2" title="say &quot;hi&quot;">link</a>"#,
    ),
    ("comments", "<div><!-- note --><span>x</span></div>"),
    ("void", "<p>a<br>b<img src=\"i.png\" alt=\"\"></p>"),
    ("nbsp", "<p>a&nbsp;b</p>"),
    ("preformatted", "<pre>  keep\n    this</pre><textarea>  and\nthis</textarea>"),
];

#[test]
fn compact_output_reparses_to_same_tree() {
    for (name, markup) in CASES {
        let first = build_dom(markup).unwrap_or_else(|e| panic!("{name}: {e}"));
        let second = build_dom(&to_html(&first)).unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_dom_eq(&first, &second, DomSnapshotOptions::default());
    }
}

#[test]
fn pretty_output_reparses_to_same_tree_modulo_layout() {
    for (name, markup) in CASES {
        let first = build_dom(markup).unwrap_or_else(|e| panic!("{name}: {e}"));
        let second =
            build_dom(&to_pretty_html(&first)).unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_dom_eq(&first, &second, DomSnapshotOptions::layout_insensitive());
    }
}

#[test]
fn serialization_is_stable_after_one_pass() {
    for (name, markup) in CASES {
        let once = to_html(&build_dom(markup).unwrap_or_else(|e| panic!("{name}: {e}")));
        let twice = to_html(&build_dom(&once).unwrap_or_else(|e| panic!("{name}: {e}")));
        assert_eq!(once, twice, "{name}");
    }
}

fn lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

#[test]
fn pretty_output_is_stable_after_one_pass() {
    for (name, markup) in CASES {
        let once = to_pretty_html(&build_dom(markup).unwrap_or_else(|e| panic!("{name}: {e}")));
        let twice = to_pretty_html(&build_dom(&once).unwrap_or_else(|e| panic!("{name}: {e}")));
        assert!(
            once == twice,
            "{name}: pretty output changed on reparse\n{}",
            diff_lines(&lines(&once), &lines(&twice))
        );
    }
}
