use html::traverse::count_elements;
use html::{Node, build_dom, to_html, to_pretty_html, visible_text};
use std::thread;

const DEPTH: usize = 10_000;

fn nested_divs(depth: usize, leaf: &str) -> String {
    let mut markup = String::with_capacity(depth * 11 + leaf.len());
    for _ in 0..depth {
        markup.push_str("<div>");
    }
    markup.push_str(leaf);
    for _ in 0..depth {
        markup.push_str("</div>");
    }
    markup
}

// Headroom for the tree builder on pathological input.
fn with_big_stack(f: impl FnOnce() + Send + 'static) {
    thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(f)
        .expect("spawn test thread")
        .join()
        .expect("test thread panicked");
}

#[test]
fn build_dom_stress_deep_nesting() {
    with_big_stack(|| {
        let dom = build_dom(&nested_divs(DEPTH, "leaf")).expect("parse");
        let body = dom
            .root_element()
            .and_then(|r| r.child_element("body"))
            .expect("body");

        let mut current = body;
        let mut seen = 0usize;
        loop {
            match current.children() {
                [only @ Node::Element { name, .. }] => {
                    assert_eq!(name, "div");
                    seen += 1;
                    current = only;
                }
                [Node::Text { text }] => {
                    assert_eq!(text, "leaf");
                    break;
                }
                other => panic!("unexpected children at depth {seen}: {}", other.len()),
            }
        }
        assert_eq!(seen, DEPTH);
        // html, head, body
        assert_eq!(count_elements(&dom), DEPTH + 3);
    });
}

#[test]
fn serializers_stress_deep_nesting() {
    with_big_stack(|| {
        let markup = nested_divs(DEPTH, "leaf");
        let dom = build_dom(&markup).expect("parse");

        assert_eq!(
            to_html(&dom),
            format!("<html><head></head><body>{markup}</body></html>")
        );

        let pretty = to_pretty_html(&dom);
        // one line per open tag, close tag, and the text
        assert_eq!(pretty.lines().count(), 2 * (DEPTH + 3) + 1);
        assert!(pretty.contains(&format!("{}leaf\n", " ".repeat(DEPTH + 2))));
    });
}

#[test]
fn visible_text_stress_deep_nesting() {
    with_big_stack(|| {
        let dom = build_dom(&nested_divs(DEPTH, "deep <b>text</b>")).expect("parse");
        assert_eq!(visible_text(dom), "deep  text");
    });
}
