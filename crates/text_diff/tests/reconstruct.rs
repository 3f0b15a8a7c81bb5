use text_diff::{ChangeKind, DiffOp, DiffOptions, Payload, diff_bytes, diff_payloads, diff_text, reconstruct};

const PAIRS: &[(&str, &str)] = &[
    ("", ""),
    ("", "added"),
    ("removed", ""),
    ("<p>Deleted</p><p>Unchanged</p>", "<p>Added</p><p>Unchanged</p>"),
    ("The cat sat on the mat.", "The cow and the cat sat on a mat!"),
    ("line one\nline two\n\nline four\n", "line one\nline 2\n\nline four\nline five\n"),
    ("caf\u{e9} na\u{ef}ve \u{1f600}", "cafe naive \u{1f601}"),
    ("abcxxx", "xxxdef"),
    ("aaaaaaaaaa", "aaaabaaaaa"),
];

fn check_sides(a: &[u8], b: &[u8], ops: &[DiffOp]) {
    assert_eq!(reconstruct(ops, ChangeKind::Delete), a, "old side of {ops:?}");
    assert_eq!(reconstruct(ops, ChangeKind::Insert), b, "new side of {ops:?}");
    assert!(ops.iter().all(|op| !op.segment.is_empty()), "empty run in {ops:?}");
}

#[test]
fn text_diffs_rebuild_both_sides() {
    for semantic_cleanup in [true, false] {
        let options = DiffOptions {
            semantic_cleanup,
            ..DiffOptions::default()
        };
        for (a, b) in PAIRS {
            let ops = diff_text(a, b, &options);
            check_sides(a.as_bytes(), b.as_bytes(), &ops);
        }
    }
}

#[test]
fn byte_diffs_rebuild_both_sides() {
    let options = DiffOptions::default();
    for (a, b) in PAIRS {
        let ops = diff_bytes(a.as_bytes(), b.as_bytes(), &options);
        check_sides(a.as_bytes(), b.as_bytes(), &ops);
    }
    let a = [0u8, 159, 146, 150, 255, 10, 13];
    let b = [0u8, 146, 150, 254, 255, 13];
    check_sides(&a, &b, &diff_bytes(&a, &b, &options));
}

#[test]
fn no_op_diff_is_a_single_equal_run() {
    for (a, _) in PAIRS.iter().filter(|(a, _)| !a.is_empty()) {
        let ops = diff_payloads(Payload::Text(a), Payload::Text(a), &DiffOptions::default())
            .expect("same kinds");
        assert_eq!(ops, vec![DiffOp::text(ChangeKind::Equal, *a)]);
    }
}

#[test]
fn edits_never_put_inserts_before_deletes_in_a_run() {
    for (a, b) in PAIRS {
        let ops = diff_text(a, b, &DiffOptions {
            semantic_cleanup: false,
            ..DiffOptions::default()
        });
        for pair in ops.windows(2) {
            assert!(
                !(pair[0].kind == ChangeKind::Insert && pair[1].kind == ChangeKind::Delete),
                "insert before delete in {ops:?}"
            );
        }
    }
}
