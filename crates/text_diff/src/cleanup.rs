//! Post-processing of raw diff runs, after diff-match-patch.
//!
//! [`cleanup_semantic`] trades minimality for readability: short equalities
//! squeezed between larger edits are folded into the edits, single edits are
//! slid to word or line boundaries, and overlapping delete/insert pairs are
//! split around the shared part. [`cleanup_merge`] normalizes run order and
//! coalesces neighbours. Both keep the two sides reconstructible.

use crate::{Atom, ChangeKind, Chunk};

pub(crate) fn cleanup_semantic<T: Atom>(chunks: &mut Vec<Chunk<T>>) {
    let mut changes = false;
    // Indices of equalities seen so far, newest last.
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<usize> = None;
    let (mut ins_before, mut del_before) = (0usize, 0usize);
    let (mut ins_after, mut del_after) = (0usize, 0usize);

    let mut pointer: isize = 0;
    while (pointer as usize) < chunks.len() {
        let idx = pointer as usize;
        if chunks[idx].kind == ChangeKind::Equal {
            equalities.push(idx);
            ins_before = ins_after;
            del_before = del_after;
            ins_after = 0;
            del_after = 0;
            last_equality = Some(chunks[idx].items.len());
        } else {
            if chunks[idx].kind == ChangeKind::Insert {
                ins_after += chunks[idx].items.len();
            } else {
                del_after += chunks[idx].items.len();
            }
            let sandwiched = last_equality.is_some_and(|len| {
                len > 0 && len <= ins_before.max(del_before) && len <= ins_after.max(del_after)
            });
            let target = if sandwiched { equalities.last().copied() } else { None };
            if let Some(eq_idx) = target {
                // Split the equality into a delete and an insert of the same text.
                let items = chunks[eq_idx].items.clone();
                chunks[eq_idx].kind = ChangeKind::Insert;
                chunks.insert(eq_idx, Chunk::new(ChangeKind::Delete, items));
                equalities.pop();
                // The equality before it needs re-evaluating too.
                equalities.pop();
                pointer = equalities.last().map_or(-1, |&i| i as isize);
                ins_before = 0;
                del_before = 0;
                ins_after = 0;
                del_after = 0;
                last_equality = None;
                changes = true;
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(chunks);
    }
    cleanup_semantic_lossless(chunks);
    split_overlaps(chunks);
    chunks.retain(|c| !c.items.is_empty());
}

/// Slides single edits bordered by equalities sideways to the boundary that
/// scores best (blank line > line break > sentence end > space > punctuation).
fn cleanup_semantic_lossless<T: Atom>(chunks: &mut Vec<Chunk<T>>) {
    let mut pointer = 1usize;
    while pointer + 1 < chunks.len() {
        if chunks[pointer - 1].kind != ChangeKind::Equal
            || chunks[pointer + 1].kind != ChangeKind::Equal
        {
            pointer += 1;
            continue;
        }
        let mut equality1 = chunks[pointer - 1].items.clone();
        let mut edit = chunks[pointer].items.clone();
        let mut equality2 = chunks[pointer + 1].items.clone();

        // Shift the edit as far left as possible.
        let offset = common_suffix(&equality1, &edit);
        if offset > 0 {
            let common = edit[edit.len() - offset..].to_vec();
            equality1.truncate(equality1.len() - offset);
            edit.truncate(edit.len() - offset);
            edit.splice(0..0, common.iter().cloned());
            equality2.splice(0..0, common);
        }

        // Then step right one atom at a time looking for the best fit.
        let mut best = (equality1.clone(), edit.clone(), equality2.clone());
        let mut best_score = boundary_score(&equality1, &edit) + boundary_score(&edit, &equality2);
        while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
            let moved = edit.remove(0);
            equality1.push(moved);
            edit.push(equality2.remove(0));
            let score = boundary_score(&equality1, &edit) + boundary_score(&edit, &equality2);
            // >= favours the rightmost of equally good positions.
            if score >= best_score {
                best_score = score;
                best = (equality1.clone(), edit.clone(), equality2.clone());
            }
        }

        let (best_equality1, best_edit, best_equality2) = best;
        if chunks[pointer - 1].items != best_equality1 {
            if best_equality1.is_empty() {
                chunks.remove(pointer - 1);
                pointer -= 1;
            } else {
                chunks[pointer - 1].items = best_equality1;
            }
            chunks[pointer].items = best_edit;
            if best_equality2.is_empty() {
                chunks.remove(pointer + 1);
                pointer = pointer.saturating_sub(1);
            } else {
                chunks[pointer + 1].items = best_equality2;
            }
        }
        pointer += 1;
    }
}

/// Where a delete and the following insert overlap by at least half of
/// either, pull the overlap out as an equality.
fn split_overlaps<T: Atom>(chunks: &mut Vec<Chunk<T>>) {
    let mut pointer = 1usize;
    while pointer < chunks.len() {
        if chunks[pointer - 1].kind == ChangeKind::Delete
            && chunks[pointer].kind == ChangeKind::Insert
        {
            let deletion = chunks[pointer - 1].items.clone();
            let insertion = chunks[pointer].items.clone();
            let overlap1 = common_overlap(&deletion, &insertion);
            let overlap2 = common_overlap(&insertion, &deletion);
            if overlap1 >= overlap2 {
                if overlap1 * 2 >= deletion.len() || overlap1 * 2 >= insertion.len() {
                    chunks.insert(
                        pointer,
                        Chunk::new(ChangeKind::Equal, insertion[..overlap1].to_vec()),
                    );
                    chunks[pointer - 1].items = deletion[..deletion.len() - overlap1].to_vec();
                    chunks[pointer + 1].items = insertion[overlap1..].to_vec();
                    pointer += 1;
                }
            } else if overlap2 * 2 >= deletion.len() || overlap2 * 2 >= insertion.len() {
                // Reverse overlap: the insert's tail is the delete's head.
                chunks.insert(
                    pointer,
                    Chunk::new(ChangeKind::Equal, deletion[..overlap2].to_vec()),
                );
                chunks[pointer - 1] = Chunk::new(
                    ChangeKind::Insert,
                    insertion[..insertion.len() - overlap2].to_vec(),
                );
                chunks[pointer + 1] = Chunk::new(ChangeKind::Delete, deletion[overlap2..].to_vec());
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

/// Puts every edit run in delete-then-insert order, factors common prefixes
/// and suffixes of paired runs into the surrounding equalities, joins
/// adjacent equalities and drops empty runs.
pub(crate) fn cleanup_merge<T: Atom>(chunks: &mut Vec<Chunk<T>>) {
    loop {
        merge_pass(chunks);
        if !shift_single_edits(chunks) {
            break;
        }
    }
}

fn merge_pass<T: Atom>(chunks: &mut Vec<Chunk<T>>) {
    // Sentinel so the final edit run gets flushed.
    chunks.push(Chunk::new(ChangeKind::Equal, Vec::new()));
    let mut pointer = 0usize;
    let (mut count_delete, mut count_insert) = (0usize, 0usize);
    let mut text_delete: Vec<T> = Vec::new();
    let mut text_insert: Vec<T> = Vec::new();

    while pointer < chunks.len() {
        match chunks[pointer].kind {
            ChangeKind::Insert => {
                count_insert += 1;
                text_insert.extend(chunks[pointer].items.iter().cloned());
                pointer += 1;
            }
            ChangeKind::Delete => {
                count_delete += 1;
                text_delete.extend(chunks[pointer].items.iter().cloned());
                pointer += 1;
            }
            ChangeKind::Equal => {
                let run = count_delete + count_insert;
                if run > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        let prefix = common_prefix(&text_insert, &text_delete);
                        if prefix != 0 {
                            let shared: Vec<T> = text_insert.drain(..prefix).collect();
                            text_delete.drain(..prefix);
                            let before = pointer - run;
                            if before > 0 && chunks[before - 1].kind == ChangeKind::Equal {
                                chunks[before - 1].items.extend(shared);
                            } else {
                                chunks.insert(0, Chunk::new(ChangeKind::Equal, shared));
                                pointer += 1;
                            }
                        }
                        let suffix = common_suffix(&text_insert, &text_delete);
                        if suffix != 0 {
                            let shared = text_insert.split_off(text_insert.len() - suffix);
                            text_delete.truncate(text_delete.len() - suffix);
                            chunks[pointer].items.splice(0..0, shared);
                        }
                    }
                    let mut merged = Vec::with_capacity(2);
                    if !text_delete.is_empty() {
                        merged.push(Chunk::new(ChangeKind::Delete, std::mem::take(&mut text_delete)));
                    }
                    if !text_insert.is_empty() {
                        merged.push(Chunk::new(ChangeKind::Insert, std::mem::take(&mut text_insert)));
                    }
                    let start = pointer - run;
                    let added = merged.len();
                    chunks.splice(start..pointer, merged);
                    pointer = start + added + 1;
                } else if pointer != 0 && chunks[pointer - 1].kind == ChangeKind::Equal {
                    let items = chunks.remove(pointer).items;
                    chunks[pointer - 1].items.extend(items);
                } else {
                    pointer += 1;
                }
                count_delete = 0;
                count_insert = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }
    // A run that factored away completely leaves two equalities touching.
    let mut coalesced: Vec<Chunk<T>> = Vec::with_capacity(chunks.len());
    for chunk in chunks.drain(..).filter(|c| !c.items.is_empty()) {
        match coalesced.last_mut() {
            Some(prev) if prev.kind == ChangeKind::Equal && chunk.kind == ChangeKind::Equal => {
                prev.items.extend(chunk.items)
            }
            _ => coalesced.push(chunk),
        }
    }
    *chunks = coalesced;
}

/// `A<ins>BA</ins>C` -> `<ins>AB</ins>AC` and the mirror case. Returns true
/// when anything moved, in which case another merge pass is due.
fn shift_single_edits<T: Atom>(chunks: &mut Vec<Chunk<T>>) -> bool {
    let mut changes = false;
    let mut pointer = 1usize;
    while pointer + 1 < chunks.len() {
        if chunks[pointer - 1].kind == ChangeKind::Equal
            && chunks[pointer + 1].kind == ChangeKind::Equal
        {
            let prev_len = chunks[pointer - 1].items.len();
            let next_len = chunks[pointer + 1].items.len();
            let edit_len = chunks[pointer].items.len();
            if edit_len >= prev_len && chunks[pointer].items.ends_with(&chunks[pointer - 1].items) {
                let prev = chunks[pointer - 1].items.clone();
                let edit = &mut chunks[pointer].items;
                edit.truncate(edit_len - prev_len);
                edit.splice(0..0, prev.iter().cloned());
                chunks[pointer + 1].items.splice(0..0, prev);
                chunks.remove(pointer - 1);
                changes = true;
            } else if edit_len >= next_len
                && chunks[pointer].items.starts_with(&chunks[pointer + 1].items)
            {
                let next = chunks[pointer + 1].items.clone();
                chunks[pointer - 1].items.extend(next.iter().cloned());
                let edit = &mut chunks[pointer].items;
                edit.drain(..next_len);
                edit.extend(next);
                chunks.remove(pointer + 1);
                changes = true;
            }
        }
        pointer += 1;
    }
    changes
}

fn common_prefix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Length of the longest suffix of `a` that is also a prefix of `b`.
fn common_overlap<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0;
    }
    let a = &a[a.len() - len..];
    let b = &b[..len];
    if a == b {
        return len;
    }
    let mut best = 0;
    let mut length = 1;
    loop {
        let pattern = &a[len - length..];
        let Some(found) = b.windows(pattern.len()).position(|w| w == pattern) else {
            return best;
        };
        length += found;
        if length > len {
            return best;
        }
        if found == 0 || a[len - length..] == b[..length] {
            best = length;
            length += 1;
            if length > len {
                return best;
            }
        }
    }
}

fn boundary_score<T: Atom>(one: &[T], two: &[T]) -> u8 {
    let (Some(last), Some(first)) = (one.last(), two.first()) else {
        // Edges of the input are the best boundaries of all.
        return 6;
    };
    let char1 = last.as_char();
    let char2 = first.as_char();
    let non_alnum1 = !char1.is_alphanumeric();
    let non_alnum2 = !char2.is_alphanumeric();
    let whitespace1 = non_alnum1 && char1.is_whitespace();
    let whitespace2 = non_alnum2 && char2.is_whitespace();
    let line_break1 = whitespace1 && (char1 == '\r' || char1 == '\n');
    let line_break2 = whitespace2 && (char2 == '\r' || char2 == '\n');
    let blank_line1 = line_break1 && ends_with_blank_line(one);
    let blank_line2 = line_break2 && starts_with_blank_line(two);

    if blank_line1 || blank_line2 {
        5
    } else if line_break1 || line_break2 {
        4
    } else if non_alnum1 && !whitespace1 && whitespace2 {
        3
    } else if whitespace1 || whitespace2 {
        2
    } else if non_alnum1 || non_alnum2 {
        1
    } else {
        0
    }
}

/// `\n\r?\n` at the end.
fn ends_with_blank_line<T: Atom>(items: &[T]) -> bool {
    let tail: Vec<char> = items.iter().rev().take(3).map(Atom::as_char).collect();
    match tail.as_slice() {
        ['\n', '\n', ..] => true,
        ['\n', '\r', '\n'] => true,
        _ => false,
    }
}

/// `\r?\n\r?\n` at the start.
fn starts_with_blank_line<T: Atom>(items: &[T]) -> bool {
    let mut chars = items.iter().map(Atom::as_char).peekable();
    for _ in 0..2 {
        if chars.peek() == Some(&'\r') {
            chars.next();
        }
        if chars.next() != Some('\n') {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(spec: &[(ChangeKind, &str)]) -> Vec<Chunk<char>> {
        spec.iter()
            .map(|(kind, text)| Chunk::new(*kind, text.chars().collect()))
            .collect()
    }

    fn render(chunks: &[Chunk<char>]) -> Vec<(ChangeKind, String)> {
        chunks
            .iter()
            .map(|c| (c.kind, c.items.iter().collect()))
            .collect()
    }

    fn owned(spec: &[(ChangeKind, &str)]) -> Vec<(ChangeKind, String)> {
        spec.iter().map(|(k, t)| (*k, t.to_string())).collect()
    }

    use ChangeKind::{Delete as D, Equal as E, Insert as I};

    #[test]
    fn merge_joins_like_runs() {
        let mut c = chunks(&[(E, "a"), (D, "b"), (D, "c"), (I, "d"), (I, "e"), (E, "f"), (E, "g")]);
        cleanup_merge(&mut c);
        assert_eq!(render(&c), owned(&[(E, "a"), (D, "bc"), (I, "de"), (E, "fg")]));
    }

    #[test]
    fn merge_factors_prefix_and_suffix() {
        let mut c = chunks(&[(E, "x"), (D, "abc"), (I, "abd"), (E, "y")]);
        cleanup_merge(&mut c);
        assert_eq!(render(&c), owned(&[(E, "xab"), (D, "c"), (I, "d"), (E, "y")]));

        let mut c = chunks(&[(I, "a"), (D, "b"), (I, "c"), (D, "dc")]);
        cleanup_merge(&mut c);
        assert_eq!(render(&c), owned(&[(D, "bd"), (I, "a"), (E, "c")]));
    }

    #[test]
    fn merge_slides_single_edits() {
        let mut c = chunks(&[(E, "a"), (I, "ba"), (E, "c")]);
        cleanup_merge(&mut c);
        assert_eq!(render(&c), owned(&[(I, "ab"), (E, "ac")]));

        let mut c = chunks(&[(E, "a"), (D, "cb"), (E, "c")]);
        cleanup_merge(&mut c);
        assert_eq!(render(&c), owned(&[(E, "ac"), (D, "bc")]));
    }

    #[test]
    fn semantic_folds_short_equalities() {
        let mut c = chunks(&[(D, "ab"), (E, "cd"), (D, "e"), (I, "f"), (E, "g")]);
        cleanup_semantic(&mut c);
        // "cd" is as long as the edits on both sides: kept.
        assert_eq!(
            render(&c),
            owned(&[(D, "ab"), (E, "cd"), (D, "e"), (I, "f"), (E, "g")])
        );

        let mut c = chunks(&[(D, "a"), (E, "b"), (D, "c")]);
        cleanup_semantic(&mut c);
        assert_eq!(render(&c), owned(&[(D, "abc"), (I, "b")]));
    }

    #[test]
    fn semantic_prefers_word_boundaries() {
        let mut c = chunks(&[(E, "The c"), (I, "ow and the c"), (E, "at.")]);
        cleanup_semantic(&mut c);
        assert_eq!(render(&c), owned(&[(E, "The "), (I, "cow and the "), (E, "cat.")]));
    }

    #[test]
    fn semantic_splits_overlaps() {
        let mut c = chunks(&[(D, "abcxxx"), (I, "xxxdef")]);
        cleanup_semantic(&mut c);
        assert_eq!(render(&c), owned(&[(D, "abc"), (E, "xxx"), (I, "def")]));

        let mut c = chunks(&[(D, "xxxabc"), (I, "defxxx")]);
        cleanup_semantic(&mut c);
        assert_eq!(render(&c), owned(&[(I, "def"), (E, "xxx"), (D, "abc")]));
    }

    #[test]
    fn overlap_lengths() {
        let v = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(common_overlap(&v("abc"), &v("abcd")), 3);
        assert_eq!(common_overlap(&v("123456xxx"), &v("xxxabcd")), 3);
        assert_eq!(common_overlap(&v("abc"), &v("xyz")), 0);
        assert_eq!(common_overlap(&v(""), &v("abc")), 0);
    }
}
