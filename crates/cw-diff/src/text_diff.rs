//! Free-text comparison helpers for human-readable output.

use similar::{ChangeTag, TextDiff};

/// The suffix of `b` left over after greedily matching `b` as a subsequence
/// of `a`.
///
/// Two cursors walk `a` and `b` once each, so this is linear in the input
/// lengths. It is an approximation, not a longest-common-subsequence: when
/// `b` extends `a` (an examine text that gained a sentence) the result is the
/// appended text.
pub fn unmatched_suffix<'b>(a: &str, b: &'b str) -> &'b str {
    let mut remaining = a.chars();
    for (pos, ch) in b.char_indices() {
        if !remaining.by_ref().any(|c| c == ch) {
            return &b[pos..];
        }
    }
    ""
}

/// A compact line diff: removed lines prefixed with `-`, added lines with
/// `+`, unchanged lines omitted.
pub fn line_diff(old: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut out = String::new();
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Equal => continue,
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
        };
        out.push(sign);
        out.push_str(change.value().trim_end_matches('\n'));
        out.push('\n');
    }
    out
}
