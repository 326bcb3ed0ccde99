//! Applying fix records to document text.
//!
//! The rule only describes edits; hosts decide whether to apply them. This is
//! the host side, following markdownlint's rules for combining fixes.

use std::collections::BTreeMap;
use std::ops::Range;

use xi_rope::Rope;
use xi_rope::delta::Builder;

use crate::rule::fix::FixInfo;

/// Applies `fixes` to `text`.
///
/// - Fixes on the same line apply right to left, by descending edit column.
/// - Identical fixes apply once.
/// - A fix reaching into text already edited by a fix to its right is dropped.
/// - Fixes naming a line past the end of `text` are dropped.
///
/// Line endings, including a missing final newline, are preserved.
pub fn apply_fixes(text: &str, fixes: &[FixInfo]) -> String {
    let mut by_line: BTreeMap<usize, Vec<&FixInfo>> = BTreeMap::new();
    for fix in fixes {
        by_line.entry(fix.line_number).or_default().push(fix);
    }

    let rope = Rope::from(text);
    let mut builder = Builder::new(rope.len());
    let mut edited = false;
    for (line_number, line_fixes) in &mut by_line {
        let Some(line) = line_range(&rope, *line_number) else {
            log::debug!("skipping fixes past the end of the text at line {line_number}");
            continue;
        };
        let content = rope.slice_to_cow(line.clone());
        for (bytes, insert) in line_edits(&content, line_fixes) {
            builder.replace(
                line.start + bytes.start..line.start + bytes.end,
                Rope::from(insert),
            );
            edited = true;
        }
    }

    if !edited {
        return text.to_string();
    }
    builder.build().apply(&rope).to_string()
}

/// Byte range of a 1-based line's content, without its line ending.
fn line_range(rope: &Rope, line_number: usize) -> Option<Range<usize>> {
    let index = line_number.checked_sub(1)?;
    let start = rope.offset_of_line(index);
    if start >= rope.len() {
        return None;
    }
    let end = rope.offset_of_line(index + 1);
    let line = rope.slice_to_cow(start..end);
    let content_len = line
        .strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .map_or(line.len(), str::len);
    Some(start..start + content_len)
}

/// Edits for one line, as byte ranges into `line` paired with their
/// replacement, in ascending order.
fn line_edits<'f>(line: &str, fixes: &mut Vec<&'f FixInfo>) -> Vec<(Range<usize>, &'f str)> {
    fixes.sort_by(|a, b| {
        b.edit_column
            .cmp(&a.edit_column)
            .then_with(|| a.delete_count.cmp(&b.delete_count))
            .then_with(|| a.insert_text.cmp(&b.insert_text))
    });
    fixes.dedup();

    let char_count = line.chars().count();
    let byte_at = |column: usize| {
        line.char_indices()
            .nth(column)
            .map_or(line.len(), |(offset, _)| offset)
    };

    let mut edits = Vec::new();
    // Start of the leftmost edit accepted so far
    let mut boundary = usize::MAX;
    for &fix in fixes.iter() {
        let start = fix.edit_column.saturating_sub(1).min(char_count);
        let end = (start + fix.delete_count.unwrap_or(0)).min(char_count);
        if end > boundary {
            log::debug!(
                "skipping overlapping fix at {}:{}",
                fix.line_number,
                fix.edit_column
            );
            continue;
        }
        boundary = start;
        let insert = fix.insert_text.as_deref().unwrap_or_default();
        if start < end || !insert.is_empty() {
            edits.push((byte_at(start)..byte_at(end), insert));
        }
    }

    // Right to left on the line is left to right for the builder. Inserts
    // sharing a column keep their right-to-left stacking.
    edits.reverse();
    edits
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn insert(line_number: usize, edit_column: usize, text: &str) -> FixInfo {
        FixInfo {
            line_number,
            edit_column,
            insert_text: Some(text.to_string()),
            delete_count: None,
        }
    }

    fn delete(line_number: usize, edit_column: usize, count: usize) -> FixInfo {
        FixInfo {
            line_number,
            edit_column,
            insert_text: None,
            delete_count: Some(count),
        }
    }

    #[test]
    fn no_fixes_returns_text_unchanged() {
        let text = "- a\nb\r\nc";
        assert_eq!(apply_fixes(text, &[]), text);
    }

    #[test]
    fn inserts_and_deletes_on_separate_lines() {
        let text = "- list item\nlazy\n    lazy\n";
        let fixes = [insert(2, 1, "  "), delete(3, 1, 2)];
        assert_eq!(
            apply_fixes(text, &fixes),
            "- list item\n  lazy\n  lazy\n"
        );
    }

    #[test]
    fn preserves_crlf_and_missing_final_newline() {
        let text = "- a\r\nb\r\nc";
        let fixes = [insert(2, 1, "  "), insert(3, 1, "  ")];
        assert_eq!(apply_fixes(text, &fixes), "- a\r\n  b\r\n  c");
    }

    #[test]
    fn same_line_fixes_apply_right_to_left() {
        let fixes = [insert(1, 1, "<"), insert(1, 4, ">")];
        assert_eq!(apply_fixes("abc", &fixes), "<abc>");
    }

    #[test]
    fn duplicate_fixes_apply_once() {
        let fixes = [insert(1, 1, "  "), insert(1, 1, "  ")];
        assert_eq!(apply_fixes("x\n", &fixes), "  x\n");
    }

    #[test]
    fn overlapping_fix_is_dropped() {
        let fixes = [delete(1, 1, 4), insert(1, 3, "!")];
        assert_eq!(apply_fixes("abcdef", &fixes), "ab!cdef");
    }

    #[test]
    fn fixes_past_end_of_text_are_ignored() {
        assert_eq!(apply_fixes("a\n", &[insert(7, 1, "x")]), "a\n");
    }

    #[test]
    fn delete_is_clamped_to_line_length() {
        assert_eq!(apply_fixes("   \nx", &[delete(1, 1, 10)]), "\nx");
    }

    #[test]
    fn columns_count_characters() {
        assert_eq!(apply_fixes("é x", &[delete(1, 2, 1)]), "éx");
    }

    #[test]
    fn inserts_at_one_column_stack_like_sequential_edits() {
        let fixes = [insert(1, 2, "x"), insert(1, 2, "y")];
        assert_eq!(apply_fixes("ab", &fixes), "ayxb");
    }

    #[test]
    fn fixes_on_lines_after_the_final_newline_are_ignored() {
        assert_eq!(apply_fixes("a\n", &[insert(2, 1, "x")]), "a\n");
        assert_eq!(apply_fixes("", &[insert(1, 1, "x")]), "");
    }

    #[test]
    fn edits_on_many_lines_apply_together() {
        let text = "- é\r\nb\n      c\nd";
        let fixes = [delete(3, 1, 4), insert(2, 1, "  "), insert(4, 1, "  ")];
        assert_eq!(apply_fixes(text, &fixes), "- é\r\n  b\n  c\n  d");
    }
}
