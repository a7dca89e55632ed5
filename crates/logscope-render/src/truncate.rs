use unicode_width::UnicodeWidthChar;

use crate::markup::{Segment, segments};

/// Shorten marked-up text to `budget` visible columns
///
/// Tags are free; only their content is charged against the budget. A tagged
/// span is kept whole, cut and closed again, or dropped, so the result never
/// contains a dangling tag. Line breaks become single spaces first.
pub fn truncate(text: &str, budget: usize) -> String {
    let text = single_line(text);
    let mut out = String::with_capacity(text.len());
    let mut remaining = budget;

    for segment in segments(&text) {
        if remaining == 0 {
            break;
        }

        let visible = segment.visible();
        let (taken, used) = take_columns(visible, remaining);
        match segment {
            Segment::Plain(_) => out.push_str(taken),
            Segment::Tagged { attr, .. } => {
                if !taken.is_empty() {
                    out.push('<');
                    out.push_str(attr);
                    out.push('>');
                    out.push_str(taken);
                    out.push_str("</>");
                }
            }
        }
        remaining -= used;

        if taken.len() < visible.len() {
            break;
        }
    }

    out
}

/// Visible width of marked-up text
pub fn visible_width(text: &str) -> usize {
    segments(text)
        .iter()
        .flat_map(|segment| segment.visible().chars())
        .map(char_columns)
        .sum()
}

/// Replace every line break with one space
fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Longest prefix of `s` that fits in `max` columns, and its width
fn take_columns(s: &str, max: usize) -> (&str, usize) {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let w = char_columns(c);
        if used + w > max {
            return (&s[..idx], used);
        }
        used += w;
    }
    (s, used)
}

/// Columns charged for a character; zero-width characters still cost one
fn char_columns(c: char) -> usize {
    c.width().unwrap_or(1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::strip;

    fn balanced(s: &str) -> bool {
        let opening = segments(s)
            .iter()
            .filter(|seg| matches!(seg, Segment::Tagged { .. }))
            .count();
        opening == s.matches("</>").count()
    }

    #[test]
    fn test_short_text_unchanged() {
        let text = "2024-01-15 10:30:00 <fg=gray>testing</>.<fg=red>ERROR</> ok";
        assert_eq!(truncate(text, 200), text);
    }

    #[test]
    fn test_cut_inside_tag_closes_it() {
        assert_eq!(truncate("ab <fg=red>ERROR</> tail", 5), "ab <fg=red>ER</>");
    }

    #[test]
    fn test_cut_at_span_boundary_drops_next_tag() {
        assert_eq!(truncate("abc<fg=red>def</>", 3), "abc");
        assert_eq!(truncate("<fg=red>abc</><fg=blue>def</>", 3), "<fg=red>abc</>");
    }

    #[test]
    fn test_zero_budget() {
        assert_eq!(truncate("<fg=red>x</>", 0), "");
    }

    #[test]
    fn test_unbounded_budget() {
        assert_eq!(truncate("<fg=red>abc</>", usize::MAX), "<fg=red>abc</>");
    }

    #[test]
    fn test_cut_inside_span_after_escaped_tag() {
        let text = r"\<bg=yellow>a <fg=red>bc</> d";
        assert_eq!(truncate(text, 15), r"\<bg=yellow>a <fg=red>b</>");
    }

    #[test]
    fn test_newlines_become_spaces() {
        assert_eq!(truncate("one\ntwo\r\nthree", 100), "one two three");
        assert_eq!(truncate("one\ntwo", 5), "one t");
    }

    #[test]
    fn test_wide_chars_respect_columns() {
        let out = truncate("日本語テキスト", 5);
        assert_eq!(out, "日本");
        assert!(visible_width(&out) <= 5);
    }

    #[test]
    fn test_never_exceeds_budget_and_stays_balanced() {
        let inputs = [
            "2024-01-15 10:30:00 <fg=gray>production</>.<fg=bright-red>CRITICAL</> <fg=gray>@single</>: payment <bg=yellow>failed</> for order 42",
            "<fg=red></>empty<bg=yellow>x</>",
            "a < b <fg=green>c</> > d e",
            "<bg=yellow>\\asdf</> trailing",
        ];
        for input in inputs {
            for budget in 0..=strip(input).chars().count() + 2 {
                let out = truncate(input, budget);
                assert!(visible_width(&out) <= budget, "{input:?} @ {budget}: {out:?}");
                assert!(strip(&out).chars().count() <= budget);
                assert!(balanced(&out), "{input:?} @ {budget}: {out:?}");
            }
        }
    }
}
