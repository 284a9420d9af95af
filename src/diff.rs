//! Unified diff rendering for the interactive review flow.

use std::fmt::Write as _;
use std::ops::Range;

use console::Style;
use similar::{Algorithm, ChangeTag, DiffOp, TextDiff};

#[derive(Debug, Clone)]
pub struct DiffConfig {
    pub context: usize,
    pub colorize: bool,
}

/// Renders a unified diff of `old` against `new` with `@@` hunk headers but
/// without the `---`/`+++` file header lines. Equal inputs render empty.
pub fn render(old: &str, new: &str, config: &DiffConfig) -> String {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old, new);

    let palette = Palette::new(config.colorize);
    let mut out = String::new();
    for group in diff.grouped_ops(config.context) {
        let (old_range, new_range) = group_ranges(&group);
        let _ = writeln!(
            out,
            "{}",
            palette
                .header
                .apply_to(hunk_header(&old_range, &new_range))
        );
        for op in &group {
            for change in diff.iter_changes(op) {
                let (sign, style) = match change.tag() {
                    ChangeTag::Delete => ('-', &palette.removed),
                    ChangeTag::Insert => ('+', &palette.added),
                    ChangeTag::Equal => (' ', &palette.plain),
                };
                let value = change.value();
                let _ = write!(out, "{}", style.apply_to(format!("{sign}{value}")));
                if !value.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }
    out
}

/// Short `+added -removed` line summary for the change journal.
pub fn summarize_lines(old: &str, new: &str) -> String {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old, new);
    let mut added = 0usize;
    let mut removed = 0usize;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => removed += 1,
            ChangeTag::Equal => {}
        }
    }
    format!("+{added} -{removed}")
}

fn group_ranges(group: &[DiffOp]) -> (Range<usize>, Range<usize>) {
    match (group.first(), group.last()) {
        (Some(first), Some(last)) => (
            first.old_range().start..last.old_range().end,
            first.new_range().start..last.new_range().end,
        ),
        _ => (0..0, 0..0),
    }
}

fn hunk_header(old: &Range<usize>, new: &Range<usize>) -> String {
    format!(
        "@@ -{},{} +{},{} @@",
        old.start + 1,
        old.len(),
        new.start + 1,
        new.len()
    )
}

struct Palette {
    header: Style,
    removed: Style,
    added: Style,
    plain: Style,
}

impl Palette {
    fn new(colorize: bool) -> Self {
        if colorize {
            Self {
                header: Style::new().cyan().force_styling(true),
                removed: Style::new().red().force_styling(true),
                added: Style::new().green().force_styling(true),
                plain: Style::new(),
            }
        } else {
            Self {
                header: Style::new(),
                removed: Style::new(),
                added: Style::new(),
                plain: Style::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(context: usize) -> DiffConfig {
        DiffConfig {
            context,
            colorize: false,
        }
    }

    #[test]
    fn render_has_hunks_but_no_file_header() {
        let old = "one\ntwo\nthree\n";
        let new = "one\n2\nthree\n";
        let text = render(old, new, &plain(1));
        assert!(text.contains("@@"));
        assert!(text.contains("-two"));
        assert!(text.contains("+2"));
        assert!(!text.lines().any(|line| line.starts_with("---")));
        assert!(!text.lines().any(|line| line.starts_with("+++")));
    }

    #[test]
    fn render_is_empty_for_equal_inputs() {
        assert!(render("same\n", "same\n", &plain(3)).is_empty());
    }

    #[test]
    fn render_handles_missing_final_newline() {
        let text = render("a", "b", &plain(0));
        assert!(text.contains("-a\n"));
        assert!(text.contains("+b\n"));
    }

    #[test]
    fn summarize_counts_lines() {
        assert_eq!(summarize_lines("a\nb\n", "a\nc\nd\n"), "+2 -1");
        assert_eq!(summarize_lines("x\n", "x\n"), "+0 -0");
    }
}
