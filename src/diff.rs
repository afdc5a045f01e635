//! Unified diff rendering for changed files.

use similar::TextDiff;

/// Render a unified diff (3 lines of context) between the original and
/// formatted content. Both header labels carry the same path, matching the
/// convention of in-place formatters.
#[must_use]
pub fn unified(original: &str, formatted: &str, label: &str) -> String {
    TextDiff::from_lines(original, formatted)
        .unified_diff()
        .context_radius(3)
        .header(label, label)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_path_twice() {
        let diff = unified("a\n", "b\n", "pkg/mod.py");
        let mut lines = diff.lines();
        assert_eq!(lines.next(), Some("--- pkg/mod.py"));
        assert_eq!(lines.next(), Some("+++ pkg/mod.py"));
    }

    #[test]
    fn test_body_shows_change() {
        let diff = unified("x = 1\nkeep\n", "x = 2\nkeep\n", "a.py");
        assert!(diff.contains("-x = 1"));
        assert!(diff.contains("+x = 2"));
        assert!(diff.contains(" keep"));
    }
}
