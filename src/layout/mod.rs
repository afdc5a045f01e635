//! Transform stage B: layout normalization.
//!
//! Line-oriented cleanups applied everywhere except inside string literals:
//!
//! - strip trailing whitespace (this also normalizes CRLF line endings)
//! - expand leading tabs to the configured indent width
//! - collapse blank-line runs above the configured maximum and drop blank
//!   lines at the start of the file
//! - ensure two spaces before an inline `#` comment and one space after
//!   the `#` (shebang and `#:` markers are exempt)
//! - end the output with exactly one newline
//!
//! The stage fails with a [`SyntaxError`] when a triple-quoted string is
//! still open at end of file; everything else is accepted.

use crate::directive::find_directive;
use crate::error::SyntaxError;
use crate::scan::{LineScan, StringTracker};

/// Options controlling layout normalization.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Spaces per leading tab
    pub indent: usize,
    /// Longest run of blank lines to keep
    pub max_blank_lines: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            indent: 4,
            max_blank_lines: 2,
        }
    }
}

/// Stage B: the layout formatter.
#[derive(Debug, Clone)]
pub struct LayoutFormatter {
    options: LayoutOptions,
}

impl LayoutFormatter {
    #[must_use]
    pub fn new(options: LayoutOptions) -> Self {
        LayoutFormatter { options }
    }

    pub fn apply(&self, source: &str) -> Result<String, SyntaxError> {
        format_layout(source, &self.options)
    }
}

/// Normalize the layout of `source`. See the module docs for the rules.
///
/// An in-file `# pytidy:` directive overrides `indent` and
/// `max_blank_lines` for this file only.
pub fn format_layout(source: &str, options: &LayoutOptions) -> Result<String, SyntaxError> {
    if source.is_empty() {
        return Ok(String::new());
    }

    let mut options = options.clone();
    if let Some(overrides) = find_directive(source) {
        if let Some(indent) = overrides.indent {
            options.indent = indent;
        }
        if let Some(max) = overrides.max_blank_lines {
            options.max_blank_lines = max;
        }
    }

    let mut lines: Vec<&str> = source.split('\n').collect();
    if source.ends_with('\n') {
        lines.pop();
    }

    let mut tracker = StringTracker::new();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut blank_run = 0usize;

    for line in &lines {
        let scan = tracker.scan_line(line);
        if scan.started_in_string {
            // Content of a multi-line string, verbatim
            out.push((*line).to_string());
            blank_run = 0;
            continue;
        }
        if line.trim().is_empty() {
            blank_run += 1;
            if !out.is_empty() && blank_run <= options.max_blank_lines {
                out.push(String::new());
            }
            continue;
        }
        blank_run = 0;
        out.push(process_line(line, &scan, &options));
    }

    if let Some(open) = tracker.open() {
        return Err(SyntaxError::new(
            "unterminated triple-quoted string",
            open.line,
            open.column,
            lines[open.line - 1],
        ));
    }

    while out.last().is_some_and(|line| line.is_empty()) {
        out.pop();
    }

    let mut result = out.join("\n");
    result.push('\n');
    Ok(result)
}

/// Apply the single-line transforms to one non-blank line that starts
/// outside any string.
fn process_line(line: &str, scan: &LineScan, options: &LayoutOptions) -> String {
    let lead_len = line.len() - line.trim_start().len();
    let lead = expand_tabs(&line[..lead_len], options.indent);

    if let Some(c) = scan.comment {
        if !scan.ends_in_string {
            let code = &line[lead_len..c];
            let comment = normalize_comment(&line[c..]);
            if code.trim().is_empty() {
                return format!("{lead}{comment}");
            }
            let code_trimmed = code.trim_end();
            let gap = &code[code_trimmed.len()..];
            let sep = if gap.len() >= 2 && !gap.contains('\t') {
                gap
            } else {
                "  "
            };
            return format!("{lead}{code_trimmed}{sep}{comment}");
        }
    }

    let body = &line[lead_len..];
    if scan.ends_in_string {
        // The tail of the line is string content; leave it alone
        format!("{lead}{body}")
    } else {
        format!("{lead}{}", body.trim_end())
    }
}

/// Expand tabs in a leading-whitespace run.
fn expand_tabs(lead: &str, indent: usize) -> String {
    if !lead.contains('\t') {
        return lead.to_string();
    }
    let mut result = String::with_capacity(lead.len() + indent);
    for c in lead.chars() {
        if c == '\t' {
            for _ in 0..indent {
                result.push(' ');
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Ensure one space between the `#` run and the comment text.
fn normalize_comment(comment: &str) -> String {
    if comment.starts_with("#!") || comment.starts_with("#:") {
        return comment.trim_end().to_string();
    }
    let hashes = comment.bytes().take_while(|&b| b == b'#').count();
    let rest = &comment[hashes..];
    if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t') {
        return comment.trim_end().to_string();
    }
    format!("{} {}", &comment[..hashes], rest.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(source: &str) -> String {
        format_layout(source, &LayoutOptions::default()).unwrap()
    }

    #[test]
    fn test_clean_source_unchanged() {
        let src = "import os\n\n\ndef main():\n    return os.name\n";
        assert_eq!(layout(src), src);
    }

    #[test]
    fn test_trailing_whitespace_stripped() {
        assert_eq!(layout("x = 1   \ny = 2\t\n"), "x = 1\ny = 2\n");
    }

    #[test]
    fn test_crlf_normalized() {
        assert_eq!(layout("x = 1\r\ny = 2\r\n"), "x = 1\ny = 2\n");
    }

    #[test]
    fn test_leading_tabs_expanded() {
        assert_eq!(layout("if x:\n\ty = 1\n\t\tz = 2\n"), "if x:\n    y = 1\n        z = 2\n");
    }

    #[test]
    fn test_tab_width_follows_options() {
        let options = LayoutOptions {
            indent: 2,
            ..LayoutOptions::default()
        };
        assert_eq!(format_layout("\tx = 1\n", &options).unwrap(), "  x = 1\n");
    }

    #[test]
    fn test_blank_runs_collapsed() {
        assert_eq!(layout("x = 1\n\n\n\n\ny = 2\n"), "x = 1\n\n\ny = 2\n");
    }

    #[test]
    fn test_leading_blanks_dropped() {
        assert_eq!(layout("\n\nx = 1\n"), "x = 1\n");
    }

    #[test]
    fn test_trailing_blanks_dropped() {
        assert_eq!(layout("x = 1\n\n\n"), "x = 1\n");
    }

    #[test]
    fn test_final_newline_added() {
        assert_eq!(layout("x = 1"), "x = 1\n");
    }

    #[test]
    fn test_inline_comment_gets_two_spaces() {
        assert_eq!(layout("x = 1 # note\n"), "x = 1  # note\n");
    }

    #[test]
    fn test_wide_comment_gap_kept() {
        // Manual alignment is preserved
        assert_eq!(layout("x = 1      # note\n"), "x = 1      # note\n");
    }

    #[test]
    fn test_space_inserted_after_hash() {
        assert_eq!(layout("#comment\n"), "# comment\n");
        assert_eq!(layout("x = 1  #tail\n"), "x = 1  # tail\n");
    }

    #[test]
    fn test_shebang_untouched() {
        assert_eq!(layout("#!/usr/bin/env python\nx = 1\n"), "#!/usr/bin/env python\nx = 1\n");
    }

    #[test]
    fn test_hash_colon_untouched() {
        assert_eq!(layout("#: type marker\n"), "#: type marker\n");
    }

    #[test]
    fn test_string_content_preserved() {
        let src = "s = \"\"\"\n  keep\ttabs   \n\n\n\n\nand blanks\n\"\"\"\n";
        assert_eq!(layout(src), src);
    }

    #[test]
    fn test_hash_in_string_not_a_comment() {
        assert_eq!(layout("x = '# nope'\n"), "x = '# nope'\n");
    }

    #[test]
    fn test_open_string_tail_kept() {
        let src = "s = '''tail   \nend'''\n";
        assert_eq!(layout(src), src);
    }

    #[test]
    fn test_unterminated_string_is_syntax_error() {
        let err = format_layout("x = 1\ns = '''oops\n", &LayoutOptions::default()).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 5);
        assert!(err.message.contains("unterminated"));
        assert_eq!(err.source_line, "s = '''oops");
    }

    #[test]
    fn test_directive_overrides_indent() {
        let src = "# pytidy: --indent 2\nif x:\n\ty = 1\n";
        assert_eq!(layout(src), "# pytidy: --indent 2\nif x:\n  y = 1\n");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(layout(""), "");
    }

    #[test]
    fn test_idempotent() {
        let src = "#header\nx = 1 # a\n\n\n\n\ty = 2   \n";
        let once = layout(src);
        assert_eq!(layout(&once), once);
    }
}
