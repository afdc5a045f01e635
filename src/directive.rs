//! Inline directive parsing for `# pytidy:` comments
//!
//! Supports in-file configuration overrides via special comments:
//! `# pytidy: --indent 2 --max-blank-lines 1`
//!
//! Two additional markers control processing itself:
//! - `# pytidy: skip-file` on its own line excludes the whole file
//! - a trailing `# pytidy: skip` pins an import statement in place

use std::sync::LazyLock;

use regex::Regex;

/// Pattern to match pytidy directive lines
static PYTIDY_DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*#\s*pytidy:\s*(.*?)\s*$").unwrap());

/// Pattern to match a trailing skip marker in a comment
static SKIP_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)#\s*pytidy:\s*skip\s*$").unwrap());

/// Parsed directive options that can override config
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectiveOverrides {
    pub indent: Option<usize>,
    pub max_blank_lines: Option<usize>,
    /// The whole file is excluded from formatting
    pub skip_file: bool,
}

impl DirectiveOverrides {
    /// Check if any overrides are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indent.is_none() && self.max_blank_lines.is_none() && !self.skip_file
    }
}

/// Check if a line contains a pytidy directive
#[must_use]
pub fn is_directive_line(line: &str) -> bool {
    PYTIDY_DIRECTIVE_RE.is_match(line)
}

/// Check if a comment tail pins the statement it follows (`# pytidy: skip`)
#[must_use]
pub fn is_skip_marker(comment: &str) -> bool {
    SKIP_MARKER_RE.is_match(comment)
}

/// Parse a pytidy directive line and return option overrides
///
/// Returns `None` if the line is not a directive or carries no recognized
/// options.
#[must_use]
pub fn parse_directive(line: &str) -> Option<DirectiveOverrides> {
    let caps = PYTIDY_DIRECTIVE_RE.captures(line)?;
    let args_str = caps.get(1)?.as_str();
    parse_directive_args(args_str)
}

/// Parse directive arguments into overrides
fn parse_directive_args(args_str: &str) -> Option<DirectiveOverrides> {
    let mut overrides = DirectiveOverrides::default();
    let tokens: Vec<&str> = args_str.split_whitespace().collect();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "-i" | "--indent" => {
                i += 1;
                if i < tokens.len() {
                    overrides.indent = tokens[i].parse().ok();
                }
            }
            "--max-blank-lines" => {
                i += 1;
                if i < tokens.len() {
                    overrides.max_blank_lines = tokens[i].parse().ok();
                }
            }
            "skip-file" => {
                overrides.skip_file = true;
            }
            _ => {
                // Unknown option, skip
            }
        }
        i += 1;
    }

    if overrides.is_empty() {
        None
    } else {
        Some(overrides)
    }
}

/// Scan source text for pytidy directives and return the first found
///
/// Only the first directive is used (subsequent ones are ignored). A
/// `skip-file` marker anywhere in the text still wins even when an earlier
/// option directive exists, so exclusion is decided before any other work.
#[must_use]
pub fn find_directive(source: &str) -> Option<DirectiveOverrides> {
    let mut first: Option<DirectiveOverrides> = None;
    for line in source.lines() {
        if !is_directive_line(line) {
            continue;
        }
        if let Some(overrides) = parse_directive(line) {
            if overrides.skip_file {
                return Some(overrides);
            }
            if first.is_none() {
                first = Some(overrides);
            }
        }
    }
    first
}
