//! Transform stage A: import normalization.
//!
//! Scans a Python source file for contiguous runs of column-zero import
//! statements ("blocks"), joins physical continuation lines into logical
//! statements, and rewrites each block with its statements grouped by
//! [`ImportCategory`] and sorted case-insensitively within each group.
//! Text outside import blocks passes through untouched, as does the spelling
//! of every individual statement.
//!
//! A trailing `# pytidy: skip` comment pins a statement: it is emitted where
//! it stood and terminates the block around it.

pub mod category;

pub use category::{classify, is_stdlib, ImportCategory};

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::directive::{is_directive_line, is_skip_marker};
use crate::error::SyntaxError;
use crate::scan::{LineScan, StringTracker};

/// A dotted module path with an optional alias (`a.b.c as d`)
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*( as [A-Za-z_][A-Za-z0-9_]*)?$")
        .unwrap()
});

/// The module clause of a from-import: dots, a dotted path, or both
static FROM_MODULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\.+|\.*[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*)$").unwrap()
});

/// A single from-import target: `*` or an identifier with optional alias
static TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*|[A-Za-z_][A-Za-z0-9_]*( as [A-Za-z_][A-Za-z0-9_]*)?)$").unwrap()
});

/// Options controlling import classification.
#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    /// Top-level module names treated as first-party
    pub first_party: Vec<String>,
}

/// Stage A: the import normalizer.
#[derive(Debug, Clone)]
pub struct ImportSorter {
    options: SortOptions,
}

impl ImportSorter {
    #[must_use]
    pub fn new(options: SortOptions) -> Self {
        ImportSorter { options }
    }

    pub fn apply(&self, source: &str) -> Result<String, SyntaxError> {
        sort_imports(source, &self.options)
    }
}

/// One logical import statement with its attached comments.
#[derive(Debug)]
struct Statement {
    /// Full-line comments moved along with the statement
    comments: Vec<String>,
    /// Physical source lines, verbatim
    lines: Vec<String>,
    module: String,
    category: ImportCategory,
    is_from: bool,
    /// Whitespace-collapsed, comment-free statement text; dedup and sort key
    normalized: String,
    pinned: bool,
}

/// How a block-collection pass stopped.
enum BlockEnd {
    /// End of file
    Eof,
    /// A non-import line follows; the main loop re-examines it
    Code,
    /// A pinned statement terminates the block and is emitted verbatim
    Pinned(Statement),
}

/// Normalize import ordering in `source`. See the module docs for semantics.
pub fn sort_imports(source: &str, options: &SortOptions) -> Result<String, SyntaxError> {
    let had_final_newline = source.ends_with('\n');
    let mut lines: Vec<&str> = source.split('\n').collect();
    if had_final_newline {
        // split leaves one empty artifact after the final terminator
        lines.pop();
    }

    let mut tracker = StringTracker::new();
    let scans: Vec<LineScan> = lines.iter().map(|l| tracker.scan_line(l)).collect();

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    // Marks out-lines that are plain comments eligible to attach to a
    // following import (directives and string content never attach)
    let mut attachable: Vec<bool> = Vec::with_capacity(lines.len());

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let scan = &scans[i];
        if scan.started_in_string || !is_import_start(line) {
            attachable.push(is_attachable_comment(line, scan));
            out.push(line.to_string());
            i += 1;
            continue;
        }

        // Comments sitting directly above the block belong to its first import
        let mut lead_comments: Vec<String> = Vec::new();
        while attachable.last() == Some(&true) {
            attachable.pop();
            lead_comments.insert(0, out.pop().unwrap_or_default());
        }

        i = process_block(&lines, &scans, i, lead_comments, options, &mut out)?;
        attachable.resize(out.len(), false);
    }

    let mut result = out.join("\n");
    if had_final_newline {
        result.push('\n');
    }
    Ok(result)
}

/// Collect one import block starting at `start`, render it sorted into
/// `out`, and return the index of the first line after the block.
fn process_block(
    lines: &[&str],
    scans: &[LineScan],
    start: usize,
    lead_comments: Vec<String>,
    options: &SortOptions,
    out: &mut Vec<String>,
) -> Result<usize, SyntaxError> {
    let mut stmts: Vec<Statement> = Vec::new();
    // Blank and comment lines seen since the last statement, in order;
    // comments attach to the next import, the rest is replayed if the block
    // ends instead
    let mut tail: Vec<String> = Vec::new();
    let mut pending_comments: Vec<String> = lead_comments;
    let mut i = start;
    let end;

    loop {
        if i >= lines.len() {
            end = BlockEnd::Eof;
            break;
        }
        let line = lines[i];
        let scan = &scans[i];
        if scan.started_in_string {
            end = BlockEnd::Code;
            break;
        }
        if line.trim().is_empty() {
            tail.push(line.to_string());
            i += 1;
            continue;
        }
        if is_attachable_comment(line, scan) {
            tail.push(line.to_string());
            pending_comments.push(line.to_string());
            i += 1;
            continue;
        }
        if !is_import_start(line) {
            end = BlockEnd::Code;
            break;
        }

        let (mut stmt, next) = parse_statement(lines, scans, i, options)?;
        stmt.comments = std::mem::take(&mut pending_comments);
        tail.clear();
        i = next;
        if stmt.pinned {
            end = BlockEnd::Pinned(stmt);
            break;
        }
        stmts.push(stmt);
    }

    render_block(stmts, out);

    match end {
        BlockEnd::Pinned(stmt) => {
            out.extend(stmt.comments);
            out.extend(stmt.lines);
        }
        BlockEnd::Code | BlockEnd::Eof => {
            // Whatever trailed the last import stays put, verbatim
            out.extend(tail);
        }
    }
    Ok(i)
}

/// Sort and emit a block's statements, one blank line between categories.
fn render_block(mut stmts: Vec<Statement>, out: &mut Vec<String>) {
    stmts.sort_by(|a, b| {
        (a.category, a.module.to_ascii_lowercase(), a.is_from).cmp(&(
            b.category,
            b.module.to_ascii_lowercase(),
            b.is_from,
        ))
    });

    let mut seen: HashSet<String> = HashSet::new();
    let mut last_category = None;
    for stmt in stmts {
        if !seen.insert(stmt.normalized.clone()) {
            continue;
        }
        if last_category.is_some() && last_category != Some(stmt.category) {
            out.push(String::new());
        }
        last_category = Some(stmt.category);
        out.extend(stmt.comments);
        out.extend(stmt.lines);
    }
}

/// A column-zero `import` or `from` keyword opens a statement.
fn is_import_start(line: &str) -> bool {
    keyword_at_start(line, "import") || keyword_at_start(line, "from")
}

fn keyword_at_start(line: &str, keyword: &str) -> bool {
    line.strip_prefix(keyword).is_some_and(|rest| {
        rest.chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric() && c != '_')
    })
}

/// A whole-line comment that may travel with an import. Directive lines stay
/// where they are written.
fn is_attachable_comment(line: &str, scan: &LineScan) -> bool {
    !scan.started_in_string
        && scan.comment == Some(line.len() - line.trim_start().len())
        && !is_directive_line(line)
}

/// Join the physical lines of one statement (parenthesized or
/// backslash-continued), validate it, and build its sort metadata.
fn parse_statement(
    lines: &[&str],
    scans: &[LineScan],
    start: usize,
    options: &SortOptions,
) -> Result<(Statement, usize), SyntaxError> {
    let mut physical: Vec<String> = Vec::new();
    let mut norm_parts: Vec<String> = Vec::new();
    let mut paren_stack: Vec<(usize, usize)> = Vec::new();
    let mut pinned = false;
    let mut j = start;

    loop {
        if j >= lines.len() {
            if let Some(&(line, column)) = paren_stack.first() {
                return Err(SyntaxError::new(
                    "unclosed '(' in import statement",
                    line,
                    column,
                    lines[line - 1],
                ));
            }
            return Err(SyntaxError::new(
                "unexpected end of file after line continuation",
                j,
                lines[j - 1].len() + 1,
                lines[j - 1],
            ));
        }

        let line = lines[j];
        let scan = &scans[j];
        physical.push(line.to_string());

        if let Some(pos) = scan.comment {
            if is_skip_marker(&line[pos..]) {
                pinned = true;
            }
        }

        // Track parens over code bytes only
        for (idx, &is_code) in scan.code.iter().enumerate() {
            if !is_code {
                continue;
            }
            match line.as_bytes()[idx] {
                b'(' => paren_stack.push((j + 1, idx + 1)),
                b')' => {
                    paren_stack.pop();
                }
                _ => {}
            }
        }

        let code_text = scan.code_text(line);
        let trimmed = code_text.trim_end();
        let continued = scan.comment.is_none()
            && trimmed.ends_with('\\')
            && scan.code.get(trimmed.len() - 1).copied().unwrap_or(false);
        norm_parts.push(if continued {
            trimmed[..trimmed.len() - 1].to_string()
        } else {
            code_text.to_string()
        });

        j += 1;
        if paren_stack.is_empty() && !continued {
            break;
        }
    }

    let normalized = norm_parts
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let first_raw = lines[start];
    let (module, is_from) = analyze_statement(&normalized, start + 1, first_raw)?;
    let category = classify(&module, &options.first_party);

    Ok((
        Statement {
            comments: Vec::new(),
            lines: physical,
            module,
            category,
            is_from,
            normalized,
            pinned,
        },
        j,
    ))
}

/// Validate a joined statement and extract `(module, is_from)`.
fn analyze_statement(
    normalized: &str,
    line_no: usize,
    raw_line: &str,
) -> Result<(String, bool), SyntaxError> {
    let end_column = raw_line.trim_end().len() + 1;

    if let Some(rest) = normalized.strip_prefix("import") {
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(SyntaxError::new(
                "expected module name after 'import'",
                line_no,
                end_column,
                raw_line,
            ));
        }
        let mut first_module = None;
        for piece in rest.split(',') {
            let piece = piece.trim();
            if piece.is_empty() || !NAME_RE.is_match(piece) {
                return Err(SyntaxError::new(
                    format!("invalid module name {piece:?} in import"),
                    line_no,
                    column_of(raw_line, piece),
                    raw_line,
                ));
            }
            if first_module.is_none() {
                let module = piece.split(" as ").next().unwrap_or(piece);
                first_module = Some(module.to_string());
            }
        }
        return Ok((first_module.unwrap_or_default(), false));
    }

    // from-import
    let rest = normalized
        .strip_prefix("from")
        .unwrap_or(normalized)
        .trim_start();
    let module_token = rest.split_whitespace().next().unwrap_or("");
    if module_token.is_empty() || module_token == "import" {
        return Err(SyntaxError::new(
            "expected module name after 'from'",
            line_no,
            column_of(raw_line, "from") + 5,
            raw_line,
        ));
    }
    if !FROM_MODULE_RE.is_match(module_token) {
        return Err(SyntaxError::new(
            format!("invalid module name {module_token:?} after 'from'"),
            line_no,
            column_of(raw_line, module_token),
            raw_line,
        ));
    }
    let after_module = rest[module_token.len()..].trim_start();
    let targets = match after_module.strip_prefix("import") {
        // The keyword must stand alone (space, paren, or end after it)
        Some(targets)
            if targets.is_empty() || targets.starts_with(' ') || targets.starts_with('(') =>
        {
            targets
        }
        _ => {
            return Err(SyntaxError::new(
                "expected 'import' in from-import",
                line_no,
                end_column,
                raw_line,
            ));
        }
    };
    let mut targets = targets.trim();
    let parenthesized = targets.starts_with('(');
    if parenthesized && targets.ends_with(')') {
        targets = targets[1..targets.len() - 1].trim();
    }
    if targets.is_empty() {
        return Err(SyntaxError::new(
            "expected import targets after 'import'",
            line_no,
            end_column,
            raw_line,
        ));
    }
    let pieces: Vec<&str> = targets.split(',').map(str::trim).collect();
    for (idx, piece) in pieces.iter().enumerate() {
        if piece.is_empty() {
            // A trailing comma is allowed inside parentheses
            if parenthesized && idx == pieces.len() - 1 {
                continue;
            }
            return Err(SyntaxError::new(
                "expected name after ',' in import targets",
                line_no,
                end_column,
                raw_line,
            ));
        }
        if !TARGET_RE.is_match(piece) {
            return Err(SyntaxError::new(
                format!("invalid import target {piece:?}"),
                line_no,
                column_of(raw_line, piece),
                raw_line,
            ));
        }
    }
    Ok((module_token.to_string(), true))
}

/// 1-based column of `needle` in `line`, or 1 when the statement spans lines
/// and the token is not on the first one.
fn column_of(line: &str, needle: &str) -> usize {
    line.find(needle).map_or(1, |pos| pos + 1)
}
