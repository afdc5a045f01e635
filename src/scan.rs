//! String-aware line scanning.
//!
//! Both transform stages are line-oriented, but neither may fire inside a
//! string literal: an `import` spelled inside a docstring is not an import,
//! and trailing whitespace inside a triple-quoted string is content. The
//! [`StringTracker`] walks a file one line at a time, carrying open-string
//! state across lines, and reports for every byte whether it is code,
//! string content, or comment.

/// A string literal that was opened and (for triple quotes) may still be open
/// at the end of the current line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenString {
    /// 1-based line where the opening quote appeared
    pub line: usize,
    /// 1-based column of the opening quote
    pub column: usize,
    /// Quote byte, `'` or `"`
    pub quote: u8,
    pub triple: bool,
    /// Raw string literal (`r"..."`), backslashes do not escape
    pub raw: bool,
}

/// Per-line classification produced by [`StringTracker::scan_line`].
#[derive(Debug)]
pub struct LineScan {
    /// `code[i]` is true iff byte `i` lies outside every string and comment
    pub code: Vec<bool>,
    /// Byte offset of a `#` starting a comment on this line, if any
    pub comment: Option<usize>,
    /// The line began inside a multi-line string
    pub started_in_string: bool,
    /// A triple-quoted string is still open after this line
    pub ends_in_string: bool,
}

impl LineScan {
    /// The code portion of the line with the comment removed.
    #[must_use]
    pub fn code_text<'a>(&self, line: &'a str) -> &'a str {
        match self.comment {
            Some(pos) => &line[..pos],
            None => line,
        }
    }
}

/// Tracks string-literal state across the lines of one file.
#[derive(Debug, Default)]
pub struct StringTracker {
    open: Option<OpenString>,
    line_no: usize,
}

impl StringTracker {
    #[must_use]
    pub fn new() -> Self {
        StringTracker::default()
    }

    /// The string still open after the last scanned line, if any.
    #[must_use]
    pub fn open(&self) -> Option<&OpenString> {
        self.open.as_ref()
    }

    /// Scan the next line of the file. Lines must be fed in order, without
    /// their terminators.
    pub fn scan_line(&mut self, line: &str) -> LineScan {
        self.line_no += 1;
        let bytes = line.as_bytes();
        let mut code = vec![false; bytes.len()];
        let mut comment = None;
        let started_in_string = self.open.is_some();

        let mut i = 0;
        while i < bytes.len() {
            if let Some(open) = &self.open {
                let b = bytes[i];
                if !open.raw && b == b'\\' {
                    i += 2;
                } else if b == open.quote {
                    if open.triple {
                        if bytes.get(i + 1) == Some(&b) && bytes.get(i + 2) == Some(&b) {
                            self.open = None;
                            i += 3;
                        } else {
                            i += 1;
                        }
                    } else {
                        self.open = None;
                        i += 1;
                    }
                } else {
                    i += 1;
                }
            } else {
                let b = bytes[i];
                if b == b'#' {
                    comment = Some(i);
                    break;
                }
                if b == b'\'' || b == b'"' {
                    let triple = bytes.get(i + 1) == Some(&b) && bytes.get(i + 2) == Some(&b);
                    self.open = Some(OpenString {
                        line: self.line_no,
                        column: i + 1,
                        quote: b,
                        triple,
                        raw: has_raw_prefix(bytes, i),
                    });
                    i += if triple { 3 } else { 1 };
                } else {
                    code[i] = true;
                    i += 1;
                }
            }
        }

        // A single-quoted string cannot span a physical line; treat the line
        // terminator as closing it rather than poisoning the rest of the file.
        if let Some(open) = &self.open {
            if !open.triple {
                self.open = None;
            }
        }

        LineScan {
            code,
            comment,
            started_in_string,
            ends_in_string: self.open.is_some(),
        }
    }
}

/// Check for an `r`/`R` in the literal prefix immediately before a quote
/// (`r"..."`, `rb'...'`, `Rf"..."`).
fn has_raw_prefix(bytes: &[u8], quote_pos: usize) -> bool {
    let mut j = quote_pos;
    let mut raw = false;
    while j > 0 && quote_pos - j < 3 && bytes[j - 1].is_ascii_alphabetic() {
        j -= 1;
        if bytes[j] == b'r' || bytes[j] == b'R' {
            raw = true;
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(source: &str) -> (StringTracker, Vec<LineScan>) {
        let mut tracker = StringTracker::new();
        let scans = source.lines().map(|l| tracker.scan_line(l)).collect();
        (tracker, scans)
    }

    #[test]
    fn test_plain_code_is_code() {
        let (tracker, scans) = scan_all("x = 1 + 2");
        assert!(tracker.open().is_none());
        assert!(scans[0].code.iter().all(|&c| c));
        assert_eq!(scans[0].comment, None);
    }

    #[test]
    fn test_comment_detected() {
        let (_, scans) = scan_all("x = 1  # note");
        assert_eq!(scans[0].comment, Some(7));
        assert!(scans[0].code[0]);
        assert!(!scans[0].code[7..].iter().any(|&c| c));
    }

    #[test]
    fn test_hash_inside_string_is_not_comment() {
        let (_, scans) = scan_all("x = '#nope'  # yes");
        assert_eq!(scans[0].comment, Some(13));
    }

    #[test]
    fn test_triple_string_spans_lines() {
        let (tracker, scans) = scan_all("s = \"\"\"start\nimport os\nend\"\"\"\ny = 2");
        assert!(tracker.open().is_none());
        assert!(!scans[1].code.iter().any(|&c| c));
        assert!(scans[1].started_in_string);
        assert!(scans[3].code.iter().any(|&c| c));
    }

    #[test]
    fn test_unterminated_triple_reported_open() {
        let (tracker, _) = scan_all("s = '''open\nstill inside");
        let open = tracker.open().expect("string should remain open");
        assert_eq!((open.line, open.column), (1, 5));
        assert!(open.triple);
    }

    #[test]
    fn test_escaped_quote_does_not_close() {
        let (tracker, scans) = scan_all(r#"s = "a\"b"  # c"#);
        assert!(tracker.open().is_none());
        assert_eq!(scans[0].comment, Some(12));
    }

    #[test]
    fn test_raw_string_backslash_does_not_escape() {
        // In r"a\" the backslash is literal and the quote closes the string
        let (tracker, scans) = scan_all(r#"s = r"a\" + t"#);
        assert!(tracker.open().is_none());
        // "+ t" after the string is code again
        assert!(scans[0].code[10]);
    }

    #[test]
    fn test_single_quote_closed_at_line_end() {
        let (tracker, _) = scan_all("s = 'oops\nx = 1");
        assert!(tracker.open().is_none());
    }

    #[test]
    fn test_code_text_strips_comment() {
        let mut tracker = StringTracker::new();
        let line = "from x import y  # tail";
        let scan = tracker.scan_line(line);
        assert_eq!(scan.code_text(line), "from x import y  ");
    }
}
