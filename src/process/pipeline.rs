//! The per-file formatting pipeline.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::diff;
use crate::directive::find_directive;
use crate::error::{PipelineError, SyntaxError};
use crate::layout::LayoutFormatter;
use crate::report::{FileReport, FileSource, STDIN_LABEL};
use crate::sort::ImportSorter;

/// A transform stage: pure text to text, or a structured parse failure.
///
/// Implemented by the two built-in stages and by any `Fn(&str)` closure,
/// which is how tests substitute stages without touching global state.
pub trait Stage: Sync {
    fn apply(&self, source: &str) -> Result<String, SyntaxError>;
}

impl Stage for ImportSorter {
    fn apply(&self, source: &str) -> Result<String, SyntaxError> {
        ImportSorter::apply(self, source)
    }
}

impl Stage for LayoutFormatter {
    fn apply(&self, source: &str) -> Result<String, SyntaxError> {
        LayoutFormatter::apply(self, source)
    }
}

impl<F> Stage for F
where
    F: Fn(&str) -> Result<String, SyntaxError> + Sync,
{
    fn apply(&self, source: &str) -> Result<String, SyntaxError> {
        self(source)
    }
}

/// Mode flags for one invocation, shared by every file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    /// Compute everything, write nothing
    pub dry_run: bool,
    /// Attach a unified diff to changed files
    pub want_diff: bool,
}

/// Applies stage A then stage B to one file and packages the outcome.
#[derive(Debug)]
pub struct FilePipeline<A, B> {
    imports: A,
    layout: B,
}

impl<A: Stage, B: Stage> FilePipeline<A, B> {
    pub fn new(imports: A, layout: B) -> Self {
        FilePipeline { imports, layout }
    }

    /// Stage A then stage B. Stage B never runs when stage A fails.
    fn transform(&self, original: &str) -> Result<String, SyntaxError> {
        let sorted = self.imports.apply(original)?;
        self.layout.apply(&sorted)
    }

    /// Read a file from disk and process it.
    pub fn process_path(&self, path: &Path, options: &ProcessOptions) -> FileReport {
        let source = FileSource::OnDisk(path.to_path_buf());
        match fs::read_to_string(path) {
            Ok(original) => self.process_content(source, &original, options),
            Err(e) => FileReport::failed(
                source,
                PipelineError::io(format!("reading {}", path.display()), e),
            ),
        }
    }

    /// Process already-read content for an on-disk source. Writes back
    /// atomically when the content changed and dry-run is off.
    pub fn process_content(
        &self,
        source: FileSource,
        original: &str,
        options: &ProcessOptions,
    ) -> FileReport {
        if let Some(reason) = skip_reason(original) {
            return FileReport::skipped(source, reason);
        }

        let formatted = match self.transform(original) {
            Ok(formatted) => formatted,
            Err(e) => return FileReport::failed(source, e.into()),
        };

        let changed = formatted != original;
        let mut written = false;
        if changed && !options.dry_run {
            if let FileSource::OnDisk(path) = &source {
                if let Err(e) = write_atomic(path, &formatted) {
                    let context = format!("writing {}", path.display());
                    return FileReport::failed(source, PipelineError::io(context, e));
                }
                written = true;
            }
        }

        let diff = (options.want_diff && changed)
            .then(|| diff::unified(original, &formatted, &source.to_string()));
        FileReport::formatted(source, changed, written, diff)
    }

    /// Process standard input. The result is never written to a file; the
    /// new content (changed or not) is echoed to `out` exactly once, unless
    /// in dry-run mode.
    pub fn process_stdin<W: Write>(
        &self,
        original: &str,
        options: &ProcessOptions,
        out: &mut W,
    ) -> FileReport {
        let source = FileSource::Stdin;
        if let Some(reason) = skip_reason(original) {
            // Keep the pipe intact: pass the input through untouched
            if !options.dry_run {
                if let Err(e) = out.write_all(original.as_bytes()) {
                    return FileReport::failed(
                        source,
                        PipelineError::io("writing to standard output", e),
                    );
                }
            }
            return FileReport::skipped(source, reason);
        }

        let formatted = match self.transform(original) {
            Ok(formatted) => formatted,
            Err(e) => return FileReport::failed(source, e.into()),
        };

        if !options.dry_run {
            if let Err(e) = out.write_all(formatted.as_bytes()) {
                return FileReport::failed(
                    source,
                    PipelineError::io("writing to standard output", e),
                );
            }
        }

        let changed = formatted != original;
        let diff = (options.want_diff && changed)
            .then(|| diff::unified(original, &formatted, STDIN_LABEL));
        FileReport::formatted(source, changed, false, diff)
    }
}

/// Skip policy, checked before any parse attempt.
fn skip_reason(source: &str) -> Option<String> {
    find_directive(source)
        .and_then(|overrides| overrides.skip_file.then(|| "skip-file directive".to_string()))
}

/// Replace `path` with `contents` via write-to-temp-then-rename, so the file
/// is never observable in a partially written state. The temporary file
/// lives in the target's directory to keep the rename on one filesystem.
fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    #[cfg(unix)]
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), metadata.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_stage(f: impl Fn(&str) -> String + Sync) -> impl Stage {
        move |source: &str| -> Result<String, SyntaxError> { Ok(f(source)) }
    }

    fn identity() -> impl Stage {
        ok_stage(str::to_string)
    }

    fn failing(message: &'static str) -> impl Stage {
        move |source: &str| -> Result<String, SyntaxError> {
            Err(SyntaxError::new(
                message,
                1,
                1,
                source.lines().next().unwrap_or(""),
            ))
        }
    }

    fn options(dry_run: bool, want_diff: bool) -> ProcessOptions {
        ProcessOptions { dry_run, want_diff }
    }

    #[test]
    fn test_unchanged_content() {
        let pipeline = FilePipeline::new(identity(), identity());
        let report = pipeline.process_content(
            FileSource::OnDisk("a.py".into()),
            "x = 1\n",
            &options(true, false),
        );
        assert!(!report.changed());
        assert!(!report.is_error());
    }

    #[test]
    fn test_stages_run_in_order() {
        let pipeline = FilePipeline::new(
            ok_stage(|s| format!("{s}a")),
            ok_stage(|s| format!("{s}b")),
        );
        let mut out = Vec::new();
        let report = pipeline.process_stdin("x", &options(false, false), &mut out);
        assert!(report.changed());
        assert_eq!(String::from_utf8(out).unwrap(), "xab");
    }

    #[test]
    fn test_stage_a_failure_skips_stage_b() {
        use std::sync::atomic::{AtomicBool, Ordering};
        let ran_b = AtomicBool::new(false);
        let pipeline = FilePipeline::new(
            failing("stage a failed"),
            |source: &str| -> Result<String, SyntaxError> {
                ran_b.store(true, Ordering::SeqCst);
                Ok(source.to_string())
            },
        );
        let report = pipeline.process_content(
            FileSource::OnDisk("a.py".into()),
            "x = 1\n",
            &options(true, false),
        );
        assert!(report.is_error());
        assert!(!ran_b.load(Ordering::SeqCst));
    }

    #[test]
    fn test_skip_marker_beats_syntax_error() {
        // Skip detection happens before any parse attempt
        let pipeline = FilePipeline::new(failing("should never run"), identity());
        let report = pipeline.process_content(
            FileSource::OnDisk("a.py".into()),
            "# pytidy: skip-file\nthis would not parse\n",
            &options(false, false),
        );
        match report.outcome {
            crate::report::Outcome::Skipped { ref reason } => {
                assert_eq!(reason, "skip-file directive");
            }
            ref other => panic!("expected skip, got {other:?}"),
        }
    }

    #[test]
    fn test_stdin_dry_run_echoes_nothing() {
        let pipeline = FilePipeline::new(identity(), ok_stage(|s| format!("{s}!")));
        let mut out = Vec::new();
        let report = pipeline.process_stdin("x", &options(true, false), &mut out);
        assert!(report.changed());
        assert!(out.is_empty());
    }

    #[test]
    fn test_stdin_unchanged_still_echoes() {
        let pipeline = FilePipeline::new(identity(), identity());
        let mut out = Vec::new();
        let report = pipeline.process_stdin("x = 1\n", &options(false, false), &mut out);
        assert!(!report.changed());
        assert_eq!(String::from_utf8(out).unwrap(), "x = 1\n");
    }

    #[test]
    fn test_stdin_diff_uses_stdin_label() {
        let pipeline = FilePipeline::new(identity(), ok_stage(|s| s.replace('1', "2")));
        let mut out = Vec::new();
        let report = pipeline.process_stdin("x = 1\n", &options(true, true), &mut out);
        match report.outcome {
            crate::report::Outcome::Formatted { diff: Some(diff), .. } => {
                assert!(diff.starts_with("--- <stdin>\n+++ <stdin>\n"));
            }
            ref other => panic!("expected diff, got {other:?}"),
        }
    }

    #[test]
    fn test_read_failure_is_io_error_report() {
        let pipeline = FilePipeline::new(identity(), identity());
        let report = pipeline.process_path(
            Path::new("definitely/not/here.py"),
            &options(true, false),
        );
        assert!(report.is_error());
        match report.outcome {
            crate::report::Outcome::Failed { ref error } => {
                assert!(error.to_string().starts_with("reading "));
            }
            ref other => panic!("expected failure, got {other:?}"),
        }
    }
}
