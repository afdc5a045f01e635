//! Per-file reports and result rendering.
//!
//! A [`FileReport`] is the immutable outcome record for one processed file,
//! built exactly once by the pipeline and consumed by [`echo_reports`]. The
//! [`Outcome`] enum enforces that a report is in exactly one terminal state:
//! formatted (changed or not), skipped, or failed.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::error::PipelineError;

/// Label used for standard input in diagnostics and diff headers
pub const STDIN_LABEL: &str = "<stdin>";

/// Where a file's content comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileSource {
    OnDisk(PathBuf),
    Stdin,
}

impl fmt::Display for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::OnDisk(path) => write!(f, "{}", path.display()),
            FileSource::Stdin => f.write_str(STDIN_LABEL),
        }
    }
}

/// Terminal state of one file's run through the pipeline.
#[derive(Debug)]
pub enum Outcome {
    Formatted {
        /// Output differs byte-for-byte from the original
        changed: bool,
        /// New content was durably persisted to the path (always false for
        /// stdin and in dry-run mode)
        written: bool,
        /// Unified diff, present only when requested and changed
        diff: Option<String>,
    },
    Skipped {
        reason: String,
    },
    Failed {
        error: PipelineError,
    },
}

/// The outcome record for one file.
#[derive(Debug)]
pub struct FileReport {
    pub source: FileSource,
    pub outcome: Outcome,
}

impl FileReport {
    #[must_use]
    pub fn formatted(source: FileSource, changed: bool, written: bool, diff: Option<String>) -> Self {
        FileReport {
            source,
            outcome: Outcome::Formatted {
                changed,
                written,
                diff,
            },
        }
    }

    #[must_use]
    pub fn skipped(source: FileSource, reason: impl Into<String>) -> Self {
        FileReport {
            source,
            outcome: Outcome::Skipped {
                reason: reason.into(),
            },
        }
    }

    #[must_use]
    pub fn failed(source: FileSource, error: PipelineError) -> Self {
        FileReport {
            source,
            outcome: Outcome::Failed { error },
        }
    }

    #[must_use]
    pub fn changed(&self) -> bool {
        matches!(self.outcome, Outcome::Formatted { changed: true, .. })
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }
}

/// The ordered list of inputs plus mode flags for one invocation.
#[derive(Debug)]
pub struct ExecutionRequest {
    /// Resolved sources, in the order results must be reported
    pub sources: Vec<FileSource>,
    /// Never write, regardless of changes
    pub dry_run: bool,
    /// Compute unified diffs for changed files
    pub want_diff: bool,
    /// Content for the stdin source, when one is present
    pub stdin: Option<String>,
}

/// Aggregate flags the exit code is computed from.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportSummary {
    pub any_changed: bool,
    pub any_error: bool,
}

/// Render the ordered reports.
///
/// Narration ("Would format", "Formatted", "Skipped") goes to `err` and is
/// suppressed by `quiet`; error diagnostics also go to `err` but are never
/// suppressed; diffs go to `out` and are never suppressed.
pub fn echo_reports<W: Write, E: Write>(
    reports: &[FileReport],
    dry_run: bool,
    quiet: bool,
    out: &mut W,
    err: &mut E,
) -> io::Result<ReportSummary> {
    let mut summary = ReportSummary::default();
    for report in reports {
        match &report.outcome {
            Outcome::Formatted {
                changed: true,
                diff,
                ..
            } => {
                summary.any_changed = true;
                if !quiet {
                    if dry_run {
                        writeln!(err, "Would format {}", report.source)?;
                    } else {
                        writeln!(err, "Formatted {}", report.source)?;
                    }
                }
                if let Some(diff) = diff {
                    write!(out, "{diff}")?;
                }
            }
            Outcome::Formatted { changed: false, .. } => {}
            Outcome::Skipped { reason } => {
                if !quiet {
                    writeln!(err, "Skipped {}: {}", report.source, reason)?;
                }
            }
            Outcome::Failed { error } => {
                summary.any_error = true;
                writeln!(err, "Error formatting {}: {}", report.source, error)?;
            }
        }
    }
    Ok(summary)
}
