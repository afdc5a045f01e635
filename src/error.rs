//! Error types and result aliases for pytidy.
//!
//! Two failure channels exist:
//! - [`Result<T>`]: alias for `anyhow::Result<T>`, used for fatal conditions
//!   (invalid configuration, worker-pool construction) that abort the whole
//!   invocation before any file is touched.
//! - [`PipelineError`]: structured per-file failures. These are captured into
//!   the file's report and never abort processing of other files.

use anyhow::Result as AnyhowResult;
use thiserror::Error;

pub type Result<T> = AnyhowResult<T>;

/// A parse failure from one of the transform stages.
///
/// Line and column are 1-based. `source_line` is the offending physical line,
/// kept so a diagnostic can quote it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub source_line: String,
}

impl SyntaxError {
    pub fn new(
        message: impl Into<String>,
        line: usize,
        column: usize,
        source_line: impl Into<String>,
    ) -> Self {
        SyntaxError {
            message: message.into(),
            line,
            column,
            source_line: source_line.into(),
        }
    }
}

/// Per-file failure taxonomy.
///
/// `Syntax` comes from a transform stage, `Io` from reading the file or from
/// the atomic replace, `Internal` from a panic caught inside a worker.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Wrap an I/O error with a short action description ("reading", "writing").
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        PipelineError::Io {
            context: context.into(),
            source,
        }
    }

    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(self, PipelineError::Syntax(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = SyntaxError::new("unexpected token", 4, 15, "foo bar fizzbuzz");
        assert_eq!(err.to_string(), "unexpected token at line 4, column 15");
    }

    #[test]
    fn test_pipeline_error_from_syntax() {
        let err: PipelineError = SyntaxError::new("bad", 1, 1, "bad").into();
        assert!(err.is_syntax());
        assert_eq!(err.to_string(), "bad at line 1, column 1");
    }

    #[test]
    fn test_io_error_display() {
        let err = PipelineError::io(
            "writing a.py",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_syntax());
        assert_eq!(err.to_string(), "writing a.py: denied");
    }
}
