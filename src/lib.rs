//! pytidy - Import-sorting and layout-normalizing formatter for Python source
//!
//! A deterministic, idempotent reformatter with parallel file processing.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod diff;
pub mod directive;
pub mod error;
pub mod layout;
pub mod process;
pub mod report;
pub mod scan;
pub mod sort;
pub mod walk;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs, Mode};
pub use config::Config;
pub use directive::{find_directive, parse_directive, DirectiveOverrides};
pub use error::{PipelineError, Result, SyntaxError};
pub use layout::{LayoutFormatter, LayoutOptions};
pub use process::{Engine, FilePipeline, ProcessOptions, Stage};
pub use report::{
    echo_reports, ExecutionRequest, FileReport, FileSource, Outcome, ReportSummary,
};
pub use sort::{ImportSorter, SortOptions};
pub use walk::resolve_sources;
