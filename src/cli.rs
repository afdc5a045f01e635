//! Command-line interface for pytidy.
//!
//! Defines CLI arguments using clap builder API

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

/// Which subcommand was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Report files that would change; write nothing
    Check,
    /// Like check, but also print unified diffs
    Diff,
    /// Rewrite changed files in place
    Format,
}

impl Mode {
    #[must_use]
    pub fn dry_run(self) -> bool {
        !matches!(self, Mode::Format)
    }

    #[must_use]
    pub fn want_diff(self) -> bool {
        matches!(self, Mode::Diff)
    }
}

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Subcommand selecting the processing mode
    pub mode: Mode,

    /// Files or directories to format; `-` selects standard input
    pub inputs: Vec<PathBuf>,

    /// Suppress narration (never error diagnostics or diffs)
    pub quiet: bool,

    /// Number of parallel jobs (0 = auto)
    pub jobs: Option<usize>,

    /// Config file path
    pub config: Option<PathBuf>,

    /// Exclude patterns for files/directories (glob patterns)
    pub exclude: Vec<String>,

    /// Spaces per leading tab
    pub indent: Option<usize>,

    /// Longest blank-line run to keep
    pub max_blank_lines: Option<usize>,

    /// Additional first-party module names
    pub first_party: Vec<String>,

    /// Enable debug output
    pub debug: bool,
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("pytidy")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Import-sorting and layout-normalizing formatter for Python source")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress narration; errors and diffs are still printed")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Parallel jobs (0 = one per processing unit)")
                .value_name("NUM")
                .global(true)
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Config file path (overrides auto-discovery)")
                .value_name("FILE")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .help("Exclude files/dirs matching pattern (repeatable)")
                .value_name("PATTERN")
                .global(true)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("indent")
                .short('i')
                .long("indent")
                .help("Spaces per leading tab [default: 4]")
                .value_name("NUM")
                .global(true)
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("max-blank-lines")
                .long("max-blank-lines")
                .help("Longest run of blank lines to keep [default: 2]")
                .value_name("NUM")
                .global(true)
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("first-party")
                .short('p')
                .long("first-party")
                .help("Treat module as first-party when sorting imports (repeatable)")
                .value_name("MODULE")
                .global(true)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("debug")
                .short('D')
                .long("debug")
                .help("Enable debug output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("check")
                .about("Check which files would be reformatted; writes nothing")
                .arg(paths_arg()),
        )
        .subcommand(
            Command::new("diff")
                .about("Show unified diffs of needed changes; writes nothing")
                .arg(paths_arg()),
        )
        .subcommand(
            Command::new("format")
                .about("Reformat files in place")
                .arg(paths_arg()),
        )
}

fn paths_arg() -> Arg {
    Arg::new("paths")
        .help("Files or directories to process, or - for stdin")
        .value_name("PATH")
        .num_args(0..)
        .value_parser(clap::value_parser!(PathBuf))
}

/// Parse arguments from the process environment
#[must_use]
pub fn parse_args() -> CliArgs {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an explicit iterator (used by tests)
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_cli().get_matches_from(args);
    let (name, sub) = matches
        .subcommand()
        .expect("clap enforces subcommand_required");
    let mode = match name {
        "check" => Mode::Check,
        "diff" => Mode::Diff,
        _ => Mode::Format,
    };

    // Global flags propagate into the subcommand's matches regardless of
    // where they were written on the command line
    CliArgs {
        mode,
        inputs: sub
            .get_many::<PathBuf>("paths")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        quiet: sub.get_flag("quiet"),
        jobs: sub.get_one::<usize>("jobs").copied(),
        config: sub.get_one::<PathBuf>("config").cloned(),
        exclude: sub
            .get_many::<String>("exclude")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        indent: sub.get_one::<usize>("indent").copied(),
        max_blank_lines: sub.get_one::<usize>("max-blank-lines").copied(),
        first_party: sub
            .get_many::<String>("first-party")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        debug: sub.get_flag("debug"),
    }
}
