//! pytidy - Python import sorter and layout formatter

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use pytidy::{
    echo_reports, parse_args, resolve_sources, CliArgs, Config, Engine, ExecutionRequest,
    FilePipeline, FileSource, ImportSorter, LayoutFormatter, LayoutOptions, Result, SortOptions,
};

fn main() -> ExitCode {
    let args = parse_args();
    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<ExitCode> {
    let config = build_config(args)?;

    let inputs: Vec<PathBuf> = if args.inputs.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.inputs.clone()
    };
    let sources = resolve_sources(&inputs, &config.exclude);

    if sources.is_empty() {
        eprintln!("No files found");
        return Ok(ExitCode::FAILURE);
    }

    // Standard input is read up front, on the main thread
    let stdin = if sources.contains(&FileSource::Stdin) {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        Some(content)
    } else {
        None
    };

    let sorter = ImportSorter::new(SortOptions {
        first_party: config.first_party.clone(),
    });
    let formatter = LayoutFormatter::new(LayoutOptions {
        indent: config.indent,
        max_blank_lines: config.max_blank_lines,
    });
    let engine = Engine::new(
        FilePipeline::new(sorter, formatter),
        args.jobs.unwrap_or(0),
    );

    let request = ExecutionRequest {
        sources,
        dry_run: args.mode.dry_run(),
        want_diff: args.mode.want_diff(),
        stdin,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let reports = engine.run(&request, &mut out)?;

    let summary = echo_reports(
        &reports,
        request.dry_run,
        args.quiet,
        &mut out,
        &mut io::stderr().lock(),
    )?;
    out.flush()?;

    // format succeeds when files changed; check and diff do not
    let failed = summary.any_error || (request.dry_run && summary.any_changed);
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Build configuration from CLI args and optional config file
fn build_config(args: &CliArgs) -> Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        // Explicit config file specified
        if args.debug {
            eprintln!(
                "[DEBUG] Using explicit config file: {}",
                config_path.display()
            );
        }
        Config::from_toml_file(config_path)?
    } else {
        // Auto-discover config files from the working directory upward
        let cwd = std::env::current_dir().unwrap_or_default();
        if args.debug {
            let discovered = Config::discover_config_files(&cwd);
            if discovered.is_empty() {
                eprintln!("[DEBUG] No config files discovered");
            } else {
                eprintln!("[DEBUG] Discovered config files:");
                for f in &discovered {
                    eprintln!("[DEBUG]   - {}", f.display());
                }
            }
        }
        Config::from_discovered_files(&cwd)
    };

    // Override with CLI arguments
    if let Some(indent) = args.indent {
        config.indent = indent;
    }
    if let Some(max) = args.max_blank_lines {
        config.max_blank_lines = max;
    }
    for module in &args.first_party {
        if !config.first_party.contains(module) {
            config.first_party.push(module.clone());
        }
    }
    for pattern in &args.exclude {
        if !config.exclude.contains(pattern) {
            config.exclude.push(pattern.clone());
        }
    }

    // Print final config in debug mode
    if args.debug {
        print_config_debug(&config);
    }

    // Validate configuration
    if let Some(error) = config.validate() {
        anyhow::bail!("Invalid configuration: {error}");
    }

    Ok(config)
}

/// Print configuration values in debug mode
fn print_config_debug(config: &Config) {
    eprintln!("[DEBUG] Configuration:");
    eprintln!("[DEBUG]   indent: {}", config.indent);
    eprintln!("[DEBUG]   max_blank_lines: {}", config.max_blank_lines);
    if !config.first_party.is_empty() {
        eprintln!("[DEBUG]   first_party: {:?}", config.first_party);
    }
    if !config.exclude.is_empty() {
        eprintln!("[DEBUG]   exclude: {:?}", config.exclude);
    }
}
