//! Path resolution.
//!
//! Turns the user's path arguments into the ordered, deduplicated list of
//! sources the engine visits. Directories are walked recursively; explicitly
//! named files are always visited (a missing one surfaces as a per-file read
//! error rather than vanishing silently). A literal `-` selects standard
//! input; only the first occurrence counts.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use crate::report::FileSource;

/// Python file extensions picked up from directory walks
const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi"];

/// Directory walks deeper than this are assumed to be pathological
const MAX_WALK_DEPTH: usize = 256;

/// Resolve user inputs to concrete sources, in input order, deduplicated.
#[must_use]
pub fn resolve_sources(inputs: &[PathBuf], exclude: &[String]) -> Vec<FileSource> {
    // Compile exclude patterns, ignoring invalid ones
    let exclude_patterns: Vec<Pattern> = exclude
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect();

    let mut seen: HashSet<FileSource> = HashSet::new();
    let mut sources: Vec<FileSource> = Vec::new();

    for input in inputs {
        if input.as_os_str() == "-" {
            push_unique(FileSource::Stdin, &mut seen, &mut sources);
        } else if input.is_dir() {
            // Note: WalkDir detects symlink loops when follow_links(true) and
            // returns errors for them. We skip errors via filter_map(ok).
            // Sorting makes the visit order reproducible across platforms.
            for entry in WalkDir::new(input)
                .follow_links(true)
                .max_depth(MAX_WALK_DEPTH)
                .sort_by_file_name()
                .into_iter()
                .filter_map(std::result::Result::ok)
            {
                let path = entry.path();
                if path.is_file()
                    && is_python_file(path)
                    && !is_excluded(path, &exclude_patterns)
                {
                    push_unique(
                        FileSource::OnDisk(path.to_path_buf()),
                        &mut seen,
                        &mut sources,
                    );
                }
            }
        } else {
            // Explicitly named file, present or not
            if !is_excluded(input, &exclude_patterns) {
                push_unique(FileSource::OnDisk(input.clone()), &mut seen, &mut sources);
            }
        }
    }

    sources
}

fn push_unique(source: FileSource, seen: &mut HashSet<FileSource>, out: &mut Vec<FileSource>) {
    if seen.insert(source.clone()) {
        out.push(source);
    }
}

/// Check if a file has a Python extension
fn is_python_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PYTHON_EXTENSIONS.contains(&ext))
}

/// Check if a path matches any exclusion pattern
fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let path_str = path.to_string_lossy();

    for pattern in patterns {
        // Match against full path
        if pattern.matches(&path_str) {
            return true;
        }

        // Match against file name only
        if let Some(file_name) = path.file_name() {
            if pattern.matches(&file_name.to_string_lossy()) {
                return true;
            }
        }

        // Match against each path component (for directory patterns)
        for component in path.components() {
            if let std::path::Component::Normal(c) = component {
                if pattern.matches(&c.to_string_lossy()) {
                    return true;
                }
            }
        }
    }

    false
}
