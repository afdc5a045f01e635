//! The multi-file execution engine.

use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use anyhow::Context;
use rayon::prelude::*;

use crate::error::PipelineError;
use crate::process::pipeline::{FilePipeline, ProcessOptions, Stage};
use crate::report::{ExecutionRequest, FileReport, FileSource};

/// Fans the file pipeline out over the resolved inputs.
///
/// The worker-pool size is an explicit constructor parameter and the pool is
/// built locally per run, never installed globally, so tests can force
/// single-threaded execution. Reports come back in input order regardless of
/// completion order, and any single file's failure (including a panic inside
/// a stage) is contained in that file's report.
#[derive(Debug)]
pub struct Engine<A, B> {
    pipeline: FilePipeline<A, B>,
    jobs: usize,
}

impl<A: Stage, B: Stage> Engine<A, B> {
    /// `jobs == 0` sizes the pool from available parallelism.
    pub fn new(pipeline: FilePipeline<A, B>, jobs: usize) -> Self {
        Engine { pipeline, jobs }
    }

    /// Process every source in the request and return one report per source,
    /// in the same order. Standard input is handled on the calling thread,
    /// outside the worker pool, with `stdout` receiving the echoed content.
    ///
    /// The only fatal error here is failing to construct the worker pool;
    /// everything per-file is captured in the reports.
    pub fn run<W: Write>(
        &self,
        request: &ExecutionRequest,
        stdout: &mut W,
    ) -> crate::Result<Vec<FileReport>> {
        if request.sources.is_empty() {
            return Ok(Vec::new());
        }

        let options = ProcessOptions {
            dry_run: request.dry_run,
            want_diff: request.want_diff,
        };

        let mut disk: Vec<(usize, &PathBuf)> = Vec::new();
        let mut stdin_index = None;
        let mut slots: Vec<Option<FileReport>> = Vec::new();
        for (index, source) in request.sources.iter().enumerate() {
            slots.push(None);
            match source {
                FileSource::OnDisk(path) => disk.push((index, path)),
                FileSource::Stdin if stdin_index.is_none() => stdin_index = Some(index),
                FileSource::Stdin => {
                    // Path resolution deduplicates the sentinel; be total anyway
                    slots[index] =
                        Some(FileReport::skipped(FileSource::Stdin, "duplicate stdin"));
                }
            }
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .context("failed to build worker pool")?;

        let processed: Vec<(usize, FileReport)> = pool.install(|| {
            disk.par_iter()
                .map(|&(index, path)| (index, self.process_one(path, &options)))
                .collect()
        });
        for (index, report) in processed {
            slots[index] = Some(report);
        }

        if let Some(index) = stdin_index {
            let content = request.stdin.as_deref().unwrap_or("");
            let report = panic::catch_unwind(AssertUnwindSafe(|| {
                self.pipeline.process_stdin(content, &options, stdout)
            }))
            .unwrap_or_else(|payload| {
                FileReport::failed(
                    FileSource::Stdin,
                    PipelineError::Internal(panic_message(&*payload)),
                )
            });
            slots[index] = Some(report);
        }

        Ok(slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    FileReport::failed(
                        request.sources[index].clone(),
                        PipelineError::Internal("report slot never filled".to_string()),
                    )
                })
            })
            .collect())
    }

    /// One worker's unit of work, with panic containment.
    fn process_one(&self, path: &PathBuf, options: &ProcessOptions) -> FileReport {
        panic::catch_unwind(AssertUnwindSafe(|| {
            self.pipeline.process_path(path, options)
        }))
        .unwrap_or_else(|payload| {
            FileReport::failed(
                FileSource::OnDisk(path.clone()),
                PipelineError::Internal(panic_message(&*payload)),
            )
        })
    }
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyntaxError;
    use std::fs;
    use std::path::Path;

    fn identity() -> impl Stage {
        |source: &str| -> Result<String, SyntaxError> { Ok(source.to_string()) }
    }

    fn request(sources: Vec<FileSource>, dry_run: bool) -> ExecutionRequest {
        ExecutionRequest {
            sources,
            dry_run,
            want_diff: false,
            stdin: None,
        }
    }

    fn write_files(dir: &Path, names: &[&str]) -> Vec<FileSource> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                fs::write(&path, format!("x = \"{name}\"\n")).unwrap();
                FileSource::OnDisk(path)
            })
            .collect()
    }

    #[test]
    fn test_empty_request_is_empty_outcome() {
        let engine = Engine::new(FilePipeline::new(identity(), identity()), 1);
        let reports = engine.run(&request(Vec::new(), true), &mut Vec::<u8>::new()).unwrap();
        assert!(reports.is_empty());
    }

    #[test]
    fn test_order_preserved_under_parallelism() {
        let dir = tempfile::tempdir().unwrap();
        let names: Vec<String> = (0..40).map(|i| format!("f{i:02}.py")).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let sources = write_files(dir.path(), &name_refs);

        let engine = Engine::new(FilePipeline::new(identity(), identity()), 4);
        let reports = engine
            .run(&request(sources.clone(), true), &mut Vec::<u8>::new())
            .unwrap();

        assert_eq!(reports.len(), sources.len());
        for (report, source) in reports.iter().zip(&sources) {
            assert_eq!(&report.source, source);
        }
    }

    #[test]
    fn test_fault_isolation() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_files(dir.path(), &["a.py", "bad.py", "c.py"]);

        let failing = |source: &str| -> Result<String, SyntaxError> {
            if source.contains("bad") {
                Err(SyntaxError::new("no good", 1, 1, source))
            } else {
                Ok(source.to_string())
            }
        };
        let engine = Engine::new(FilePipeline::new(failing, identity()), 2);
        let reports = engine.run(&request(sources, true), &mut Vec::<u8>::new()).unwrap();

        assert!(!reports[0].is_error());
        assert!(reports[1].is_error());
        assert!(!reports[2].is_error());
    }

    #[test]
    fn test_panic_contained_as_error_report() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_files(dir.path(), &["a.py", "boom.py", "c.py"]);

        let panicking = |source: &str| -> Result<String, SyntaxError> {
            assert!(!source.contains("boom"), "stage blew up");
            Ok(source.to_string())
        };
        let engine = Engine::new(FilePipeline::new(panicking, identity()), 2);
        let reports = engine.run(&request(sources, true), &mut Vec::<u8>::new()).unwrap();

        assert_eq!(reports.len(), 3);
        assert!(!reports[0].is_error());
        assert!(reports[1].is_error());
        assert!(!reports[2].is_error());
    }

    #[test]
    fn test_stdin_spliced_at_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = write_files(dir.path(), &["a.py"]);
        sources.insert(0, FileSource::Stdin);

        let engine = Engine::new(FilePipeline::new(identity(), identity()), 1);
        let mut echoed = Vec::new();
        let reports = engine
            .run(
                &ExecutionRequest {
                    sources,
                    dry_run: false,
                    want_diff: false,
                    stdin: Some("y = 2\n".to_string()),
                },
                &mut echoed,
            )
            .unwrap();

        assert_eq!(reports[0].source, FileSource::Stdin);
        assert!(matches!(reports[1].source, FileSource::OnDisk(_)));
        assert_eq!(String::from_utf8(echoed).unwrap(), "y = 2\n");
    }
}
