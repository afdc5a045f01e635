//! File processing and execution.
//!
//! [`pipeline`] runs one file through the two transform stages and packages
//! the outcome into a [`crate::report::FileReport`]:
//!
//! - skip policy is checked before any parsing
//! - stage A (import normalization), then stage B (layout)
//! - change detection, atomic in-place replace, optional unified diff
//!
//! [`engine`] fans the pipeline out over the resolved inputs with a
//! bounded worker pool, isolating each file's failure and returning the
//! reports in input order.

pub mod engine;
pub mod pipeline;

pub use engine::Engine;
pub use pipeline::{FilePipeline, ProcessOptions, Stage};
