//! Evaluation session and report generation.
//!
//! This module provides the batch evaluation infrastructure:
//!
//! - [`session::EvalSession`]: Drives a recognizer over a labelled sample
//! - [`session::EvalConfig`]: Configuration for evaluation
//! - [`report`]: Report types for evaluation results

pub mod report;
pub mod session;

pub use report::{EvalReport, GradeReport, ItemResult, RecognitionRecord};
pub use session::{EvalConfig, EvalConfigBuilder, EvalSession};
