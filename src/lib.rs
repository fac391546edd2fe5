//! # plate-eval
//!
//! License-plate recognition evaluation and grading library.
//!
//! Ground truth comes from annotation XML, predictions from an external
//! recognition engine driven over a line protocol on its standard streams.
//! Predictions are judged with OCR-tolerant matching, and accuracy plus
//! latency reduce to a single half-point grade.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use plate_eval::{AnnotationLoader, EngineConfig, EvalConfig, EvalSession, RecognitionEngineClient};
//!
//! let truth = AnnotationLoader::load("dataset/annotations/annotations.xml");
//!
//! let engine = RecognitionEngineClient::start(
//!     EngineConfig::builder().program("python").arg("ocr_engine.py").build(),
//! )?;
//!
//! let session = EvalSession::new(EvalConfig::builder().report_dir("./reports").build());
//! let report = session.run("dataset/images", &truth, &engine)?;
//! println!("{report}");
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`annotation`]: Ground-truth loading from annotation XML
//! - [`engine`]: External recognition engine client
//! - [`matcher`]: Plate normalization and tolerant matching
//! - [`grade`]: Grade calculation
//! - [`corpus`]: Candidate image discovery and sampling
//! - [`eval`]: Evaluation session and report generation
//! - [`stats`]: Latency statistics

pub mod annotation;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod eval;
pub mod grade;
pub mod matcher;
pub mod stats;

// Re-export commonly used types
pub use annotation::{AnnotationLoader, AnnotationSchema, GroundTruthMap};
pub use corpus::{Corpus, CorpusImage, SampleStrategy};
pub use engine::{
    EngineConfig, EngineSession, PlateRecognizer, Recognition, RecognitionEngineClient, StderrMode,
};
pub use error::{Error, Result};
pub use eval::{
    report::{EvalReport, GradeReport, ItemResult, RecognitionRecord},
    session::{EvalConfig, EvalSession},
};
pub use grade::grade;
pub use matcher::{MatchPolicy, matches, normalize};
pub use stats::LatencySummary;
