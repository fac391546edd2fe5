//! Client for the long-lived external recognition engine.
//!
//! The engine is a separate process reached over its standard streams (see
//! [`protocol`]). One [`RecognitionEngineClient`] owns one process and
//! serializes requests to it; the process is shut down when the client is
//! dropped.
//!
//! ## Example
//!
//! ```rust,ignore
//! use plate_eval::engine::{EngineConfig, RecognitionEngineClient};
//!
//! let config = EngineConfig::builder()
//!     .program("python")
//!     .arg("ocr_engine.py")
//!     .build();
//!
//! let engine = RecognitionEngineClient::start(config)?;
//! let plate = engine.recognize("dataset/images/car_001.jpg");
//! ```

mod client;
mod config;
pub mod protocol;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use client::RecognitionEngineClient;
pub use config::{EngineConfig, EngineConfigBuilder, StderrMode};

/// Connection state of an engine client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineSession {
    /// Process launched, waiting for the handshake.
    Starting,
    /// Idle and accepting requests.
    Ready,
    /// A request is outstanding.
    Busy,
    /// Shut down; no further requests reach the process.
    Closed,
}

impl fmt::Display for EngineSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Busy => "busy",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Outcome of one recognition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Recognition {
    /// The engine read a plate.
    Found(String),
    /// The engine found no plate.
    NotFound,
    /// The request failed: engine-reported error, transport failure,
    /// timeout, or a closed session.
    EngineError(String),
}

impl Recognition {
    /// Recognized text, or `""` for anything but [`Recognition::Found`].
    #[must_use]
    pub fn legacy_text(&self) -> &str {
        match self {
            Self::Found(text) => text,
            Self::NotFound | Self::EngineError(_) => "",
        }
    }

    /// Whether the request failed rather than completed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::EngineError(_))
    }

    /// Short status code for reports.
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::NotFound => "not_found",
            Self::EngineError(_) => "engine_error",
        }
    }
}

/// Anything that can read a plate from an image file.
///
/// Implemented by [`RecognitionEngineClient`] and by closures, so an
/// evaluation can run against a stub.
pub trait PlateRecognizer {
    /// Recognize the plate in one image.
    fn recognize_plate(&self, image: &Path) -> Recognition;
}

impl<F> PlateRecognizer for F
where
    F: Fn(&Path) -> Recognition,
{
    fn recognize_plate(&self, image: &Path) -> Recognition {
        self(image)
    }
}

impl PlateRecognizer for RecognitionEngineClient {
    fn recognize_plate(&self, image: &Path) -> Recognition {
        self.request(image)
    }
}
