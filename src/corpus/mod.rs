//! Candidate images for an evaluation run.
//!
//! A [`Corpus`] is the flat listing of image files in one directory. The
//! evaluation draws at most a fixed number of them, either in listing order
//! or after a shuffle (see [`SampleStrategy`]).
//!
//! ## Example
//!
//! ```rust,ignore
//! use plate_eval::corpus::{Corpus, SampleStrategy};
//!
//! let corpus = Corpus::discover("./dataset/images", &["jpg"])?;
//! let sample = corpus.sample(100, SampleStrategy::Shuffle { seed: Some(7) });
//! ```

mod discovery;
mod sample;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use discovery::DEFAULT_EXTENSIONS;
pub use sample::SampleStrategy;

use crate::error::Result;

/// Image files found in one directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    /// Name of the corpus (directory name).
    pub name: String,

    /// Directory that was listed.
    pub root_path: PathBuf,

    /// Images, sorted by file name.
    pub images: Vec<CorpusImage>,
}

/// An image in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusImage {
    /// Path relative to the corpus root (a bare file name).
    pub relative_path: PathBuf,

    /// File size in bytes.
    pub file_size: u64,

    /// Lower-cased file extension.
    pub format: String,
}

impl CorpusImage {
    /// Get the full path to the image.
    #[must_use]
    pub fn full_path(&self, root: &Path) -> PathBuf {
        root.join(&self.relative_path)
    }

    /// Get the image name (filename without path).
    #[must_use]
    pub fn name(&self) -> &str {
        self.relative_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
    }
}

impl Corpus {
    /// Create a new empty corpus.
    #[must_use]
    pub fn new(name: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root_path: root_path.into(),
            images: Vec::new(),
        }
    }

    /// List images directly inside `path` whose extension is in `extensions`
    /// (compared case-insensitively).
    pub fn discover<S: AsRef<str>>(path: impl AsRef<Path>, extensions: &[S]) -> Result<Self> {
        discovery::discover_corpus(path.as_ref(), extensions)
    }

    /// Get the number of images in the corpus.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Check if the corpus is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Select at most `cap` images.
    ///
    /// When the corpus is no larger than `cap`, every image is returned in
    /// listing order regardless of strategy.
    #[must_use]
    pub fn sample(&self, cap: usize, strategy: SampleStrategy) -> Vec<&CorpusImage> {
        let mut selected: Vec<&CorpusImage> = self.images.iter().collect();
        if selected.len() > cap {
            strategy.select(&mut selected, cap);
        }
        selected
    }
}
