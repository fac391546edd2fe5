//! Image discovery in directories.

use std::fs;
use std::path::Path;

use crate::corpus::{Corpus, CorpusImage};
use crate::error::{Error, Result};

/// Extensions recognized as images when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// List images directly inside a directory.
pub fn discover_corpus<S: AsRef<str>>(path: &Path, extensions: &[S]) -> Result<Corpus> {
    if !path.exists() {
        return Err(Error::Corpus(format!("Path does not exist: {}", path.display())));
    }

    if !path.is_dir() {
        return Err(Error::Corpus(format!("Path is not a directory: {}", path.display())));
    }

    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("corpus")
        .to_string();

    let mut corpus = Corpus::new(name, path);

    let entries = fs::read_dir(path).map_err(|e| {
        Error::Corpus(format!("Failed to read directory {}: {}", path.display(), e))
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            Error::Corpus(format!("Failed to read entry in {}: {}", path.display(), e))
        })?;

        let file_path = entry.path();
        if file_path.is_file() {
            if let Some(img) = try_image_info(&file_path, extensions) {
                corpus.images.push(img);
            }
        }
    }

    // read_dir order is platform-defined
    corpus.images.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok(corpus)
}

fn try_image_info<S: AsRef<str>>(path: &Path, extensions: &[S]) -> Option<CorpusImage> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    if !extensions
        .iter()
        .any(|ext| ext.as_ref().trim_start_matches('.').eq_ignore_ascii_case(&extension))
    {
        return None;
    }

    let file_size = fs::metadata(path).ok()?.len();
    let relative_path = path.file_name()?.into();

    Some(CorpusImage {
        relative_path,
        file_size,
        format: extension,
    })
}
