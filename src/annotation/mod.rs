//! Ground-truth plate labels loaded from annotation XML.
//!
//! Two layouts are understood, picked by a single structural probe:
//!
//! - **Per-image** ([`AnnotationSchema::PerImage`]): `<image name="...">`
//!   elements, each holding a `<box>` with either a `label` attribute or an
//!   `<attribute name="plate number">` child.
//! - **Flat** ([`AnnotationSchema::Flat`]): `<annotation>` elements with
//!   `<filename>` and `<object><name>` children.
//!
//! ## Example
//!
//! ```rust,ignore
//! use plate_eval::annotation::AnnotationLoader;
//!
//! let truth = AnnotationLoader::load("dataset/annotations/annotations.xml");
//! if truth.is_empty() {
//!     // nothing to evaluate against
//! }
//! println!("{:?}", truth.get("car_001.jpg"));
//! ```

mod schema;

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use tracing::{error, info};

pub use schema::AnnotationSchema;

use crate::error::{Error, Result};

/// Mapping from bare image filename to its raw plate label.
///
/// Keys never contain a directory component. Built once per run and
/// read-only afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroundTruthMap {
    schema: Option<AnnotationSchema>,
    entries: HashMap<String, String>,
}

impl GroundTruthMap {
    /// Layout the map was parsed from, `None` for an empty default map.
    #[must_use]
    pub fn schema(&self) -> Option<AnnotationSchema> {
        self.schema
    }

    /// Ground-truth label for a bare filename.
    #[must_use]
    pub fn get(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    /// Whether a label exists for a bare filename.
    #[must_use]
    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    /// Number of labelled images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no labels were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(filename, label)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for GroundTruthMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            schema: None,
            entries: iter.into_iter().collect(),
        }
    }
}

/// Loads annotation files into a [`GroundTruthMap`].
pub struct AnnotationLoader;

impl AnnotationLoader {
    /// Load an annotation file, never failing.
    ///
    /// Any read or parse failure is logged and yields an empty map. Callers
    /// must treat an empty map as "no ground truth".
    pub fn load(path: impl AsRef<Path>) -> GroundTruthMap {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(map) => map,
            Err(e) => {
                error!("{e}");
                GroundTruthMap::default()
            }
        }
    }

    /// Load an annotation file, surfacing read and parse failures.
    pub fn try_load(path: impl AsRef<Path>) -> Result<GroundTruthMap> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::Annotation {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let map = Self::parse_str(&text).map_err(|e| Error::Annotation {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        info!(
            "Loaded {} plates from {} ({})",
            map.len(),
            path.display(),
            map.schema.map_or("empty", AnnotationSchema::name)
        );
        Ok(map)
    }

    /// Parse annotation XML from a string.
    pub fn parse_str(text: &str) -> std::result::Result<GroundTruthMap, roxmltree::Error> {
        let doc = roxmltree::Document::parse(text)?;
        let schema = AnnotationSchema::detect(&doc);

        let mut entries = HashMap::new();
        for (filename, plate) in schema.entries(&doc) {
            // Last one wins on duplicate filenames
            entries.insert(filename, plate);
        }

        Ok(GroundTruthMap {
            schema: Some(schema),
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PER_IMAGE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<annotations>
  <version>1.1</version>
  <image id="0" name="photos/car_001.jpg" width="1280" height="720">
    <box label="plate" xtl="10" ytl="20" xbr="110" ybr="50">
      <attribute name="plate number">WA 12345</attribute>
    </box>
    <box label="plate" xtl="300" ytl="20" xbr="400" ybr="50">
      <attribute name="plate number">IGNORED</attribute>
    </box>
  </image>
  <image id="1" name="car_002.jpg">
    <box label="KR 9876A"/>
  </image>
  <image id="2" name="car_003.jpg">
    <box label="plate">
      <attribute name="type">civilian</attribute>
      <attribute name="plate number">   </attribute>
    </box>
  </image>
  <image id="3" name="car_004.jpg"/>
  <image id="4" name="">
    <box label="GD 55555"/>
  </image>
</annotations>"#;

    const FLAT: &str = r#"<dataset>
  <annotation>
    <folder>images</folder>
    <filename>plate_a.png</filename>
    <object><name>PO 1234X</name></object>
    <object><name>SECOND</name></object>
  </annotation>
  <annotation>
    <filename>plate_b.png</filename>
  </annotation>
  <annotation>
    <filename>plate_c.png</filename>
    <object><name>LU 0001</name></object>
  </annotation>
  <annotation>
    <filename>plate_c.png</filename>
    <object><name>LU 0002</name></object>
  </annotation>
</dataset>"#;

    #[test]
    fn test_per_image_schema() {
        let map = AnnotationLoader::parse_str(PER_IMAGE).unwrap();
        assert_eq!(map.schema(), Some(AnnotationSchema::PerImage));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("car_001.jpg"), Some("WA 12345"));
        assert_eq!(map.get("car_002.jpg"), Some("KR 9876A"));
        assert!(!map.contains("car_003.jpg"));
        assert!(!map.contains("car_004.jpg"));
    }

    #[test]
    fn test_keys_are_bare_filenames() {
        let map = AnnotationLoader::parse_str(PER_IMAGE).unwrap();
        assert!(map.iter().all(|(name, _)| !name.contains('/')));
        assert!(!map.contains("photos/car_001.jpg"));
    }

    #[test]
    fn test_flat_schema_fallback() {
        let map = AnnotationLoader::parse_str(FLAT).unwrap();
        assert_eq!(map.schema(), Some(AnnotationSchema::Flat));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("plate_a.png"), Some("PO 1234X"));
        assert_eq!(map.get("plate_c.png"), Some("LU 0002"));
        assert!(!map.contains("plate_b.png"));
    }

    #[test]
    fn test_load_malformed_returns_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<annotations><image name=").unwrap();

        let map = AnnotationLoader::load(file.path());
        assert!(map.is_empty());
        assert!(AnnotationLoader::try_load(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file_returns_empty() {
        let map = AnnotationLoader::load("/nonexistent/annotations.xml");
        assert!(map.is_empty());
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PER_IMAGE.as_bytes()).unwrap();

        let map = AnnotationLoader::load(file.path());
        assert_eq!(map.len(), 2);
    }
}
