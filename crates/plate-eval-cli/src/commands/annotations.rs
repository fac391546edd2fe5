//! Annotation inspection command.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use plate_eval::{AnnotationLoader, normalize};

pub fn run(path: &Path, json: bool) -> Result<()> {
    let truth = AnnotationLoader::try_load(path)
        .with_context(|| format!("Failed to load annotations from {}", path.display()))?;

    // Sorted for stable output
    let entries: BTreeMap<&str, &str> = truth.iter().collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Annotations: {}", path.display());
    println!("  Layout: {}", truth.schema().map_or("none", |s| s.name()));
    println!("  Plates: {}", truth.len());

    let unusable = entries.values().filter(|plate| normalize(plate).is_empty()).count();
    if unusable > 0 {
        println!("  Labels with no letters or digits: {}", unusable);
    }

    Ok(())
}
