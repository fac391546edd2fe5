//! Single-image recognition command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use plate_eval::{EngineConfig, Recognition, RecognitionEngineClient, RecognitionRecord};

pub fn run(image: &Path, json: bool, source: &str, engine: &EngineConfig) -> Result<()> {
    let engine = RecognitionEngineClient::start(engine.clone())
        .with_context(|| format!("Failed to start engine: {}", engine.command_line()))?;

    let start = Instant::now();
    let recognition = engine.request(image);
    let elapsed = start.elapsed();
    engine.shutdown();

    let record = RecognitionRecord::new(image, recognition, elapsed, source);

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    match &record.recognition {
        Recognition::Found(plate) => {
            println!("Plate: {} (time: {} ms)", plate, record.elapsed.as_millis());
        }
        Recognition::NotFound => {
            println!("No plate found (time: {} ms)", record.elapsed.as_millis());
        }
        Recognition::EngineError(detail) => {
            println!("Recognition failed: {} (time: {} ms)", detail, record.elapsed.as_millis());
        }
    }

    Ok(())
}
