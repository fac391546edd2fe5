//! Batch evaluation command.

use anyhow::{Context, Result, bail};
use plate_eval::{
    AnnotationLoader, EvalConfig, EvalSession, RecognitionEngineClient, SampleStrategy,
};

use crate::EvaluateArgs;

pub fn run(args: EvaluateArgs, verbose: bool) -> Result<()> {
    let truth = AnnotationLoader::load(&args.annotations);
    if truth.is_empty() {
        bail!(
            "No ground truth loaded from {}; check the annotation file",
            args.annotations.display()
        );
    }

    let sampling = if args.in_order {
        SampleStrategy::InOrder
    } else {
        SampleStrategy::Shuffle { seed: args.seed }
    };

    let mut config = EvalConfig::builder()
        .name(&args.name)
        .sample_cap(args.cap)
        .sampling(sampling)
        .match_policy(args.policy);
    if !args.extensions.is_empty() {
        config = config.extensions(args.extensions.iter().cloned());
    }
    if let Some(dir) = &args.report_dir {
        config = config.report_dir(dir);
    }
    let session = EvalSession::new(config.build());

    let engine_config = args.engine.to_config();
    let engine = RecognitionEngineClient::start(engine_config.clone())
        .with_context(|| format!("Failed to start engine: {}", engine_config.command_line()))?;

    // The engine is shut down when dropped, including on the error path
    let report = session
        .run(&args.images, &truth, &engine)
        .with_context(|| format!("Evaluation of {} failed", args.images.display()))?;
    engine.shutdown();

    if verbose {
        for item in &report.items {
            println!(
                "{:<30} | {:<12} | {:<12} | {}",
                item.image,
                item.expected_normalized,
                item.predicted_normalized,
                item.status_label()
            );
        }
        println!();
    }

    println!("{:-<48}", "");
    println!("{report}");
    if let Some(latency) = &report.latency {
        println!(
            "Latency (ms):    mean {:.1}, median {:.1}, p95 {:.1}",
            latency.mean_ms, latency.median_ms, latency.p95_ms
        );
    }
    println!("{:-<48}", "");

    if let Some(dir) = &args.report_dir {
        println!("Reports written to: {}", dir.display());
    }

    Ok(())
}
