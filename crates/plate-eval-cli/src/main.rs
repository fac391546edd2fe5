//! plate-eval CLI - License-plate recognition grading tool

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use plate_eval::{EngineConfig, MatchPolicy, StderrMode};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

/// License-plate recognition evaluation and grading tool.
#[derive(Parser)]
#[command(name = "plate-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (per-image log lines)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a graded batch evaluation against annotated images
    Evaluate(EvaluateArgs),

    /// Recognize the plate in a single image
    Recognize {
        /// Image file
        image: PathBuf,

        /// Print a JSON record instead of plain text
        #[arg(long)]
        json: bool,

        /// Source tag stored in the record
        #[arg(long, default_value = "cli")]
        source: String,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Load an annotation file and show its ground truth
    Annotations {
        /// Annotation XML file
        path: PathBuf,

        /// Print all entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute a grade from accuracy and time per 100 images
    Grade {
        /// Accuracy in percent
        #[arg(long)]
        accuracy: f64,

        /// Seconds per 100 images
        #[arg(long)]
        time: f64,
    },
}

/// Options for a batch evaluation.
#[derive(Args)]
pub struct EvaluateArgs {
    /// Directory of candidate images
    #[arg(short, long, env = "PLATE_EVAL_IMAGES", default_value = "dataset/images")]
    images: PathBuf,

    /// Annotation XML with ground truth
    #[arg(
        short,
        long,
        env = "PLATE_EVAL_ANNOTATIONS",
        default_value = "dataset/annotations/annotations.xml"
    )]
    annotations: PathBuf,

    /// Maximum number of images to evaluate
    #[arg(long, default_value_t = plate_eval::eval::session::DEFAULT_SAMPLE_CAP)]
    cap: usize,

    /// Take the first images in name order instead of a random sample
    #[arg(long, conflicts_with = "seed")]
    in_order: bool,

    /// Seed for a repeatable random sample
    #[arg(long)]
    seed: Option<u64>,

    /// Match policy (exact, tolerant)
    #[arg(long, default_value = "tolerant")]
    policy: MatchPolicy,

    /// Image extension to include (repeatable); defaults to common formats
    #[arg(long = "ext")]
    extensions: Vec<String>,

    /// Directory for JSON/CSV reports
    #[arg(short, long, env = "PLATE_EVAL_REPORT_DIR")]
    report_dir: Option<PathBuf>,

    /// Run name used for report files
    #[arg(long, default_value = "evaluation")]
    name: String,

    #[command(flatten)]
    engine: EngineArgs,
}

/// How to launch the recognition engine.
#[derive(Args)]
pub struct EngineArgs {
    /// Engine executable
    #[arg(long, env = "PLATE_EVAL_ENGINE", default_value = "python")]
    engine: PathBuf,

    /// Argument passed to the engine (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true, default_value = "ocr_engine.py")]
    engine_args: Vec<String>,

    /// Working directory for the engine
    #[arg(long, env = "PLATE_EVAL_ENGINE_DIR")]
    engine_dir: Option<PathBuf>,

    /// Log engine stderr instead of reading it as responses
    #[arg(long)]
    separate_stderr: bool,

    /// Give up if the engine is not READY within this many milliseconds
    #[arg(long, env = "PLATE_EVAL_STARTUP_TIMEOUT_MS")]
    startup_timeout_ms: Option<u64>,

    /// Give up on a single image after this many milliseconds
    #[arg(long, env = "PLATE_EVAL_TIMEOUT_MS")]
    timeout_ms: Option<u64>,
}

impl EngineArgs {
    fn to_config(&self) -> EngineConfig {
        let mut builder = EngineConfig::builder()
            .program(&self.engine)
            .args(self.engine_args.iter().cloned())
            .stderr(if self.separate_stderr {
                StderrMode::Separate
            } else {
                StderrMode::Merged
            });
        if let Some(dir) = &self.engine_dir {
            builder = builder.working_dir(dir);
        }
        if let Some(ms) = self.startup_timeout_ms {
            builder = builder.startup_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.timeout_ms {
            builder = builder.request_timeout(Duration::from_millis(ms));
        }
        builder.build()
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Evaluate(args) => commands::evaluate::run(args, cli.verbose),
        Commands::Recognize { image, json, source, engine } => {
            commands::recognize::run(&image, json, &source, &engine.to_config())
        }
        Commands::Annotations { path, json } => commands::annotations::run(&path, json),
        Commands::Grade { accuracy, time } => {
            commands::grade::run(accuracy, time);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
