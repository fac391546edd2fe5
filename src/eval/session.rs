//! Evaluation session: drive a recognizer over a labelled sample and grade it.
//!
//! This module provides [`EvalSession`], the main entry point for a batch
//! run. The caller supplies ground truth and a [`PlateRecognizer`]; the
//! session selects the sample, times each request, judges the predictions
//! and builds the [`EvalReport`].

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::annotation::GroundTruthMap;
use crate::corpus::{Corpus, CorpusImage, DEFAULT_EXTENSIONS, SampleStrategy};
use crate::engine::PlateRecognizer;
use crate::error::{Error, Result};
use crate::eval::report::{EvalReport, GradeReport, ItemResult};
use crate::matcher::{MatchPolicy, character_confusions, normalize};
use crate::stats::LatencySummary;

/// Default number of images per run.
pub const DEFAULT_SAMPLE_CAP: usize = 100;

/// Configuration for an evaluation session.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Run name, used for report file names.
    pub name: String,

    /// Maximum number of images drawn from the corpus.
    pub sample_cap: usize,

    /// How the sample is drawn when the corpus exceeds the cap.
    pub sampling: SampleStrategy,

    /// How predictions are judged.
    pub match_policy: MatchPolicy,

    /// File extensions treated as images.
    pub extensions: Vec<String>,

    /// Directory for report output (JSON, CSV). No files are written when unset.
    pub report_dir: Option<PathBuf>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl EvalConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> EvalConfigBuilder {
        EvalConfigBuilder::default()
    }
}

/// Builder for [`EvalConfig`].
#[derive(Debug, Default)]
pub struct EvalConfigBuilder {
    name: Option<String>,
    sample_cap: Option<usize>,
    sampling: Option<SampleStrategy>,
    match_policy: Option<MatchPolicy>,
    extensions: Option<Vec<String>>,
    report_dir: Option<PathBuf>,
}

impl EvalConfigBuilder {
    /// Set the run name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the sample cap.
    #[must_use]
    pub fn sample_cap(mut self, cap: usize) -> Self {
        self.sample_cap = Some(cap);
        self
    }

    /// Set the sampling strategy.
    #[must_use]
    pub fn sampling(mut self, sampling: SampleStrategy) -> Self {
        self.sampling = Some(sampling);
        self
    }

    /// Set the match policy.
    #[must_use]
    pub fn match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = Some(policy);
        self
    }

    /// Set the recognized image extensions.
    #[must_use]
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Set the report output directory.
    #[must_use]
    pub fn report_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> EvalConfig {
        EvalConfig {
            name: self.name.unwrap_or_else(|| "evaluation".to_string()),
            sample_cap: self.sample_cap.unwrap_or(DEFAULT_SAMPLE_CAP),
            sampling: self.sampling.unwrap_or_default(),
            match_policy: self.match_policy.unwrap_or_default(),
            extensions: self.extensions.unwrap_or_else(|| {
                DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect()
            }),
            report_dir: self.report_dir,
        }
    }
}

/// Evaluation session for a plate recognizer.
///
/// # Example
///
/// ```rust,ignore
/// use plate_eval::{AnnotationLoader, EvalConfig, EvalSession, RecognitionEngineClient};
///
/// let truth = AnnotationLoader::load("dataset/annotations/annotations.xml");
/// let engine = RecognitionEngineClient::start(Default::default())?;
///
/// let session = EvalSession::new(EvalConfig::builder().report_dir("./reports").build());
/// let report = session.run("dataset/images", &truth, &engine)?;
/// println!("{report}");
/// ```
pub struct EvalSession {
    config: EvalConfig,
}

impl EvalSession {
    /// Create a new evaluation session.
    #[must_use]
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluate the images in `images_dir` against `truth`.
    ///
    /// Fails only on preconditions: empty ground truth, an unreadable image
    /// directory, or a report that cannot be written. Per-image problems are
    /// recorded in the report.
    pub fn run<R>(
        &self,
        images_dir: impl AsRef<Path>,
        truth: &GroundTruthMap,
        recognizer: &R,
    ) -> Result<EvalReport>
    where
        R: PlateRecognizer + ?Sized,
    {
        if truth.is_empty() {
            return Err(Error::NoGroundTruth);
        }

        let corpus = Corpus::discover(images_dir, self.config.extensions.as_slice())?;
        let sample = corpus.sample(self.config.sample_cap, self.config.sampling);
        info!(
            "Evaluating {} of {} images in {}",
            sample.len(),
            corpus.len(),
            corpus.root_path.display()
        );

        let report = self.evaluate_sample(&corpus.root_path, &sample, truth, recognizer);

        if let Some(dir) = &self.config.report_dir {
            Self::write_report(&report, dir)?;
        }

        Ok(report)
    }

    /// Evaluate an already selected sample.
    pub fn evaluate_sample<R>(
        &self,
        root: &Path,
        sample: &[&CorpusImage],
        truth: &GroundTruthMap,
        recognizer: &R,
    ) -> EvalReport
    where
        R: PlateRecognizer + ?Sized,
    {
        let policy = self.config.match_policy;
        let mut items = Vec::with_capacity(sample.len());
        let mut skipped = 0;
        let mut engine_errors = 0;
        let mut total_elapsed = Duration::ZERO;

        for image in sample {
            let name = image.name();
            let Some(expected) = truth.get(name) else {
                debug!("{name}: no ground truth, skipping");
                skipped += 1;
                continue;
            };

            let path = image.full_path(root);
            let start = Instant::now();
            let recognition = recognizer.recognize_plate(&path);
            let elapsed = start.elapsed();
            total_elapsed += elapsed;

            if recognition.is_error() {
                engine_errors += 1;
            }

            let predicted = recognition.legacy_text().to_string();
            let predicted_normalized = normalize(&predicted);
            let expected_normalized = normalize(expected);
            let correct = policy.is_correct(&predicted_normalized, &expected_normalized);

            debug!(
                "{name} -> OCR: [{predicted_normalized}] vs truth: [{expected_normalized}] {}",
                if correct { "OK" } else { "FAIL" }
            );

            items.push(ItemResult {
                image: name.to_string(),
                expected: expected.to_string(),
                confusions: if correct {
                    Vec::new()
                } else {
                    character_confusions(&expected_normalized, &predicted_normalized)
                },
                predicted,
                expected_normalized,
                predicted_normalized,
                recognition,
                correct,
                elapsed,
            });
        }

        if items.is_empty() {
            warn!("No selected image had ground truth ({skipped} skipped)");
        }

        let correct = items.iter().filter(|item| item.correct).count();
        let durations: Vec<Duration> = items.iter().map(|item| item.elapsed).collect();

        EvalReport {
            name: self.config.name.clone(),
            match_policy: policy,
            sampling: self.config.sampling,
            candidates: sample.len(),
            skipped,
            engine_errors,
            grade: GradeReport::compute(items.len(), correct, total_elapsed),
            latency: LatencySummary::compute(&durations),
            items,
            total_elapsed,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Write the report as JSON plus two CSVs (all readings, failures) into `dir`.
    pub fn write_report(report: &EvalReport, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::Report(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        let json_path = dir.join(format!("{}.json", report.name));
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&json_path, json)?;

        Self::write_readings_csv(report, &dir.join(format!("{}.csv", report.name)))?;
        Self::write_failures_csv(report, &dir.join(format!("{}-failures.csv", report.name)))?;

        info!("Wrote report to {}", json_path.display());
        Ok(())
    }

    /// Write every reading with its status.
    fn write_readings_csv(report: &EvalReport, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;

        wtr.write_record([
            "image",
            "expected",
            "detected",
            "expected_normalized",
            "detected_normalized",
            "engine_status",
            "status",
            "elapsed_ms",
        ])?;

        for item in &report.items {
            let elapsed_ms = format!("{:.1}", item.elapsed.as_secs_f64() * 1000.0);
            wtr.write_record([
                item.image.as_str(),
                item.expected.as_str(),
                item.predicted.as_str(),
                item.expected_normalized.as_str(),
                item.predicted_normalized.as_str(),
                item.recognition.status(),
                item.status_label(),
                elapsed_ms.as_str(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Write failed readings with their character confusions.
    fn write_failures_csv(report: &EvalReport, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;

        wtr.write_record(["image", "expected", "detected", "engine_status", "errors"])?;

        for item in report.failures() {
            let errors = item.confusions.join(", ");
            wtr.write_record([
                item.image.as_str(),
                item.expected_normalized.as_str(),
                item.predicted_normalized.as_str(),
                item.recognition.status(),
                errors.as_str(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Recognition;
    use std::fs;

    fn truth(entries: &[(&str, &str)]) -> GroundTruthMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn image_dir(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), b"img").unwrap();
        }
        dir
    }

    fn by_file_name(table: &'static [(&'static str, &'static str)]) -> impl Fn(&Path) -> Recognition {
        move |path: &Path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            table
                .iter()
                .find(|(file, _)| *file == name)
                .map_or(Recognition::NotFound, |(_, text)| Recognition::Found((*text).to_string()))
        }
    }

    #[test]
    fn test_eval_config_builder() {
        let config = EvalConfig::builder()
            .name("nightly")
            .sample_cap(10)
            .sampling(SampleStrategy::InOrder)
            .match_policy(MatchPolicy::Exact)
            .extensions(["png"])
            .report_dir("/tmp/reports")
            .build();

        assert_eq!(config.name, "nightly");
        assert_eq!(config.sample_cap, 10);
        assert_eq!(config.sampling, SampleStrategy::InOrder);
        assert_eq!(config.match_policy, MatchPolicy::Exact);
        assert_eq!(config.extensions, vec!["png".to_string()]);
        assert_eq!(config.report_dir, Some(PathBuf::from("/tmp/reports")));
    }

    #[test]
    fn test_eval_config_defaults() {
        let config = EvalConfig::default();
        assert_eq!(config.sample_cap, DEFAULT_SAMPLE_CAP);
        assert_eq!(config.match_policy, MatchPolicy::Tolerant);
        assert!(config.report_dir.is_none());
        assert!(config.extensions.iter().any(|e| e == "jpg"));
    }

    #[test]
    fn test_end_to_end_half_correct() {
        let dir = image_dir(&["a.jpg", "b.jpg", "c.jpg"]);
        let truth = truth(&[("a.jpg", "KR 12345"), ("b.jpg", "WA-99999")]);
        let stub = by_file_name(&[("a.jpg", "KR12345"), ("b.jpg", "GD11111"), ("c.jpg", "PO1")]);

        let session = EvalSession::new(EvalConfig::builder().sampling(SampleStrategy::InOrder).build());
        let report = session.run(dir.path(), &truth, &stub).unwrap();

        assert_eq!(report.candidates, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.processed(), 2);
        assert_eq!(report.correct(), 1);

        let grade = report.grade.as_ref().unwrap();
        assert_eq!(grade.processed, 2);
        assert_eq!(grade.correct, 1);
        assert_eq!(grade.accuracy_percent, 50.0);
        assert_eq!(grade.grade, 2.0);
    }

    #[test]
    fn test_policy_changes_outcome() {
        let dir = image_dir(&["a.jpg"]);
        let truth = truth(&[("a.jpg", "AB1O3")]);
        let stub = |_: &Path| Recognition::Found("ab1z3".to_string());

        let exact = EvalSession::new(EvalConfig::builder().match_policy(MatchPolicy::Exact).build());
        assert_eq!(exact.run(dir.path(), &truth, &stub).unwrap().correct(), 0);

        let tolerant = EvalSession::new(EvalConfig::builder().match_policy(MatchPolicy::Tolerant).build());
        let report = tolerant.run(dir.path(), &truth, &stub).unwrap();
        assert_eq!(report.correct(), 1);
        assert!(report.items[0].confusions.is_empty());
    }

    #[test]
    fn test_empty_ground_truth_is_fatal() {
        let dir = image_dir(&["a.jpg"]);
        let stub = |_: &Path| Recognition::NotFound;
        let session = EvalSession::new(EvalConfig::default());

        let result = session.run(dir.path(), &GroundTruthMap::default(), &stub);
        assert!(matches!(result, Err(Error::NoGroundTruth)));
    }

    #[test]
    fn test_no_data_is_distinct_from_zero_accuracy() {
        let dir = image_dir(&["a.jpg", "b.jpg"]);
        let truth = truth(&[("other.jpg", "KR1")]);
        let stub = |_: &Path| Recognition::NotFound;
        let session = EvalSession::new(EvalConfig::default());

        let report = session.run(dir.path(), &truth, &stub).unwrap();
        assert!(report.is_no_data());
        assert!(report.grade.is_none());
        assert_eq!(report.skipped, 2);
        assert!(report.to_string().contains("No data"));
    }

    #[test]
    fn test_engine_errors_count_as_misses() {
        let dir = image_dir(&["a.jpg", "b.jpg"]);
        let truth = truth(&[("a.jpg", "KR12345"), ("b.jpg", "KR12345")]);
        let stub = |_: &Path| Recognition::EngineError("ERROR_PROCESS".to_string());
        let session = EvalSession::new(EvalConfig::default());

        let report = session.run(dir.path(), &truth, &stub).unwrap();
        assert_eq!(report.engine_errors, 2);
        assert_eq!(report.correct(), 0);
        assert_eq!(report.grade.unwrap().accuracy_percent, 0.0);
    }

    #[test]
    fn test_sample_cap_applies() {
        let names: Vec<String> = (0..12).map(|i| format!("img{i:02}.jpg")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let dir = image_dir(&refs);
        let truth: GroundTruthMap = names.iter().map(|n| (n.clone(), "KR1234".to_string())).collect();
        let stub = |_: &Path| Recognition::Found("KR1234".to_string());

        let session = EvalSession::new(
            EvalConfig::builder()
                .sample_cap(5)
                .sampling(SampleStrategy::Shuffle { seed: Some(3) })
                .build(),
        );
        let report = session.run(dir.path(), &truth, &stub).unwrap();
        assert_eq!(report.candidates, 5);
        assert_eq!(report.processed(), 5);
        assert_eq!(report.correct(), 5);
    }

    #[test]
    fn test_confusions_recorded_for_failures() {
        let dir = image_dir(&["a.jpg"]);
        let truth = truth(&[("a.jpg", "KR0123")]);
        let stub = |_: &Path| Recognition::Found("KRO12B".to_string());
        let session = EvalSession::new(EvalConfig::builder().match_policy(MatchPolicy::Exact).build());

        let report = session.run(dir.path(), &truth, &stub).unwrap();
        assert_eq!(report.items[0].confusions, vec!["0->O".to_string(), "3->B".to_string()]);
    }

    #[test]
    fn test_write_report_files() {
        let images = image_dir(&["a.jpg", "b.jpg"]);
        let out = tempfile::tempdir().unwrap();
        let truth = truth(&[("a.jpg", "KR12345"), ("b.jpg", "WA99999")]);
        let stub = by_file_name(&[("a.jpg", "KR12345"), ("b.jpg", "WA00000")]);

        let session = EvalSession::new(
            EvalConfig::builder().name("run1").report_dir(out.path()).build(),
        );
        session.run(images.path(), &truth, &stub).unwrap();

        let json = fs::read_to_string(out.path().join("run1.json")).unwrap();
        let parsed: EvalReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.processed(), 2);

        let readings = fs::read_to_string(out.path().join("run1.csv")).unwrap();
        assert_eq!(readings.lines().count(), 3);
        assert!(readings.contains("a.jpg,KR12345,KR12345"));

        let failures = fs::read_to_string(out.path().join("run1-failures.csv")).unwrap();
        assert_eq!(failures.lines().count(), 2);
        assert!(failures.contains("b.jpg"));
    }

    #[test]
    fn test_write_report_without_session_state() {
        let out = tempfile::tempdir().unwrap();
        let truth = truth(&[("a.jpg", "KR12345")]);
        let stub = by_file_name(&[]);
        let session = EvalSession::new(EvalConfig::builder().name("empty").build());
        let report = session.evaluate_sample(Path::new("."), &[], &truth, &stub);

        EvalSession::write_report(&report, out.path()).unwrap();

        let failures = fs::read_to_string(out.path().join("empty-failures.csv")).unwrap();
        assert_eq!(failures.lines().count(), 1);
        assert!(out.path().join("empty.json").is_file());
    }
}
