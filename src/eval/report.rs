//! Report types for evaluation results.
//!
//! This module defines the data structures for evaluation reports that can be
//! serialized to JSON or CSV.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::corpus::SampleStrategy;
use crate::engine::Recognition;
use crate::grade::grade;
use crate::matcher::MatchPolicy;
use crate::stats::LatencySummary;

/// Outcome for one image that had ground truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResult {
    /// Bare image filename.
    pub image: String,

    /// Ground-truth label as annotated.
    pub expected: String,

    /// Recognized text, `""` when nothing was read.
    pub predicted: String,

    /// Normalized ground truth.
    pub expected_normalized: String,

    /// Normalized prediction.
    pub predicted_normalized: String,

    /// What the recognizer reported.
    pub recognition: Recognition,

    /// Whether the prediction counts as correct under the run's policy.
    pub correct: bool,

    /// Positional character substitutions (`expected->detected`).
    #[serde(default)]
    pub confusions: Vec<String>,

    /// Time spent in the recognition call.
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

impl ItemResult {
    /// `OK` or `FAIL`.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.correct { "OK" } else { "FAIL" }
    }
}

/// Accuracy, latency and the resulting grade for a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeReport {
    /// Items that had ground truth and were sent for recognition.
    pub processed: usize,

    /// Items judged correct.
    pub correct: usize,

    /// `100 * correct / processed`.
    pub accuracy_percent: f64,

    /// Average item time extrapolated to 100 items, in seconds.
    pub time_per_100_secs: f64,

    /// Grade on the half-point scale.
    pub grade: f64,
}

impl GradeReport {
    /// Score a batch. Returns `None` when nothing was processed.
    #[must_use]
    pub fn compute(processed: usize, correct: usize, total_elapsed: Duration) -> Option<Self> {
        if processed == 0 {
            return None;
        }

        let accuracy_percent = 100.0 * correct as f64 / processed as f64;
        let time_per_100_secs = 100.0 * total_elapsed.as_secs_f64() / processed as f64;

        Some(Self {
            processed,
            correct,
            accuracy_percent,
            time_per_100_secs,
            grade: grade(accuracy_percent, time_per_100_secs),
        })
    }
}

impl fmt::Display for GradeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processed:       {}", self.processed)?;
        writeln!(f, "Correct:         {}", self.correct)?;
        writeln!(f, "Accuracy:        {:.2}%", self.accuracy_percent)?;
        writeln!(f, "Time (per 100):  {:.2}s", self.time_per_100_secs)?;
        write!(f, "Grade:           {:.1}", self.grade)
    }
}

/// Report for one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    /// Run name.
    pub name: String,

    /// Match policy used to judge predictions.
    pub match_policy: MatchPolicy,

    /// How the sample was drawn.
    pub sampling: SampleStrategy,

    /// Images selected for the run (after capping).
    pub candidates: usize,

    /// Selected images without ground truth.
    pub skipped: usize,

    /// Requests that ended in an engine error rather than a reading.
    pub engine_errors: usize,

    /// Per-image outcomes, in evaluation order.
    pub items: Vec<ItemResult>,

    /// Sum of per-item recognition time.
    #[serde(with = "duration_millis")]
    pub total_elapsed: Duration,

    /// Latency distribution; `None` when nothing was processed.
    pub latency: Option<LatencySummary>,

    /// Score; `None` when nothing was processed.
    pub grade: Option<GradeReport>,

    /// When this report was generated.
    #[serde(with = "chrono_serde")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl EvalReport {
    /// Number of items that were evaluated.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.items.len()
    }

    /// Number of items judged correct.
    #[must_use]
    pub fn correct(&self) -> usize {
        self.items.iter().filter(|item| item.correct).count()
    }

    /// True when no selected image had ground truth, as opposed to a run
    /// that scored 0%.
    #[must_use]
    pub fn is_no_data(&self) -> bool {
        self.items.is_empty()
    }

    /// Items judged incorrect.
    pub fn failures(&self) -> impl Iterator<Item = &ItemResult> {
        self.items.iter().filter(|item| !item.correct)
    }
}

impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run:             {} ({} match)", self.name, self.match_policy)?;
        writeln!(f, "Candidates:      {}", self.candidates)?;
        writeln!(f, "Skipped:         {} (no ground truth)", self.skipped)?;
        writeln!(f, "Engine errors:   {}", self.engine_errors)?;
        match &self.grade {
            Some(grade) => write!(f, "{grade}"),
            None => write!(f, "No data: no selected image had ground truth"),
        }
    }
}

/// Record of a single ad-hoc recognition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionRecord {
    /// Image that was recognized.
    pub file_path: PathBuf,

    /// Recognized plate, `""` when none.
    pub detected_plate: String,

    /// What the engine reported.
    pub recognition: Recognition,

    /// Time spent in the recognition call.
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,

    /// Where the request came from (e.g. `cli`).
    pub source: String,

    /// When the recognition finished.
    #[serde(with = "chrono_serde")]
    pub processed_at: chrono::DateTime<chrono::Utc>,
}

impl RecognitionRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(
        file_path: impl Into<PathBuf>,
        recognition: Recognition,
        elapsed: Duration,
        source: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            detected_plate: recognition.legacy_text().to_string(),
            recognition,
            elapsed,
            source: source.into(),
            processed_at: chrono::Utc::now(),
        }
    }
}

// Custom serialization for Duration as fractional milliseconds
pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_nanos() as f64 / 1_000_000.0).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = f64::deserialize(deserializer)?;
        if !millis.is_finite() || millis < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "invalid duration: {millis} ms"
            )));
        }
        Ok(Duration::from_nanos((millis * 1_000_000.0).round() as u64))
    }
}

pub(crate) mod duration_millis_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.map(|d| d.as_millis()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: Option<u64> = Option::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

mod chrono_serde {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dt.to_rfc3339().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_report_compute() {
        let report = GradeReport::compute(4, 3, Duration::from_secs(2)).unwrap();
        assert_eq!(report.accuracy_percent, 75.0);
        assert!((report.time_per_100_secs - 50.0).abs() < 1e-9);
        // acc 0.375, time 0.2 -> score 0.3225 -> raw 2.9675 -> 3.0
        assert_eq!(report.grade, 3.0);
    }

    #[test]
    fn test_grade_report_extrapolates_from_actual_sample() {
        let report = GradeReport::compute(10, 10, Duration::from_secs(1)).unwrap();
        assert!((report.time_per_100_secs - 10.0).abs() < 1e-9);
        assert_eq!(report.grade, 5.0);
    }

    #[test]
    fn test_grade_report_no_data() {
        assert!(GradeReport::compute(0, 0, Duration::ZERO).is_none());
    }

    #[test]
    fn test_grade_report_display_two_decimals() {
        let report = GradeReport::compute(3, 2, Duration::from_millis(1500)).unwrap();
        let text = report.to_string();
        assert!(text.contains("Accuracy:        66.67%"));
        assert!(text.contains("Time (per 100):  50.00s"));
    }

    #[test]
    fn test_elapsed_keeps_sub_millisecond_precision() {
        let record = RecognitionRecord::new(
            "/data/car.jpg",
            Recognition::Found("KR1234".to_string()),
            Duration::from_micros(1500),
            "cli",
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["elapsed"], serde_json::json!(1.5));

        let back: RecognitionRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.elapsed, Duration::from_micros(1500));
    }

    #[test]
    fn test_negative_elapsed_is_rejected() {
        let mut value = serde_json::to_value(RecognitionRecord::new(
            "/data/car.jpg",
            Recognition::NotFound,
            Duration::ZERO,
            "cli",
        ))
        .unwrap();
        value["elapsed"] = serde_json::json!(-1.0);
        assert!(serde_json::from_value::<RecognitionRecord>(value).is_err());
    }

    #[test]
    fn test_recognition_record() {
        let record = RecognitionRecord::new(
            "/data/car.jpg",
            Recognition::NotFound,
            Duration::from_millis(120),
            "cli",
        );
        assert_eq!(record.detected_plate, "");

        let json = serde_json::to_string(&record).unwrap();
        let back: RecognitionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.elapsed, Duration::from_millis(120));
        assert_eq!(back.recognition, Recognition::NotFound);
    }
}
