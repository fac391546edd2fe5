//! Plate string normalization and tolerant matching.
//!
//! OCR output is noisy: a single `O`/`0` swap or a dropped edge character
//! should not count as a miss. [`matches`] encodes which differences are
//! tolerated; [`MatchPolicy`] lets a run choose between that and strict
//! equality.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Strings shorter than this never get tolerance applied.
pub const MIN_TOLERANT_LEN: usize = 3;

/// Normalize a plate string: upper-case, then drop everything outside `[A-Z0-9]`.
///
/// # Example
///
/// ```
/// use plate_eval::matcher::normalize;
///
/// assert_eq!(normalize("kr 123-ab"), "KR123AB");
/// ```
#[must_use]
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}

/// Compare a normalized prediction to a normalized ground truth.
///
/// Rules, first hit wins:
/// 1. exact equality;
/// 2. either side shorter than [`MIN_TOLERANT_LEN`] is rejected;
/// 3. equal lengths match with at most one substituted character;
/// 4. the prediction contains the truth, or the truth contains the
///    prediction and the prediction is at most one character shorter.
#[must_use]
pub fn matches(predicted: &str, actual: &str) -> bool {
    if predicted == actual {
        return true;
    }

    if predicted.len() < MIN_TOLERANT_LEN || actual.len() < MIN_TOLERANT_LEN {
        return false;
    }

    if predicted.len() == actual.len() && hamming_distance(predicted, actual) <= 1 {
        return true;
    }

    predicted.contains(actual)
        || (actual.contains(predicted) && predicted.len() + 1 >= actual.len())
}

/// Number of positions at which two equal-length strings differ.
///
/// Extra characters of the longer string are ignored.
#[must_use]
pub fn hamming_distance(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).filter(|(x, y)| x != y).count()
}

/// Character substitutions between an expected and a detected plate.
///
/// Returns `expected->detected` pairs for each differing position, or an
/// empty list when the lengths differ (no positional alignment exists).
#[must_use]
pub fn character_confusions(expected: &str, detected: &str) -> Vec<String> {
    if expected.chars().count() != detected.chars().count() {
        return Vec::new();
    }

    expected
        .chars()
        .zip(detected.chars())
        .filter(|(e, d)| e != d)
        .map(|(e, d)| format!("{e}->{d}"))
        .collect()
}

/// How a prediction is judged against ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Normalized strings must be identical.
    Exact,
    /// Apply the OCR-noise tolerance rules of [`matches`].
    #[default]
    Tolerant,
}

impl MatchPolicy {
    /// Judge a prediction. Both inputs must already be normalized.
    ///
    /// An empty prediction is never correct, whatever the policy.
    #[must_use]
    pub fn is_correct(self, predicted: &str, actual: &str) -> bool {
        if predicted.is_empty() {
            return false;
        }
        match self {
            Self::Exact => predicted == actual,
            Self::Tolerant => matches(predicted, actual),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Tolerant => write!(f, "tolerant"),
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "tolerant" => Ok(Self::Tolerant),
            other => Err(format!("unknown match policy: {other} (expected exact or tolerant)")),
        }
    }
}
