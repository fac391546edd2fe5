//! Sample selection when a corpus exceeds the run cap.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// How a capped sample is drawn from a larger corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SampleStrategy {
    /// First `cap` images in listing order.
    InOrder,
    /// `cap` images after a shuffle. A fixed seed makes the draw repeatable.
    Shuffle {
        /// RNG seed; entropy-seeded when `None`.
        seed: Option<u64>,
    },
}

impl Default for SampleStrategy {
    fn default() -> Self {
        Self::Shuffle { seed: None }
    }
}

impl SampleStrategy {
    /// Reduce `items` to at most `cap` entries.
    pub(crate) fn select<T>(self, items: &mut Vec<T>, cap: usize) {
        if let Self::Shuffle { seed } = self {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            items.shuffle(&mut rng);
        }
        items.truncate(cap);
    }
}
