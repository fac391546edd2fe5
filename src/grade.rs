//! Final grade from accuracy and latency.

/// Lowest grade; also returned when a minimum requirement is missed.
pub const FLOOR_GRADE: f64 = 2.0;

/// Accuracy (percent) below which the floor grade is returned.
pub const MIN_ACCURACY_PERCENT: f64 = 60.0;

/// Time per 100 images (seconds) above which the floor grade is returned.
pub const MAX_TIME_PER_100_SECS: f64 = 60.0;

/// Time per 100 images (seconds) that earns full speed credit.
pub const FULL_CREDIT_TIME_PER_100_SECS: f64 = 10.0;

const ACCURACY_WEIGHT: f64 = 0.7;
const TIME_WEIGHT: f64 = 0.3;
const GRADE_SPAN: f64 = 3.0;

/// Map accuracy and time-per-100 to a grade on a half-point scale.
///
/// Accuracy is normalized linearly from 60% (0.0) to 100% (1.0), time from
/// 60s (0.0) to 10s (1.0, capped). The weighted score `0.7 * acc + 0.3 * time`
/// is scaled onto `2.0..=5.0` and snapped to the nearest 0.5.
///
/// Accuracy above 100% is not clamped; it cannot occur for a ratio of counts.
///
/// # Example
///
/// ```
/// use plate_eval::grade::grade;
///
/// assert_eq!(grade(100.0, 10.0), 5.0);
/// assert_eq!(grade(59.0, 5.0), 2.0);
/// ```
#[must_use]
pub fn grade(accuracy_percent: f64, time_per_100_secs: f64) -> f64 {
    if accuracy_percent < MIN_ACCURACY_PERCENT || time_per_100_secs > MAX_TIME_PER_100_SECS {
        return FLOOR_GRADE;
    }

    let acc_norm = (accuracy_percent - MIN_ACCURACY_PERCENT) / (100.0 - MIN_ACCURACY_PERCENT);
    let time_norm = ((MAX_TIME_PER_100_SECS - time_per_100_secs)
        / (MAX_TIME_PER_100_SECS - FULL_CREDIT_TIME_PER_100_SECS))
        .min(1.0);

    let score = ACCURACY_WEIGHT * acc_norm + TIME_WEIGHT * time_norm;
    let raw = FLOOR_GRADE + GRADE_SPAN * score;

    (raw * 2.0).round() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_gate() {
        assert_eq!(grade(59.0, 5.0), 2.0);
        assert_eq!(grade(59.99, 1.0), 2.0);
    }

    #[test]
    fn test_time_gate() {
        assert_eq!(grade(100.0, 60.01), 2.0);
    }

    #[test]
    fn test_perfect_run() {
        assert_eq!(grade(100.0, 10.0), 5.0);
        // Faster than 10s earns nothing extra
        assert_eq!(grade(100.0, 1.0), 5.0);
    }

    #[test]
    fn test_midpoint() {
        // acc 0.5, time 0.5 -> score 0.5 -> 3.5
        assert_eq!(grade(80.0, 35.0), 3.5);
    }

    #[test]
    fn test_rounds_to_half_points() {
        // acc 0.75, time 0.2 -> score 0.585 -> raw 3.755 -> 4.0
        assert_eq!(grade(90.0, 50.0), 4.0);
        // acc 0.0, time 0.0 -> raw 2.0
        assert_eq!(grade(60.0, 60.0), 2.0);
        // acc 0.25, time 0.0 -> score 0.175 -> raw 2.525 -> 2.5
        assert_eq!(grade(70.0, 60.0), 2.5);
    }

    #[test]
    fn test_above_hundred_percent_is_unclamped() {
        assert!(grade(140.0, 10.0) > 5.0);
    }
}
