//! Percentile and summary statistics.

use serde::{Deserialize, Serialize};

/// `p`-th percentile (0-100) by linear interpolation between closest ranks.
///
/// `p` is clamped to `[0, 100]`. Returns `None` for an empty slice.
///
/// # Examples
///
/// ```
/// use u_shuttle::metrics::percentile;
///
/// let v = [4.0, 1.0, 3.0, 2.0];
/// assert_eq!(percentile(&v, 0.0), Some(1.0));
/// assert_eq!(percentile(&v, 50.0), Some(2.5));
/// assert_eq!(percentile(&v, 100.0), Some(4.0));
/// assert_eq!(percentile(&[], 95.0), None);
/// ```
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(percentile_sorted(&sorted, p))
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = p.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Mean, 95th percentile, and maximum of a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Arithmetic mean.
    pub mean: f64,
    /// 95th percentile.
    pub p95: f64,
    /// Maximum.
    pub max: f64,
}

impl Summary {
    /// Summarizes `values`; all zeros when empty.
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self {
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            p95: percentile_sorted(&sorted, 95.0),
            max: sorted[sorted.len() - 1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let v: Vec<f64> = (0..=10).map(f64::from).collect();
        assert!((percentile(&v, 95.0).expect("non-empty") - 9.5).abs() < 1e-10);
        assert!((percentile(&v, 25.0).expect("non-empty") - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_percentile_single_value() {
        assert_eq!(percentile(&[7.0], 95.0), Some(7.0));
    }

    #[test]
    fn test_percentile_clamps_p() {
        let v = [1.0, 2.0];
        assert_eq!(percentile(&v, -5.0), Some(1.0));
        assert_eq!(percentile(&v, 250.0), Some(2.0));
    }

    #[test]
    fn test_summary() {
        let s = Summary::of(&[3.0, -1.0, 2.0, 0.0]);
        assert!((s.mean - 1.0).abs() < 1e-10);
        assert_eq!(s.max, 3.0);
        // rank 0.95 · 3 = 2.85 → 2 + 0.85 · (3 - 2)
        assert!((s.p95 - 2.85).abs() < 1e-10);
        assert_eq!(Summary::of(&[]), Summary::default());
    }
}
