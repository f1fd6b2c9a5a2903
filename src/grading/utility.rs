use serde::{Deserialize, Serialize};

/// How a mean treats missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AveragePolicy {
    /// Average over the present values; undefined only when none are present.
    #[default]
    SkipMissing,
    /// Undefined as soon as any value is missing.
    RequireAll,
}

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of possibly-missing values under `policy`. `None` means undefined.
pub fn mean_with(values: &[Option<f64>], policy: AveragePolicy) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    if policy == AveragePolicy::RequireAll && present.len() != values.len() {
        return None;
    }
    Some(mean(&present))
}

/// Sample standard deviation (n - 1) given a pre-computed mean.
/// Undefined for fewer than two values.
pub fn stddev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    Some(variance.sqrt())
}

/// Linearly interpolated quantile of an ascending slice. `q` is in `[0, 1]`.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0]), 3.0);
    }

    #[test]
    fn test_mean_with_skip_missing() {
        let values = [Some(8.0), None, Some(6.0)];
        assert_eq!(mean_with(&values, AveragePolicy::SkipMissing), Some(7.0));
        assert_eq!(mean_with(&[None, None], AveragePolicy::SkipMissing), None);
        assert_eq!(mean_with(&[], AveragePolicy::SkipMissing), None);
    }

    #[test]
    fn test_mean_with_require_all() {
        let values = [Some(8.0), None, Some(6.0)];
        assert_eq!(mean_with(&values, AveragePolicy::RequireAll), None);
        assert_eq!(
            mean_with(&[Some(8.0), Some(6.0)], AveragePolicy::RequireAll),
            Some(7.0)
        );
    }

    #[test]
    fn test_stddev_sample() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = stddev(&values, mean(&values)).unwrap();
        assert!((sd - 2.138_089_935_299_395).abs() < 1e-12);
        assert_eq!(stddev(&[1.0], 1.0), None);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile(&sorted, 1.0), Some(4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }
}
