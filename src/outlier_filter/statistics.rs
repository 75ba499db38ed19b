//! Layer-local statistics: thresholds for the statistical rule and the
//! descriptive summaries tabulated per layer
//!
//! Mean and population standard deviation come from statrs. Quartiles use
//! linear interpolation between closest ranks, the same estimator as
//! `numpy.percentile` with default settings.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::types::{Fence, Layer, Sample, SkipReason, StatisticalMethod};

/// Mean and population standard deviation, `None` for an empty slice
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().mean();
    let std = values.iter().population_std_dev();
    Some((mean, std))
}

/// Quantile `q` in `[0, 1]` of already sorted values (linear interpolation)
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }
    let pos = q * (sorted.len() - 1) as f64;
    let idx = pos.floor() as usize;
    let frac = pos - idx as f64;
    let a = sorted[idx];
    let b = sorted[(idx + 1).min(sorted.len() - 1)];
    Some((b - a).mul_add(frac, a))
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Relative spread below which a layer counts as constant
const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// True when a standard deviation is indistinguishable from zero at the
/// scale of the mean (summation noise on a constant curve)
fn is_zero_variance(mean: f64, std: f64) -> bool {
    !(std > ZERO_VARIANCE_TOLERANCE * mean.abs().max(1.0))
}

// ============================================================================
// Statistical thresholds
// ============================================================================

/// A statistical threshold computed over one layer's surviving samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    ZScore { mean: f64, std: f64, k: f64 },
    Iqr { q1: f64, q3: f64, lower: f64, upper: f64 },
}

impl Threshold {
    /// Compute the threshold for `method` over `values`.
    ///
    /// Fails with the reason the layer has to be skipped: no method, no
    /// values, or (z-score only) a constant curve.
    pub fn compute(method: StatisticalMethod, values: &[f64]) -> Result<Self, SkipReason> {
        match method {
            StatisticalMethod::None => Err(SkipReason::NoMethod),
            StatisticalMethod::ZScore { k } => {
                let (mean, std) = mean_and_std(values).ok_or(SkipReason::TooFewSamples)?;
                if is_zero_variance(mean, std) {
                    return Err(SkipReason::ZeroVariance);
                }
                Ok(Self::ZScore { mean, std, k })
            }
            StatisticalMethod::Iqr { multiplier } => {
                let sorted = sorted_copy(values);
                let q1 = quantile_sorted(&sorted, 0.25).ok_or(SkipReason::TooFewSamples)?;
                let q3 = quantile_sorted(&sorted, 0.75).ok_or(SkipReason::TooFewSamples)?;
                let iqr = q3 - q1;
                Ok(Self::Iqr {
                    q1,
                    q3,
                    lower: multiplier.mul_add(-iqr, q1),
                    upper: multiplier.mul_add(iqr, q3),
                })
            }
        }
    }

    pub fn is_outlier(&self, value: f64) -> bool {
        match *self {
            Self::ZScore { mean, std, k } => (value - mean).abs() > k * std,
            Self::Iqr { lower, upper, .. } => value < lower || value > upper,
        }
    }

    pub fn fence(&self) -> Fence {
        match *self {
            Self::ZScore { mean, std, k } => Fence {
                lower: k.mul_add(-std, mean),
                upper: k.mul_add(std, mean),
            },
            Self::Iqr { lower, upper, .. } => Fence { lower, upper },
        }
    }
}

// ============================================================================
// Descriptive layer statistics
// ============================================================================

/// Descriptive statistics of one curve inside one layer.
///
/// Value fields are `None` when the layer has no valid samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStatistics {
    pub layer: String,
    pub top: f64,
    pub base: f64,
    pub sample_count: usize,
    pub valid_count: usize,
    pub missing_count: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

impl LayerStatistics {
    /// Summarize `samples` (already restricted to the layer)
    pub fn describe(layer: &Layer, samples: &[Sample]) -> Self {
        let values: Vec<f64> = samples.iter().filter_map(|s| *s).collect();
        let sorted = sorted_copy(&values);
        let moments = mean_and_std(&values);

        Self {
            layer: layer.name.clone(),
            top: layer.top,
            base: layer.base,
            sample_count: samples.len(),
            valid_count: values.len(),
            missing_count: samples.len() - values.len(),
            mean: moments.map(|(m, _)| m),
            std_dev: moments.map(|(_, s)| s),
            min: sorted.first().copied(),
            q1: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q3: quantile_sorted(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_quantiles_match_linear_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(quantile_sorted(&sorted, 0.25).unwrap(), 1.75));
        assert!(approx(quantile_sorted(&sorted, 0.5).unwrap(), 2.5));
        assert!(approx(quantile_sorted(&sorted, 0.75).unwrap(), 3.25));
        assert_eq!(quantile_sorted(&sorted, 1.5), None);
        assert_eq!(quantile_sorted(&[], 0.5), None);
        assert_eq!(quantile_sorted(&[7.0], 0.25), Some(7.0));
    }

    #[test]
    fn test_population_std() {
        let (mean, std) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(approx(mean, 5.0));
        assert!(approx(std, 2.0));
    }

    #[test]
    fn test_zscore_threshold() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let t = Threshold::compute(StatisticalMethod::ZScore { k: 1.5 }, &values).unwrap();
        // mean 5, std 2 -> fence [2, 8]
        assert!(!t.is_outlier(2.1));
        assert!(!t.is_outlier(7.9));
        assert!(t.is_outlier(9.0));
        assert!(t.is_outlier(1.9));
        let fence = t.fence();
        assert!(approx(fence.lower, 2.0) && approx(fence.upper, 8.0));
    }

    #[test]
    fn test_zero_variance_disables_zscore() {
        let values = [3.3; 12];
        assert_eq!(
            Threshold::compute(StatisticalMethod::ZScore { k: 2.0 }, &values),
            Err(SkipReason::ZeroVariance)
        );
    }

    #[test]
    fn test_zero_iqr_still_fences() {
        let values = [5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 9.0];
        let t = Threshold::compute(StatisticalMethod::Iqr { multiplier: 1.5 }, &values).unwrap();
        assert!(t.is_outlier(9.0));
        assert!(!t.is_outlier(5.0));
    }

    #[test]
    fn test_iqr_threshold() {
        let values = [10.0, 12.0, 11.0, 13.0, 12.0, 11.0, 50.0, 12.0];
        let t = Threshold::compute(StatisticalMethod::Iqr { multiplier: 1.5 }, &values).unwrap();
        assert!(t.is_outlier(50.0));
        assert!(!t.is_outlier(10.0));
        assert!(!t.is_outlier(13.0));
    }

    #[test]
    fn test_empty_values_skip() {
        assert_eq!(
            Threshold::compute(StatisticalMethod::Iqr { multiplier: 1.5 }, &[]),
            Err(SkipReason::TooFewSamples)
        );
        assert_eq!(
            Threshold::compute(StatisticalMethod::None, &[1.0]),
            Err(SkipReason::NoMethod)
        );
    }

    #[test]
    fn test_describe_layer() {
        let layer = Layer::new("W-1", "Sand", 0.0, 10.0);
        let stats = LayerStatistics::describe(&layer, &[Some(1.0), None, Some(3.0), Some(2.0)]);

        assert_eq!(stats.sample_count, 4);
        assert_eq!(stats.valid_count, 3);
        assert_eq!(stats.missing_count, 1);
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(3.0));
        assert!(approx(stats.median.unwrap(), 2.0));
        assert!(approx(stats.mean.unwrap(), 2.0));
    }

    #[test]
    fn test_describe_all_missing_layer() {
        let layer = Layer::new("W-1", "Gap", 0.0, 10.0);
        let stats = LayerStatistics::describe(&layer, &[None, None]);
        assert_eq!(stats.valid_count, 0);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.q1, None);
    }
}
