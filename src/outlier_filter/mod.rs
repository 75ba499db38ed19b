//! Layered Outlier Filter
//!
//! Removes implausible samples from a well-log curve. Two kinds of rule are
//! applied:
//!
//! - **Prior bounds**: a fixed plausible range per curve type (caliper tied
//!   to bit size, density between 1 and 3 g/cm3, ...). Applied to every
//!   sample, inside or outside a layer.
//! - **Statistical rule**: z-score or IQR fences computed independently in
//!   each layer from that layer's surviving samples only.
//!
//! Removed samples become missing rather than being dropped, so the cleaned
//! curve stays aligned with the well's depth index. The input well is never
//! modified.
//!
//! ## Architecture
//! - `segmenter`: layer validation and depth partitioning
//! - `statistics`: z-score / IQR thresholds and descriptive layer statistics

pub mod segmenter;
pub mod statistics;

pub use segmenter::{LayerSegment, LayerSegmenter, Partition};
pub use statistics::{LayerStatistics, Threshold};

use thiserror::Error;
use tracing::{debug, info};

use crate::types::{
    CleaningReport, Curve, Layer, LayerSummary, OutlierRules, RemovedSample, RuleTag,
    RulePrecedence, Sample, SkipReason, Well,
};

/// Validation failures. All of them mean malformed input for one well.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("Unknown curve {curve} on well {well_id}")]
    UnknownCurve { well_id: String, curve: String },

    #[error("Invalid layer coverage for well {well_id}: {reason}")]
    LayerCoverage { well_id: String, reason: String },

    #[error("Curve {curve} on well {well_id} has no samples")]
    EmptyCurve { well_id: String, curve: String },
}

/// Clean `curve_name` on `well`. See [`LayeredOutlierFilter::filter_curve`].
pub fn filter_curve(
    well: &Well,
    curve_name: &str,
    layers: &[Layer],
    rules: &OutlierRules,
) -> Result<(Curve, CleaningReport), FilterError> {
    LayeredOutlierFilter::filter_curve(well, curve_name, layers, rules)
}

/// Per-layer descriptive statistics of `curve_name`.
/// See [`LayeredOutlierFilter::describe_layers`].
pub fn describe_layers(
    well: &Well,
    curve_name: &str,
    layers: &[Layer],
) -> Result<Vec<LayerStatistics>, FilterError> {
    LayeredOutlierFilter::describe_layers(well, curve_name, layers)
}

/// Layer-aware outlier filter
pub struct LayeredOutlierFilter;

impl LayeredOutlierFilter {
    /// Remove outliers from one curve of a well.
    ///
    /// Returns the cleaned curve (same length as the input, removed
    /// positions set to missing) and a report of every removed sample in
    /// depth order.
    ///
    /// # Errors
    /// - `UnknownCurve` if the well has no curve named `curve_name`
    /// - `LayerCoverage` if a layer is inverted or two layers overlap
    /// - `EmptyCurve` if the curve has no samples
    pub fn filter_curve(
        well: &Well,
        curve_name: &str,
        layers: &[Layer],
        rules: &OutlierRules,
    ) -> Result<(Curve, CleaningReport), FilterError> {
        let curve = Self::lookup(well, curve_name)?;
        let ignored_layers = layers.iter().filter(|l| l.well_id != well.id()).count();
        let layers = LayerSegmenter::validate(well.id(), layers)?;
        if curve.is_empty() {
            return Err(FilterError::EmptyCurve {
                well_id: well.id().to_string(),
                curve: curve_name.to_string(),
            });
        }

        let partition = LayerSegmenter::partition(well.depth(), &layers);
        let samples = curve.samples();
        let mut flags: Vec<Option<RuleTag>> = vec![None; samples.len()];

        // Prior bounds are physical, so they apply regardless of layer
        if let Some(bounds) = rules.prior_bounds {
            for (flag, sample) in flags.iter_mut().zip(samples) {
                if sample.is_some_and(|v| bounds.violates(v)) {
                    *flag = Some(RuleTag::Prior);
                }
            }
        }

        let summaries: Vec<LayerSummary> = partition
            .segments
            .iter()
            .map(|segment| Self::clean_layer(segment, samples, &mut flags, rules))
            .collect();

        let lookup = partition.segment_lookup(samples.len());
        let depth = well.depth();
        let mut removed: Vec<RemovedSample> = flags
            .iter()
            .enumerate()
            .filter_map(|(i, flag)| {
                let rule = (*flag)?;
                Some(RemovedSample {
                    index: i,
                    depth: depth[i],
                    original_value: samples[i]?,
                    rule,
                    layer: lookup[i].map(|seg| partition.segments[seg].layer.name.clone()),
                })
            })
            .collect();
        removed.sort_by(|a, b| a.depth.total_cmp(&b.depth));

        let indices: Vec<usize> = removed.iter().map(|r| r.index).collect();
        let cleaned = curve.masked(&indices);

        let report = CleaningReport {
            well_id: well.id().to_string(),
            curve: curve_name.to_string(),
            removed,
            layers: summaries,
            uncovered_samples: partition.uncovered.len(),
            ignored_layers,
        };

        info!(
            well = %report.well_id,
            curve = %report.curve,
            method = %rules.statistical_method,
            removed = report.removed_count(),
            prior = report.count_by(RuleTag::Prior),
            statistical = report.count_by(RuleTag::Statistical),
            ignored_layers,
            "Curve cleaned"
        );

        Ok((cleaned, report))
    }

    /// Descriptive statistics of a curve for every layer of the well
    pub fn describe_layers(
        well: &Well,
        curve_name: &str,
        layers: &[Layer],
    ) -> Result<Vec<LayerStatistics>, FilterError> {
        let curve = Self::lookup(well, curve_name)?;
        let layers = LayerSegmenter::validate(well.id(), layers)?;
        if curve.is_empty() {
            return Err(FilterError::EmptyCurve {
                well_id: well.id().to_string(),
                curve: curve_name.to_string(),
            });
        }

        let partition = LayerSegmenter::partition(well.depth(), &layers);
        Ok(partition
            .segments
            .iter()
            .map(|segment| {
                let layer_samples: Vec<Sample> =
                    segment.indices.iter().map(|&i| curve.get(i)).collect();
                LayerStatistics::describe(segment.layer, &layer_samples)
            })
            .collect())
    }

    fn lookup<'w>(well: &'w Well, curve_name: &str) -> Result<&'w Curve, FilterError> {
        well.curve(curve_name).ok_or_else(|| FilterError::UnknownCurve {
            well_id: well.id().to_string(),
            curve: curve_name.to_string(),
        })
    }

    /// Apply the statistical rule inside one layer.
    ///
    /// Thresholds are recomputed over the survivors until a pass removes
    /// nothing, so a second run over the cleaned curve finds no new outliers.
    fn clean_layer(
        segment: &LayerSegment<'_>,
        samples: &[Sample],
        flags: &mut [Option<RuleTag>],
        rules: &OutlierRules,
    ) -> LayerSummary {
        let layer = segment.layer;
        let mut summary = LayerSummary {
            layer: layer.name.clone(),
            top: layer.top,
            base: layer.base,
            sample_count: segment.indices.len(),
            valid_count: segment.indices.iter().filter(|&&i| samples[i].is_some()).count(),
            statistical_applied: false,
            skip_reason: None,
            fence: None,
            passes: 0,
            removed_prior: segment
                .indices
                .iter()
                .filter(|&&i| flags[i] == Some(RuleTag::Prior))
                .count(),
            removed_statistical: 0,
        };

        if segment.indices.is_empty() {
            summary.skip_reason = Some(SkipReason::NoSamples);
            return summary;
        }
        if rules.statistical_method.is_none() {
            summary.skip_reason = Some(SkipReason::NoMethod);
            return summary;
        }

        let mut survivors: Vec<usize> = segment
            .indices
            .iter()
            .copied()
            .filter(|&i| samples[i].is_some() && flags[i].is_none())
            .collect();

        if survivors.is_empty() || survivors.len() < rules.min_layer_samples {
            debug!(
                layer = %layer.name,
                survivors = survivors.len(),
                min = rules.min_layer_samples,
                "Too few samples for statistical rule"
            );
            summary.skip_reason = Some(SkipReason::TooFewSamples);
            return summary;
        }

        let mut last = None;
        loop {
            if rules
                .max_statistical_passes
                .is_some_and(|max| summary.passes >= max)
            {
                break;
            }

            let values: Vec<f64> = survivors.iter().filter_map(|&i| samples[i]).collect();
            let threshold = match Threshold::compute(rules.statistical_method, &values) {
                Ok(t) => t,
                Err(reason) => {
                    if last.is_none() {
                        debug!(layer = %layer.name, ?reason, "Statistical rule skipped");
                        summary.skip_reason = Some(reason);
                    }
                    break;
                }
            };
            summary.statistical_applied = true;
            last = Some(threshold);

            let (outliers, kept): (Vec<usize>, Vec<usize>) = std::mem::take(&mut survivors)
                .into_iter()
                .partition(|&i| samples[i].is_some_and(|v| threshold.is_outlier(v)));

            if outliers.is_empty() {
                break;
            }
            for &i in &outliers {
                flags[i] = Some(RuleTag::Statistical);
            }
            summary.removed_statistical += outliers.len();
            summary.passes += 1;
            survivors = kept;

            if survivors.len() < rules.min_layer_samples {
                break;
            }
        }

        if let Some(threshold) = last {
            summary.fence = Some(threshold.fence());

            if rules.precedence == RulePrecedence::StatisticalFirst {
                for &i in &segment.indices {
                    let outside = samples[i].is_some_and(|v| threshold.is_outlier(v));
                    if flags[i] == Some(RuleTag::Prior) && outside {
                        flags[i] = Some(RuleTag::Statistical);
                        summary.removed_prior -= 1;
                        summary.removed_statistical += 1;
                    }
                }
            }
        }

        debug!(
            layer = %layer.name,
            passes = summary.passes,
            removed_prior = summary.removed_prior,
            removed_statistical = summary.removed_statistical,
            "Layer cleaned"
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PriorBounds, StatisticalMethod};

    fn caliper_well() -> Well {
        Well::new("W-1", vec![1000.0, 1001.0, 1002.0, 1003.0, 1004.0])
            .unwrap()
            .with_curve(Curve::new(
                "CAL",
                vec![Some(12.2), Some(12.3), Some(40.0), Some(12.25), Some(12.1)],
            ))
            .unwrap()
    }

    fn full_layer() -> Vec<Layer> {
        vec![Layer::new("W-1", "All", 1000.0, 1005.0)]
    }

    #[test]
    fn test_caliper_prior_bounds() {
        let rules = OutlierRules::default().with_prior_bounds(PriorBounds::new(12.0, 12.5));
        let (cleaned, report) =
            filter_curve(&caliper_well(), "CAL", &full_layer(), &rules).unwrap();

        assert_eq!(
            cleaned.samples(),
            &[Some(12.2), Some(12.3), None, Some(12.25), Some(12.1)]
        );
        assert_eq!(report.removed_count(), 1);
        let entry = &report.removed[0];
        assert_eq!(entry.depth, 1002.0);
        assert_eq!(entry.original_value, 40.0);
        assert_eq!(entry.rule, RuleTag::Prior);
        assert_eq!(entry.layer.as_deref(), Some("All"));
    }

    #[test]
    fn test_unknown_curve() {
        let err = filter_curve(&caliper_well(), "GR", &full_layer(), &OutlierRules::default())
            .unwrap_err();
        assert!(matches!(err, FilterError::UnknownCurve { .. }));
    }

    #[test]
    fn test_empty_curve() {
        let well = Well::new("W-0", vec![])
            .unwrap()
            .with_curve(Curve::new("GR", vec![]))
            .unwrap();
        let err = filter_curve(&well, "GR", &[], &OutlierRules::default()).unwrap_err();
        assert!(matches!(err, FilterError::EmptyCurve { .. }));
    }

    #[test]
    fn test_small_layer_exempt_from_statistics() {
        let rules = OutlierRules::default()
            .with_statistical_method(StatisticalMethod::ZScore { k: 2.0 })
            .with_min_layer_samples(5);
        let well = Well::new("W-1", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_curve(Curve::new("GR", vec![Some(50.0), Some(51.0), Some(500.0)]))
            .unwrap();
        let layers = vec![Layer::new("W-1", "Thin", 0.0, 10.0)];

        let (cleaned, report) = filter_curve(&well, "GR", &layers, &rules).unwrap();
        assert!(report.is_clean());
        assert_eq!(cleaned, *well.curve("GR").unwrap());
        assert_eq!(report.layers[0].skip_reason, Some(SkipReason::TooFewSamples));
    }

    #[test]
    fn test_statistical_first_precedence_retags() {
        let mut values = vec![Some(50.0); 20];
        values[3] = Some(52.0);
        values[7] = Some(48.0);
        values[10] = Some(900.0);
        let depth: Vec<f64> = (0..20).map(f64::from).collect();
        let well = Well::new("W-1", depth)
            .unwrap()
            .with_curve(Curve::new("GR", values))
            .unwrap();
        let layers = vec![Layer::new("W-1", "L", 0.0, 20.0)];
        let base = OutlierRules::default()
            .with_prior_bounds(PriorBounds::new(0.0, 300.0))
            .with_statistical_method(StatisticalMethod::Iqr { multiplier: 1.5 });

        let (_, report) = filter_curve(&well, "GR", &layers, &base).unwrap();
        let sample = report.removed.iter().find(|r| r.index == 10).unwrap();
        assert_eq!(sample.rule, RuleTag::Prior);

        let rules = base.with_precedence(RulePrecedence::StatisticalFirst);
        let (_, report) = filter_curve(&well, "GR", &layers, &rules).unwrap();
        let sample = report.removed.iter().find(|r| r.index == 10).unwrap();
        assert_eq!(sample.rule, RuleTag::Statistical);
        assert_eq!(report.layers[0].removed_prior, 0);
    }

    #[test]
    fn test_report_sorted_by_depth_for_unsorted_index() {
        let well = Well::new("W-1", vec![3.0, 1.0, 2.0])
            .unwrap()
            .with_curve(Curve::new("DEN", vec![Some(5.0), Some(0.2), Some(2.4)]))
            .unwrap();
        let rules = OutlierRules::default().with_prior_bounds(PriorBounds::new(1.0, 3.0));

        let (_, report) = filter_curve(&well, "DEN", &[], &rules).unwrap();
        assert_eq!(report.removed_depths(), vec![1.0, 3.0]);
        assert_eq!(report.uncovered_samples, 3);
        assert!(report.removed.iter().all(|r| r.layer.is_none()));
    }

    #[test]
    fn test_describe_layers() {
        let stats = describe_layers(&caliper_well(), "CAL", &full_layer()).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].valid_count, 5);
        assert_eq!(stats[0].max, Some(40.0));
    }
}
