//! Cleaning stage abstraction.
//!
//! Provides a unified trait for the steps a well passes through between
//! import and hand-off: null-sentinel normalisation, truncation to the
//! interpreted interval and outlier removal. Every stage reads a well and
//! returns a new one.

use thiserror::Error;
use tracing::debug;

use crate::config::QcConfig;
use crate::outlier_filter::{FilterError, LayeredOutlierFilter};
use crate::types::{CleaningReport, Curve, Layer, Well, WellError};

/// Failure inside a single stage
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Well(#[from] WellError),
}

/// What a stage hands to the next one
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub well: Well,
    pub reports: Vec<CleaningReport>,
}

impl StageOutput {
    /// Output that forwards `well` unchanged
    pub fn unchanged(well: &Well) -> Self {
        Self {
            well: well.clone(),
            reports: Vec::new(),
        }
    }
}

/// Trait abstracting one pure step of the cleaning pipeline.
///
/// Implementations must not depend on anything but their inputs, so the
/// same well and layers always give the same output.
pub trait CleaningStage: Send + Sync {
    /// Human-readable name for logging (e.g. "truncate", "outliers").
    fn name(&self) -> &str;

    /// Run the stage over one well and its layers.
    fn apply(&self, well: &Well, layers: &[Layer]) -> Result<StageOutput, StageError>;
}

// ============================================================================
// Null sentinels
// ============================================================================

/// Turns loader sentinel values (`-999.25` and friends) into missing samples
pub struct NullValueStage {
    null_value: f64,
}

impl NullValueStage {
    pub fn new(null_value: f64) -> Self {
        Self { null_value }
    }
}

impl CleaningStage for NullValueStage {
    fn name(&self) -> &str {
        "nulls"
    }

    fn apply(&self, well: &Well, _layers: &[Layer]) -> Result<StageOutput, StageError> {
        let mut current = well.clone();
        for curve in well.curves() {
            let raw = curve.to_raw(f64::NAN);
            let normalized = Curve::from_raw(curve.name.clone(), &raw, self.null_value)
                .with_unit(curve.unit.clone());
            let nulled = curve.valid_count() - normalized.valid_count();
            if nulled > 0 {
                debug!(well = %well.id(), curve = %curve.name, nulled, "Null sentinels set to missing");
                current = current.replace_curve(normalized)?;
            }
        }
        Ok(StageOutput {
            well: current,
            reports: Vec::new(),
        })
    }
}

// ============================================================================
// Truncation
// ============================================================================

/// Cuts a well down to the span of its layers plus a padding margin
pub struct TruncateStage {
    padding: f64,
}

impl TruncateStage {
    pub fn new(padding: f64) -> Self {
        Self { padding }
    }
}

impl CleaningStage for TruncateStage {
    fn name(&self) -> &str {
        "truncate"
    }

    fn apply(&self, well: &Well, layers: &[Layer]) -> Result<StageOutput, StageError> {
        let own = layers.iter().filter(|l| l.well_id == well.id());
        let span = own.fold(None, |acc: Option<(f64, f64)>, l| {
            Some(acc.map_or((l.top, l.base), |(top, base)| (top.min(l.top), base.max(l.base))))
        });

        let Some((top, base)) = span else {
            debug!(well = %well.id(), "No layers, truncation skipped");
            return Ok(StageOutput::unchanged(well));
        };

        let truncated = well.truncate(top - self.padding, base + self.padding);
        debug!(
            well = %well.id(),
            before = well.depth().len(),
            after = truncated.depth().len(),
            "Well truncated to layer span"
        );
        Ok(StageOutput {
            well: truncated,
            reports: Vec::new(),
        })
    }
}

// ============================================================================
// Outlier removal
// ============================================================================

/// Runs the layered outlier filter over the configured curves of a well
pub struct OutlierStage {
    config: QcConfig,
}

impl OutlierStage {
    pub fn new(config: QcConfig) -> Self {
        Self { config }
    }

    /// Curves this stage cleans on `well`: the configured list, or every
    /// curve when the list is empty
    fn target_curves(&self, well: &Well) -> Vec<String> {
        if self.config.pipeline.curves.is_empty() {
            well.curve_names().map(str::to_string).collect()
        } else {
            self.config.pipeline.curves.clone()
        }
    }
}

impl CleaningStage for OutlierStage {
    fn name(&self) -> &str {
        "outliers"
    }

    fn apply(&self, well: &Well, layers: &[Layer]) -> Result<StageOutput, StageError> {
        let mut current = well.clone();
        let mut reports = Vec::new();

        for curve in self.target_curves(well) {
            let rules = self.config.rules_for(&curve);
            if rules.is_noop() {
                debug!(well = %well.id(), curve = %curve, "No rule applies, curve passed through");
                continue;
            }
            let (cleaned, report) =
                LayeredOutlierFilter::filter_curve(&current, &curve, layers, &rules)?;
            current = current.replace_curve(cleaned)?;
            reports.push(report);
        }

        Ok(StageOutput {
            well: current,
            reports,
        })
    }
}
