//! Cleaning Pipeline Module
//!
//! ```text
//! STAGE 1: Nulls               - loader sentinel values become missing
//! STAGE 2: Truncate (optional) - cut the well to the layer span + padding
//! STAGE 3: Outliers            - layered outlier filter on every target curve
//! ```
//!
//! Stages are pure: each one takes a well and returns a new well plus its
//! cleaning reports. `Pipeline::run` threads one well through the stages in
//! order; `batch::run_batch` does that for many wells in parallel and
//! keeps going when a well fails.

pub mod batch;
pub mod stage;

pub use batch::{run_batch, BatchSummary, WellOutcome};
pub use stage::{
    CleaningStage, NullValueStage, OutlierStage, StageError, StageOutput, TruncateStage,
};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::QcConfig;
use crate::types::{CleaningReport, Layer, Well};

/// A stage failed for one well
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Stage '{stage}' failed for well {well_id}: {source}")]
pub struct PipelineError {
    pub stage: String,
    pub well_id: String,
    #[source]
    pub source: StageError,
}

/// Result of running every stage over one well
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub well: Well,
    pub reports: Vec<CleaningReport>,
}

impl PipelineOutcome {
    pub fn removed_count(&self) -> usize {
        self.reports.iter().map(CleaningReport::removed_count).sum()
    }
}

/// Ordered list of cleaning stages
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn CleaningStage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard pipeline for a config: null sentinels, optional truncation,
    /// then outliers
    pub fn from_config(config: &QcConfig) -> Self {
        let mut pipeline = Self::new().with_stage(NullValueStage::new(config.pipeline.null_value));
        if config.pipeline.truncate_to_layers {
            pipeline = pipeline.with_stage(TruncateStage::new(config.pipeline.truncate_padding_m));
        }
        pipeline.with_stage(OutlierStage::new(config.clone()))
    }

    #[must_use]
    pub fn with_stage(mut self, stage: impl CleaningStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run all stages over one well. The input well is not modified.
    pub fn run(&self, well: &Well, layers: &[Layer]) -> Result<PipelineOutcome, PipelineError> {
        let mut current = well.clone();
        let mut reports = Vec::new();

        for stage in &self.stages {
            let output = stage.apply(&current, layers).map_err(|source| PipelineError {
                stage: stage.name().to_string(),
                well_id: well.id().to_string(),
                source,
            })?;
            debug!(
                well = %well.id(),
                stage = stage.name(),
                reports = output.reports.len(),
                "Stage complete"
            );
            current = output.well;
            reports.extend(output.reports);
        }

        let outcome = PipelineOutcome {
            well: current,
            reports,
        };
        info!(
            well = %well.id(),
            curves = outcome.reports.len(),
            removed = outcome.removed_count(),
            "Well cleaned"
        );
        Ok(outcome)
    }
}
