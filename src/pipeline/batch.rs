//! Parallel batch cleaning across wells.
//!
//! Wells share no state, so they are mapped in parallel with rayon. A
//! well that fails validation is logged and recorded; the rest of the
//! batch carries on.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::{Pipeline, PipelineOutcome};
use crate::types::{LayerTable, Well};

/// Outcome for one well of a batch
#[derive(Debug, Clone)]
pub enum WellOutcome {
    Cleaned(PipelineOutcome),
    Failed { well_id: String, error: String },
}

impl WellOutcome {
    pub fn well_id(&self) -> &str {
        match self {
            Self::Cleaned(outcome) => outcome.well.id(),
            Self::Failed { well_id, .. } => well_id,
        }
    }

    pub fn is_cleaned(&self) -> bool {
        matches!(self, Self::Cleaned(_))
    }
}

/// Counts for a finished batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub wells: usize,
    pub cleaned: usize,
    pub failed: usize,
    pub removed_samples: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[WellOutcome]) -> Self {
        let mut summary = Self {
            wells: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                WellOutcome::Cleaned(o) => {
                    summary.cleaned += 1;
                    summary.removed_samples += o.removed_count();
                }
                WellOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// Run `pipeline` over every well with its own layers from `table`.
///
/// Outcomes are returned in input order.
pub fn run_batch(pipeline: &Pipeline, wells: &[Well], table: &LayerTable) -> Vec<WellOutcome> {
    let outcomes: Vec<WellOutcome> = wells
        .par_iter()
        .map(|well| {
            let layers = table.for_well(well.id());
            match pipeline.run(well, &layers) {
                Ok(outcome) => WellOutcome::Cleaned(outcome),
                Err(e) => {
                    warn!(well = %well.id(), error = %e, "Well skipped");
                    WellOutcome::Failed {
                        well_id: well.id().to_string(),
                        error: e.to_string(),
                    }
                }
            }
        })
        .collect();

    let summary = BatchSummary::from_outcomes(&outcomes);
    info!(
        wells = summary.wells,
        cleaned = summary.cleaned,
        failed = summary.failed,
        removed = summary.removed_samples,
        "Batch complete"
    );
    outcomes
}
