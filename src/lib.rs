//! well-log-qc: Layer-aware well-log cleaning
//!
//! Cleans petrophysical log curves (GR, CAL, DT, DEN, ...) before they are
//! used for layer statistics and seismic-to-well ties.
//!
//! ## Architecture
//!
//! - **Types**: Curves with a missing-value sentinel, wells sharing one depth
//!   index, layers from horizon tables, outlier rules and cleaning reports
//! - **Outlier Filter**: prior bounds plus per-layer z-score / IQR removal
//! - **Config**: TOML rule tables with typo detection and range checks
//! - **Pipeline**: pure cleaning stages, batch-parallel across wells

pub mod config;
pub mod outlier_filter;
pub mod pipeline;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, QcConfig};

// Re-export commonly used types
pub use types::{
    CleaningReport, Curve, HorizonPick, Layer, LayerTable, OutlierRules, PriorBounds,
    RemovedSample, RulePrecedence, RuleTag, Sample, StatisticalMethod, Well, WellError, LAS_NULL,
};

// Re-export the filter
pub use outlier_filter::{
    describe_layers, filter_curve, FilterError, LayerStatistics, LayeredOutlierFilter,
};

// Re-export pipeline components
pub use pipeline::{
    run_batch, BatchSummary, CleaningStage, Pipeline, PipelineError, PipelineOutcome, WellOutcome,
};
