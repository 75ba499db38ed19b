//! Cleaning reports produced by the layered outlier filter

use serde::{Deserialize, Serialize};

/// Rule responsible for removing a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTag {
    Prior,
    Statistical,
}

impl std::fmt::Display for RuleTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleTag::Prior => write!(f, "prior"),
            RuleTag::Statistical => write!(f, "statistical"),
        }
    }
}

/// One sample set to missing by a cleaning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedSample {
    /// Position in the well's depth index
    pub index: usize,
    pub depth: f64,
    pub original_value: f64,
    pub rule: RuleTag,
    /// Layer containing the sample, if any
    pub layer: Option<String>,
}

/// Why a layer did not get a statistical rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No statistical method configured
    NoMethod,
    /// The layer contains no depth samples of this well
    NoSamples,
    /// Fewer surviving samples than `min_layer_samples`
    TooFewSamples,
    /// Constant curve in the layer, so the z-score is undefined
    ZeroVariance,
}

/// Final statistical fences used inside a layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fence {
    pub lower: f64,
    pub upper: f64,
}

/// Per-layer outcome of a cleaning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub layer: String,
    pub top: f64,
    pub base: f64,
    /// Depth samples inside the layer
    pub sample_count: usize,
    /// Non-missing samples inside the layer before cleaning
    pub valid_count: usize,
    pub statistical_applied: bool,
    pub skip_reason: Option<SkipReason>,
    pub fence: Option<Fence>,
    /// Statistical passes that removed at least one sample
    pub passes: usize,
    pub removed_prior: usize,
    pub removed_statistical: usize,
}

/// What one `filter_curve` call removed, and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub well_id: String,
    pub curve: String,
    /// Removed samples ordered by depth ascending
    pub removed: Vec<RemovedSample>,
    /// One entry per validated layer, top to bottom
    pub layers: Vec<LayerSummary>,
    /// Samples not covered by any layer
    pub uncovered_samples: usize,
    /// Layers passed in for other wells and left out of the run
    #[serde(default)]
    pub ignored_layers: usize,
}

impl CleaningReport {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn count_by(&self, rule: RuleTag) -> usize {
        self.removed.iter().filter(|r| r.rule == rule).count()
    }

    pub fn is_clean(&self) -> bool {
        self.removed.is_empty()
    }

    pub fn removed_depths(&self) -> Vec<f64> {
        self.removed.iter().map(|r| r.depth).collect()
    }

    pub fn layer(&self, name: &str) -> Option<&LayerSummary> {
        self.layers.iter().find(|l| l.layer == name)
    }
}
