//! Layer validation and depth-index partitioning
//!
//! Splits a well's depth index into one segment per layer so statistics are
//! never pooled across layers with different lithology.

use tracing::warn;

use super::FilterError;
use crate::types::Layer;

/// Depth indices of a well that fall inside one layer
#[derive(Debug, Clone)]
pub struct LayerSegment<'a> {
    pub layer: &'a Layer,
    /// Positions in the depth index, ascending
    pub indices: Vec<usize>,
}

/// Result of partitioning a depth index by layers
#[derive(Debug, Clone)]
pub struct Partition<'a> {
    /// One segment per layer, in top-to-bottom order (possibly empty)
    pub segments: Vec<LayerSegment<'a>>,
    /// Positions covered by no layer
    pub uncovered: Vec<usize>,
}

impl Partition<'_> {
    /// Segment position for every depth sample, `None` when uncovered
    pub fn segment_lookup(&self, len: usize) -> Vec<Option<usize>> {
        let mut lookup = vec![None; len];
        for (seg, segment) in self.segments.iter().enumerate() {
            for &i in &segment.indices {
                lookup[i] = Some(seg);
            }
        }
        lookup
    }
}

/// Layer validator and depth segmenter
pub struct LayerSegmenter;

impl LayerSegmenter {
    /// Check that the well's layers form a valid coverage.
    ///
    /// Every layer needs finite `top < base` and no two layers may share
    /// depth. Layers tagged with a different well are ignored. Returns the
    /// remaining layers sorted by top.
    pub fn validate<'a>(well_id: &str, layers: &'a [Layer]) -> Result<Vec<&'a Layer>, FilterError> {
        let mut own = Vec::with_capacity(layers.len());
        for layer in layers {
            if layer.well_id != well_id {
                warn!(
                    well = %well_id,
                    layer = %layer.name,
                    layer_well = %layer.well_id,
                    "Ignoring layer that belongs to another well"
                );
                continue;
            }
            if !layer.top.is_finite() || !layer.base.is_finite() || layer.top >= layer.base {
                return Err(FilterError::LayerCoverage {
                    well_id: well_id.to_string(),
                    reason: format!(
                        "layer {} has top {} not above base {}",
                        layer.name, layer.top, layer.base
                    ),
                });
            }
            own.push(layer);
        }

        own.sort_by(|a, b| a.top.total_cmp(&b.top));
        for pair in own.windows(2) {
            if pair[0].overlaps(pair[1]) {
                return Err(FilterError::LayerCoverage {
                    well_id: well_id.to_string(),
                    reason: format!(
                        "layers {} [{}, {}) and {} [{}, {}) overlap",
                        pair[0].name, pair[0].top, pair[0].base, pair[1].name, pair[1].top, pair[1].base
                    ),
                });
            }
        }
        Ok(own)
    }

    /// Assign every depth sample to the layer containing it.
    ///
    /// `layers` must come from [`LayerSegmenter::validate`] (sorted,
    /// disjoint). The depth index does not need to be sorted.
    pub fn partition<'a>(depth: &[f64], layers: &[&'a Layer]) -> Partition<'a> {
        let mut segments: Vec<LayerSegment<'a>> = layers
            .iter()
            .map(|&layer| LayerSegment {
                layer,
                indices: Vec::new(),
            })
            .collect();
        let mut uncovered = Vec::new();

        for (i, &d) in depth.iter().enumerate() {
            // Last layer whose top is at or above this depth
            let candidate = layers.partition_point(|l| l.top <= d);
            match candidate.checked_sub(1) {
                Some(seg) if layers[seg].contains(d) => segments[seg].indices.push(i),
                _ => uncovered.push(i),
            }
        }

        Partition { segments, uncovered }
    }
}
