//! Stratigraphic layers (horizon intervals) and the tables they come from

use serde::{Deserialize, Serialize};

/// A named depth interval `[top, base)` inside one well
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub well_id: String,
    #[serde(rename = "layer_name")]
    pub name: String,
    pub top: f64,
    pub base: f64,
}

impl Layer {
    pub fn new(well_id: impl Into<String>, name: impl Into<String>, top: f64, base: f64) -> Self {
        Self {
            well_id: well_id.into(),
            name: name.into(),
            top,
            base,
        }
    }

    /// Half-open membership test: the top is inside, the base is not
    pub fn contains(&self, depth: f64) -> bool {
        depth >= self.top && depth < self.base
    }

    /// True when the two intervals share any depth
    pub fn overlaps(&self, other: &Self) -> bool {
        self.top < other.base && other.top < self.base
    }
}

/// One interpreted surface pick: the measured depth at which a horizon
/// crosses a well
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonPick {
    pub well: String,
    pub md: f64,
    pub surface: String,
}

/// All layers of a project, across wells
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerTable {
    layers: Vec<Layer>,
}

impl LayerTable {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    /// Build layers from a horizon pick table.
    ///
    /// Within each well the picks are sorted by depth; every pick opens a
    /// layer named after its surface that runs down to the next pick. The
    /// deepest pick of a well only closes the layer above it.
    pub fn from_picks(picks: &[HorizonPick]) -> Self {
        let mut sorted: Vec<&HorizonPick> = picks.iter().filter(|p| p.md.is_finite()).collect();
        sorted.sort_by(|a, b| a.well.cmp(&b.well).then(a.md.total_cmp(&b.md)));

        let layers = sorted
            .windows(2)
            .filter(|w| w[0].well == w[1].well && w[1].md > w[0].md)
            .map(|w| Layer::new(&w[0].well, &w[0].surface, w[0].md, w[1].md))
            .collect();

        Self { layers }
    }

    /// Layers belonging to `well_id`, ordered by top depth
    pub fn for_well(&self, well_id: &str) -> Vec<Layer> {
        let mut layers: Vec<Layer> = self
            .layers
            .iter()
            .filter(|l| l.well_id == well_id)
            .cloned()
            .collect();
        layers.sort_by(|a, b| a.top.total_cmp(&b.top));
        layers
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
