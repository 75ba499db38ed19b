//! Depth-indexed log curves and the wells that own them

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Null value written by most LAS exporters (`~W NULL. -999.25`)
pub const LAS_NULL: f64 = -999.25;

/// A single curve sample. `None` is the missing-value sentinel.
pub type Sample = Option<f64>;

/// Errors raised while assembling a well
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WellError {
    #[error("Curve {curve} has {actual} samples but well {well_id} has {expected} depth samples")]
    LengthMismatch {
        well_id: String,
        curve: String,
        expected: usize,
        actual: usize,
    },

    #[error("Well {well_id} has a non-finite depth at index {index}")]
    NonFiniteDepth { well_id: String, index: usize },

    #[error("Well {well_id} already has a curve named {curve}")]
    DuplicateCurve { well_id: String, curve: String },
}

// ============================================================================
// Curve
// ============================================================================

/// A named, ordered sequence of log samples (GR, CAL, DT, DEN, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// Curve mnemonic as it appears in the source file
    pub name: String,
    /// Measurement unit, informational only
    #[serde(default)]
    pub unit: String,
    #[serde(deserialize_with = "deserialize_samples")]
    samples: Vec<Sample>,
}

/// NaN and infinities carry no measurement, so they are stored as missing.
fn finite_only(samples: Vec<Sample>) -> Vec<Sample> {
    samples
        .into_iter()
        .map(|s| s.filter(|v| v.is_finite()))
        .collect()
}

fn deserialize_samples<'de, D>(deserializer: D) -> Result<Vec<Sample>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Vec::<Sample>::deserialize(deserializer).map(finite_only)
}

impl Curve {
    /// Create a curve; `Some(NaN)` and `Some(±inf)` are stored as `None`.
    pub fn new(name: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            name: name.into(),
            unit: String::new(),
            samples: finite_only(samples),
        }
    }

    /// Build a curve from raw loader output.
    ///
    /// Values equal to `null_value`, NaN and infinities become missing.
    pub fn from_raw(name: impl Into<String>, raw: &[f64], null_value: f64) -> Self {
        let samples = raw
            .iter()
            .map(|&v| {
                if !v.is_finite() || v == null_value {
                    None
                } else {
                    Some(v)
                }
            })
            .collect();
        Self::new(name, samples)
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Export back to a flat array, writing `null_value` for missing samples
    pub fn to_raw(&self, null_value: f64) -> Vec<f64> {
        self.samples.iter().map(|s| s.unwrap_or(null_value)).collect()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn get(&self, index: usize) -> Sample {
        self.samples.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of non-missing samples
    pub fn valid_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_some()).count()
    }

    /// Copy of this curve with the given positions set to missing.
    ///
    /// Length and ordering are preserved so the curve stays aligned with
    /// the well's depth index.
    #[must_use]
    pub fn masked(&self, indices: &[usize]) -> Self {
        let mut samples = self.samples.clone();
        for &i in indices {
            if let Some(slot) = samples.get_mut(i) {
                *slot = None;
            }
        }
        Self {
            name: self.name.clone(),
            unit: self.unit.clone(),
            samples,
        }
    }

    /// Copy holding only the samples at `indices`, in the order given
    fn select(&self, indices: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            unit: self.unit.clone(),
            samples: indices.iter().filter_map(|&i| self.samples.get(i).copied()).collect(),
        }
    }
}

// ============================================================================
// Well
// ============================================================================

/// Raw well record as it appears in a serialized stage file
#[derive(Deserialize)]
struct WellRecord {
    id: String,
    depth: Vec<f64>,
    #[serde(default)]
    curves: Vec<Curve>,
}

/// A well: identifier, a depth index, and the curves sampled on it.
///
/// Every curve shares the well's depth axis, so all curves have exactly
/// `depth.len()` samples. Deserialization goes through the same checks as
/// [`Well::new`] and [`Well::with_curve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WellRecord")]
pub struct Well {
    id: String,
    depth: Vec<f64>,
    #[serde(serialize_with = "serialize_curves")]
    curves: BTreeMap<String, Curve>,
}

fn serialize_curves<S>(curves: &BTreeMap<String, Curve>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(curves.values())
}

impl TryFrom<WellRecord> for Well {
    type Error = WellError;

    fn try_from(record: WellRecord) -> Result<Self, Self::Error> {
        let mut well = Self::new(record.id, record.depth)?;
        for curve in record.curves {
            well = well.with_curve(curve)?;
        }
        Ok(well)
    }
}

impl Well {
    /// Create a well with a depth index and no curves
    pub fn new(id: impl Into<String>, depth: Vec<f64>) -> Result<Self, WellError> {
        let id = id.into();
        if let Some(index) = depth.iter().position(|d| !d.is_finite()) {
            return Err(WellError::NonFiniteDepth { well_id: id, index });
        }
        Ok(Self {
            id,
            depth,
            curves: BTreeMap::new(),
        })
    }

    /// Add a curve sampled on this well's depth index
    pub fn with_curve(mut self, curve: Curve) -> Result<Self, WellError> {
        self.check_length(&curve)?;
        if self.curves.contains_key(&curve.name) {
            return Err(WellError::DuplicateCurve {
                well_id: self.id,
                curve: curve.name,
            });
        }
        self.curves.insert(curve.name.clone(), curve);
        Ok(self)
    }

    /// New well identical to this one except for `curve`, which replaces
    /// (or adds) the curve of the same name. `self` is left untouched.
    pub fn replace_curve(&self, curve: Curve) -> Result<Self, WellError> {
        self.check_length(&curve)?;
        let mut next = self.clone();
        next.curves.insert(curve.name.clone(), curve);
        Ok(next)
    }

    /// New well restricted to samples with `top <= depth <= base`.
    ///
    /// Each depth is tested on its own, so the index need not be sorted and
    /// kept samples stay in their original order. Depths outside the window
    /// are dropped from every curve together.
    #[must_use]
    pub fn truncate(&self, top: f64, base: f64) -> Self {
        let keep: Vec<usize> = self
            .depth
            .iter()
            .enumerate()
            .filter(|&(_, &d)| top <= d && d <= base)
            .map(|(i, _)| i)
            .collect();

        Self {
            id: self.id.clone(),
            depth: keep.iter().map(|&i| self.depth[i]).collect(),
            curves: self
                .curves
                .iter()
                .map(|(name, c)| (name.clone(), c.select(&keep)))
                .collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn depth(&self) -> &[f64] {
        &self.depth
    }

    pub fn curve(&self, name: &str) -> Option<&Curve> {
        self.curves.get(name)
    }

    /// Curve names in sorted order
    pub fn curve_names(&self) -> impl Iterator<Item = &str> {
        self.curves.keys().map(String::as_str)
    }

    pub fn curves(&self) -> impl Iterator<Item = &Curve> {
        self.curves.values()
    }

    fn check_length(&self, curve: &Curve) -> Result<(), WellError> {
        if curve.len() == self.depth.len() {
            Ok(())
        } else {
            Err(WellError::LengthMismatch {
                well_id: self.id.clone(),
                curve: curve.name.clone(),
                expected: self.depth.len(),
                actual: curve.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_well() -> Well {
        Well::new("W-1", vec![1000.0, 1000.5, 1001.0, 1001.5, 1002.0])
            .unwrap()
            .with_curve(Curve::from_raw("GR", &[45.0, 50.0, LAS_NULL, 60.0, 65.0], LAS_NULL))
            .unwrap()
    }

    #[test]
    fn test_from_raw_maps_null_and_non_finite_to_missing() {
        let curve = Curve::from_raw("DT", &[80.0, LAS_NULL, f64::NAN, f64::INFINITY, 90.0], LAS_NULL);
        assert_eq!(curve.samples(), &[Some(80.0), None, None, None, Some(90.0)]);
        assert_eq!(curve.valid_count(), 2);
        assert_eq!(curve.to_raw(LAS_NULL), vec![80.0, LAS_NULL, LAS_NULL, LAS_NULL, 90.0]);
    }

    #[test]
    fn test_new_stores_non_finite_as_missing() {
        let curve = Curve::new("GR", vec![Some(40.0), Some(f64::NAN), Some(f64::INFINITY), None]);
        assert_eq!(curve.samples(), &[Some(40.0), None, None, None]);
        assert_eq!(curve.valid_count(), 1);
    }

    #[test]
    fn test_curve_length_must_match_depth() {
        let result = Well::new("W-1", vec![1.0, 2.0])
            .unwrap()
            .with_curve(Curve::new("GR", vec![Some(1.0)]));
        assert!(matches!(
            result,
            Err(WellError::LengthMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_curve_rejected() {
        let result = sample_well().with_curve(Curve::new("GR", vec![None; 5]));
        assert!(matches!(result, Err(WellError::DuplicateCurve { .. })));
    }

    #[test]
    fn test_non_finite_depth_rejected() {
        let result = Well::new("W-1", vec![1.0, f64::NAN]);
        assert_eq!(
            result,
            Err(WellError::NonFiniteDepth { well_id: "W-1".to_string(), index: 1 })
        );
    }

    #[test]
    fn test_replace_curve_leaves_original_untouched() {
        let well = sample_well();
        let cleaned = well.curve("GR").unwrap().masked(&[0]);
        let next = well.replace_curve(cleaned).unwrap();

        assert_eq!(well.curve("GR").unwrap().get(0), Some(45.0));
        assert_eq!(next.curve("GR").unwrap().get(0), None);
        assert_eq!(next.depth(), well.depth());
    }

    #[test]
    fn test_truncate_keeps_curves_aligned() {
        let well = sample_well();
        let cut = well.truncate(1000.5, 1001.5);

        assert_eq!(cut.depth(), &[1000.5, 1001.0, 1001.5]);
        assert_eq!(cut.curve("GR").unwrap().samples(), &[Some(50.0), None, Some(60.0)]);
    }

    #[test]
    fn test_truncate_unsorted_depth_keeps_original_order() {
        let well = Well::new("W-3", vec![1002.0, 1000.0, 1001.0, 1003.0])
            .unwrap()
            .with_curve(Curve::new("GR", vec![Some(1.0), Some(2.0), None, Some(4.0)]))
            .unwrap();
        let cut = well.truncate(1000.5, 1002.0);

        assert_eq!(cut.depth(), &[1002.0, 1001.0]);
        assert_eq!(cut.curve("GR").unwrap().samples(), &[Some(1.0), None]);
    }

    #[test]
    fn test_truncate_outside_range_is_empty() {
        let cut = sample_well().truncate(2000.0, 3000.0);
        assert!(cut.depth().is_empty());
        assert!(cut.curve("GR").unwrap().is_empty());
    }

    #[test]
    fn test_deserialize_validates_lengths() {
        let json = r#"{"id":"W-2","depth":[1.0,2.0],"curves":[{"name":"GR","samples":[1.0]}]}"#;
        assert!(serde_json::from_str::<Well>(json).is_err());

        let json = r#"{"id":"W-2","depth":[1.0,2.0],"curves":[{"name":"GR","samples":[1.0,null]}]}"#;
        let well: Well = serde_json::from_str(json).unwrap();
        assert_eq!(well.curve("GR").unwrap().samples(), &[Some(1.0), None]);
    }

    #[test]
    fn test_serialize_round_trips_through_validation() {
        let well = sample_well();
        let json = serde_json::to_string(&well).unwrap();
        let back: Well = serde_json::from_str(&json).unwrap();
        assert_eq!(back, well);
    }
}
