//! Outlier rule definitions: prior bounds and statistical criteria

use serde::{Deserialize, Serialize};

/// Default minimum surviving samples before a layer gets a statistical rule
pub const DEFAULT_MIN_LAYER_SAMPLES: usize = 10;

/// Physically plausible value range for a curve type.
///
/// Either side may be open. A value strictly below `min` or strictly above
/// `max` is implausible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl PriorBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Caliper bounds: the hole cannot be narrower than the bit, and a hole
    /// wider than `bit_size + tolerance` is washed out
    pub fn caliper(bit_size: f64, tolerance: f64) -> Self {
        Self::new(bit_size, bit_size + tolerance)
    }

    pub fn violates(&self, value: f64) -> bool {
        self.min.is_some_and(|min| value < min) || self.max.is_some_and(|max| value > max)
    }
}

/// Statistical outlier criterion evaluated inside one layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatisticalMethod {
    #[default]
    None,
    /// Flag `|v - mean| > k * std` (population standard deviation)
    ZScore { k: f64 },
    /// Flag values outside `[Q1 - m * IQR, Q3 + m * IQR]`
    Iqr { multiplier: f64 },
}

impl StatisticalMethod {
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl std::fmt::Display for StatisticalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::ZScore { k } => write!(f, "z_score({k})"),
            Self::Iqr { multiplier } => write!(f, "iqr({multiplier})"),
        }
    }
}

/// Which rule a sample is attributed to when both would remove it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePrecedence {
    #[default]
    PriorFirst,
    StatisticalFirst,
}

/// Rule set applied to one curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierRules {
    #[serde(default)]
    pub prior_bounds: Option<PriorBounds>,
    #[serde(default)]
    pub statistical_method: StatisticalMethod,
    #[serde(default = "default_min_layer_samples")]
    pub min_layer_samples: usize,
    #[serde(default)]
    pub precedence: RulePrecedence,
    /// Upper bound on statistical re-evaluation passes per layer.
    /// `None` repeats until a pass removes nothing.
    #[serde(default)]
    pub max_statistical_passes: Option<usize>,
}

fn default_min_layer_samples() -> usize {
    DEFAULT_MIN_LAYER_SAMPLES
}

impl Default for OutlierRules {
    fn default() -> Self {
        Self {
            prior_bounds: None,
            statistical_method: StatisticalMethod::None,
            min_layer_samples: DEFAULT_MIN_LAYER_SAMPLES,
            precedence: RulePrecedence::PriorFirst,
            max_statistical_passes: None,
        }
    }
}

impl OutlierRules {
    #[must_use]
    pub fn with_prior_bounds(mut self, bounds: PriorBounds) -> Self {
        self.prior_bounds = Some(bounds);
        self
    }

    #[must_use]
    pub fn with_statistical_method(mut self, method: StatisticalMethod) -> Self {
        self.statistical_method = method;
        self
    }

    #[must_use]
    pub fn with_min_layer_samples(mut self, min: usize) -> Self {
        self.min_layer_samples = min;
        self
    }

    #[must_use]
    pub fn with_precedence(mut self, precedence: RulePrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    #[must_use]
    pub fn with_max_statistical_passes(mut self, passes: usize) -> Self {
        self.max_statistical_passes = Some(passes);
        self
    }

    /// True when the rule set can never remove anything
    pub const fn is_noop(&self) -> bool {
        self.prior_bounds.is_none() && self.statistical_method.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive_at_the_edges() {
        let bounds = PriorBounds::new(12.0, 12.5);
        assert!(!bounds.violates(12.0));
        assert!(!bounds.violates(12.5));
        assert!(bounds.violates(11.99));
        assert!(bounds.violates(40.0));
    }

    #[test]
    fn test_open_sided_bounds() {
        let gr = PriorBounds::at_least(0.0);
        assert!(gr.violates(-1.0));
        assert!(!gr.violates(1.0e6));
    }

    #[test]
    fn test_caliper_from_bit_size() {
        let bounds = PriorBounds::caliper(8.5, 2.0);
        assert_eq!(bounds, PriorBounds::new(8.5, 10.5));
    }

    #[test]
    fn test_statistical_method_toml_shape() {
        let method: StatisticalMethod = toml::from_str("kind = \"z_score\"\nk = 3.0").unwrap();
        assert_eq!(method, StatisticalMethod::ZScore { k: 3.0 });

        let method: StatisticalMethod = toml::from_str("kind = \"iqr\"\nmultiplier = 1.5").unwrap();
        assert_eq!(method, StatisticalMethod::Iqr { multiplier: 1.5 });
        assert_eq!(method.to_string(), "iqr(1.5)");
    }

    #[test]
    fn test_default_rules_are_noop() {
        assert!(OutlierRules::default().is_noop());
        assert!(!OutlierRules::default()
            .with_prior_bounds(PriorBounds::new(0.0, 1.0))
            .is_noop());
    }
}
