//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::defaults::DEFAULT_ZSCORE_K;
use super::QcConfig;
use crate::types::{PriorBounds, StatisticalMethod};

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Table whose entries are named after curve mnemonics
const PRIOR_BOUNDS_TABLE: &str = "prior.bounds";

/// Returns the complete set of valid dotted key paths for QcConfig.
///
/// Mnemonic entries under `[prior.bounds]` are user-named and checked
/// separately. Any new field added to QcConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [project]
        "project",
        "project.name",
        // [prior]
        "prior",
        "prior.enabled",
        "prior.use_builtin",
        "prior.bounds",
        // [caliper]
        "caliper",
        "caliper.bit_size_inches",
        "caliper.tolerance_inches",
        "caliper.mnemonics",
        // [statistical]
        "statistical",
        "statistical.min_layer_samples",
        "statistical.max_passes",
        "statistical.precedence",
        "statistical.method",
        "statistical.method.kind",
        "statistical.method.k",
        "statistical.method.multiplier",
        // [pipeline]
        "pipeline",
        "pipeline.curves",
        "pipeline.truncate_to_layers",
        "pipeline.truncate_padding_m",
        "pipeline.null_value",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// A key path found in a rule file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TomlKey {
    /// A key with a fixed name, e.g. `statistical.method.k`
    Fixed(String),
    /// A field of a `[prior.bounds.<MNEMONIC>]` table
    PriorBound { mnemonic: String, field: String },
}

impl TomlKey {
    /// Dotted path as written in the file
    pub fn path(&self) -> String {
        match self {
            Self::Fixed(path) => path.clone(),
            Self::PriorBound { mnemonic, field } => {
                format!("{PRIOR_BOUNDS_TABLE}.{mnemonic}.{field}")
            }
        }
    }
}

/// Collects every key of a parsed rule file, fixed keys first, each group sorted.
///
/// Tables are walked with an explicit stack. Entries of `[prior.bounds]` are
/// named by the user, so their mnemonic level is not reported on its own:
/// `{ prior = { bounds = { GR = { min = 0 } } } }` yields `prior`,
/// `prior.bounds` and `PriorBound { mnemonic: "GR", field: "min" }`.
pub fn walk_toml_keys(value: &toml::Value) -> Vec<TomlKey> {
    let mut keys = Vec::new();
    let mut pending: Vec<(String, &toml::Table)> = Vec::new();
    if let Some(root) = value.as_table() {
        pending.push((String::new(), root));
    }

    while let Some((prefix, table)) = pending.pop() {
        for (name, entry) in table {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            match entry.as_table() {
                Some(fields) if prefix == PRIOR_BOUNDS_TABLE => {
                    keys.extend(fields.keys().map(|field| TomlKey::PriorBound {
                        mnemonic: name.clone(),
                        field: field.clone(),
                    }));
                }
                Some(child) => {
                    keys.push(TomlKey::Fixed(path.clone()));
                    pending.push((path, child));
                }
                None => keys.push(TomlKey::Fixed(path)),
            }
        }
    }

    keys.sort();
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties go to the alphabetically first key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

/// Only `min` and `max` are valid inside a `[prior.bounds.<MNEMONIC>]` table.
fn check_prior_bound_field(mnemonic: &str, field: &str) -> Option<ValidationWarning> {
    if matches!(field, "min" | "max") {
        return None;
    }

    let key = format!("{PRIOR_BOUNDS_TABLE}.{mnemonic}.{field}");
    let known: HashSet<&str> = ["min", "max"].into_iter().collect();
    Some(ValidationWarning {
        message: format!("Unknown config key '{key}'"),
        field: key,
        suggestion: suggest_correction(field, &known)
            .map(|f| format!("{PRIOR_BOUNDS_TABLE}.{mnemonic}.{f}")),
    })
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let mut warnings = Vec::new();

    for key in walk_toml_keys(&value) {
        let key = match key {
            TomlKey::PriorBound { mnemonic, field } => {
                warnings.extend(check_prior_bound_field(&mnemonic, &field));
                continue;
            }
            TomlKey::Fixed(key) => key,
        };
        if !known.contains(key.as_str()) {
            warnings.push(ValidationWarning {
                suggestion: suggest_correction(&key, &known),
                message: format!("Unknown config key '{key}'"),
                field: key,
            });
        }
    }

    warnings
}

// ============================================================================
// Physical Range Validation
// ============================================================================

fn check_bounds(name: &str, bounds: &PriorBounds, errors: &mut Vec<String>) {
    // NaN/Inf comparisons silently pass, catch them explicitly
    for (side, value) in [("min", bounds.min), ("max", bounds.max)] {
        if value.is_some_and(|v| !v.is_finite()) {
            errors.push(format!("prior.bounds.{name}.{side} must be finite"));
        }
    }
    if let (Some(min), Some(max)) = (bounds.min, bounds.max) {
        if min > max {
            errors.push(format!(
                "prior.bounds.{name}: min ({min:.3}) must be <= max ({max:.3})"
            ));
        }
    }
}

/// Validate physical ranges on a parsed QcConfig.
///
/// Returns (errors, warnings): errors are impossible values that must
/// prevent a run; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(config: &QcConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (name, bounds) in &config.prior.bounds {
        check_bounds(name, bounds, &mut errors);
    }

    if let Some(caliper) = &config.caliper {
        // 2-36 inches covers everything from coiled tubing to conductor
        let bit = caliper.bit_size_inches;
        if !(2.0..=36.0).contains(&bit) {
            errors.push(format!(
                "caliper.bit_size_inches = {bit:.2} is outside physical range (2-36 inches)"
            ));
        }
        if !caliper.tolerance_inches.is_finite() || caliper.tolerance_inches < 0.0 {
            errors.push(format!(
                "caliper.tolerance_inches = {:.2} must be a non-negative number",
                caliper.tolerance_inches
            ));
        }
        if caliper.mnemonics.is_empty() {
            warnings.push(ValidationWarning {
                field: "caliper.mnemonics".to_string(),
                message: "caliper.mnemonics is empty, the caliper rule applies to no curve"
                    .to_string(),
                suggestion: None,
            });
        }
    }

    let stat = &config.statistical;
    match stat.method {
        StatisticalMethod::None => {}
        StatisticalMethod::ZScore { k } => {
            if !k.is_finite() || k <= 0.0 {
                errors.push(format!("statistical.method.k = {k} must be > 0"));
            } else if k < 1.0 {
                warnings.push(ValidationWarning {
                    field: "statistical.method.k".to_string(),
                    message: format!(
                        "statistical.method.k = {k:.2} flags most of every layer as outliers (usual: {DEFAULT_ZSCORE_K})"
                    ),
                    suggestion: None,
                });
            }
        }
        StatisticalMethod::Iqr { multiplier } => {
            if !multiplier.is_finite() || multiplier < 0.0 {
                errors.push(format!(
                    "statistical.method.multiplier = {multiplier} must be >= 0"
                ));
            } else if multiplier < 1.0 {
                warnings.push(ValidationWarning {
                    field: "statistical.method.multiplier".to_string(),
                    message: format!(
                        "statistical.method.multiplier = {multiplier:.2} is unusually tight (1.5 mild, 3.0 extreme)"
                    ),
                    suggestion: None,
                });
            }
        }
    }

    if stat.max_passes == Some(0) {
        errors.push("statistical.max_passes must be >= 1 (omit it to iterate to convergence)".to_string());
    }

    if stat.min_layer_samples < 3 {
        warnings.push(ValidationWarning {
            field: "statistical.min_layer_samples".to_string(),
            message: format!(
                "statistical.min_layer_samples = {} is too few to estimate a layer distribution",
                stat.min_layer_samples
            ),
            suggestion: None,
        });
    }

    let padding = config.pipeline.truncate_padding_m;
    if !padding.is_finite() || padding < 0.0 {
        errors.push(format!(
            "pipeline.truncate_padding_m = {padding} must be a non-negative number"
        ));
    }

    (errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_walk_nested_keys() {
        let value: toml::Value = "[a]\nb = 1\n[a.c]\nd = 2".parse().unwrap();
        let paths: Vec<String> = walk_toml_keys(&value).iter().map(TomlKey::path).collect();
        assert_eq!(paths, vec!["a", "a.b", "a.c", "a.c.d"]);
    }

    #[test]
    fn test_walk_folds_mnemonic_tables() {
        let value: toml::Value = "[prior.bounds]\nDT = 5\n[prior.bounds.GR]\nmin = 0.0\nmax = 300.0"
            .parse()
            .unwrap();
        let keys = walk_toml_keys(&value);
        assert_eq!(
            keys,
            vec![
                TomlKey::Fixed("prior".into()),
                TomlKey::Fixed("prior.bounds".into()),
                TomlKey::Fixed("prior.bounds.DT".into()),
                TomlKey::PriorBound { mnemonic: "GR".into(), field: "max".into() },
                TomlKey::PriorBound { mnemonic: "GR".into(), field: "min".into() },
            ]
        );
    }

    #[test]
    fn test_scalar_prior_bound_is_unknown() {
        let warnings = validate_unknown_keys("[prior.bounds]\nDT = 5");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "prior.bounds.DT");
    }

    #[test]
    fn test_prior_bounds_mnemonics_accepted() {
        let warnings = validate_unknown_keys("[prior.bounds.NPHI]\nmin = -0.05\nmax = 0.6");
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_prior_bounds_field_typo() {
        let warnings = validate_unknown_keys("[prior.bounds.NPHI]\nmim = -0.05");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].suggestion.as_deref(), Some("prior.bounds.NPHI.min"));
    }
}
