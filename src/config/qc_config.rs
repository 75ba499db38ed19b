//! QC Configuration - outlier rules as operator-tunable TOML values
//!
//! Every prior bound and statistical setting is a field here. Each struct
//! implements `Default`, so a missing file or section falls back to the
//! built-in rule table in `defaults`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults::{
    CALIPER_MNEMONICS, DEFAULT_IQR_MULTIPLIER, DEFAULT_TRUNCATE_PADDING_M, PRIOR_BOUNDS_TABLE,
};
use crate::types::{
    OutlierRules, PriorBounds, RulePrecedence, StatisticalMethod, DEFAULT_MIN_LAYER_SAMPLES,
    LAS_NULL,
};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "WELL_QC_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "qc_config.toml";

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error ({origin}): {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a cleaning project.
///
/// Load with `QcConfig::load()` which searches:
/// 1. `$WELL_QC_CONFIG` env var
/// 2. `./qc_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QcConfig {
    /// Project identification, appears in logs and manifests
    #[serde(default)]
    pub project: ProjectInfo,

    /// Prior-knowledge bounds per curve mnemonic
    #[serde(default)]
    pub prior: PriorConfig,

    /// Caliper bounds derived from the drill bit
    #[serde(default)]
    pub caliper: Option<CaliperConfig>,

    /// Layer-local statistical rule
    #[serde(default)]
    pub statistical: StatisticalConfig,

    /// Stage selection for the cleaning pipeline
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl QcConfig {
    /// Load configuration using the standard search order:
    /// 1. `$WELL_QC_CONFIG` environment variable
    /// 2. `./qc_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), project = %config.project.name, "Loaded QC config from {CONFIG_ENV_VAR}");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load QC config, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV_VAR} points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(project = %config.project.name, "Loaded QC config from ./{LOCAL_CONFIG_FILE}");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        info!("No {LOCAL_CONFIG_FILE} found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, &path.display().to_string())
    }

    /// Parse and validate a TOML document. `origin` labels parse errors.
    ///
    /// Unknown keys only produce warnings; out-of-range values fail.
    pub fn from_toml_str(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!(origin = %origin, "{}", w);
        }

        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML (used to print the effective config)
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Range checks. Warnings are logged, errors fail the load.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_physical_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Prior bounds for a curve mnemonic (case-insensitive).
    ///
    /// The caliper rule wins for caliper mnemonics, then explicit
    /// `[prior.bounds]` entries, then the built-in table.
    pub fn prior_bounds_for(&self, mnemonic: &str) -> Option<PriorBounds> {
        if !self.prior.enabled {
            return None;
        }
        let key = mnemonic.to_ascii_uppercase();

        if let Some(caliper) = &self.caliper {
            if caliper.mnemonics.iter().any(|m| m.eq_ignore_ascii_case(&key)) {
                return Some(caliper.bounds());
            }
        }
        if let Some(bounds) = self
            .prior
            .bounds
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&key))
            .map(|(_, b)| *b)
        {
            return Some(bounds);
        }
        if self.prior.use_builtin {
            return PRIOR_BOUNDS_TABLE
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, b)| *b);
        }
        None
    }

    /// Full rule set for one curve
    pub fn rules_for(&self, mnemonic: &str) -> OutlierRules {
        OutlierRules {
            prior_bounds: self.prior_bounds_for(mnemonic),
            statistical_method: self.statistical.method,
            min_layer_samples: self.statistical.min_layer_samples,
            precedence: self.statistical.precedence,
            max_statistical_passes: self.statistical.max_passes,
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Identification metadata, not used for logic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default = "default_project_name")]
    pub name: String,
}

fn default_project_name() -> String {
    "DEFAULT".to_string()
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            name: default_project_name(),
        }
    }
}

/// Prior-knowledge bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorConfig {
    /// Master switch for prior bounds
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Fall back to the built-in mnemonic table for curves without an
    /// explicit entry
    #[serde(default = "default_true")]
    pub use_builtin: bool,

    /// Explicit bounds keyed by mnemonic, e.g. `[prior.bounds.GR] min = 0`
    #[serde(default)]
    pub bounds: BTreeMap<String, PriorBounds>,
}

fn default_true() -> bool {
    true
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_builtin: true,
            bounds: BTreeMap::new(),
        }
    }
}

/// Caliper rule: plausible hole size is `[bit, bit + tolerance]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaliperConfig {
    pub bit_size_inches: f64,

    #[serde(default = "default_caliper_tolerance")]
    pub tolerance_inches: f64,

    #[serde(default = "default_caliper_mnemonics")]
    pub mnemonics: Vec<String>,
}

fn default_caliper_tolerance() -> f64 {
    7.5
}

fn default_caliper_mnemonics() -> Vec<String> {
    CALIPER_MNEMONICS.iter().map(|m| (*m).to_string()).collect()
}

impl CaliperConfig {
    pub fn new(bit_size_inches: f64, tolerance_inches: f64) -> Self {
        Self {
            bit_size_inches,
            tolerance_inches,
            mnemonics: default_caliper_mnemonics(),
        }
    }

    pub fn bounds(&self) -> PriorBounds {
        PriorBounds::caliper(self.bit_size_inches, self.tolerance_inches)
    }
}

/// Layer-local statistical rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalConfig {
    #[serde(default = "default_min_layer_samples")]
    pub min_layer_samples: usize,

    /// Cap on re-evaluation passes per layer; unset iterates to convergence
    #[serde(default)]
    pub max_passes: Option<usize>,

    #[serde(default)]
    pub precedence: RulePrecedence,

    #[serde(default = "default_method")]
    pub method: StatisticalMethod,
}

fn default_method() -> StatisticalMethod {
    StatisticalMethod::Iqr {
        multiplier: DEFAULT_IQR_MULTIPLIER,
    }
}

fn default_min_layer_samples() -> usize {
    DEFAULT_MIN_LAYER_SAMPLES
}

impl Default for StatisticalConfig {
    fn default() -> Self {
        Self {
            min_layer_samples: default_min_layer_samples(),
            max_passes: None,
            precedence: RulePrecedence::PriorFirst,
            method: default_method(),
        }
    }
}

/// Pipeline stage selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Curves to clean; empty cleans every curve of the well
    #[serde(default)]
    pub curves: Vec<String>,

    /// Cut wells to the layer span before cleaning
    #[serde(default)]
    pub truncate_to_layers: bool,

    #[serde(default = "default_truncate_padding")]
    pub truncate_padding_m: f64,

    /// Null value written when exporting raw arrays
    #[serde(default = "default_null_value")]
    pub null_value: f64,
}

fn default_truncate_padding() -> f64 {
    DEFAULT_TRUNCATE_PADDING_M
}

fn default_null_value() -> f64 {
    LAS_NULL
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            curves: Vec::new(),
            truncate_to_layers: false,
            truncate_padding_m: default_truncate_padding(),
            null_value: default_null_value(),
        }
    }
}
