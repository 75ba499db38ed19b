//! Built-in default constants.
//!
//! Prior-knowledge bounds per curve mnemonic, used when no `qc_config.toml`
//! overrides them. Grouped by measurement.

use crate::types::PriorBounds;

// ============================================================================
// Prior bounds
// ============================================================================

/// Gamma ray (gAPI): cannot be negative.
pub const GR_BOUNDS: PriorBounds = PriorBounds::at_least(0.0);

/// Bulk density (g/cm3). Below 1.0 is washout or mud, above 3.0 is not rock.
pub const DENSITY_BOUNDS: PriorBounds = PriorBounds::new(1.0, 3.0);

/// Sonic slowness (us/ft). Below 40 is cycle skipping, above 200 is
/// unconsolidated formation or tool failure.
pub const SONIC_BOUNDS: PriorBounds = PriorBounds::new(40.0, 200.0);

/// Caliper (in) for an 8.5" bit: never narrower than the bit, far wider
/// is a severe washout.
pub const CALIPER_BOUNDS: PriorBounds = PriorBounds::new(8.5, 16.0);

/// Deep laterolog resistivity (ohm.m). Very low is a tool short, very high
/// needs truncation.
pub const RESISTIVITY_BOUNDS: PriorBounds = PriorBounds::new(0.1, 2000.0);

/// Porosity (v/v). 0.1 is the interpreter's default fill value.
pub const POROSITY_BOUNDS: PriorBounds = PriorBounds::new(0.1, 1.0);

/// Mnemonic → bounds table. Aliases share the same bounds.
pub const PRIOR_BOUNDS_TABLE: &[(&str, PriorBounds)] = &[
    ("GR", GR_BOUNDS),
    ("DEN", DENSITY_BOUNDS),
    ("RHOB", DENSITY_BOUNDS),
    ("DT", SONIC_BOUNDS),
    ("AC", SONIC_BOUNDS),
    ("CAL", CALIPER_BOUNDS),
    ("CALI", CALIPER_BOUNDS),
    ("LLD", RESISTIVITY_BOUNDS),
    ("LLD1", RESISTIVITY_BOUNDS),
    ("POR", POROSITY_BOUNDS),
];

/// Caliper mnemonics affected by the `[caliper]` bit-size rule.
pub const CALIPER_MNEMONICS: &[&str] = &["CAL", "CALI"];

// ============================================================================
// Statistical rule
// ============================================================================

/// Default sigma multiplier for the z-score rule.
pub const DEFAULT_ZSCORE_K: f64 = 3.0;

/// Default IQR fence multiplier (1.5 mild, 3.0 extreme outliers).
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

// ============================================================================
// Pipeline
// ============================================================================

/// Depth padding (m) kept above the shallowest and below the deepest layer
/// when truncating a well.
pub const DEFAULT_TRUNCATE_PADDING_M: f64 = 20.0;
