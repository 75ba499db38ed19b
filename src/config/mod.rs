//! QC Configuration Module
//!
//! Provides the outlier rule configuration loaded from TOML files, so prior
//! bounds (bit size, per-mnemonic ranges) and statistical settings are
//! operator-tunable per field instead of hardcoded.
//!
//! ## Loading Order
//!
//! 1. `WELL_QC_CONFIG` environment variable (path to TOML file)
//! 2. `qc_config.toml` in the current working directory
//! 3. Built-in defaults (the prior bounds table in `defaults`)
//!
//! ## Usage
//!
//! ```ignore
//! let config = QcConfig::load();
//! let rules = config.rules_for("CALI");
//! ```

mod qc_config;
pub mod defaults;
pub mod validation;

pub use qc_config::*;
