//! Config Validation Tests
//!
//! Typo detection and range validation for QC rule files, plus loading
//! from disk. These tests exercise the config layer independently from the
//! filter and the pipeline.

use std::io::Write;

use well_log_qc::config::validation::{
    known_config_keys, suggest_correction, validate_physical_ranges, validate_unknown_keys,
};
use well_log_qc::config::{CaliperConfig, ConfigError};
use well_log_qc::{PriorBounds, QcConfig, StatisticalMethod};

// ============================================================================
// Typo Detection Tests
// ============================================================================

#[test]
fn typo_in_statistical_section_warns_with_suggestion() {
    let toml_str = r#"
[statistical]
min_layer_sampels = 12
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("min_layer_sampels"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("statistical.min_layer_samples"),
        "Should suggest the correct spelling"
    );
}

#[test]
fn typo_in_caliper_section_warns() {
    let toml_str = r#"
[caliper]
bit_size_inchs = 12.25
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("caliper.bit_size_inches")
    );
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[project]
name = "Volve-Hugin"

[prior]
enabled = true
use_builtin = true

[prior.bounds.GR]
min = 0.0
max = 250.0

[prior.bounds.NPHI]
min = -0.05
max = 0.6

[caliper]
bit_size_inches = 8.5
tolerance_inches = 4.0
mnemonics = ["CAL", "CALI", "HCAL"]

[statistical]
min_layer_samples = 15
max_passes = 3
precedence = "prior_first"

[statistical.method]
kind = "z_score"
k = 3.0

[pipeline]
curves = ["GR", "DEN", "DT", "CALI"]
truncate_to_layers = true
truncate_padding_m = 20.0
null_value = -999.25
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.is_empty(), "Unexpected warnings: {warnings:?}");
}

#[test]
fn unknown_section_without_close_match_has_no_suggestion() {
    let warnings = validate_unknown_keys("[seismic_tie]\nwavelet = \"ricker\"");
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| w.suggestion.is_none()));
}

#[test]
fn suggestions_stay_within_edit_distance() {
    let known = known_config_keys();
    assert_eq!(
        suggest_correction("pipeline.curvs", &known).as_deref(),
        Some("pipeline.curves")
    );
    assert_eq!(suggest_correction("completely.unrelated.key", &known), None);
}

#[test]
fn broken_toml_yields_no_key_warnings() {
    // Syntax errors are reported by the serde pass, not the key walker
    assert!(validate_unknown_keys("[statistical\nk = ").is_empty());
}

// ============================================================================
// Range Validation Tests
// ============================================================================

#[test]
fn default_config_is_valid() {
    let (errors, warnings) = validate_physical_ranges(&QcConfig::default());
    assert!(errors.is_empty(), "{errors:?}");
    assert!(warnings.is_empty(), "{warnings:?}");
}

#[test]
fn inverted_prior_bounds_are_errors() {
    let mut config = QcConfig::default();
    config
        .prior
        .bounds
        .insert("DEN".to_string(), PriorBounds::new(3.0, 1.0));
    let (errors, _) = validate_physical_ranges(&config);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("prior.bounds.DEN"));
}

#[test]
fn impossible_bit_size_is_error() {
    let config = QcConfig {
        caliper: Some(CaliperConfig::new(60.0, 2.0)),
        ..QcConfig::default()
    };
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("bit_size_inches")));
}

#[test]
fn non_positive_k_is_error_and_small_k_is_warning() {
    let mut config = QcConfig::default();
    config.statistical.method = StatisticalMethod::ZScore { k: 0.0 };
    let (errors, _) = validate_physical_ranges(&config);
    assert_eq!(errors.len(), 1);

    config.statistical.method = StatisticalMethod::ZScore { k: 0.5 };
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty());
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "statistical.method.k");
}

#[test]
fn zero_max_passes_is_error() {
    let mut config = QcConfig::default();
    config.statistical.max_passes = Some(0);
    let (errors, _) = validate_physical_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("max_passes")));
}

#[test]
fn tiny_min_layer_samples_is_warning() {
    let mut config = QcConfig::default();
    config.statistical.min_layer_samples = 2;
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty());
    assert!(warnings
        .iter()
        .any(|w| w.field == "statistical.min_layer_samples"));
}

#[test]
fn invalid_values_fail_parse() {
    let toml_str = r#"
[statistical.method]
kind = "iqr"
multiplier = -1.0
"#;
    let err = QcConfig::from_toml_str(toml_str, "inline").unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 1));
}

// ============================================================================
// Loading Tests
// ============================================================================

#[test]
fn load_from_file_reads_rules() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[project]
name = "Hugin"

[caliper]
bit_size_inches = 12.25
tolerance_inches = 0.5

[statistical.method]
kind = "none"
"#
    )
    .unwrap();

    let config = QcConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.project.name, "Hugin");
    assert_eq!(
        config.prior_bounds_for("CAL"),
        Some(PriorBounds::new(12.25, 12.75))
    );
    assert!(config.rules_for("CAL").statistical_method.is_none());
}

#[test]
fn load_from_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = QcConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn typos_do_not_break_loading() {
    let config = QcConfig::from_toml_str("[pipeline]\ncurvs = [\"GR\"]", "inline").unwrap();
    assert!(config.pipeline.curves.is_empty());
}

#[test]
fn shipped_example_config_is_clean() {
    let text = include_str!("../qc_config.example.toml");
    assert!(validate_unknown_keys(text).is_empty());

    let config = QcConfig::from_toml_str(text, "qc_config.example.toml").unwrap();
    assert_eq!(
        config.prior_bounds_for("CALI"),
        Some(PriorBounds::new(12.25, 16.25))
    );
    assert_eq!(config.prior_bounds_for("NPHI"), Some(PriorBounds::new(-0.05, 0.6)));
}
