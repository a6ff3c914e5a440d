//! TOML-based scenario configuration and preset definitions.
//!
//! Electrical fields are free-form text handed to the unit parser, so both
//! `v_ll = 380` and `v_ll = "0.38 kV"` are accepted.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::model::System;
use crate::session::{LineInputs, OperatingInputs, ScrInputs};
use crate::units::{PerUnit, QuantityKind, parse_quantity};

/// Top-level scenario configuration parsed from TOML.
///
/// All sections have defaults matching the `380V/60Hz` preset. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Grid ratings.
    #[serde(default)]
    pub system: SystemConfig,
    /// Line impedance.
    #[serde(default)]
    pub line: LineConfig,
    /// Transformer impedance.
    #[serde(default)]
    pub transformer: TransformerConfig,
    /// Target-SCR line solve parameters.
    #[serde(default)]
    pub target: TargetConfig,
    /// Operating point request and limits.
    #[serde(default)]
    pub operating: OperatingConfig,
    /// δ-sweep range.
    #[serde(default)]
    pub sweep: SweepConfig,
    /// Parser options.
    #[serde(default)]
    pub options: OptionsConfig,
}

/// Grid ratings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystemConfig {
    /// Line-to-line voltage (V, or kV suffix).
    #[serde(deserialize_with = "text_or_number")]
    pub v_ll: String,
    /// Rated apparent power (VA, or kVA/MVA suffix).
    #[serde(deserialize_with = "text_or_number")]
    pub s_n: String,
    /// Frequency (Hz).
    #[serde(deserialize_with = "text_or_number")]
    pub f: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            v_ll: "380".to_string(),
            s_n: "250000".to_string(),
            f: "60".to_string(),
        }
    }
}

/// Line impedance per phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineConfig {
    /// Resistance (Ω, mΩ, kΩ or pu).
    #[serde(deserialize_with = "text_or_number")]
    pub r: String,
    /// Inductance (H, mH, uH or pu).
    #[serde(deserialize_with = "text_or_number")]
    pub l: String,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            r: "0.0".to_string(),
            l: "7.5e-05".to_string(),
        }
    }
}

/// Transformer impedance per phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformerConfig {
    #[serde(deserialize_with = "text_or_number")]
    pub r: String,
    #[serde(deserialize_with = "text_or_number")]
    pub l: String,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            r: "0.0".to_string(),
            l: "0.0".to_string(),
        }
    }
}

/// Target-SCR line solve parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    /// Desired SCR (must be > 0).
    #[serde(deserialize_with = "text_or_number")]
    pub scr: String,
    /// Line R/L ratio (Ω/H).
    #[serde(deserialize_with = "text_or_number")]
    pub r_over_l: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            scr: "3.0".to_string(),
            r_over_l: "0.0".to_string(),
        }
    }
}

/// Operating point request and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperatingConfig {
    /// Real power to transfer; non-positive or empty selects `delta_deg`.
    #[serde(deserialize_with = "text_or_number")]
    pub p: String,
    /// Power angle (degrees).
    #[serde(deserialize_with = "text_or_number")]
    pub delta_deg: String,
    /// Current limit (A); empty for none.
    #[serde(deserialize_with = "text_or_number")]
    pub i_max: String,
    /// Voltage-drop limit (%); empty for none.
    #[serde(deserialize_with = "text_or_number")]
    pub v_drop_pct: String,
}

impl Default for OperatingConfig {
    fn default() -> Self {
        let inputs = OperatingInputs::default();
        Self {
            p: inputs.p,
            delta_deg: inputs.delta_deg,
            i_max: inputs.i_max,
            v_drop_pct: inputs.v_drop_pct,
        }
    }
}

/// δ-sweep range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Largest swept angle (degrees, >= 0).
    pub delta_max_deg: f64,
    /// Angle increment (degrees, > 0).
    pub step_deg: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            delta_max_deg: 60.0,
            step_deg: 0.5,
        }
    }
}

/// Parser options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsConfig {
    /// Interpret `pu` suffixes on impedance fields.
    pub per_unit: bool,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"system.s_n"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the `380V/60Hz` preset with the default line.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["380V/60Hz", "400V/50Hz", "480V/60Hz"];

    /// Loads a scenario from a named preset.
    ///
    /// Presets set the grid ratings; all other sections keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        let (v_ll, f) = match name {
            "380V/60Hz" => ("380", "60"),
            "400V/50Hz" => ("400", "50"),
            "480V/60Hz" => ("480", "60"),
            _ => {
                return Err(ConfigError::new(
                    "preset",
                    format!(
                        "unknown preset \"{name}\", available: {}",
                        Self::PRESETS.join(", ")
                    ),
                ));
            }
        };
        Ok(Self {
            system: SystemConfig {
                v_ll: v_ll.to_string(),
                s_n: "250000".to_string(),
                f: f.to_string(),
            },
            ..Self::default()
        })
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Grid ratings parsed into base units; unparsable fields become 0.
    pub fn system(&self) -> System {
        let pu = PerUnit::disabled();
        let value = |text: &str, kind| parse_quantity(text, kind, &pu).map_or(0.0, |q| q.value);
        System::new(
            value(&self.system.v_ll, QuantityKind::Voltage),
            value(&self.system.s_n, QuantityKind::ApparentPower),
            value(&self.system.f, QuantityKind::Frequency),
        )
    }

    pub fn scr_inputs(&self) -> ScrInputs {
        ScrInputs {
            v_ll: self.system.v_ll.clone(),
            s_n: self.system.s_n.clone(),
            f: self.system.f.clone(),
            r_line: self.line.r.clone(),
            l_line: self.line.l.clone(),
            r_tr: self.transformer.r.clone(),
            l_tr: self.transformer.l.clone(),
        }
    }

    pub fn line_inputs(&self) -> LineInputs {
        LineInputs {
            v_ll: self.system.v_ll.clone(),
            s_n: self.system.s_n.clone(),
            f: self.system.f.clone(),
            target_scr: self.target.scr.clone(),
            r_over_l: self.target.r_over_l.clone(),
            r_tr: self.transformer.r.clone(),
            l_tr: self.transformer.l.clone(),
        }
    }

    pub fn operating_inputs(&self) -> OperatingInputs {
        OperatingInputs {
            p: self.operating.p.clone(),
            delta_deg: self.operating.delta_deg.clone(),
            i_max: self.operating.i_max.clone(),
            v_drop_pct: self.operating.v_drop_pct.clone(),
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let disabled = PerUnit::disabled();

        let ratings = [
            ("system.v_ll", &self.system.v_ll, QuantityKind::Voltage),
            ("system.s_n", &self.system.s_n, QuantityKind::ApparentPower),
            ("system.f", &self.system.f, QuantityKind::Frequency),
        ];
        for (field, text, kind) in ratings {
            match parse_quantity(text, kind, &disabled) {
                Some(q) if q.value > 0.0 && q.value.is_finite() => {}
                Some(_) => errors.push(ConfigError::new(field, "must be > 0")),
                None => errors.push(ConfigError::new(
                    field,
                    format!("\"{text}\" is not a number"),
                )),
            }
        }

        let impedances = [
            ("line.r", &self.line.r, QuantityKind::Resistance),
            ("line.l", &self.line.l, QuantityKind::Inductance),
            ("transformer.r", &self.transformer.r, QuantityKind::Resistance),
            ("transformer.l", &self.transformer.l, QuantityKind::Inductance),
        ];
        for (field, text, kind) in impedances {
            let is_pu = text.to_lowercase().contains("pu");
            if is_pu && !self.options.per_unit {
                errors.push(ConfigError::new(
                    field,
                    "per-unit value requires options.per_unit = true",
                ));
                continue;
            }
            if !is_pu && parse_quantity(text, kind, &disabled).is_some_and(|q| q.value < 0.0) {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }

        match parse_quantity(&self.target.scr, QuantityKind::Percent, &disabled) {
            Some(q) if q.value > 0.0 && q.value.is_finite() => {}
            _ => errors.push(ConfigError::new("target.scr", "must be a number > 0")),
        }

        let sw = &self.sweep;
        if !sw.step_deg.is_finite() || sw.step_deg <= 0.0 {
            errors.push(ConfigError::new("sweep.step_deg", "must be > 0"));
        }
        if !sw.delta_max_deg.is_finite() || sw.delta_max_deg < 0.0 {
            errors.push(ConfigError::new("sweep.delta_max_deg", "must be >= 0"));
        }

        errors
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// Accepts a TOML string or number and keeps it as text for the unit parser.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawField::deserialize(deserializer)? {
        RawField::Text(s) => s,
        RawField::Integer(n) => n.to_string(),
        RawField::Float(x) => x.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent").expect_err("unknown preset");
        assert!(err.message.contains("unknown preset"));
        assert_eq!(err.field, "preset");
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name).expect("listed preset should load");
            let errors = cfg.validate();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn preset_sets_ratings_only() {
        let cfg = ScenarioConfig::from_preset("400V/50Hz").expect("known preset");
        let sys = cfg.system();
        assert_eq!(sys, System::new(400.0, 250_000.0, 50.0));
        assert_eq!(cfg.line.l, LineConfig::default().l);
    }

    #[test]
    fn valid_toml_parses_numbers_and_unit_strings() {
        let toml = r#"
[system]
v_ll = "0.4 kV"
s_n = "0.75 MVA"
f = 50

[line]
r = "20 mΩ"
l = "75uH"

[transformer]
r = 0.002
l = "0.02 mH"

[target]
scr = 3
r_over_l = 100

[operating]
p = "200 kW"
i_max = "1.2 kA"
v_drop_pct = 10

[sweep]
delta_max_deg = 45.0
step_deg = 1.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).expect("valid TOML should parse");
        let sys = cfg.system();
        assert!((sys.v_ll - 400.0).abs() < 1e-9);
        assert_eq!(sys.s_n, 750_000.0);
        assert_eq!(sys.f, 50.0);
        assert_eq!(cfg.transformer.r, "0.002");
        assert_eq!(cfg.target.scr, "3");
        assert_eq!(cfg.operating.v_drop_pct, "10");
        assert_eq!(cfg.sweep.step_deg, 1.0);
        let errors = cfg.validate();
        assert!(errors.is_empty(), "should be valid: {errors:?}");
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[system]
v_ll = 380
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[line]
r = "10 mohm"
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).expect("partial TOML");
        assert_eq!(cfg.line.r, "10 mohm");
        assert_eq!(cfg.line.l, "7.5e-05");
        assert_eq!(cfg.system.v_ll, "380");
        assert_eq!(cfg.sweep.delta_max_deg, 60.0);
    }

    #[test]
    fn validation_catches_zero_rating() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.system.s_n = "0".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "system.s_n"));
    }

    #[test]
    fn validation_catches_unparsable_frequency() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.system.f = "sixty".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "system.f"));
    }

    #[test]
    fn validation_requires_per_unit_mode_for_pu_text() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.line.l = "0.05pu".to_string();
        assert!(cfg.validate().iter().any(|e| e.field == "line.l"));
        cfg.options.per_unit = true;
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validation_catches_bad_sweep_and_target() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.sweep.step_deg = 0.0;
        cfg.target.scr = "-1".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "sweep.step_deg"));
        assert!(errors.iter().any(|e| e.field == "target.scr"));
    }

    #[test]
    fn inputs_carry_scenario_text() {
        let cfg = ScenarioConfig::from_preset("480V/60Hz").expect("known preset");
        assert_eq!(cfg.scr_inputs().v_ll, "480");
        assert_eq!(cfg.line_inputs().target_scr, "3.0");
        assert_eq!(cfg.operating_inputs().p, "1000");
    }
}
