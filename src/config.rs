//! TOML-based scenario configuration and the built-in course presets.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::modes::{Capacity, Mode, StorageParams};

/// Hourly load profile shared by every course task (MW).
pub const COURSE_DEMAND_MW: [f64; 24] = [
    30.0, 20.0, 20.0, 30.0, 50.0, 80.0, 100.0, 140.0, 120.0, 100.0, 90.0, 80.0, 70.0, 80.0, 120.0,
    160.0, 220.0, 200.0, 180.0, 160.0, 120.0, 100.0, 80.0, 40.0,
];

/// Available wind production per hour for the first wind farm (MW).
pub const WIND_PROFILE_MW: [f64; 24] = [
    32.0, 51.0, 19.0, 25.0, 19.0, 4.0, 2.0, 1.0, 0.0, 0.0, 0.0, 0.0, 2.0, 4.0, 9.0, 1.0, 41.0,
    32.0, 14.0, 14.0, 19.0, 32.0, 32.0, 41.0,
];

/// Available wind production per hour for the second wind site (MW).
pub const WIND2_PROFILE_MW: [f64; 24] = [
    0.0, 1.0, 0.0, 4.0, 7.0, 13.0, 21.0, 25.0, 31.0, 32.0, 41.0, 40.0, 31.0, 20.0, 14.0, 21.0,
    26.0, 29.0, 42.0, 43.0, 45.0, 41.0, 40.0, 29.0,
];

/// Available solar production per hour (MW).
pub const SOLAR_PROFILE_MW: [f64; 24] = [
    0.0, 0.0, 0.0, 0.0, 2.0, 5.0, 8.0, 10.0, 12.0, 15.0, 18.0, 22.0, 25.0, 28.0, 30.0, 30.0, 30.0,
    25.0, 20.0, 15.0, 10.0, 5.0, 0.0, 0.0,
];

/// Which optimisation problem a scenario builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formulation {
    /// Single LP over all hours with capacity and demand-balance constraints.
    Economic,
    /// Threshold-driven battery with one LP per hour.
    RuleBattery,
    /// MILP with state-of-charge continuity and charge/discharge exclusivity.
    StorageMilp,
    /// MILP choosing an integer unit count per mode.
    UnitSizing,
}

impl Formulation {
    /// Short name used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Economic => "economic",
            Self::RuleBattery => "rule_battery",
            Self::StorageMilp => "storage_milp",
            Self::UnitSizing => "unit_sizing",
        }
    }

    /// Returns `true` when the formulation needs a `[storage]` table.
    pub fn needs_storage(self) -> bool {
        matches!(self, Self::RuleBattery | Self::StorageMilp)
    }
}

impl fmt::Display for Formulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level scenario configuration parsed from TOML.
///
/// Every table has defaults matching the `thermal` preset. Load from TOML with
/// [`ScenarioConfig::from_toml_file`] or use [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Scenario identity, formulation, and carbon price.
    #[serde(default)]
    pub scenario: ScenarioSection,
    /// Hourly demand (MW); its length sets the horizon.
    #[serde(default = "course_demand")]
    pub demand: Vec<f64>,
    /// Generation modes in stacking order.
    #[serde(default = "thermal_modes")]
    pub modes: Vec<Mode>,
    /// Battery parameters, required by the storage formulations.
    #[serde(default)]
    pub storage: Option<StorageParams>,
    /// Thresholds for the rule-based battery.
    #[serde(default)]
    pub rule: RuleConfig,
    /// Chart labels and layout.
    #[serde(default)]
    pub chart: ChartConfig,
}

/// Scenario identity, formulation, and carbon price.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioSection {
    /// Name used for the default chart file.
    pub name: String,
    /// Optimisation problem to build.
    pub formulation: Formulation,
    /// Carbon price per tonne of CO2.
    pub co2_price: f64,
}

impl Default for ScenarioSection {
    fn default() -> Self {
        Self {
            name: "thermal".to_string(),
            formulation: Formulation::Economic,
            co2_price: 0.0,
        }
    }
}

/// Load thresholds driving the rule-based battery (MW).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleConfig {
    /// Charge while the load is strictly below this value.
    pub charge_below_mw: f64,
    /// Discharge while the load is strictly above this value.
    pub discharge_above_mw: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            charge_below_mw: 95.0,
            discharge_above_mw: 120.0,
        }
    }
}

/// Chart labels and layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartConfig {
    /// Chart caption; the scenario name is used when absent.
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    /// Draws a horizontal line at this level (MW).
    pub reference_line_mw: Option<f64>,
    /// Stacking order bottom to top; mode order is used when empty.
    pub order: Vec<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: None,
            x_label: "Time [h]".to_string(),
            y_label: "Generation [MW]".to_string(),
            reference_line_mw: None,
            order: Vec::new(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"modes[2].capacity"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

fn course_demand() -> Vec<f64> {
    COURSE_DEMAND_MW.to_vec()
}

fn thermal_modes() -> Vec<Mode> {
    vec![
        Mode::new("coal", 200.0, 60.0, Capacity::Constant(120.0)).with_color("#1f77b4"),
        Mode::new("gas", 500.0, 100.0, Capacity::Constant(200.0)).with_color("#ff7f0e"),
        Mode::new("nuclear", 800.0, 120.0, Capacity::Constant(50.0)).with_color("#2ca02c"),
        Mode::new("biomass", 1000.0, 150.0, Capacity::Constant(30.0)).with_color("#d62728"),
    ]
}

fn course_battery() -> StorageParams {
    StorageParams {
        color: Some("#9467bd".to_string()),
        ..StorageParams::default()
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::thermal()
    }
}

impl ScenarioConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &[
        "thermal",
        "battery_rule",
        "co2_price",
        "cheap_baseload",
        "renewables",
        "unit_sizing",
        "storage_milp",
    ];

    fn named(name: &str, formulation: Formulation) -> ScenarioSection {
        ScenarioSection {
            name: name.to_string(),
            formulation,
            co2_price: 0.0,
        }
    }

    /// Four thermal plants with merit-order variable costs.
    pub fn thermal() -> Self {
        Self {
            scenario: Self::named("thermal", Formulation::Economic),
            demand: course_demand(),
            modes: thermal_modes(),
            storage: None,
            rule: RuleConfig::default(),
            chart: ChartConfig::default(),
        }
    }

    /// Thermal plants plus a battery that charges at night and shaves peaks above 120 MW.
    pub fn battery_rule() -> Self {
        Self {
            scenario: Self::named("battery_rule", Formulation::RuleBattery),
            storage: Some(course_battery()),
            chart: ChartConfig {
                reference_line_mw: Some(120.0),
                ..ChartConfig::default()
            },
            ..Self::thermal()
        }
    }

    /// Thermal plants with a carbon price of 60 per tonne.
    pub fn co2_price() -> Self {
        let emissions = [1.5, 0.2, 0.0, 0.0];
        Self {
            scenario: ScenarioSection {
                co2_price: 60.0,
                ..Self::named("co2_price", Formulation::Economic)
            },
            modes: thermal_modes()
                .into_iter()
                .zip(emissions)
                .map(|(mode, co2)| mode.with_co2(co2))
                .collect(),
            ..Self::thermal()
        }
    }

    /// Thermal plants where nuclear and biomass become the cheapest to run.
    pub fn cheap_baseload() -> Self {
        let variable = [65.0, 120.0, 40.0, 35.0];
        Self {
            scenario: Self::named("cheap_baseload", Formulation::Economic),
            modes: thermal_modes()
                .into_iter()
                .zip(variable)
                .map(|(mode, cost)| Mode {
                    variable_cost: cost,
                    ..mode
                })
                .collect(),
            ..Self::thermal()
        }
    }

    /// Coal and gas backed by variable wind and solar.
    pub fn renewables() -> Self {
        Self {
            scenario: Self::named("renewables", Formulation::Economic),
            modes: vec![
                Mode::new("coal", 200.0, 65.0, Capacity::Constant(120.0)).with_color("#1f77b4"),
                Mode::new("gas", 500.0, 120.0, Capacity::Constant(200.0)).with_color("#ff7f0e"),
                Mode::new("wind", 800.0, 40.0, Capacity::Hourly(WIND_PROFILE_MW.to_vec()))
                    .with_color("#bcbd22"),
                Mode::new("solar", 1000.0, 35.0, Capacity::Hourly(SOLAR_PROFILE_MW.to_vec()))
                    .with_color("#e377c2"),
            ],
            chart: ChartConfig {
                title: Some(
                    "Optimal production profile (with variable wind and solar power)".to_string(),
                ),
                order: ["coal", "solar", "wind", "gas"].map(String::from).to_vec(),
                ..ChartConfig::default()
            },
            ..Self::thermal()
        }
    }

    /// Renewables plus a second wind site, choosing how many wind units to build.
    pub fn unit_sizing() -> Self {
        let base = Self::renewables();
        let mut modes: Vec<Mode> = base
            .modes
            .into_iter()
            .map(|mode| match mode.name.as_str() {
                "coal" => mode.with_co2(2.0),
                "gas" => mode.with_co2(0.5),
                "wind" => mode.with_max_units(100),
                _ => mode,
            })
            .collect();
        modes.push(
            Mode::new("wind2", 800.0, 40.0, Capacity::Hourly(WIND2_PROFILE_MW.to_vec()))
                .with_max_units(100)
                .with_color("#17becf"),
        );

        Self {
            scenario: ScenarioSection {
                co2_price: 80.0,
                ..Self::named("unit_sizing", Formulation::UnitSizing)
            },
            demand: course_demand(),
            modes,
            storage: None,
            rule: RuleConfig::default(),
            chart: ChartConfig {
                title: Some(
                    "Optimal production profile (with optimal sizing of wind power plants)"
                        .to_string(),
                ),
                order: ["coal", "solar", "wind2", "wind", "gas"]
                    .map(String::from)
                    .to_vec(),
                ..ChartConfig::default()
            },
        }
    }

    /// Thermal plants plus a lossy battery scheduled jointly over the day.
    pub fn storage_milp() -> Self {
        Self {
            scenario: Self::named("storage_milp", Formulation::StorageMilp),
            storage: Some(StorageParams {
                charge_efficiency: 0.95,
                discharge_efficiency: 0.95,
                ..course_battery()
            }),
            ..Self::thermal()
        }
    }

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "thermal" => Ok(Self::thermal()),
            "battery_rule" => Ok(Self::battery_rule()),
            "co2_price" => Ok(Self::co2_price()),
            "cheap_baseload" => Ok(Self::cheap_baseload()),
            "renewables" => Ok(Self::renewables()),
            "unit_sizing" => Ok(Self::unit_sizing()),
            "storage_milp" => Ok(Self::storage_milp()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
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

    /// Number of hours in the horizon.
    pub fn hours(&self) -> usize {
        self.demand.len()
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let hours = self.hours();

        if self.demand.is_empty() {
            errors.push(ConfigError::new("demand", "must contain at least one hour"));
        }
        for (h, d) in self.demand.iter().enumerate() {
            if !d.is_finite() || *d < 0.0 {
                errors.push(ConfigError::new(
                    format!("demand[{h}]"),
                    "must be a finite value >= 0",
                ));
            }
        }

        if !self.scenario.co2_price.is_finite() || self.scenario.co2_price < 0.0 {
            errors.push(ConfigError::new("scenario.co2_price", "must be >= 0"));
        }

        if self.modes.is_empty() {
            errors.push(ConfigError::new("modes", "must define at least one mode"));
        }

        let mut names = HashSet::new();
        for (i, mode) in self.modes.iter().enumerate() {
            validate_mode(i, mode, hours, self.scenario.formulation, &mut errors);
            if !names.insert(mode.name.as_str()) {
                errors.push(ConfigError::new(
                    format!("modes[{i}].name"),
                    format!("duplicate mode \"{}\"", mode.name),
                ));
            }
        }

        match (&self.storage, self.scenario.formulation.needs_storage()) {
            (None, true) => errors.push(ConfigError::new(
                "storage",
                format!(
                    "required by formulation \"{}\"",
                    self.scenario.formulation
                ),
            )),
            (Some(storage), _) => {
                validate_storage(storage, &mut errors);
                if !names.insert(storage.name.as_str()) {
                    errors.push(ConfigError::new(
                        "storage.name",
                        format!("\"{}\" is already used by a mode", storage.name),
                    ));
                }
            }
            (None, false) => {}
        }

        if self.scenario.formulation == Formulation::RuleBattery
            && self.rule.charge_below_mw > self.rule.discharge_above_mw
        {
            errors.push(ConfigError::new(
                "rule.charge_below_mw",
                "must be <= rule.discharge_above_mw",
            ));
        }

        for (i, name) in self.chart.order.iter().enumerate() {
            if !names.contains(name.as_str()) {
                errors.push(ConfigError::new(
                    format!("chart.order[{i}]"),
                    format!("\"{name}\" is not a mode of this scenario"),
                ));
            }
        }

        errors
    }
}

fn validate_mode(
    i: usize,
    mode: &Mode,
    hours: usize,
    formulation: Formulation,
    errors: &mut Vec<ConfigError>,
) {
    if mode.name.trim().is_empty() {
        errors.push(ConfigError::new(format!("modes[{i}].name"), "must not be empty"));
    }
    if mode.fixed_cost < 0.0 || !mode.fixed_cost.is_finite() {
        errors.push(ConfigError::new(format!("modes[{i}].fixed_cost"), "must be >= 0"));
    }
    if mode.variable_cost < 0.0 || !mode.variable_cost.is_finite() {
        errors.push(ConfigError::new(
            format!("modes[{i}].variable_cost"),
            "must be >= 0",
        ));
    }
    if mode.co2_per_mwh < 0.0 || !mode.co2_per_mwh.is_finite() {
        errors.push(ConfigError::new(format!("modes[{i}].co2_per_mwh"), "must be >= 0"));
    }
    let non_finite = match &mode.capacity {
        Capacity::Constant(mw) => !mw.is_finite(),
        Capacity::Hourly(profile) => profile.iter().any(|mw| !mw.is_finite()),
        Capacity::Unlimited => false,
    };
    if non_finite {
        errors.push(ConfigError::new(
            format!("modes[{i}].capacity"),
            "must be finite (use \"unlimited\" for no bound)",
        ));
    } else if mode.capacity.min_over(hours) < 0.0 {
        errors.push(ConfigError::new(format!("modes[{i}].capacity"), "must be >= 0"));
    }
    if let Capacity::Hourly(profile) = &mode.capacity
        && profile.len() < hours
    {
        errors.push(ConfigError::new(
            format!("modes[{i}].capacity"),
            format!("has {} hourly values, demand has {hours}", profile.len()),
        ));
    }
    if mode.max_units == 0 {
        errors.push(ConfigError::new(format!("modes[{i}].max_units"), "must be >= 1"));
    }
    if formulation == Formulation::UnitSizing && mode.capacity == Capacity::Unlimited {
        errors.push(ConfigError::new(
            format!("modes[{i}].capacity"),
            "must be finite for unit sizing",
        ));
    }
    if let Some(color) = &mode.color
        && parse_hex_color(color).is_none()
    {
        errors.push(ConfigError::new(
            format!("modes[{i}].color"),
            format!("expected \"#rrggbb\", got \"{color}\""),
        ));
    }
}

fn validate_storage(storage: &StorageParams, errors: &mut Vec<ConfigError>) {
    for (field, value) in [
        ("storage.power_mw", storage.power_mw),
        ("storage.capacity_mwh", storage.capacity_mwh),
        ("storage.initial_mwh", storage.initial_mwh),
        ("storage.fixed_cost", storage.fixed_cost),
        ("storage.variable_cost", storage.variable_cost),
    ] {
        if !value.is_finite() {
            errors.push(ConfigError::new(field, "must be finite"));
        }
    }
    if storage.power_mw < 0.0 {
        errors.push(ConfigError::new("storage.power_mw", "must be >= 0"));
    }
    if storage.capacity_mwh <= 0.0 {
        errors.push(ConfigError::new("storage.capacity_mwh", "must be > 0"));
    }
    if !(0.0..=storage.capacity_mwh).contains(&storage.initial_mwh) {
        errors.push(ConfigError::new(
            "storage.initial_mwh",
            "must be in [0, storage.capacity_mwh]",
        ));
    }
    for (field, eta) in [
        ("storage.charge_efficiency", storage.charge_efficiency),
        ("storage.discharge_efficiency", storage.discharge_efficiency),
    ] {
        if !(eta > 0.0 && eta <= 1.0) {
            errors.push(ConfigError::new(field, "must be in (0.0, 1.0]"));
        }
    }
    if storage.fixed_cost < 0.0 || storage.variable_cost < 0.0 {
        errors.push(ConfigError::new("storage", "costs must be >= 0"));
    }
    if let Some(color) = &storage.color
        && parse_hex_color(color).is_none()
    {
        errors.push(ConfigError::new(
            "storage.color",
            format!("expected \"#rrggbb\", got \"{color}\""),
        ));
    }
}

/// Parses `#rrggbb` into its RGB components.
pub fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thermal_preset_valid() {
        let cfg = ScenarioConfig::thermal();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "thermal should be valid: {errors:?}");
        assert_eq!(cfg.hours(), 24);
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let cfg = cfg.unwrap();
            assert_eq!(cfg.scenario.name, *name);
            let errors = cfg.validate();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r##"
demand = [10, 20, 30]

[scenario]
name = "tiny"
formulation = "storage_milp"
co2_price = 25.0

[[modes]]
name = "coal"
fixed_cost = 100
variable_cost = 50
capacity = 40
co2_per_mwh = 1.0
color = "#000000"

[[modes]]
name = "sun"
fixed_cost = 0
variable_cost = 5
capacity = [0, 10, 5]

[storage]
power_mw = 5
capacity_mwh = 10

[chart]
order = ["sun", "coal", "battery"]
reference_line_mw = 25
"##;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.unwrap();
        assert_eq!(cfg.scenario.formulation, Formulation::StorageMilp);
        assert_eq!(cfg.hours(), 3);
        assert_eq!(cfg.modes[1].capacity, Capacity::Hourly(vec![0.0, 10.0, 5.0]));
        assert_eq!(cfg.storage.as_ref().map(|s| s.power_mw), Some(5.0));
        assert_eq!(cfg.storage.as_ref().map(|s| s.variable_cost), Some(20.0));
        assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[scenario]
name = "x"
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unknown_formulation_is_rejected() {
        let toml = r#"
[scenario]
formulation = "quantum"
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[scenario]
co2_price = 10.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.scenario.co2_price, 10.0);
        assert_eq!(cfg.scenario.formulation, Formulation::Economic);
        assert_eq!(cfg.demand, COURSE_DEMAND_MW.to_vec());
        assert_eq!(cfg.modes.len(), 4);
    }

    #[test]
    fn validation_catches_empty_demand() {
        let mut cfg = ScenarioConfig::thermal();
        cfg.demand.clear();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "demand"));
    }

    #[test]
    fn validation_catches_short_profile() {
        let mut cfg = ScenarioConfig::renewables();
        cfg.modes[2].capacity = Capacity::Hourly(vec![1.0; 12]);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "modes[2].capacity"));
    }

    #[test]
    fn validation_catches_nan_storage_power() {
        let toml = r#"
[scenario]
formulation = "rule_battery"

[storage]
power_mw = nan
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "storage.power_mw"), "{errors:?}");
    }

    #[test]
    fn validation_catches_infinite_storage_fields() {
        let mut cfg = ScenarioConfig::storage_milp();
        if let Some(storage) = cfg.storage.as_mut() {
            storage.capacity_mwh = f64::INFINITY;
            storage.variable_cost = f64::NAN;
        }
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"storage.capacity_mwh".to_string()));
        assert!(fields.contains(&"storage.variable_cost".to_string()));
    }

    #[test]
    fn validation_catches_nan_capacity() {
        let toml = r#"
demand = [10]

[[modes]]
name = "only"
fixed_cost = 0
variable_cost = 1
capacity = nan
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "modes[0].capacity"), "{errors:?}");
    }

    #[test]
    fn validation_catches_non_finite_profile_value() {
        let mut cfg = ScenarioConfig::renewables();
        let mut profile = vec![1.0; 24];
        profile[7] = f64::INFINITY;
        cfg.modes[2].capacity = Capacity::Hourly(profile);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "modes[2].capacity"));

        cfg.modes[2].capacity = Capacity::Unlimited;
        assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
    }

    #[test]
    fn validation_catches_missing_storage() {
        let mut cfg = ScenarioConfig::battery_rule();
        cfg.storage = None;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "storage"));
    }

    #[test]
    fn validation_catches_duplicate_modes() {
        let mut cfg = ScenarioConfig::thermal();
        cfg.modes[1].name = "coal".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "modes[1].name"));
    }

    #[test]
    fn validation_catches_bad_efficiency() {
        let mut cfg = ScenarioConfig::storage_milp();
        if let Some(storage) = cfg.storage.as_mut() {
            storage.discharge_efficiency = 0.0;
        }
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "storage.discharge_efficiency"));
    }

    #[test]
    fn validation_catches_unknown_chart_entry() {
        let mut cfg = ScenarioConfig::thermal();
        cfg.chart.order = vec!["coal".into(), "hydro".into()];
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "chart.order[1]"));
    }

    #[test]
    fn unit_sizing_rejects_unlimited_capacity() {
        let mut cfg = ScenarioConfig::unit_sizing();
        cfg.modes[0].capacity = Capacity::Unlimited;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "modes[0].capacity"));
    }

    #[test]
    fn co2_preset_prices_coal_above_gas() {
        let cfg = ScenarioConfig::co2_price();
        let price = cfg.scenario.co2_price;
        assert_eq!(cfg.modes[0].marginal_cost(price), 150.0);
        assert_eq!(cfg.modes[1].marginal_cost(price), 112.0);
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#1f77b4"), Some((0x1f, 0x77, 0xb4)));
        assert_eq!(parse_hex_color("1f77b4"), None);
        assert_eq!(parse_hex_color("#1f77"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }
}
