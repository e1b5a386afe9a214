//! Feeder reinforcement study: configuration, the full calculation chain, and its report.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use super::annuity_factor;
use super::fleet::FleetBattery;
use super::line::{Feeder, LineAssessment, LineType, LinearCostFit, compare};
use super::payment::{PaymentCase, ReinvestmentSchedule};
use super::sensitivity::{
    Sweep, linspace, sweep_discount_rate, sweep_peak_price, sweep_reinvestment,
};
use crate::config::ConfigError;
use crate::error::{Error, Result};

/// Inputs of the reinforcement study, parsed from TOML.
///
/// Every table defaults to the course case, so an empty file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudyConfig {
    pub site: SiteConfig,
    pub charging: ChargingConfig,
    pub finance: FinanceConfig,
    pub fleet: FleetConfig,
    /// Line currently supplying the site.
    pub existing_line: LineType,
    /// Reinforcement options compared by marginal analysis.
    pub candidates: Vec<LineType>,
    /// Candidate whose annual cost the fleet battery is priced against.
    pub reference_line: String,
    pub sweeps: SweepConfig,
}

/// Feeder geometry and the load before charging stations (MW, NOK/MWh, h).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub length_km: f64,
    pub resistivity: f64,
    pub voltage_mv: f64,
    pub peak_load_mw: f64,
    pub valley_load_mw: f64,
    pub peak_price: f64,
    pub valley_price: f64,
    pub peak_hours: f64,
    pub valley_hours: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            length_km: 8.0,
            resistivity: 18.0,
            voltage_mv: 0.01,
            peak_load_mw: 3.5,
            valley_load_mw: 1.25,
            peak_price: 325.0,
            valley_price: 210.0,
            peak_hours: 6.0,
            valley_hours: 18.0,
        }
    }
}

/// Fast-charging stations added to the peak load.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChargingConfig {
    pub stations: u32,
    pub station_mw: f64,
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            stations: 52,
            station_mw: 0.055,
        }
    }
}

impl ChargingConfig {
    pub fn load_mw(&self) -> f64 {
        f64::from(self.stations) * self.station_mw
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinanceConfig {
    pub discount_rate: f64,
    pub lifetime_years: u32,
    /// Years at which the fleet battery is paid for again.
    pub reinvestment_years: Vec<u32>,
    /// Growth `x` of successive reinvestments.
    pub reinvestment_growth: f64,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            discount_rate: 0.085,
            lifetime_years: 20,
            reinvestment_years: vec![5, 10, 15],
            reinvestment_growth: 0.25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    pub charge_efficiency: f64,
    pub discharge_efficiency: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            charge_efficiency: 0.94,
            discharge_efficiency: 0.92,
        }
    }
}

/// Closed interval sampled at `points` evenly spaced values.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeConfig {
    pub start: f64,
    pub end: f64,
    pub points: usize,
}

impl RangeConfig {
    pub fn values(&self) -> Vec<f64> {
        linspace(self.start, self.end, self.points)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    pub reinvestment: RangeConfig,
    pub discount_rate: RangeConfig,
    pub peak_price: RangeConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            reinvestment: RangeConfig {
                start: 0.0,
                end: 1.0,
                points: 21,
            },
            discount_rate: RangeConfig {
                start: 0.0,
                end: 0.2,
                points: 11,
            },
            peak_price: RangeConfig {
                start: 0.0,
                end: 1000.0,
                points: 20,
            },
        }
    }
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            charging: ChargingConfig::default(),
            finance: FinanceConfig::default(),
            fleet: FleetConfig::default(),
            existing_line: LineType::new("FeAl25", 25.0, 255.0, 0.0),
            candidates: vec![
                LineType::new("FeAl75", 60.0, 424.0, 750_000.0),
                LineType::new("FeAl90", 90.0, 485.0, 900_000.0),
            ],
            reference_line: "FeAl90".to_string(),
            sweeps: SweepConfig::default(),
        }
    }
}

impl StudyConfig {
    /// Parses a study from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "study".into(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a study from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".into(),
            message: e.to_string(),
        })
    }

    /// Site data with the charging load added to the peak.
    pub fn feeder(&self) -> Feeder {
        let s = &self.site;
        Feeder {
            length_km: s.length_km,
            resistivity: s.resistivity,
            voltage_mv: s.voltage_mv,
            peak_load_mw: s.peak_load_mw + self.charging.load_mw(),
            valley_load_mw: s.valley_load_mw,
            peak_price: s.peak_price,
            valley_price: s.valley_price,
            peak_hours: s.peak_hours,
            valley_hours: s.valley_hours,
        }
    }

    pub fn schedule(&self) -> ReinvestmentSchedule {
        ReinvestmentSchedule {
            years: self.finance.reinvestment_years.clone(),
            growth: self.finance.reinvestment_growth,
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ConfigError {
                    field: field.to_string(),
                    message: message.to_string(),
                });
            }
        };

        let s = &self.site;
        check(s.length_km > 0.0, "site.length_km", "must be > 0");
        check(s.resistivity > 0.0, "site.resistivity", "must be > 0");
        check(s.voltage_mv > 0.0, "site.voltage_mv", "must be > 0");
        check(s.peak_load_mw >= 0.0, "site.peak_load_mw", "must be >= 0");
        check(s.valley_load_mw >= 0.0, "site.valley_load_mw", "must be >= 0");
        check(s.peak_hours > 0.0, "site.peak_hours", "must be > 0");
        check(s.valley_hours > 0.0, "site.valley_hours", "must be > 0");
        check(
            s.peak_hours + s.valley_hours <= 24.0,
            "site.valley_hours",
            "peak and valley hours must fit in a day",
        );
        check(self.charging.station_mw >= 0.0, "charging.station_mw", "must be >= 0");

        let f = &self.finance;
        check(f.discount_rate >= 0.0, "finance.discount_rate", "must be >= 0");
        check(f.lifetime_years >= 1, "finance.lifetime_years", "must be >= 1");
        check(
            f.reinvestment_years.iter().all(|&y| y >= 1),
            "finance.reinvestment_years",
            "every year must be >= 1",
        );
        check(
            f.reinvestment_growth >= 0.0,
            "finance.reinvestment_growth",
            "must be >= 0",
        );

        for (field, eta) in [
            ("fleet.charge_efficiency", self.fleet.charge_efficiency),
            ("fleet.discharge_efficiency", self.fleet.discharge_efficiency),
        ] {
            check(eta > 0.0 && eta <= 1.0, field, "must be in (0.0, 1.0]");
        }

        for (i, line) in std::iter::once(&self.existing_line)
            .chain(&self.candidates)
            .enumerate()
        {
            let field = if i == 0 {
                "existing_line".to_string()
            } else {
                format!("candidates[{}]", i - 1)
            };
            check(
                line.cross_section_mm2 > 0.0,
                &format!("{field}.cross_section_mm2"),
                "must be > 0",
            );
            check(line.ampacity_a > 0.0, &format!("{field}.ampacity_a"), "must be > 0");
            check(
                line.investment_nok_per_km >= 0.0,
                &format!("{field}.investment_nok_per_km"),
                "must be >= 0",
            );
        }
        check(
            self.candidates.len() >= 2,
            "candidates",
            "needs at least two lines to compare",
        );
        check(
            self.candidates.iter().any(|l| l.name == self.reference_line),
            "reference_line",
            "must name one of the candidates",
        );

        for (field, range) in [
            ("sweeps.reinvestment.points", self.sweeps.reinvestment),
            ("sweeps.discount_rate.points", self.sweeps.discount_rate),
            ("sweeps.peak_price.points", self.sweeps.peak_price),
        ] {
            check(range.points >= 1, field, "must be >= 1");
        }
        check(
            self.sweeps.discount_rate.start >= 0.0,
            "sweeps.discount_rate.start",
            "must be >= 0",
        );

        errors
    }
}

/// Annual cost of the fleet-battery alternative (NOK/year).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryOperatingCost {
    /// Energy bought at the flat import.
    pub energy: f64,
    /// Losses on the existing line at the flat import.
    pub losses: f64,
}

impl BatteryOperatingCost {
    pub fn total(&self) -> f64 {
        self.energy + self.losses
    }
}

/// Results of the full study.
#[derive(Debug, Clone)]
pub struct StudyReport {
    pub charging_load_mw: f64,
    pub peak_load_mw: f64,
    pub existing_line: String,
    pub existing_capacity_mw: f64,
    /// Peak load above the existing line's capacity (MW).
    pub shortfall_mw: f64,
    pub annuity: f64,
    pub assessments: Vec<LineAssessment>,
    /// Cheapest candidate by annual total.
    pub preferred: String,
    pub fit: LinearCostFit,
    /// `None` when the fitted cost does not grow with cross-section.
    pub optimal_cross_section_mm2: Option<f64>,
    pub fleet: FleetBattery,
    pub reference_line: String,
    /// Annual cost of the reference line including delivered energy.
    pub reference_cost: f64,
    pub battery_operating_cost: BatteryOperatingCost,
    pub max_initial_payment: f64,
    pub sweeps: Vec<Sweep>,
}

/// Runs the whole calculation chain on a validated configuration.
///
/// # Errors
///
/// Returns [`Error::Config`] listing every validation failure.
pub fn run(config: &StudyConfig) -> Result<StudyReport> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(Error::Config(errors));
    }
    let invalid = |field: &str, message: &str| {
        Error::from(ConfigError {
            field: field.to_string(),
            message: message.to_string(),
        })
    };

    let feeder = config.feeder();
    let finance = &config.finance;
    let annuity = annuity_factor(finance.discount_rate, finance.lifetime_years)
        .ok_or_else(|| invalid("finance.lifetime_years", "must be >= 1"))?;
    info!(
        peak_load_mw = feeder.peak_load_mw,
        annuity, "running feeder study"
    );

    let existing_capacity_mw = feeder.max_power(&config.existing_line);
    let assessments: Vec<LineAssessment> = config
        .candidates
        .iter()
        .map(|line| feeder.assess(line, annuity))
        .collect();
    let preferred = assessments
        .iter()
        .reduce(|best, next| compare(best, next))
        .map(|a| a.line.clone())
        .ok_or_else(|| invalid("candidates", "needs at least two lines to compare"))?;
    for a in &assessments {
        debug!(line = %a.line, total = a.total, "line assessed");
    }

    let fit = LinearCostFit::through(&config.candidates[0], &config.candidates[1])
        .ok_or_else(|| invalid("candidates", "first two lines need different cross-sections"))?;
    let optimal_cross_section_mm2 = feeder.optimal_cross_section(&fit, annuity);

    let fleet = FleetBattery::size(
        feeder.peak_load_mw,
        feeder.valley_load_mw,
        feeder.peak_hours,
        feeder.valley_hours,
        config.fleet.charge_efficiency,
        config.fleet.discharge_efficiency,
    );
    let flat = feeder.with_flat_load(fleet.import_mw);
    let battery_operating_cost = BatteryOperatingCost {
        energy: flat.annual_energy_cost(),
        losses: flat.annual_loss_cost(&config.existing_line),
    };

    let reference = config
        .candidates
        .iter()
        .find(|l| l.name == config.reference_line)
        .cloned()
        .ok_or_else(|| invalid("reference_line", "must name one of the candidates"))?;
    let case = PaymentCase {
        feeder: feeder.clone(),
        reference,
        rate: finance.discount_rate,
        lifetime_years: finance.lifetime_years,
        schedule: config.schedule(),
    };
    let undefined = || invalid("finance.reinvestment_years", "every year must be >= 1");
    let reference_cost = case.reference_cost().ok_or_else(undefined)?;
    let max_initial_payment = case.max_payment().ok_or_else(undefined)?;

    let sweeps = vec![
        sweep_reinvestment(&case, &config.sweeps.reinvestment.values()).ok_or_else(undefined)?,
        sweep_discount_rate(&case, &config.sweeps.discount_rate.values())
            .ok_or_else(undefined)?,
        sweep_peak_price(&case, &config.sweeps.peak_price.values()).ok_or_else(undefined)?,
    ];
    info!(max_initial_payment, preferred = %preferred, "feeder study done");

    Ok(StudyReport {
        charging_load_mw: config.charging.load_mw(),
        peak_load_mw: feeder.peak_load_mw,
        existing_line: config.existing_line.name.clone(),
        existing_capacity_mw,
        shortfall_mw: feeder.capacity_shortfall(&config.existing_line),
        annuity,
        assessments,
        preferred,
        fit,
        optimal_cross_section_mm2,
        fleet,
        reference_line: config.reference_line.clone(),
        reference_cost,
        battery_operating_cost,
        max_initial_payment,
        sweeps,
    })
}

impl fmt::Display for StudyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Line capacity ---")?;
        writeln!(f, "Charging load:         {:.4} MW", self.charging_load_mw)?;
        writeln!(f, "Peak load:             {:.4} MW", self.peak_load_mw)?;
        writeln!(
            f,
            "Line capacity:         {:.4} MW ({})",
            self.existing_capacity_mw, self.existing_line
        )?;
        writeln!(f, "Shortfall:             {:.4} MW", self.shortfall_mw)?;
        writeln!(f, "--- Marginal analysis ---")?;
        writeln!(f, "Annuity factor:        {:.6}", self.annuity)?;
        for a in &self.assessments {
            writeln!(f, "{a}")?;
        }
        writeln!(f, "Preferred line:        {}", self.preferred)?;
        writeln!(
            f,
            "Cost fit:              F(x) = {:.0} + {:.2}·x NOK/km",
            self.fit.intercept, self.fit.per_mm2
        )?;
        match self.optimal_cross_section_mm2 {
            Some(x) => writeln!(f, "Optimal cross-section: {x:.2} mm2")?,
            None => writeln!(f, "Optimal cross-section: undefined")?,
        }
        writeln!(f, "--- Fleet battery ---")?;
        writeln!(f, "Battery:               {}", self.fleet)?;
        writeln!(f, "Battery capacity:      {:.4} MWh", self.fleet.energy_mwh)?;
        writeln!(
            f,
            "Reference cost:        {:.0} NOK/yr ({})",
            self.reference_cost, self.reference_line
        )?;
        writeln!(
            f,
            "Battery operation:     {:.0} NOK/yr (energy {:.0} + losses {:.0})",
            self.battery_operating_cost.total(),
            self.battery_operating_cost.energy,
            self.battery_operating_cost.losses
        )?;
        write!(f, "Max initial payment:   {:.0} NOK", self.max_initial_payment)?;
        for sweep in &self.sweeps {
            let (lo, hi) = sweep
                .values()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            write!(
                f,
                "\n{}: {} points, {:.0} .. {:.0} NOK",
                sweep.title,
                sweep.points.len(),
                lo,
                hi
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn default_study_is_valid() {
        let errors = StudyConfig::default().validate();
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn course_study() {
        let r = run(&StudyConfig::default()).unwrap();
        assert_relative_eq!(r.charging_load_mw, 2.86, max_relative = 1e-9);
        assert_relative_eq!(r.shortfall_mw, 1.943_270_440_699_363, max_relative = 1e-9);
        assert_eq!(r.preferred, "FeAl90");
        assert_relative_eq!(
            r.optimal_cross_section_mm2.unwrap(),
            102.677_229_013_254_29,
            max_relative = 1e-9
        );
        assert_relative_eq!(r.fleet.energy_mwh, 24.054_417_983_529_934, max_relative = 1e-9);
        assert_relative_eq!(r.reference_cost, 7_507_318.560_175_791, max_relative = 1e-9);
        assert_relative_eq!(r.max_initial_payment, 2_344_677.323_272_809, max_relative = 1e-9);
        assert_relative_eq!(
            r.battery_operating_cost.total(),
            6_447_501.225_615_592,
            max_relative = 1e-9
        );
        let sizes: Vec<usize> = r.sweeps.iter().map(|s| s.points.len()).collect();
        assert_eq!(sizes, vec![21, 11, 20]);
    }

    #[test]
    fn partial_toml_overrides_one_field() {
        let cfg = StudyConfig::from_toml_str(
            r#"
[charging]
stations = 10
"#,
        )
        .unwrap();
        assert_eq!(cfg.charging.stations, 10);
        assert_eq!(cfg.charging.station_mw, 0.055);
        assert_eq!(cfg.candidates.len(), 2);
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(StudyConfig::from_toml_str("[site]\nheight = 3\n").is_err());
    }

    #[test]
    fn candidates_from_toml() {
        let cfg = StudyConfig::from_toml_str(
            r#"
reference_line = "B"

[[candidates]]
name = "A"
cross_section_mm2 = 50
ampacity_a = 300
investment_nok_per_km = 500000

[[candidates]]
name = "B"
cross_section_mm2 = 100
ampacity_a = 500
investment_nok_per_km = 800000
"#,
        )
        .unwrap();
        let r = run(&cfg).unwrap();
        assert_relative_eq!(r.fit.per_mm2, 6000.0, max_relative = 1e-12);
        assert_eq!(r.reference_line, "B");
    }

    #[test]
    fn validation_lists_every_problem() {
        let mut cfg = StudyConfig::default();
        cfg.finance.lifetime_years = 0;
        cfg.fleet.discharge_efficiency = 1.5;
        cfg.reference_line = "FeAl120".into();
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"finance.lifetime_years".to_string()));
        assert!(fields.contains(&"fleet.discharge_efficiency".to_string()));
        assert!(fields.contains(&"reference_line".to_string()));
        assert!(matches!(run(&cfg), Err(Error::Config(_))));
    }

    #[test]
    fn report_prints_headline_numbers() {
        let text = run(&StudyConfig::default()).unwrap().to_string();
        assert!(text.contains("Shortfall:"));
        assert!(text.contains("Preferred line:        FeAl90"));
        assert!(text.contains("Max initial payment:   2344677 NOK"));
    }
}
