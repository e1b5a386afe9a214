//! Radial feeder sizing: resistance, losses, and annual line costs.
//!
//! Units follow the course conventions: lengths in km, cross-sections in mm²,
//! voltages in MV, powers in MW, prices in NOK/MWh.

use std::fmt;

use serde::Deserialize;

/// Overhead line candidate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineType {
    pub name: String,
    /// Conductor cross-section (mm²).
    pub cross_section_mm2: f64,
    /// Thermal current limit (A).
    pub ampacity_a: f64,
    /// Investment cost (NOK/km).
    #[serde(default)]
    pub investment_nok_per_km: f64,
}

impl LineType {
    pub fn new(name: &str, cross_section_mm2: f64, ampacity_a: f64, investment: f64) -> Self {
        Self {
            name: name.to_string(),
            cross_section_mm2,
            ampacity_a,
            investment_nok_per_km: investment,
        }
    }
}

/// Site data for the feeder: geometry, two-level load profile and tariffs.
#[derive(Debug, Clone, PartialEq)]
pub struct Feeder {
    pub length_km: f64,
    /// Conductor resistivity (Ω·mm²/km).
    pub resistivity: f64,
    pub voltage_mv: f64,
    pub peak_load_mw: f64,
    pub valley_load_mw: f64,
    pub peak_price: f64,
    pub valley_price: f64,
    pub peak_hours: f64,
    pub valley_hours: f64,
}

impl Feeder {
    /// Line resistance (Ω).
    pub fn resistance(&self, line: &LineType) -> f64 {
        self.length_km * self.resistivity / line.cross_section_mm2
    }

    /// Three-phase transfer limit `√3 · U · I_max` (MW).
    pub fn max_power(&self, line: &LineType) -> f64 {
        3f64.sqrt() * self.voltage_mv * line.ampacity_a
    }

    /// Resistive loss for a transfer of `power_mw` over a line of `resistance_ohm`.
    pub fn loss_mw(&self, resistance_ohm: f64, power_mw: f64) -> f64 {
        resistance_ohm * 1e-6 * power_mw.powi(2) / self.voltage_mv.powi(2)
    }

    /// Cost of losses over one year at the peak and valley tariffs.
    pub fn annual_loss_cost(&self, line: &LineType) -> f64 {
        let r = self.resistance(line);
        let peak = self.loss_mw(r, self.peak_load_mw);
        let valley = self.loss_mw(r, self.valley_load_mw);
        365.0
            * (self.peak_price * peak * self.peak_hours
                + self.valley_price * valley * self.valley_hours)
    }

    /// Cost of the delivered energy over one year.
    pub fn annual_energy_cost(&self) -> f64 {
        365.0
            * (self.peak_price * self.peak_load_mw * self.peak_hours
                + self.valley_price * self.valley_load_mw * self.valley_hours)
    }

    /// Investment annuity for `line` given the annuity factor.
    pub fn annual_investment(&self, line: &LineType, annuity: f64) -> f64 {
        line.investment_nok_per_km * self.length_km * annuity
    }

    /// Annual investment, losses, and their sum for `line`.
    pub fn assess(&self, line: &LineType, annuity: f64) -> LineAssessment {
        let investment = self.annual_investment(line, annuity);
        let losses = self.annual_loss_cost(line);
        LineAssessment {
            line: line.name.clone(),
            investment,
            losses,
            total: investment + losses,
        }
    }

    /// Peak load above what `line` can carry (MW); negative when it fits.
    pub fn capacity_shortfall(&self, line: &LineType) -> f64 {
        self.peak_load_mw - self.max_power(line)
    }

    /// Same site with a flat load of `load_mw` in both periods.
    pub fn with_flat_load(&self, load_mw: f64) -> Self {
        Self {
            peak_load_mw: load_mw,
            valley_load_mw: load_mw,
            ..self.clone()
        }
    }

    /// Same site with a different peak tariff.
    pub fn with_peak_price(&self, peak_price: f64) -> Self {
        Self {
            peak_price,
            ..self.clone()
        }
    }

    /// Coefficient `K` of the loss cost `K / x` as a function of cross-section `x`.
    pub fn loss_coefficient(&self) -> f64 {
        let per_area = self.length_km * self.resistivity / (self.voltage_mv * 1e3).powi(2);
        per_area
            * 365.0
            * (self.peak_price * self.peak_load_mw.powi(2) * self.peak_hours
                + self.valley_price * self.valley_load_mw.powi(2) * self.valley_hours)
    }

    /// Cross-section minimising `fit(x)·L·E + K/x` (mm²).
    ///
    /// Returns `None` when the fitted cost does not grow with cross-section.
    pub fn optimal_cross_section(&self, fit: &LinearCostFit, annuity: f64) -> Option<f64> {
        let marginal = self.length_km * annuity * fit.per_mm2;
        (marginal > 0.0).then(|| (self.loss_coefficient() / marginal).sqrt())
    }
}

/// Annual cost breakdown for one line (NOK/year).
#[derive(Debug, Clone, PartialEq)]
pub struct LineAssessment {
    pub line: String,
    pub investment: f64,
    pub losses: f64,
    pub total: f64,
}

impl fmt::Display for LineAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: investment {:.0} NOK/yr + losses {:.0} NOK/yr = {:.0} NOK/yr",
            self.line, self.investment, self.losses, self.total
        )
    }
}

/// Marginal analysis: the cheaper of two assessed lines.
pub fn compare<'a>(a: &'a LineAssessment, b: &'a LineAssessment) -> &'a LineAssessment {
    if b.total < a.total { b } else { a }
}

/// Investment cost as a linear function of cross-section, `F(x) = a + b·x` (NOK/km).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCostFit {
    pub intercept: f64,
    pub per_mm2: f64,
}

impl LinearCostFit {
    /// Line through the (cross-section, investment) points of two line types.
    ///
    /// Returns `None` when both have the same cross-section.
    pub fn through(a: &LineType, b: &LineType) -> Option<Self> {
        let dx = b.cross_section_mm2 - a.cross_section_mm2;
        if dx == 0.0 {
            return None;
        }
        let per_mm2 = (b.investment_nok_per_km - a.investment_nok_per_km) / dx;
        Some(Self {
            intercept: b.investment_nok_per_km - per_mm2 * b.cross_section_mm2,
            per_mm2,
        })
    }

    pub fn cost(&self, cross_section_mm2: f64) -> f64 {
        self.intercept + self.per_mm2 * cross_section_mm2
    }
}
