//! Dispatch formulations handed to the LP/MILP solver, and their results.

use good_lp::{ProblemVariables, Variable, variable};
use tracing::info;

use crate::config::{Formulation, RuleConfig, ScenarioConfig};
use crate::error::{Error, Result};
use crate::modes::{Mode, StorageParams};

/// Single LP over every hour.
pub mod economic;
pub mod kpi;
/// Threshold-driven battery with one LP per hour.
pub mod rule_based;
/// Integer unit counts per mode.
pub mod sizing;
/// Battery scheduled jointly with generation.
pub mod storage;
pub mod types;

pub use kpi::KpiReport;
pub use types::{DispatchSolution, HourDispatch, StorageFlow};

/// Values below this magnitude are reported as zero.
const SOLVER_EPSILON: f64 = 1e-9;

/// Parameter tables for one dispatch run, built from a validated scenario.
#[derive(Debug, Clone)]
pub struct DispatchProblem {
    pub name: String,
    pub formulation: Formulation,
    pub modes: Vec<Mode>,
    pub demand: Vec<f64>,
    pub co2_price: f64,
    pub storage: Option<StorageParams>,
    pub rule: RuleConfig,
}

impl DispatchProblem {
    /// Validates the scenario and copies out the tables the solver needs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] listing every validation failure.
    pub fn from_config(config: &ScenarioConfig) -> Result<Self> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(Error::Config(errors));
        }
        Ok(Self {
            name: config.scenario.name.clone(),
            formulation: config.scenario.formulation,
            modes: config.modes.clone(),
            demand: config.demand.clone(),
            co2_price: config.scenario.co2_price,
            storage: config.storage.clone(),
            rule: config.rule.clone(),
        })
    }

    /// Number of hours in the horizon.
    pub fn hours(&self) -> usize {
        self.demand.len()
    }

    /// Mode names in declaration order.
    pub fn mode_names(&self) -> Vec<String> {
        self.modes.iter().map(|m| m.name.clone()).collect()
    }

    /// Builds and solves the configured formulation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Infeasible`] when demand cannot be met, or another
    /// solver error.
    pub fn solve(&self) -> Result<DispatchSolution> {
        info!(
            scenario = %self.name,
            formulation = %self.formulation,
            hours = self.hours(),
            modes = self.modes.len(),
            "solving dispatch"
        );
        let solution = match self.formulation {
            Formulation::Economic => economic::solve(self),
            Formulation::RuleBattery => rule_based::solve(self),
            Formulation::StorageMilp => storage::solve(self),
            Formulation::UnitSizing => sizing::solve(self),
        }?;
        info!(
            objective = solution.objective,
            residual_mw = solution.max_balance_residual(),
            "dispatch solved"
        );
        Ok(solution)
    }

    /// Fixed cost of every mode for one hour, one unit each.
    pub(crate) fn fixed_cost_per_hour(&self) -> f64 {
        self.modes.iter().map(|m| m.fixed_cost).sum()
    }

    /// Variable plus carbon cost of an hour's production.
    pub(crate) fn running_cost(&self, production: &[f64]) -> f64 {
        self.modes
            .iter()
            .zip(production)
            .map(|(m, p)| m.marginal_cost(self.co2_price) * p)
            .sum()
    }

    pub(crate) fn storage_params(&self) -> Result<&StorageParams> {
        self.storage.as_ref().ok_or_else(|| {
            Error::Config(vec![crate::config::ConfigError {
                field: "storage".into(),
                message: format!("required by formulation \"{}\"", self.formulation),
            }])
        })
    }

    /// Adds one bounded production variable per (hour, mode).
    pub(crate) fn production_vars(&self, vars: &mut ProblemVariables) -> Vec<Vec<Variable>> {
        (0..self.hours())
            .map(|h| {
                self.modes
                    .iter()
                    .map(|m| vars.add(variable().min(0.0).max(m.limit(h))))
                    .collect()
            })
            .collect()
    }
}

/// Rounds solver noise to zero.
pub(crate) fn clean(value: f64) -> f64 {
    if value.abs() < SOLVER_EPSILON { 0.0 } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_is_rejected_before_solving() {
        let mut cfg = ScenarioConfig::thermal();
        cfg.demand.clear();
        let err = DispatchProblem::from_config(&cfg).unwrap_err();
        assert!(matches!(err, Error::Config(ref errors) if errors.iter().any(|e| e.field == "demand")));
    }

    #[test]
    fn running_cost_uses_carbon_price() {
        let problem = DispatchProblem::from_config(&ScenarioConfig::co2_price()).unwrap();
        // coal 150/MWh and gas 112/MWh at 60 per tonne
        assert_eq!(problem.running_cost(&[1.0, 1.0, 0.0, 0.0]), 262.0);
        assert_eq!(problem.fixed_cost_per_hour(), 2500.0);
    }

    #[test]
    fn clean_drops_noise() {
        assert_eq!(clean(1e-12), 0.0);
        assert_eq!(clean(-1e-12), 0.0);
        assert_eq!(clean(0.5), 0.5);
    }
}
