//! Post-hoc KPI computation from a solved dispatch.

use std::fmt;

use super::{DispatchProblem, DispatchSolution};

/// Aggregate indicators derived from a complete dispatch.
///
/// Computed from the per-hour records rather than the solver's objective so
/// that reported numbers always match the printed table.
#[derive(Debug, Clone)]
pub struct KpiReport {
    /// Total cost over the horizon.
    pub total_cost: f64,
    /// Fixed cost share, including storage and installed units.
    pub fixed_cost: f64,
    /// Variable cost share, including battery discharge.
    pub variable_cost: f64,
    /// Carbon cost share.
    pub co2_cost: f64,
    /// Total demand (MWh).
    pub demand_mwh: f64,
    /// Highest hourly demand (MW).
    pub peak_demand_mw: f64,
    /// Energy per mode, in mode order (MWh).
    pub energy_mwh: Vec<(String, f64)>,
    /// Total emissions (t).
    pub emissions_t: f64,
    /// Share of generation from renewable modes (%).
    pub renewable_share_pct: f64,
    /// Energy discharged by the battery (MWh).
    pub storage_throughput_mwh: f64,
    /// Largest demand-balance residual (MW).
    pub max_residual_mw: f64,
}

impl KpiReport {
    /// Computes all KPIs from a solution and the problem it solved.
    ///
    /// # Arguments
    ///
    /// * `solution` - Solved dispatch
    /// * `problem` - Problem holding the mode costs and emissions
    pub fn from_solution(solution: &DispatchSolution, problem: &DispatchProblem) -> Self {
        let mut variable_cost = 0.0;
        let mut co2_cost = 0.0;
        let mut emissions_t = 0.0;
        let mut renewable_mwh = 0.0;
        let mut generation_mwh = 0.0;
        let mut storage_throughput_mwh = 0.0;

        for hour in &solution.hours {
            for (mode, &p) in problem.modes.iter().zip(&hour.production) {
                variable_cost += mode.variable_cost * p;
                co2_cost += problem.co2_price * mode.co2_per_mwh * p;
                emissions_t += mode.co2_per_mwh * p;
                generation_mwh += p;
                if mode.is_renewable() {
                    renewable_mwh += p;
                }
            }
            if let Some(flow) = hour.storage {
                storage_throughput_mwh += flow.discharge_mw;
            }
        }
        if let Some(storage) = &problem.storage
            && solution.storage_name.is_some()
        {
            variable_cost += storage.variable_cost * storage_throughput_mwh;
        }

        let total_cost = solution.objective;
        let renewable_share_pct = if generation_mwh > 0.0 {
            100.0 * renewable_mwh / generation_mwh
        } else {
            0.0
        };

        Self {
            total_cost,
            fixed_cost: total_cost - variable_cost - co2_cost,
            variable_cost,
            co2_cost,
            demand_mwh: solution.hours.iter().map(|h| h.demand_mw).sum(),
            peak_demand_mw: solution
                .hours
                .iter()
                .map(|h| h.demand_mw)
                .fold(0.0, f64::max),
            energy_mwh: solution
                .mode_names
                .iter()
                .enumerate()
                .map(|(m, name)| (name.clone(), solution.mode_energy(m)))
                .collect(),
            emissions_t,
            renewable_share_pct,
            storage_throughput_mwh,
            max_residual_mw: solution.max_balance_residual(),
        }
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(f, "Total cost:            {:.2}", self.total_cost)?;
        writeln!(f, "Fixed cost:            {:.2}", self.fixed_cost)?;
        writeln!(f, "Variable cost:         {:.2}", self.variable_cost)?;
        writeln!(f, "CO2 cost:              {:.2}", self.co2_cost)?;
        writeln!(f, "Demand:                {:.2} MWh", self.demand_mwh)?;
        writeln!(f, "Peak demand:           {:.2} MW", self.peak_demand_mw)?;
        for (name, energy) in &self.energy_mwh {
            writeln!(f, "Energy {name:<15} {energy:.2} MWh")?;
        }
        writeln!(f, "Emissions:             {:.2} t", self.emissions_t)?;
        writeln!(f, "Renewable share:       {:.1}%", self.renewable_share_pct)?;
        writeln!(
            f,
            "Storage throughput:    {:.2} MWh",
            self.storage_throughput_mwh
        )?;
        write!(f, "Max balance residual:  {:.6} MW", self.max_residual_mw)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::config::ScenarioConfig;

    fn report(cfg: &ScenarioConfig) -> KpiReport {
        let problem = DispatchProblem::from_config(cfg).unwrap();
        let solution = problem.solve().unwrap();
        KpiReport::from_solution(&solution, &problem)
    }

    #[test]
    fn thermal_cost_split() {
        let r = report(&ScenarioConfig::thermal());
        assert_abs_diff_eq!(r.total_cost, 217_000.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.fixed_cost, 60_000.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.variable_cost, 157_000.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.co2_cost, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.demand_mwh, 2390.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.peak_demand_mw, 220.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.renewable_share_pct, 0.0, epsilon = 1e-9);
        assert_eq!(r.energy_mwh[0].0, "coal");
        assert_abs_diff_eq!(r.energy_mwh[0].1, 2050.0, epsilon = 1e-6);
    }

    #[test]
    fn co2_emissions_follow_dispatch() {
        let r = report(&ScenarioConfig::co2_price());
        // 2370 MWh of gas at 0.2 t/MWh
        assert_abs_diff_eq!(r.emissions_t, 474.0, epsilon = 1e-6);
        assert_abs_diff_eq!(r.co2_cost, 474.0 * 60.0, epsilon = 1e-3);
    }

    #[test]
    fn battery_throughput_counts_discharge() {
        let r = report(&ScenarioConfig::battery_rule());
        // 25 MWh at hour 7, 100 MWh over hours 15..=18
        assert_abs_diff_eq!(r.storage_throughput_mwh, 125.0, epsilon = 1e-6);
        assert!(r.max_residual_mw < 1e-6);
    }

    #[test]
    fn renewables_have_positive_share() {
        let r = report(&ScenarioConfig::renewables());
        assert!(r.renewable_share_pct > 0.0 && r.renewable_share_pct < 100.0);
    }

    #[test]
    fn display_has_labelled_lines() {
        let text = report(&ScenarioConfig::thermal()).to_string();
        assert!(text.contains("Total cost:"));
        assert!(text.contains("Emissions:"));
        assert!(text.contains("Energy coal"));
    }
}
