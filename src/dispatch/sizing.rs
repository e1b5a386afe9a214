use good_lp::solvers::microlp::microlp;
use good_lp::{Expression, Solution, SolverModel, constraint, variable, variables};
use tracing::{debug, info};

use super::{DispatchProblem, DispatchSolution, HourDispatch, clean};
use crate::config::Formulation;
use crate::error::{Error, Result};

/// Dispatch that also chooses how many units of each mode to install.
///
/// Each mode gets an integer unit count `n` in `[1, max_units]`. Production is
/// bounded by the per-unit limit times `n`, and the fixed cost is paid per
/// unit for every hour:
///
/// ```text
/// min  sum_m hours * fixed_m * n_m + sum_{h,m} marginal_m * y[h][m]
/// s.t. sum_m y[h][m] = demand[h]
///      0 <= y[h][m] <= limit_m(h) * n_m
/// ```
///
/// # Errors
///
/// Returns [`Error::Infeasible`] when demand cannot be met even at the
/// maximum unit counts.
pub fn solve(problem: &DispatchProblem) -> Result<DispatchSolution> {
    let hours = problem.hours();
    let mut vars = variables!();
    let n: Vec<_> = problem
        .modes
        .iter()
        .map(|m| {
            vars.add(
                variable()
                    .integer()
                    .min(1.0)
                    .max(f64::from(m.max_units)),
            )
        })
        .collect();
    let y: Vec<Vec<_>> = (0..hours)
        .map(|_| {
            problem
                .modes
                .iter()
                .map(|_| vars.add(variable().min(0.0)))
                .collect()
        })
        .collect();

    let fixed: Expression = n
        .iter()
        .zip(&problem.modes)
        .map(|(&units, m)| (hours as f64 * m.fixed_cost) * units)
        .sum();
    let running: Expression = y
        .iter()
        .flat_map(|row| {
            row.iter()
                .zip(&problem.modes)
                .map(|(&v, m)| m.marginal_cost(problem.co2_price) * v)
        })
        .sum();

    let mut model = vars.minimise(fixed + running).using(microlp);
    for (h, row) in y.iter().enumerate() {
        let supply: Expression = row.iter().map(|&v| Expression::from(v)).sum();
        model.add_constraint(constraint!(supply == problem.demand[h]));
        for ((&v, &units), mode) in row.iter().zip(&n).zip(&problem.modes) {
            model.add_constraint(constraint!(v <= mode.limit(h) * units));
        }
    }
    debug!(
        integers = n.len(),
        variables = hours * problem.modes.len(),
        "unit sizing model built"
    );

    let solved = model
        .solve()
        .map_err(|e| Error::from_resolution(Formulation::UnitSizing.as_str(), e))?;

    let units: Vec<u32> = n
        .iter()
        .map(|&v| solved.value(v).round().max(0.0) as u32)
        .collect();
    info!(units = ?units, "unit counts chosen");

    let fixed_per_hour: f64 = problem
        .modes
        .iter()
        .zip(&units)
        .map(|(m, &k)| m.fixed_cost * f64::from(k))
        .sum();
    let records: Vec<HourDispatch> = y
        .iter()
        .enumerate()
        .map(|(hour, row)| {
            let production: Vec<f64> = row.iter().map(|&v| clean(solved.value(v))).collect();
            let cost = fixed_per_hour + problem.running_cost(&production);
            HourDispatch {
                hour,
                demand_mw: problem.demand[hour],
                production,
                storage: None,
                cost,
            }
        })
        .collect();

    Ok(DispatchSolution {
        formulation: Formulation::UnitSizing,
        mode_names: problem.mode_names(),
        storage_name: None,
        objective: records.iter().map(|h| h.cost).sum(),
        hours: records,
        unit_counts: Some(units),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::config::ScenarioConfig;
    use crate::dispatch::economic;
    use crate::modes::{Capacity, Mode};

    fn solve_config(cfg: &ScenarioConfig) -> DispatchSolution {
        let problem = DispatchProblem::from_config(cfg).unwrap();
        solve(&problem).unwrap()
    }

    #[test]
    fn unit_counts_within_bounds() {
        let cfg = ScenarioConfig::unit_sizing();
        let s = solve_config(&cfg);
        let units = s.unit_counts.clone().unwrap();
        assert_eq!(units.len(), cfg.modes.len());
        for (mode, &k) in cfg.modes.iter().zip(&units) {
            assert!(k >= 1 && k <= mode.max_units, "{} has {k} units", mode.name);
        }
        // single-unit modes cannot be scaled
        assert_eq!(units[0], 1);
        assert_eq!(units[1], 1);
        assert_eq!(units[3], 1);
    }

    #[test]
    fn production_respects_scaled_limits() {
        let cfg = ScenarioConfig::unit_sizing();
        let s = solve_config(&cfg);
        let units = s.unit_counts.clone().unwrap();
        for h in &s.hours {
            for (m, mode) in cfg.modes.iter().enumerate() {
                let cap = mode.limit(h.hour) * f64::from(units[m]);
                assert!(h.production[m] <= cap + 1e-6, "hour {} mode {}", h.hour, mode.name);
            }
        }
        assert!(s.max_balance_residual() < 1e-6);
    }

    #[test]
    fn never_worse_than_single_units() {
        let cfg = ScenarioConfig::unit_sizing();
        let sized = solve_config(&cfg);
        let mut single = cfg.clone();
        single.scenario.formulation = Formulation::Economic;
        let problem = DispatchProblem::from_config(&single).unwrap();
        let baseline = economic::solve(&problem).unwrap();
        assert!(sized.objective <= baseline.objective + 1e-3);
    }

    #[test]
    fn cheap_unit_is_scaled_to_cover_demand() {
        let mut cfg = ScenarioConfig::thermal();
        cfg.scenario.formulation = Formulation::UnitSizing;
        cfg.demand = vec![35.0, 35.0];
        cfg.modes = vec![
            Mode::new("diesel", 0.0, 100.0, Capacity::Constant(100.0)),
            Mode::new("wind", 1.0, 0.0, Capacity::Constant(10.0)).with_max_units(10),
        ];
        cfg.chart.order.clear();
        let s = solve_config(&cfg);
        // 4 wind units cover 35 MW at 8 fixed vs 1000 for diesel
        assert_eq!(s.unit_counts, Some(vec![1, 4]));
        assert_abs_diff_eq!(s.production(0, 1), 35.0, epsilon = 1e-6);
        assert_abs_diff_eq!(s.objective, 8.0, epsilon = 1e-6);
    }
}
