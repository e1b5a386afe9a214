use good_lp::solvers::microlp::microlp;
use good_lp::{Expression, Solution, SolverModel, constraint, variable, variables};
use tracing::debug;

use super::{DispatchProblem, DispatchSolution, HourDispatch, StorageFlow, clean};
use crate::config::Formulation;
use crate::error::{Error, Result};
use crate::modes::{BatteryAction, RuleBattery};

/// Dispatch with a battery that follows fixed load thresholds.
///
/// The battery decides first each hour. Charging raises the hour's load by the
/// power drawn. Discharging enters a one-hour LP as an extra mode bounded by
/// the rated power and the stored energy, priced at the battery's variable
/// cost. Every hour is then solved independently.
///
/// # Errors
///
/// Returns [`Error::Infeasible`] when an hour cannot be covered, including
/// the extra load from charging.
pub fn solve(problem: &DispatchProblem) -> Result<DispatchSolution> {
    let params = problem.storage_params()?;
    let mut battery = RuleBattery::new(
        params,
        problem.rule.charge_below_mw,
        problem.rule.discharge_above_mw,
    );
    let fixed = problem.fixed_cost_per_hour() + params.fixed_cost;

    let mut hours = Vec::with_capacity(problem.hours());
    for (hour, &demand_mw) in problem.demand.iter().enumerate() {
        let action = battery.decide(demand_mw);
        let charge_mw = match action {
            BatteryAction::Charge => battery.charge(),
            _ => 0.0,
        };
        let discharge_cap = match action {
            BatteryAction::Discharge => battery.available_discharge_mw(),
            _ => 0.0,
        };

        let (production, discharge_mw) =
            solve_hour(problem, hour, demand_mw + charge_mw, discharge_cap, params.variable_cost)?;
        battery.discharge(discharge_mw);

        debug!(
            hour,
            ?action,
            charge_mw,
            discharge_mw,
            soc_mwh = battery.stored_mwh(),
            "battery step"
        );

        let cost = fixed + problem.running_cost(&production) + params.variable_cost * discharge_mw;
        hours.push(HourDispatch {
            hour,
            demand_mw,
            production,
            storage: Some(StorageFlow {
                charge_mw,
                discharge_mw,
                soc_mwh: battery.stored_mwh(),
            }),
            cost,
        });
    }

    Ok(DispatchSolution {
        formulation: Formulation::RuleBattery,
        mode_names: problem.mode_names(),
        storage_name: Some(params.name.clone()),
        objective: hours.iter().map(|h| h.cost).sum(),
        hours,
        unit_counts: None,
    })
}

/// One-hour LP: generation plus optional battery output meets `load_mw`.
fn solve_hour(
    problem: &DispatchProblem,
    hour: usize,
    load_mw: f64,
    discharge_cap: f64,
    discharge_cost: f64,
) -> Result<(Vec<f64>, f64)> {
    let mut vars = variables!();
    let p: Vec<_> = problem
        .modes
        .iter()
        .map(|m| vars.add(variable().min(0.0).max(m.limit(hour))))
        .collect();
    let b = vars.add(variable().min(0.0).max(discharge_cap));

    let running: Expression = p
        .iter()
        .zip(&problem.modes)
        .map(|(&v, m)| m.marginal_cost(problem.co2_price) * v)
        .sum::<Expression>()
        + discharge_cost * b;
    let supply: Expression = p.iter().map(|&v| Expression::from(v)).sum::<Expression>() + b;

    let solved = vars
        .minimise(running)
        .using(microlp)
        .with(constraint!(supply == load_mw))
        .solve()
        .map_err(|e| Error::from_resolution(Formulation::RuleBattery.as_str(), e))?;

    let production = p.iter().map(|&v| clean(solved.value(v))).collect();
    Ok((production, clean(solved.value(b))))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::config::ScenarioConfig;

    fn solve_battery_rule() -> DispatchSolution {
        let problem = DispatchProblem::from_config(&ScenarioConfig::battery_rule()).unwrap();
        solve(&problem).unwrap()
    }

    #[test]
    fn state_of_charge_follows_thresholds() {
        let s = solve_battery_rule();
        let soc: Vec<f64> = s.hours.iter().map(|h| h.storage.unwrap().soc_mwh).collect();
        let expected = [
            25.0, 50.0, 75.0, 100.0, 100.0, 100.0, 100.0, 75.0, 75.0, 75.0, 100.0, 100.0, 100.0,
            100.0, 100.0, 75.0, 50.0, 25.0, 0.0, 0.0, 0.0, 0.0, 25.0, 50.0,
        ];
        for (h, (&got, &want)) in soc.iter().zip(&expected).enumerate() {
            assert_abs_diff_eq!(got, want, epsilon = 1e-6);
            assert!((0.0..=100.0).contains(&got), "hour {h} soc {got}");
        }
    }

    #[test]
    fn charging_adds_to_generation() {
        let s = solve_battery_rule();
        let h0 = &s.hours[0];
        assert_abs_diff_eq!(h0.storage.unwrap().charge_mw, 25.0, epsilon = 1e-6);
        assert_abs_diff_eq!(h0.generation_mw(), 55.0, epsilon = 1e-6);
        assert!(s.max_balance_residual() < 1e-6);
    }

    #[test]
    fn discharge_shaves_the_peak() {
        let s = solve_battery_rule();
        let peak = &s.hours[16];
        assert_abs_diff_eq!(peak.storage.unwrap().discharge_mw, 25.0, epsilon = 1e-6);
        assert_abs_diff_eq!(peak.generation_mw(), 195.0, epsilon = 1e-6);
    }

    #[test]
    fn never_charges_and_discharges_together() {
        for h in solve_battery_rule().hours {
            let flow = h.storage.unwrap();
            assert!(flow.charge_mw == 0.0 || flow.discharge_mw == 0.0, "hour {}", h.hour);
        }
    }

    #[test]
    fn discharge_limited_by_stored_energy() {
        let mut cfg = ScenarioConfig::battery_rule();
        cfg.demand = vec![200.0, 200.0];
        if let Some(storage) = cfg.storage.as_mut() {
            storage.initial_mwh = 10.0;
        }
        let problem = DispatchProblem::from_config(&cfg).unwrap();
        let s = solve(&problem).unwrap();
        assert_abs_diff_eq!(s.hours[0].storage.unwrap().discharge_mw, 10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(s.hours[1].storage.unwrap().discharge_mw, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn missing_storage_is_a_config_error() {
        let mut problem = DispatchProblem::from_config(&ScenarioConfig::battery_rule()).unwrap();
        problem.storage = None;
        assert!(matches!(solve(&problem), Err(Error::Config(_))));
    }
}
