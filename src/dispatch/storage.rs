use good_lp::solvers::microlp::microlp;
use good_lp::{Expression, Solution, SolverModel, constraint, variable, variables};
use tracing::debug;

use super::{DispatchProblem, DispatchSolution, HourDispatch, StorageFlow, clean};
use crate::config::Formulation;
use crate::error::{Error, Result};

/// Dispatch with a battery scheduled jointly over the horizon.
///
/// Per hour the model has charge `c`, discharge `d`, state of charge `s` and a
/// binary `u` selecting charge mode:
///
/// ```text
/// sum(p) + d - c = demand
/// s[h] = s[h-1] + eta_c * c[h] - d[h] / eta_d      (s[-1] = initial)
/// 0 <= s[h] <= capacity
/// c[h] <= power * u[h]
/// d[h] <= power * (1 - u[h])
/// ```
///
/// With `cyclic`, the final state of charge must be at least the initial one.
///
/// # Errors
///
/// Returns [`Error::Infeasible`] when demand cannot be met or the cyclic
/// condition cannot hold.
pub fn solve(problem: &DispatchProblem) -> Result<DispatchSolution> {
    let params = problem.storage_params()?;
    let hours = problem.hours();
    let power = params.power_mw;

    let mut vars = variables!();
    let p = problem.production_vars(&mut vars);
    let c: Vec<_> = (0..hours).map(|_| vars.add(variable().min(0.0).max(power))).collect();
    let d: Vec<_> = (0..hours).map(|_| vars.add(variable().min(0.0).max(power))).collect();
    let s: Vec<_> = (0..hours)
        .map(|_| vars.add(variable().min(0.0).max(params.capacity_mwh)))
        .collect();
    let u: Vec<_> = (0..hours).map(|_| vars.add(variable().binary())).collect();

    let running: Expression = p
        .iter()
        .flat_map(|row| {
            row.iter()
                .zip(&problem.modes)
                .map(|(&v, m)| m.marginal_cost(problem.co2_price) * v)
        })
        .sum::<Expression>()
        + d.iter()
            .map(|&v| params.variable_cost * v)
            .sum::<Expression>();

    let mut model = vars.minimise(running).using(microlp);
    let eta_c = params.charge_efficiency;
    let discharge_loss = 1.0 / params.discharge_efficiency;
    for h in 0..hours {
        let supply: Expression =
            p[h].iter().map(|&v| Expression::from(v)).sum::<Expression>() + d[h] - c[h];
        model.add_constraint(constraint!(supply == problem.demand[h]));

        let prev: Expression = if h == 0 {
            params.initial_mwh.into()
        } else {
            s[h - 1].into()
        };
        model.add_constraint(constraint!(
            s[h] == prev + eta_c * c[h] - discharge_loss * d[h]
        ));
        model.add_constraint(constraint!(c[h] <= power * u[h]));
        model.add_constraint(constraint!(d[h] + power * u[h] <= power));
    }
    if params.cyclic
        && let Some(&last) = s.last()
    {
        model.add_constraint(constraint!(last >= params.initial_mwh));
    }
    debug!(hours, binaries = hours, cyclic = params.cyclic, "storage model built");

    let solved = model
        .solve()
        .map_err(|e| Error::from_resolution(Formulation::StorageMilp.as_str(), e))?;

    let fixed = problem.fixed_cost_per_hour() + params.fixed_cost;
    let records: Vec<HourDispatch> = (0..hours)
        .map(|h| {
            let production: Vec<f64> = p[h].iter().map(|&v| clean(solved.value(v))).collect();
            let flow = StorageFlow {
                charge_mw: clean(solved.value(c[h])),
                discharge_mw: clean(solved.value(d[h])),
                soc_mwh: clean(solved.value(s[h])),
            };
            let cost = fixed
                + problem.running_cost(&production)
                + params.variable_cost * flow.discharge_mw;
            HourDispatch {
                hour: h,
                demand_mw: problem.demand[h],
                production,
                storage: Some(flow),
                cost,
            }
        })
        .collect();

    Ok(DispatchSolution {
        formulation: Formulation::StorageMilp,
        mode_names: problem.mode_names(),
        storage_name: Some(params.name.clone()),
        objective: records.iter().map(|h| h.cost).sum(),
        hours: records,
        unit_counts: None,
    })
}
