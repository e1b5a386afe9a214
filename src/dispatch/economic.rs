use good_lp::solvers::microlp::microlp;
use good_lp::{Expression, Solution, SolverModel, constraint, variables};
use tracing::debug;

use super::{DispatchProblem, DispatchSolution, HourDispatch, clean};
use crate::config::Formulation;
use crate::error::{Error, Result};

/// Minimum-cost dispatch over all hours at once.
///
/// Variables `p[h][m]` are bounded by each mode's hourly limit; every hour
/// must balance generation against demand. Fixed costs are charged for every
/// mode and hour regardless of output, so they shift the objective without
/// changing the optimal dispatch.
///
/// # Errors
///
/// Returns [`Error::Infeasible`] when some hour's demand exceeds the combined
/// capacity.
pub fn solve(problem: &DispatchProblem) -> Result<DispatchSolution> {
    let mut vars = variables!();
    let p = problem.production_vars(&mut vars);

    let running: Expression = p
        .iter()
        .flat_map(|row| {
            row.iter()
                .zip(&problem.modes)
                .map(|(&v, m)| m.marginal_cost(problem.co2_price) * v)
        })
        .sum();

    let mut model = vars.minimise(running).using(microlp);
    for (row, &demand) in p.iter().zip(&problem.demand) {
        let supply: Expression = row.iter().map(|&v| Expression::from(v)).sum();
        model.add_constraint(constraint!(supply == demand));
    }
    debug!(
        variables = problem.hours() * problem.modes.len(),
        constraints = problem.hours(),
        "economic model built"
    );

    let solved = model
        .solve()
        .map_err(|e| Error::from_resolution(Formulation::Economic.as_str(), e))?;

    let fixed = problem.fixed_cost_per_hour();
    let hours: Vec<HourDispatch> = p
        .iter()
        .zip(&problem.demand)
        .enumerate()
        .map(|(hour, (row, &demand_mw))| {
            let production: Vec<f64> = row.iter().map(|&v| clean(solved.value(v))).collect();
            let cost = fixed + problem.running_cost(&production);
            HourDispatch {
                hour,
                demand_mw,
                production,
                storage: None,
                cost,
            }
        })
        .collect();

    Ok(DispatchSolution {
        formulation: Formulation::Economic,
        mode_names: problem.mode_names(),
        storage_name: None,
        objective: hours.iter().map(|h| h.cost).sum(),
        hours,
        unit_counts: None,
    })
}
