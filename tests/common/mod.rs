//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use energy_planning::config::ScenarioConfig;
use energy_planning::dispatch::{DispatchProblem, DispatchSolution};

/// Largest tolerated demand-balance residual (MW).
pub const BALANCE_TOLERANCE: f64 = 1e-6;

/// Path of a file under the crate's `scenarios/` directory.
pub fn scenario_path(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(file)
}

/// Builds and solves a scenario, panicking on any error.
pub fn solve(config: &ScenarioConfig) -> (DispatchProblem, DispatchSolution) {
    let problem = DispatchProblem::from_config(config)
        .unwrap_or_else(|e| panic!("scenario {} is invalid: {e}", config.scenario.name));
    let solution = problem
        .solve()
        .unwrap_or_else(|e| panic!("scenario {} failed: {e}", config.scenario.name));
    (problem, solution)
}

/// Loads and solves a built-in preset.
pub fn solve_preset(name: &str) -> (DispatchProblem, DispatchSolution) {
    let config = ScenarioConfig::from_preset(name).expect("preset should exist");
    solve(&config)
}

/// Asserts every hour meets demand within [`BALANCE_TOLERANCE`].
pub fn assert_balanced(solution: &DispatchSolution) {
    for h in &solution.hours {
        assert!(
            h.balance_residual().abs() < BALANCE_TOLERANCE,
            "hour {} off balance by {} MW",
            h.hour,
            h.balance_residual()
        );
    }
}
