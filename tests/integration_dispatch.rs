//! End-to-end dispatch runs over presets and scenario files.

mod common;

use approx::assert_abs_diff_eq;
use energy_planning::Error;
use energy_planning::config::{Formulation, ScenarioConfig};
use energy_planning::dispatch::{DispatchProblem, KpiReport};
use energy_planning::io::write_dispatch_csv;
use energy_planning::modes::{Capacity, Mode};

#[test]
fn every_preset_solves_and_balances() {
    for name in ScenarioConfig::PRESETS {
        let (problem, solution) = common::solve_preset(name);
        assert_eq!(solution.hours.len(), problem.hours(), "preset {name}");
        assert!(solution.objective.is_finite(), "preset {name}");
        common::assert_balanced(&solution);
    }
}

#[test]
fn production_respects_hourly_limits() {
    for name in ScenarioConfig::PRESETS {
        let (problem, solution) = common::solve_preset(name);
        let units = solution.unit_counts.clone();
        for h in &solution.hours {
            for (m, mode) in problem.modes.iter().enumerate() {
                let scale = units.as_ref().map_or(1.0, |u| f64::from(u[m]));
                assert!(
                    h.production[m] <= mode.limit(h.hour) * scale + 1e-6,
                    "preset {name}: {} exceeds its limit at hour {}",
                    mode.name,
                    h.hour
                );
                assert!(h.production[m] >= -1e-9);
            }
        }
    }
}

#[test]
fn carbon_price_raises_thermal_cost() {
    let (_, plain) = common::solve_preset("thermal");
    let (_, priced) = common::solve_preset("co2_price");
    assert_abs_diff_eq!(plain.objective, 217_000.0, epsilon = 1e-3);
    assert_abs_diff_eq!(priced.objective, 327_840.0, epsilon = 1e-3);
}

#[test]
fn kpi_total_matches_objective() {
    for name in ScenarioConfig::PRESETS {
        let (problem, solution) = common::solve_preset(name);
        let kpi = KpiReport::from_solution(&solution, &problem);
        assert_abs_diff_eq!(kpi.total_cost, solution.objective, epsilon = 1e-6);
        assert!(kpi.max_residual_mw < common::BALANCE_TOLERANCE);
    }
}

#[test]
fn objective_is_the_sum_of_hourly_costs() {
    for name in ScenarioConfig::PRESETS {
        let (_, solution) = common::solve_preset(name);
        let summed: f64 = solution.hours.iter().map(|h| h.cost).sum();
        assert_abs_diff_eq!(solution.objective, summed, epsilon = 1e-9);
    }
}

#[test]
fn storage_milp_never_charges_and_discharges_together() {
    let (_, solution) = common::solve_preset("storage_milp");
    for h in &solution.hours {
        let s = h.storage.expect("storage flow every hour");
        assert!(
            s.charge_mw < 1e-6 || s.discharge_mw < 1e-6,
            "hour {}: charge {} and discharge {}",
            h.hour,
            s.charge_mw,
            s.discharge_mw
        );
    }
}

#[test]
fn thermal_scenario_file_follows_merit_order() {
    let config =
        ScenarioConfig::from_toml_file(&common::scenario_path("thermal_peak.toml")).unwrap();
    assert_eq!(config.scenario.formulation, Formulation::Economic);
    let (_, solution) = common::solve(&config);

    // fixed 150/h over 8 h, base 455 MWh at 30, peaker 90 MWh at 150
    assert_abs_diff_eq!(solution.objective, 28_350.0, epsilon = 1e-3);
    assert_abs_diff_eq!(solution.series("peaker").unwrap()[5], 50.0, epsilon = 1e-6);
    assert_abs_diff_eq!(solution.mode_energy(0), 455.0, epsilon = 1e-6);
}

#[test]
fn storage_scenario_file_solves() {
    let config =
        ScenarioConfig::from_toml_file(&common::scenario_path("wind_gas_storage.toml")).unwrap();
    assert_eq!(config.scenario.formulation, Formulation::StorageMilp);
    let (_, solution) = common::solve(&config);
    common::assert_balanced(&solution);

    let last = solution.hours.last().and_then(|h| h.storage).unwrap();
    assert!(last.soc_mwh >= 30.0 - 1e-6, "cyclic battery ends below its start");
}

#[test]
fn unmet_demand_is_a_typed_error() {
    let mut config = ScenarioConfig::thermal();
    config.demand = vec![50.0, 1_000.0];
    config.modes = vec![Mode::new("only", 0.0, 10.0, Capacity::Constant(100.0))];
    let problem = DispatchProblem::from_config(&config).unwrap();
    let err = problem.solve().unwrap_err();
    assert!(matches!(err, Error::Infeasible { formulation: "economic" }));
}

#[test]
fn csv_has_one_row_per_hour() {
    let (_, solution) = common::solve_preset("battery_rule");
    let mut buf = Vec::new();
    write_dispatch_csv(&solution, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), solution.hours.len() + 1);
    assert!(text.lines().next().unwrap().ends_with("charge_mw,discharge_mw,soc_mwh,cost"));
}
