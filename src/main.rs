//! Energy planning entry point: CLI wiring for dispatch and economics studies.

mod cli;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use energy_planning::chart::{ChartStyle, render_dispatch, render_sweep};
use energy_planning::config::ScenarioConfig;
use energy_planning::dispatch::{DispatchProblem, KpiReport};
use energy_planning::economics::{StudyConfig, run_study};
use energy_planning::io::{export_dispatch_csv, export_sweep_csv};
use energy_planning::logging;

use crate::cli::{Args, Command, DispatchArgs, EconomicsArgs};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    match args.command {
        Command::Dispatch(dispatch) => run_dispatch(&dispatch),
        Command::Economics(economics) => run_economics(&economics),
        Command::Presets => {
            for name in ScenarioConfig::PRESETS {
                println!("{name}");
            }
            Ok(())
        }
    }
}

/// Loads the scenario: `--scenario` file, then `--preset`, then `thermal`.
fn load_scenario(args: &DispatchArgs) -> Result<ScenarioConfig> {
    let config = match (&args.scenario, &args.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?,
        (None, Some(name)) => ScenarioConfig::from_preset(name)?,
        (None, None) => ScenarioConfig::thermal(),
    };
    Ok(config)
}

fn run_dispatch(args: &DispatchArgs) -> Result<()> {
    let config = load_scenario(args)?;
    let problem = DispatchProblem::from_config(&config)?;
    let solution = problem
        .solve()
        .with_context(|| format!("scenario \"{}\" could not be solved", problem.name))?;
    let kpi = KpiReport::from_solution(&solution, &problem);

    println!("{solution}");
    println!("\n{kpi}");

    if let Some(path) = &args.csv {
        export_dispatch_csv(&solution, path)?;
        info!(path = %path.display(), "dispatch CSV written");
    }

    if !args.no_chart {
        let path = args
            .chart
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.png", config.scenario.name)));
        render_dispatch(&solution, &ChartStyle::from_config(&config), &path)?;
    }
    Ok(())
}

fn run_economics(args: &EconomicsArgs) -> Result<()> {
    let config = match &args.study {
        Some(path) => StudyConfig::from_toml_file(path)
            .with_context(|| format!("failed to load study {}", path.display()))?,
        None => StudyConfig::default(),
    };
    let report = run_study(&config)?;
    println!("{report}");

    if let Some(dir) = &args.csv_dir {
        ensure_dir(dir)?;
        for sweep in &report.sweeps {
            export_sweep_csv(sweep, &dir.join(format!("{}.csv", sweep.parameter)))?;
        }
        info!(dir = %dir.display(), "sweep CSVs written");
    }
    if let Some(dir) = &args.chart_dir {
        ensure_dir(dir)?;
        for sweep in &report.sweeps {
            render_sweep(sweep, &dir.join(format!("{}.png", sweep.parameter)))?;
        }
    }
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))
}
