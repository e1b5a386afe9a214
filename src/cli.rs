//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    /// Log filter used when `RUST_LOG` is unset.
    #[clap(
        long = "log-level",
        default_value = "info",
        env = "ENERGY_PLANNING_LOG",
        global = true
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Solve an hourly dispatch scenario and chart the result.
    #[clap(name = "dispatch")]
    Dispatch(DispatchArgs),

    /// Run the feeder reinforcement and fleet battery study.
    #[clap(name = "economics")]
    Economics(EconomicsArgs),

    /// List the built-in dispatch presets.
    #[clap(name = "presets")]
    Presets,
}

#[derive(Parser)]
pub struct DispatchArgs {
    /// Built-in preset (see `presets`). Defaults to `thermal`.
    #[clap(long, conflicts_with = "scenario")]
    pub preset: Option<String>,

    /// Scenario TOML file.
    #[clap(long)]
    pub scenario: Option<PathBuf>,

    /// Chart output path. Defaults to `<scenario name>.png`.
    #[clap(long)]
    pub chart: Option<PathBuf>,

    /// Do not render a chart.
    #[clap(long = "no-chart", conflicts_with = "chart")]
    pub no_chart: bool,

    /// Also export the hourly dispatch as CSV.
    #[clap(long)]
    pub csv: Option<PathBuf>,
}

#[derive(Parser)]
pub struct EconomicsArgs {
    /// Study TOML file. The course case is used when omitted.
    #[clap(long)]
    pub study: Option<PathBuf>,

    /// Directory for the sensitivity charts.
    #[clap(long = "chart-dir")]
    pub chart_dir: Option<PathBuf>,

    /// Directory for the sensitivity CSV files.
    #[clap(long = "csv-dir")]
    pub csv_dir: Option<PathBuf>,
}
