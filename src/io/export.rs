//! CSV export for dispatch solutions and sensitivity sweeps.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::dispatch::DispatchSolution;
use crate::economics::Sweep;
use crate::error::{Error, Result};

/// Columns before the per-mode production columns.
const LEADING: [&str; 2] = ["hour", "demand_mw"];
/// Columns after the per-mode production columns.
const TRAILING: [&str; 4] = ["charge_mw", "discharge_mw", "soc_mwh", "cost"];

/// Second column of a sweep export.
const SWEEP_VALUE: &str = "max_initial_payment_nok";

fn create(path: &Path) -> Result<io::BufWriter<File>> {
    let file = File::create(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(io::BufWriter::new(file))
}

/// Exports a dispatch solution to a CSV file at the given path.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be created, or [`Error::Csv`] if
/// writing fails.
pub fn export_dispatch_csv(solution: &DispatchSolution, path: &Path) -> Result<()> {
    write_dispatch_csv(solution, create(path)?)
}

/// Writes a dispatch solution as CSV to any writer.
///
/// Header is `hour,demand_mw,<mode...>,charge_mw,discharge_mw,soc_mwh,cost`.
/// Storage columns are zero when the solution has no battery. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns [`Error::Csv`] if writing fails.
pub fn write_dispatch_csv(solution: &DispatchSolution, writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header: Vec<&str> = LEADING.to_vec();
    header.extend(solution.mode_names.iter().map(String::as_str));
    header.extend(TRAILING);
    wtr.write_record(&header)?;

    for h in &solution.hours {
        let (charge, discharge, soc) = h
            .storage
            .map_or((0.0, 0.0, 0.0), |s| (s.charge_mw, s.discharge_mw, s.soc_mwh));
        let mut row = Vec::with_capacity(LEADING.len() + h.production.len() + TRAILING.len());
        row.push(h.hour.to_string());
        row.push(format!("{:.4}", h.demand_mw));
        row.extend(h.production.iter().map(|p| format!("{p:.4}")));
        row.push(format!("{charge:.4}"));
        row.push(format!("{discharge:.4}"));
        row.push(format!("{soc:.4}"));
        row.push(format!("{:.2}", h.cost));
        wtr.write_record(&row)?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Exports a sweep to a CSV file at the given path.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be created, or [`Error::Csv`] if
/// writing fails.
pub fn export_sweep_csv(sweep: &Sweep, path: &Path) -> Result<()> {
    write_sweep_csv(sweep, create(path)?)
}

/// Writes a sweep as `<parameter>,max_initial_payment_nok` rows.
///
/// # Errors
///
/// Returns [`Error::Csv`] if writing fails.
pub fn write_sweep_csv(sweep: &Sweep, writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record([sweep.parameter, SWEEP_VALUE])?;
    for &(x, y) in &sweep.points {
        wtr.write_record(&[format!("{x:.6}"), format!("{y:.2}")])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
