//! Dispatch results: per-hour production and the solved objective.

use std::fmt;

use crate::config::Formulation;

/// Battery flows for one hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageFlow {
    /// Power drawn from the generators into the battery (MW).
    pub charge_mw: f64,
    /// Power delivered from the battery to the load (MW).
    pub discharge_mw: f64,
    /// Stored energy at the end of the hour (MWh).
    pub soc_mwh: f64,
}

/// Complete record of one dispatched hour.
#[derive(Debug, Clone)]
pub struct HourDispatch {
    /// Hour index.
    pub hour: usize,
    /// Demand to be met (MW), excluding battery charging.
    pub demand_mw: f64,
    /// Production per mode, in mode order (MW).
    pub production: Vec<f64>,
    /// Battery flows, when the formulation has storage.
    pub storage: Option<StorageFlow>,
    /// Cost attributed to this hour (fixed + variable + carbon).
    pub cost: f64,
}

impl HourDispatch {
    /// Total generation from all modes (MW).
    pub fn generation_mw(&self) -> f64 {
        self.production.iter().sum()
    }

    /// Generation plus discharge minus charge, minus demand. Zero when balanced.
    pub fn balance_residual(&self) -> f64 {
        let (charge, discharge) = self
            .storage
            .map_or((0.0, 0.0), |s| (s.charge_mw, s.discharge_mw));
        self.generation_mw() + discharge - charge - self.demand_mw
    }
}

/// Solved dispatch over the whole horizon.
#[derive(Debug, Clone)]
pub struct DispatchSolution {
    /// Formulation that produced this solution.
    pub formulation: Formulation,
    /// Mode names, indexing `HourDispatch::production`.
    pub mode_names: Vec<String>,
    /// Storage name, when the formulation has a battery.
    pub storage_name: Option<String>,
    /// One record per hour.
    pub hours: Vec<HourDispatch>,
    /// Total cost over the horizon: the sum of every hour's `cost`.
    pub objective: f64,
    /// Installed units per mode (unit sizing only).
    pub unit_counts: Option<Vec<u32>>,
}

impl DispatchSolution {
    /// Production of `mode` at `hour` (MW), zero when out of range.
    pub fn production(&self, hour: usize, mode: usize) -> f64 {
        self.hours
            .get(hour)
            .and_then(|h| h.production.get(mode))
            .copied()
            .unwrap_or(0.0)
    }

    /// Index of the mode with the given name.
    pub fn mode_index(&self, name: &str) -> Option<usize> {
        self.mode_names.iter().position(|n| n == name)
    }

    /// Energy produced by `mode` over the horizon (MWh).
    pub fn mode_energy(&self, mode: usize) -> f64 {
        self.hours.iter().map(|h| h.production.get(mode).copied().unwrap_or(0.0)).sum()
    }

    /// Hourly series for a mode or, by name, the battery discharge.
    pub fn series(&self, name: &str) -> Option<Vec<f64>> {
        if let Some(i) = self.mode_index(name) {
            return Some(self.hours.iter().map(|h| h.production[i]).collect());
        }
        if self.storage_name.as_deref() == Some(name) {
            return Some(
                self.hours
                    .iter()
                    .map(|h| h.storage.map_or(0.0, |s| s.discharge_mw))
                    .collect(),
            );
        }
        None
    }

    /// Demand-balance residual at `hour` (MW), zero when out of range.
    pub fn balance_residual(&self, hour: usize) -> f64 {
        self.hours.get(hour).map_or(0.0, HourDispatch::balance_residual)
    }

    /// Largest absolute demand-balance residual across hours (MW).
    pub fn max_balance_residual(&self) -> f64 {
        self.hours
            .iter()
            .map(|h| h.balance_residual().abs())
            .fold(0.0, f64::max)
    }
}

impl fmt::Display for HourDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "h={:>2} | demand={:>7.2} MW | gen={:>7.2} MW",
            self.hour,
            self.demand_mw,
            self.generation_mw()
        )?;
        if let Some(s) = self.storage {
            write!(
                f,
                " | charge={:.2} discharge={:.2} soc={:.2} MWh",
                s.charge_mw, s.discharge_mw, s.soc_mwh
            )?;
        }
        write!(f, " | cost={:.2}", self.cost)
    }
}

impl fmt::Display for DispatchSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hour")?;
        for name in &self.mode_names {
            write!(f, " {name:>9}")?;
        }
        if let Some(name) = &self.storage_name {
            write!(f, " {:>9} {:>9} {:>9}", format!("{name}+"), format!("{name}-"), "soc")?;
        }
        writeln!(f, " {:>10}", "cost")?;

        for h in &self.hours {
            write!(f, "{:>4}", h.hour)?;
            for p in &h.production {
                write!(f, " {p:>9.2}")?;
            }
            if let Some(s) = h.storage {
                write!(
                    f,
                    " {:>9.2} {:>9.2} {:>9.2}",
                    s.charge_mw, s.discharge_mw, s.soc_mwh
                )?;
            }
            writeln!(f, " {:>10.2}", h.cost)?;
        }

        if let Some(units) = &self.unit_counts {
            write!(f, "units:")?;
            for (name, n) in self.mode_names.iter().zip(units) {
                write!(f, " {name}={n}")?;
            }
            writeln!(f)?;
        }
        write!(f, "objective ({}): {:.2}", self.formulation, self.objective)
    }
}
