use std::fmt;

/// Vehicle-fleet battery sized so that grid import is constant over the day.
///
/// The fleet charges through the valley hours and discharges through the peak
/// hours. Energy balance `P_ch·η_c·h_valley = P_dis·h_peak/η_d` and a flat
/// import `P_peak − P_dis = P_valley + P_ch` fix both powers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FleetBattery {
    /// Discharge power during peak hours (MW).
    pub discharge_mw: f64,
    /// Charge power during valley hours (MW).
    pub charge_mw: f64,
    /// Stored energy at the end of the valley period (MWh).
    pub energy_mwh: f64,
    /// Resulting flat grid import (MW).
    pub import_mw: f64,
}

impl FleetBattery {
    /// Sizes the battery for a two-level load.
    ///
    /// # Arguments
    ///
    /// * `peak_mw`, `valley_mw` - Load in each period
    /// * `peak_hours`, `valley_hours` - Period lengths per day
    /// * `charge_efficiency`, `discharge_efficiency` - Round-trip split, in (0, 1]
    pub fn size(
        peak_mw: f64,
        valley_mw: f64,
        peak_hours: f64,
        valley_hours: f64,
        charge_efficiency: f64,
        discharge_efficiency: f64,
    ) -> Self {
        let ratio = peak_hours / (charge_efficiency * valley_hours * discharge_efficiency);
        let discharge_mw = (peak_mw - valley_mw) / (ratio + 1.0);
        let charge_mw = peak_mw - discharge_mw - valley_mw;
        Self {
            discharge_mw,
            charge_mw,
            energy_mwh: valley_hours * charge_mw * charge_efficiency,
            import_mw: peak_mw - discharge_mw,
        }
    }
}

impl fmt::Display for FleetBattery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "charge {:.4} MW, discharge {:.4} MW, capacity {:.4} MWh, import {:.4} MW",
            self.charge_mw, self.discharge_mw, self.energy_mwh, self.import_mw
        )
    }
}
