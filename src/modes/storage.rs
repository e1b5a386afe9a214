use serde::Deserialize;

/// Battery storage parameters shared by the rule-based and MILP formulations.
///
/// # Power Convention
/// - Charging draws from the generators and adds to the hour's demand.
/// - Discharging supplies demand alongside the generators.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageParams {
    /// Display name used in tables and charts.
    pub name: String,
    /// Maximum charge and discharge power (MW).
    pub power_mw: f64,
    /// Usable energy capacity (MWh).
    pub capacity_mwh: f64,
    /// Stored energy before the first hour (MWh).
    pub initial_mwh: f64,
    /// Fraction of charged energy that is stored (0..1].
    pub charge_efficiency: f64,
    /// Fraction of stored energy that reaches the grid (0..1].
    pub discharge_efficiency: f64,
    /// Cost charged every hour.
    pub fixed_cost: f64,
    /// Cost per MWh discharged.
    pub variable_cost: f64,
    /// Require the final state of charge to be at least the initial one.
    pub cyclic: bool,
    /// Chart colour as `#rrggbb`.
    pub color: Option<String>,
}

impl Default for StorageParams {
    fn default() -> Self {
        Self {
            name: "battery".to_string(),
            power_mw: 25.0,
            capacity_mwh: 100.0,
            initial_mwh: 0.0,
            charge_efficiency: 1.0,
            discharge_efficiency: 1.0,
            fixed_cost: 50.0,
            variable_cost: 20.0,
            cyclic: false,
            color: None,
        }
    }
}

/// What the rule-based battery does in a given hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryAction {
    Charge,
    Discharge,
    Idle,
}

/// Stateful battery driven by load thresholds, one hour at a time.
///
/// Charges at full power while the load is low enough for the base generation
/// to absorb the extra demand, and discharges while the load is above the
/// discharge threshold.
#[derive(Debug, Clone)]
pub struct RuleBattery {
    power_mw: f64,
    capacity_mwh: f64,
    stored_mwh: f64,
    charge_below_mw: f64,
    discharge_above_mw: f64,
}

impl RuleBattery {
    /// Creates a rule battery from storage parameters and load thresholds.
    ///
    /// # Panics
    ///
    /// Panics if power or capacity is negative, or the initial charge is out of range.
    pub fn new(params: &StorageParams, charge_below_mw: f64, discharge_above_mw: f64) -> Self {
        assert!(params.power_mw >= 0.0);
        assert!(params.capacity_mwh >= 0.0);
        assert!((0.0..=params.capacity_mwh).contains(&params.initial_mwh));

        Self {
            power_mw: params.power_mw,
            capacity_mwh: params.capacity_mwh,
            stored_mwh: params.initial_mwh,
            charge_below_mw,
            discharge_above_mw,
        }
    }

    /// Decides the action for an hour with the given load (MW).
    pub fn decide(&self, load_mw: f64) -> BatteryAction {
        if self.stored_mwh < self.capacity_mwh && load_mw < self.charge_below_mw {
            BatteryAction::Charge
        } else if self.stored_mwh > 0.0 && load_mw > self.discharge_above_mw {
            BatteryAction::Discharge
        } else {
            BatteryAction::Idle
        }
    }

    /// Charges for one hour and returns the power drawn (MW).
    pub fn charge(&mut self) -> f64 {
        let drawn = self.power_mw.min(self.capacity_mwh - self.stored_mwh).max(0.0);
        self.stored_mwh += drawn;
        drawn
    }

    /// Largest discharge possible this hour (MW).
    pub fn available_discharge_mw(&self) -> f64 {
        self.power_mw.min(self.stored_mwh)
    }

    /// Removes discharged energy for one hour.
    pub fn discharge(&mut self, mw: f64) {
        self.stored_mwh = (self.stored_mwh - mw).clamp(0.0, self.capacity_mwh);
    }

    /// Energy currently stored (MWh).
    pub fn stored_mwh(&self) -> f64 {
        self.stored_mwh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battery() -> RuleBattery {
        RuleBattery::new(&StorageParams::default(), 95.0, 120.0)
    }

    #[test]
    fn charges_at_low_load_until_full() {
        let mut bat = battery();
        for _ in 0..4 {
            assert_eq!(bat.decide(30.0), BatteryAction::Charge);
            assert_eq!(bat.charge(), 25.0);
        }
        assert_eq!(bat.stored_mwh(), 100.0);
        assert_eq!(bat.decide(30.0), BatteryAction::Idle);
    }

    #[test]
    fn discharges_only_above_threshold_with_energy() {
        let mut bat = battery();
        assert_eq!(bat.decide(160.0), BatteryAction::Idle);
        bat.charge();
        assert_eq!(bat.decide(120.0), BatteryAction::Idle);
        assert_eq!(bat.decide(160.0), BatteryAction::Discharge);
    }

    #[test]
    fn discharge_is_capped_by_stored_energy() {
        let params = StorageParams {
            initial_mwh: 10.0,
            ..StorageParams::default()
        };
        let mut bat = RuleBattery::new(&params, 95.0, 120.0);
        assert_eq!(bat.available_discharge_mw(), 10.0);
        bat.discharge(10.0);
        assert_eq!(bat.stored_mwh(), 0.0);
    }

    #[test]
    fn partial_charge_near_full() {
        let params = StorageParams {
            initial_mwh: 90.0,
            ..StorageParams::default()
        };
        let mut bat = RuleBattery::new(&params, 95.0, 120.0);
        assert_eq!(bat.charge(), 10.0);
        assert_eq!(bat.stored_mwh(), 100.0);
    }

    #[test]
    #[should_panic]
    fn initial_charge_above_capacity_panics() {
        let params = StorageParams {
            initial_mwh: 150.0,
            ..StorageParams::default()
        };
        RuleBattery::new(&params, 95.0, 120.0);
    }
}
