use super::annuity_factor;
use super::line::{Feeder, LineType};

/// The fleet battery priced against a reference line reinforcement.
#[derive(Debug, Clone)]
pub struct PaymentCase {
    /// Site with the charging load included.
    pub feeder: Feeder,
    /// Line whose annual cost the battery avoids.
    pub reference: LineType,
    pub rate: f64,
    pub lifetime_years: u32,
    pub schedule: ReinvestmentSchedule,
}

impl PaymentCase {
    /// Annual cost of the reference: line investment, losses, and delivered energy.
    pub fn reference_cost(&self) -> Option<f64> {
        let annuity = annuity_factor(self.rate, self.lifetime_years)?;
        let line = self.feeder.assess(&self.reference, annuity);
        Some(line.total + self.feeder.annual_energy_cost())
    }

    pub fn max_payment(&self) -> Option<f64> {
        max_initial_payment(
            self.reference_cost()?,
            self.rate,
            self.lifetime_years,
            &self.schedule,
        )
    }
}

/// Reinvestments after the initial payment, as multiples of that payment.
///
/// The k-th reinvestment (k = 1, 2, ...) costs `1 + k·x` times the initial
/// payment.
#[derive(Debug, Clone, PartialEq)]
pub struct ReinvestmentSchedule {
    /// Years at which reinvestments fall due.
    pub years: Vec<u32>,
    /// Growth `x` of each successive reinvestment.
    pub growth: f64,
}

impl ReinvestmentSchedule {
    /// Weight of each reinvestment relative to the initial payment.
    pub fn weights(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.years
            .iter()
            .enumerate()
            .map(|(k, &year)| (year, 1.0 + (k as f64 + 1.0) * self.growth))
    }

    /// Same years with a different growth.
    pub fn with_growth(&self, growth: f64) -> Self {
        Self {
            years: self.years.clone(),
            growth,
        }
    }
}

/// Largest initial payment that keeps the annual net benefit non-negative.
///
/// ```text
/// f_max = (c_ref / E(r, n)) / (1 + Σ_k w_k / E(r, year_k))
/// ```
///
/// `reference_cost` is the annual cost of the alternative being avoided.
/// Returns `None` when any horizon is zero years.
pub fn max_initial_payment(
    reference_cost: f64,
    rate: f64,
    lifetime_years: u32,
    schedule: &ReinvestmentSchedule,
) -> Option<f64> {
    let lifetime = annuity_factor(rate, lifetime_years)?;
    let mut denominator = 1.0;
    for (year, weight) in schedule.weights() {
        denominator += weight / annuity_factor(rate, year)?;
    }
    Some(reference_cost / lifetime / denominator)
}
