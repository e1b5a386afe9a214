//! Closed-form planning economics for a radial feeder.
//!
//! Covers annuities, line losses and marginal line selection, the vehicle
//! fleet battery alternative, and the sensitivity of what that battery may
//! cost.

mod annuity;
pub mod fleet;
pub mod line;
pub mod payment;
pub mod sensitivity;
pub mod study;

pub use annuity::annuity_factor;
pub use fleet::FleetBattery;
pub use line::{Feeder, LineAssessment, LineType, LinearCostFit, compare};
pub use payment::{PaymentCase, ReinvestmentSchedule, max_initial_payment};
pub use sensitivity::{Sweep, linspace, sweep_discount_rate, sweep_peak_price, sweep_reinvestment};
pub use study::{StudyConfig, StudyReport, run as run_study};
