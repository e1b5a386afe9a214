//! Generation technologies and storage used by the dispatch formulations.

/// Battery parameters and the threshold-driven battery.
pub mod storage;
pub mod types;

pub use storage::{BatteryAction, RuleBattery, StorageParams};
pub use types::{Capacity, Mode};
