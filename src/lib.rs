//! Power-system planning toolkit.
//!
//! Two halves share the crate:
//!
//! - [`dispatch`]: hourly generation dispatch over a set of production
//!   [`modes`], solved as an LP (merit order), a per-hour LP driven by a rule
//!   battery, a storage MILP, or an integer unit-sizing problem.
//! - [`economics`]: distribution feeder reinforcement, fleet battery sizing,
//!   and the maximum up-front payment a battery contract can justify.
//!
//! Scenarios come from built-in presets or TOML files ([`config`]); results
//! are charted with [`chart`] and exported with [`io`].

pub mod chart;
pub mod config;
pub mod dispatch;
pub mod economics;
pub mod error;
pub mod io;
pub mod logging;
pub mod modes;

pub use error::{Error, Result};
