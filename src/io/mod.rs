/// CSV export of dispatch tables and sweeps.
pub mod export;

pub use export::{export_dispatch_csv, export_sweep_csv, write_dispatch_csv, write_sweep_csv};
