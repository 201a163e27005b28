//! File-level collaborators of `georef-core`: CSV loaders for control points
//! and unprojected points, CSV writers for projected and simulated results,
//! and JSON run configuration / report helpers.

mod config;
mod error;
mod read;
mod report;
mod write;

pub use config::{FieldNames, MissingPolicy, RunConfig};
pub use error::IoError;
pub use read::{
    load_control_points, load_unprojected, read_control_points, read_table, read_unprojected,
    MissingValues,
};
pub use report::RunReport;
pub use write::{
    format_value, save_projected, save_spread, write_projected, write_spread, SimWriter,
    PROJECTED_HEADER, SIM_HEADER, SPREAD_HEADER,
};
