//! CLI command implementations.
//!
//! Available commands:
//! - **report**: load, filter and compute KPIs, then render them
//! - **workspaces**: list workspaces and the campaigns in each
//! - **init**: write a default `.leadmetrics.toml`

pub mod init;
pub mod report;
pub mod workspaces;

pub use init::init_config;
pub use report::{build_criteria, run_report, ReportConfig};
pub use workspaces::list_workspaces;
