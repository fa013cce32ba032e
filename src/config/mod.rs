//! `.leadmetrics.toml` configuration.
//!
//! ```toml
//! [metrics]
//! precision = 4
//! funnel_mode = "current-status"
//!
//! [filters]
//! default_range = "last-7-days"
//! lead_date_field = "sent"
//!
//! [cache]
//! enabled = true
//! ttl_secs = 300
//!
//! [status_aliases]
//! "warm lead" = "interested"
//! ```

mod core;
mod loader;

pub use core::{FilterSettings, LeadmetricsConfig};
pub use loader::{
    directory_ancestors, load_config, load_config_from, parse_and_validate_config,
    CONFIG_ENV_VAR, CONFIG_FILE_NAME,
};
