use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::LeadmetricsConfig;
use crate::cache::CacheSettings;
use crate::core::{Error, Result};
use crate::metrics::MetricsSettings;

pub const CONFIG_FILE_NAME: &str = ".leadmetrics.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "LEADMETRICS_CONFIG";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Largest accepted `[metrics] precision`
const MAX_PRECISION: u32 = 12;

pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse a TOML config; out-of-range values are replaced by defaults.
pub fn parse_and_validate_config(contents: &str) -> Result<LeadmetricsConfig> {
    let mut config = toml::from_str::<LeadmetricsConfig>(contents)
        .map_err(|e| Error::Configuration(format!("Failed to parse {CONFIG_FILE_NAME}: {e}")))?;

    if config.metrics.precision > MAX_PRECISION {
        log::warn!(
            "Invalid metrics precision {} (max {}). Using default.",
            config.metrics.precision,
            MAX_PRECISION
        );
        config.metrics.precision = MetricsSettings::default().precision;
    }

    if config.cache.ttl_secs == 0 {
        log::warn!("Cache ttl_secs must be positive. Using default.");
        config.cache.ttl_secs = CacheSettings::default().ttl_secs;
    }

    Ok(config)
}

pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<LeadmetricsConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{}. Using defaults.", e);
            None
        }
    }
}

/// Only real failures are logged; a missing file is the normal case.
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// `start` and its parents, nearest first, at most `max_depth` entries.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Nearest `.leadmetrics.toml` at or above `start`, or the defaults.
pub fn load_config_from(start: PathBuf) -> LeadmetricsConfig {
    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            LeadmetricsConfig::default()
        })
}

/// `$LEADMETRICS_CONFIG` if set, otherwise the nearest config above the
/// working directory.
pub fn load_config() -> LeadmetricsConfig {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR) {
        let path = PathBuf::from(explicit);
        return try_load_config_from_path(&path).unwrap_or_else(|| {
            log::warn!(
                "{} points at unusable {}. Using default config.",
                CONFIG_ENV_VAR,
                path.display()
            );
            LeadmetricsConfig::default()
        });
    }

    match std::env::current_dir() {
        Ok(dir) => load_config_from(dir),
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            LeadmetricsConfig::default()
        }
    }
}
