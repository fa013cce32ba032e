use crate::cache::CacheSettings;
use crate::core::{LeadDateField, StatusMap};
use crate::filter::DatePreset;
use crate::metrics::MetricsSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration structure for leadmetrics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LeadmetricsConfig {
    /// Precision and funnel mode for computed metrics
    #[serde(default)]
    pub metrics: MetricsSettings,

    /// Defaults applied when the command line leaves filters unset
    #[serde(default)]
    pub filters: FilterSettings,

    /// In-process result cache
    #[serde(default)]
    pub cache: CacheSettings,

    /// Extra raw status → canonical status mappings
    #[serde(default)]
    pub status_aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub default_range: DatePreset,
    pub lead_date_field: LeadDateField,
}

impl LeadmetricsConfig {
    /// Default status table extended with the configured aliases.
    pub fn status_map(&self) -> StatusMap {
        StatusMap::with_aliases(&self.status_aliases)
    }
}
