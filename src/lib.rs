//! Campaign and lead KPI engine.
//!
//! Raw rows from a [`RecordSource`](io::RecordSource) are normalized into a
//! [`NormalizedTable`], filtered into a borrowed [`TableView`], and reduced
//! to a [`KpiResult`]. Everything after loading is pure and deterministic.

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod filter;
pub mod io;
pub mod metrics;
pub mod normalize;
pub mod pipeline;

pub use crate::core::{
    Campaign, CampaignRef, Error, Lead, LeadDateField, LeadStatus, NormalizedTable, Platform,
    Result, StatusMap, WorkspaceId,
};

pub use crate::filter::{
    filter, DatePreset, DateRange, FilterCriteria, TableView, WorkspaceSelector,
};

pub use crate::metrics::{
    compare, compute, compute_with, FunnelMode, KpiResult, KpiSet, MetricsSettings, PeriodChange,
};

pub use crate::normalize::{normalize, Anomalies, Normalized, Normalizer, RawRecord};

pub use crate::cache::{CacheKey, KpiCache};

pub use crate::pipeline::{load, Report, ReportEngine};
