//! KPI computation over a filtered [`TableView`].
//!
//! Everything here is a pure function of the view and the settings. All
//! keyed outputs use `BTreeMap` so two runs over the same view serialize
//! identically.

pub mod breakdowns;
pub mod funnel;
pub mod kpis;
pub mod outreach;
pub mod rates;
pub mod sequences;

pub use breakdowns::{EspCell, EspMatrix, UNASSIGNED, UNSPECIFIED};
pub use funnel::{Funnel, FunnelMode, FunnelStage};
pub use kpis::{KpiSet, Tally};
pub use outreach::OutreachSummary;
pub use rates::{PeriodChange, DEFAULT_PRECISION};
pub use sequences::{StepGroup, StepStats};

use crate::core::{Lead, Platform};
use crate::filter::TableView;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug_span;

/// Knobs for [`compute_with`]; also the `[metrics]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Decimal places kept on rate metrics
    pub precision: u32,
    pub funnel_mode: FunnelMode,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            funnel_mode: FunnelMode::default(),
        }
    }
}

/// Everything computed for one view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiResult {
    pub kpis: KpiSet,
    pub esp_distribution: BTreeMap<String, u64>,
    pub sender_esp_distribution: BTreeMap<String, u64>,
    pub status_breakdown: BTreeMap<String, u64>,
    pub esp_matrix: EspMatrix,
    /// `YYYY-MM-DD` of the view's lead date field; undated leads are left out
    pub by_date: BTreeMap<String, KpiSet>,
    pub by_campaign: BTreeMap<String, KpiSet>,
    pub by_workspace: BTreeMap<String, KpiSet>,
    /// Present only when LinkedIn data is in play
    pub funnel: Option<Funnel>,
    pub outreach: OutreachSummary,
    /// Email sequence steps per campaign id; empty without a sequence table
    #[serde(default)]
    pub sequences: BTreeMap<String, Vec<StepGroup>>,
}

/// [`compute_with`] using default settings.
pub fn compute(view: &TableView<'_>) -> KpiResult {
    compute_with(view, &MetricsSettings::default())
}

pub fn compute_with(view: &TableView<'_>, settings: &MetricsSettings) -> KpiResult {
    let _span = debug_span!(
        "compute_kpis",
        leads = view.leads.len(),
        campaigns = view.campaigns.len()
    )
    .entered();

    let precision = settings.precision;
    let leads = || view.leads.iter().copied();
    let table = view.table();
    let date_field = view.date_field();

    let by_campaign = breakdowns::group_kpis(
        leads(),
        |lead: &Lead| {
            Some(
                lead.campaign
                    .and_then(|r| table.campaign(r))
                    .map(|c| c.id.clone())
                    .unwrap_or_else(|| UNASSIGNED.to_string()),
            )
        },
        precision,
    );

    let by_workspace = breakdowns::group_kpis(
        leads(),
        |lead: &Lead| {
            Some(
                lead.workspace
                    .and_then(|w| table.workspace_name(w))
                    .unwrap_or(UNASSIGNED)
                    .to_string(),
            )
        },
        precision,
    );

    let by_date = breakdowns::group_kpis(
        leads(),
        |lead: &Lead| {
            lead.date(date_field)
                .map(|ts| ts.date().format("%Y-%m-%d").to_string())
        },
        precision,
    );

    let has_linkedin = table.platform == Platform::LinkedIn
        || leads().any(|lead| lead.platform == Platform::LinkedIn);
    let funnel = has_linkedin.then(|| funnel::funnel(leads(), settings.funnel_mode, precision));

    let result = KpiResult {
        kpis: Tally::from_leads(leads()).to_kpis(precision),
        esp_distribution: breakdowns::esp_distribution(leads()),
        sender_esp_distribution: breakdowns::sender_esp_distribution(leads()),
        status_breakdown: breakdowns::status_breakdown(leads()),
        esp_matrix: breakdowns::esp_matrix(leads()),
        by_date,
        by_campaign,
        by_workspace,
        funnel,
        outreach: outreach::outreach_summary(view.campaigns.iter().copied(), precision),
        sequences: sequences::sequence_stats(view),
    };

    log::debug!(
        "Computed KPIs: {} sent, {} dated buckets, {} campaigns",
        result.kpis.total_sent,
        result.by_date.len(),
        result.by_campaign.len()
    );
    result
}

/// Change of every KPI in `current` relative to `previous`.
pub fn compare(current: &KpiSet, previous: &KpiSet) -> BTreeMap<&'static str, PeriodChange> {
    let before = previous.metrics();
    current
        .metrics()
        .into_iter()
        .map(|(name, value)| {
            let prior = before.get(name).copied().unwrap_or_default();
            (name, PeriodChange::between(value, prior))
        })
        .collect()
}
