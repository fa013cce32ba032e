//! Report pipeline: load → normalize → filter → compute.
//!
//! Loading is the only fallible, I/O-bound stage. Once a [`Normalized`]
//! snapshot exists, building a [`Report`] is pure apart from the optional
//! cache lookup.

use crate::cache::{CacheKey, KpiCache};
use crate::core::{NormalizedTable, Platform, Result, ResultExt};
use crate::filter::{filter, FilterCriteria};
use crate::io::source::RecordSource;
use crate::metrics::{compare, compute_with, KpiResult, KpiSet, MetricsSettings, PeriodChange};
use crate::normalize::{Anomalies, Normalized, Normalizer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::info_span;

/// KPIs of the preceding window of equal length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub previous_criteria: FilterCriteria,
    pub previous: KpiSet,
    pub changes: BTreeMap<String, PeriodChange>,
}

/// Everything a report writer needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub platform: Platform,
    pub criteria: FilterCriteria,
    pub result: KpiResult,
    pub anomalies: Anomalies,
    pub comparison: Option<Comparison>,
}

/// Pull the campaign, lead and sequence tables for `platform` from `source`
/// and normalize them.
pub fn load(
    source: &dyn RecordSource,
    platform: Platform,
    normalizer: &Normalizer,
) -> Result<Normalized> {
    let _span = info_span!("load", %platform).entered();

    let campaigns = source
        .campaigns(platform)
        .context("loading campaign records")?;
    let leads = source.leads(platform).context("loading lead records")?;
    let steps = source
        .sequences(platform)
        .context("loading sequence records")?;

    let mut normalized = normalizer.normalize(&campaigns, &leads, platform);
    if !steps.is_empty() {
        let (sequences, anomalies) = normalizer.normalize_sequences(&steps, &normalized.table);
        normalized.table.sequences = sequences;
        normalized.anomalies += anomalies;
    }

    if !normalized.anomalies.is_clean() {
        log::warn!(
            "{} anomalies while normalizing {} data: {:?}",
            normalized.anomalies.count(),
            platform,
            normalized.anomalies
        );
    }
    Ok(normalized)
}

/// Builds reports, optionally memoizing results in a [`KpiCache`]
#[derive(Default)]
pub struct ReportEngine {
    settings: MetricsSettings,
    cache: Option<KpiCache>,
}

impl ReportEngine {
    pub fn new(settings: MetricsSettings) -> Self {
        Self {
            settings,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: KpiCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn settings(&self) -> &MetricsSettings {
        &self.settings
    }

    pub fn cache(&self) -> Option<&KpiCache> {
        self.cache.as_ref()
    }

    /// KPIs for one criteria set, served from the cache when possible.
    pub fn result_for(
        &self,
        table: &NormalizedTable,
        criteria: &FilterCriteria,
        now: Instant,
    ) -> Result<Arc<KpiResult>> {
        let run = || compute_with(&filter(table, criteria), &self.settings);
        match &self.cache {
            Some(cache) => {
                let key = CacheKey::new(criteria, table)?;
                Ok(cache.get_or_compute(key, now, run))
            }
            None => Ok(Arc::new(run())),
        }
    }

    /// Build a report; with `with_comparison` the preceding window is computed
    /// too, provided the criteria carry a closed, valid date range.
    pub fn report(
        &self,
        snapshot: &Normalized,
        criteria: &FilterCriteria,
        with_comparison: bool,
        now: Instant,
    ) -> Result<Report> {
        let _span = info_span!("report", comparison = with_comparison).entered();
        let table = &snapshot.table;
        let current = self.result_for(table, criteria, now)?;

        let comparison = if with_comparison {
            match criteria.preceding() {
                Some(previous_criteria) => {
                    let previous = self.result_for(table, &previous_criteria, now)?;
                    let changes = compare(&current.kpis, &previous.kpis)
                        .into_iter()
                        .map(|(name, change)| (name.to_string(), change))
                        .collect();
                    Some(Comparison {
                        previous_criteria,
                        previous: previous.kpis,
                        changes,
                    })
                }
                None => {
                    log::info!("Comparison needs a closed date range; skipping");
                    None
                }
            }
        } else {
            None
        };

        Ok(Report {
            platform: table.platform,
            criteria: criteria.clone(),
            result: KpiResult::clone(&current),
            anomalies: snapshot.anomalies,
            comparison,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LeadDateField;
    use crate::filter::DateRange;
    use crate::io::source::MemorySource;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::time::Duration;

    fn rows(value: serde_json::Value) -> Vec<crate::normalize::RawRecord> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn source() -> MemorySource {
        MemorySource::new().with_platform(
            Platform::Email,
            rows(json!([{"id": "c1", "Name": "Spring"}])),
            rows(json!([
                {"id": "a", "campaign_id": "c1", "status": "Replied", "sent_date": "2024-03-10"},
                {"id": "b", "campaign_id": "c1", "status": "Sent", "sent_date": "2024-03-11"},
                {"id": "c", "campaign_id": "c1", "status": "Sent", "sent_date": "2024-03-04"},
                {"id": "d", "campaign_id": "zz", "status": "Sent", "sent_date": "2024-03-05"}
            ])),
        )
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_load_counts_anomalies() {
        let normalized = load(&source(), Platform::Email, &Normalizer::default()).unwrap();
        assert_eq!(normalized.table.leads.len(), 4);
        assert_eq!(normalized.anomalies.dangling_campaign_refs, 1);
    }

    #[test]
    fn test_report_with_comparison() {
        let snapshot = load(&source(), Platform::Email, &Normalizer::default()).unwrap();
        let criteria =
            FilterCriteria::all().range(DateRange::between(day(8), day(14), LeadDateField::Sent));
        let report = ReportEngine::default()
            .report(&snapshot, &criteria, true, Instant::now())
            .unwrap();

        assert_eq!(report.result.kpis.total_sent, 2);
        let comparison = report.comparison.unwrap();
        assert_eq!(comparison.previous.total_sent, 2);
        assert_eq!(comparison.changes["total_sent"], PeriodChange::Flat);
        assert_eq!(comparison.changes["replied"], PeriodChange::NotApplicable);
    }

    #[test]
    fn test_open_range_skips_comparison() {
        let snapshot = load(&source(), Platform::Email, &Normalizer::default()).unwrap();
        let report = ReportEngine::default()
            .report(&snapshot, &FilterCriteria::all(), true, Instant::now())
            .unwrap();
        assert!(report.comparison.is_none());
        assert_eq!(report.result.kpis.total_leads, 4);
    }

    #[test]
    fn test_cached_engine_reuses_results() {
        let snapshot = load(&source(), Platform::Email, &Normalizer::default()).unwrap();
        let engine = ReportEngine::new(MetricsSettings::default())
            .with_cache(KpiCache::new(Duration::from_secs(300)));
        let now = Instant::now();
        let criteria = FilterCriteria::all();

        let first = engine.result_for(&snapshot.table, &criteria, now).unwrap();
        let second = engine.result_for(&snapshot.table, &criteria, now).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.cache().map(|c| c.stats().hits), Some(1));
    }

    #[test]
    fn test_load_attaches_sequence_steps() {
        let source = source().with_sequences(
            Platform::Email,
            rows(json!([
                {"sequence_num": 1, "campaign_id": "c1", "order": 1},
                {"sequence_num": 2, "campaign_id": "gone", "order": 2}
            ])),
        );
        let normalized = load(&source, Platform::Email, &Normalizer::default()).unwrap();
        assert_eq!(normalized.table.sequences.len(), 2);
        assert_eq!(normalized.anomalies.dangling_campaign_refs, 2);
    }
}
