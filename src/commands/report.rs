use crate::cache::KpiCache;
use crate::config::{FilterSettings, LeadmetricsConfig};
use crate::core::{LeadDateField, Platform};
use crate::filter::{DatePreset, DateRange, FilterCriteria, WorkspaceSelector};
use crate::io::{create_writer, JsonFileSource, OutputFormat};
use crate::normalize::Normalizer;
use crate::pipeline::{load, ReportEngine};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

pub struct ReportConfig {
    pub campaigns: PathBuf,
    pub leads: PathBuf,
    pub sequences: Option<PathBuf>,
    pub platform: Platform,
    pub workspace: Option<String>,
    pub campaign: Option<String>,
    pub range: Option<DatePreset>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub date_field: Option<LeadDateField>,
    pub today: NaiveDate,
    pub compare: bool,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

/// Turn command-line filters into criteria, filling gaps from config.
///
/// Explicit `--from`/`--to` win over any preset; either bound may be open.
/// `all-time` applies no date filter.
pub fn build_criteria(config: &ReportConfig, defaults: &FilterSettings) -> FilterCriteria {
    let lead_field = config.date_field.unwrap_or(defaults.lead_date_field);
    let range = if config.from.is_some() || config.to.is_some() {
        Some(DateRange::new(config.from, config.to, lead_field))
    } else {
        config
            .range
            .unwrap_or(defaults.default_range)
            .resolve(config.today, lead_field)
    };

    FilterCriteria {
        workspace: WorkspaceSelector::parse(config.workspace.as_deref()),
        campaign_id: config.campaign.clone(),
        range,
    }
}

pub fn run_report(config: ReportConfig, settings: &LeadmetricsConfig) -> Result<()> {
    let mut source = JsonFileSource::new(&config.campaigns, &config.leads);
    if let Some(path) = &config.sequences {
        source = source.with_sequences(path);
    }
    let normalizer = Normalizer::new(settings.status_map());
    let snapshot = load(&source, config.platform, &normalizer)?;

    let criteria = build_criteria(&config, &settings.filters);
    log::info!("Computing {} report for {:?}", config.platform, criteria);

    let mut engine = ReportEngine::new(settings.metrics);
    if settings.cache.enabled {
        engine = engine.with_cache(KpiCache::new(settings.cache.ttl()));
    }
    let report = engine.report(&snapshot, &criteria, config.compare, Instant::now())?;

    let out: Box<dyn Write> = match &config.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = create_writer(config.format, out);
    writer.write_report(&report)?;

    if let Some(path) = &config.output {
        log::info!("Wrote report to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn config() -> ReportConfig {
        ReportConfig {
            campaigns: PathBuf::from("c.json"),
            leads: PathBuf::from("l.json"),
            sequences: None,
            platform: Platform::Email,
            workspace: None,
            campaign: None,
            range: None,
            from: None,
            to: None,
            date_field: None,
            today: day(14),
            compare: false,
            format: OutputFormat::Json,
            output: None,
        }
    }

    #[test]
    fn test_defaults_come_from_config() {
        let defaults = FilterSettings {
            default_range: DatePreset::Today,
            lead_date_field: LeadDateField::Reply,
        };
        let criteria = build_criteria(&config(), &defaults);
        assert_eq!(
            criteria.range,
            Some(DateRange::between(day(14), day(14), LeadDateField::Reply))
        );
        assert_eq!(criteria.workspace, WorkspaceSelector::All);
    }

    #[test]
    fn test_explicit_bounds_override_preset() {
        let cfg = ReportConfig {
            range: Some(DatePreset::AllTime),
            from: Some(day(1)),
            date_field: Some(LeadDateField::Bounce),
            workspace: Some("Acme".into()),
            campaign: Some("c1".into()),
            ..config()
        };
        let criteria = build_criteria(&cfg, &FilterSettings::default());
        assert_eq!(
            criteria.range,
            Some(DateRange::new(Some(day(1)), None, LeadDateField::Bounce))
        );
        assert_eq!(criteria.workspace, WorkspaceSelector::Named("Acme".into()));
        assert_eq!(criteria.campaign_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_all_time_keeps_undated_leads() {
        use crate::filter::filter;
        use crate::metrics::compute;
        use crate::normalize::{normalize, RawRecord};
        use serde_json::json;

        let leads: Vec<RawRecord> = [
            json!({"id": "a", "status": "Sent", "sent_date": "2024-03-10"}),
            json!({"id": "b", "status": "Sent"}),
            json!({"id": "c", "status": "Replied", "sent_date": "2024-04-01"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        let snapshot = normalize(&[], &leads, Platform::Email);

        let cfg = ReportConfig {
            range: Some(DatePreset::AllTime),
            ..config()
        };
        let criteria = build_criteria(&cfg, &FilterSettings::default());
        assert_eq!(criteria.range, None);

        let result = compute(&filter(&snapshot.table, &criteria));
        assert_eq!(result.kpis.total_sent, 3);
        assert_eq!(result.kpis.reply_rate, 0.3333);
    }
}
