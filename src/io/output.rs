use crate::core::LeadDateField;
use crate::filter::{DateRange, WorkspaceSelector};
use crate::metrics::{KpiResult, KpiSet, PeriodChange, StepGroup, StepStats};
use crate::pipeline::Report;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Table};
use std::collections::BTreeMap;
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
    Markdown,
}

/// Renders a [`Report`]; implementations flush their writer before returning.
pub trait OutputWriter {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()>;
}

/// Headline KPIs in display order
const KPI_ROWS: &[(&str, &str)] = &[
    ("total_leads", "Total Leads"),
    ("total_sent", "Total Sent"),
    ("replied", "Replied"),
    ("reply_rate", "Reply Rate"),
    ("bounced", "Bounced"),
    ("bounce_rate", "Bounce Rate"),
    ("responses", "Responses"),
    ("response_rate", "Response Rate"),
    ("human_replies", "Human Replies"),
    ("human_reply_rate", "Human Reply Rate"),
    ("interested_count", "Interested"),
    ("interested_rate", "Interested Rate"),
    ("objection_count", "Objections"),
    ("objection_rate", "Objection Rate"),
    ("not_interested_count", "Not Interested"),
    ("automated_count", "Automated Replies"),
    ("revisit_count", "Revisit Later"),
    ("unsubscribed_count", "Unsubscribed"),
    ("unknown_count", "Unknown Status"),
];

fn format_metric(name: &str, value: f64) -> String {
    if name.ends_with("_rate") {
        format_rate(value)
    } else {
        format!("{value:.0}")
    }
}

fn format_rate(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn date_field_label(field: LeadDateField) -> &'static str {
    match field {
        LeadDateField::Sent => "sent date",
        LeadDateField::Reply => "reply date",
        LeadDateField::Bounce => "bounce date",
    }
}

fn describe_range(range: Option<&DateRange>) -> String {
    let Some(range) = range else {
        return "All time".to_string();
    };
    let bound = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "…".to_string())
    };
    format!(
        "{} → {} ({})",
        bound(range.start),
        bound(range.end),
        date_field_label(range.lead_field)
    )
}

/// Label/value pairs describing what the report covers.
fn scope_lines(report: &Report) -> Vec<(&'static str, String)> {
    let workspace = match &report.criteria.workspace {
        WorkspaceSelector::All => "All Workspaces".to_string(),
        WorkspaceSelector::Named(name) => name.clone(),
    };
    vec![
        ("Platform", report.platform.to_string()),
        ("Workspace", workspace),
        (
            "Campaign",
            report
                .criteria
                .campaign_id
                .clone()
                .unwrap_or_else(|| "All Campaigns".to_string()),
        ),
        ("Date range", describe_range(report.criteria.range.as_ref())),
    ]
}

fn change_for<'a>(report: &'a Report, name: &str) -> Option<&'a PeriodChange> {
    report
        .comparison
        .as_ref()
        .and_then(|c| c.changes.get(name))
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()> {
        self.write_header(report)?;
        self.write_kpis(report)?;
        self.write_distribution("ESP Distribution", "ESP", &report.result.esp_distribution)?;
        self.write_distribution("Status Breakdown", "Status", &report.result.status_breakdown)?;
        self.write_funnel(&report.result)?;
        self.write_outreach(&report.result)?;
        self.write_sequences(&report.result)?;
        self.write_data_quality(report)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> MarkdownWriter<W> {
    fn write_header(&mut self, report: &Report) -> anyhow::Result<()> {
        writeln!(self.writer, "# Lead Metrics Report")?;
        writeln!(self.writer)?;
        for (label, value) in scope_lines(report) {
            writeln!(self.writer, "- **{label}**: {value}")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_kpis(&mut self, report: &Report) -> anyhow::Result<()> {
        let kpis = &report.result.kpis;
        let with_change = report.comparison.is_some();

        writeln!(self.writer, "## Key Metrics")?;
        writeln!(self.writer)?;
        if with_change {
            writeln!(self.writer, "| Metric | Value | Change |")?;
            writeln!(self.writer, "|--------|-------|--------|")?;
        } else {
            writeln!(self.writer, "| Metric | Value |")?;
            writeln!(self.writer, "|--------|-------|")?;
        }

        for (name, label) in KPI_ROWS {
            let value = format_metric(name, kpis.get(name).unwrap_or_default());
            match change_for(report, name) {
                Some(change) if with_change => {
                    writeln!(self.writer, "| {label} | {value} | {change} |")?
                }
                _ if with_change => writeln!(self.writer, "| {label} | {value} | - |")?,
                _ => writeln!(self.writer, "| {label} | {value} |")?,
            }
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_distribution(
        &mut self,
        title: &str,
        column: &str,
        counts: &BTreeMap<String, u64>,
    ) -> anyhow::Result<()> {
        if counts.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "## {title}")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| {column} | Count |")?;
        writeln!(self.writer, "|------|-------|")?;
        for (key, count) in counts {
            writeln!(self.writer, "| {key} | {count} |")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_funnel(&mut self, result: &KpiResult) -> anyhow::Result<()> {
        let Some(funnel) = &result.funnel else {
            return Ok(());
        };
        writeln!(self.writer, "## LinkedIn Funnel")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Stage | Leads | Share of First |")?;
        writeln!(self.writer, "|-------|-------|----------------|")?;
        for stage in &funnel.stages {
            writeln!(
                self.writer,
                "| {} | {} | {} |",
                stage.label,
                stage.count,
                format_rate(stage.share_of_first)
            )?;
        }
        if !funnel.is_monotonic() {
            writeln!(self.writer)?;
            writeln!(
                self.writer,
                "> Counts reflect current status only; later stages may exceed earlier ones."
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_outreach(&mut self, result: &KpiResult) -> anyhow::Result<()> {
        let o = &result.outreach;
        if o.campaigns == 0 {
            return Ok(());
        }
        writeln!(self.writer, "## Campaign Outreach ({} campaigns)", o.campaigns)?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Metric | Value |")?;
        writeln!(self.writer, "|--------|-------|")?;
        for (label, value) in outreach_rows(result) {
            writeln!(self.writer, "| {label} | {value} |")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_sequences(&mut self, result: &KpiResult) -> anyhow::Result<()> {
        for (campaign_id, groups) in &result.sequences {
            writeln!(self.writer, "## Sequence Steps: {campaign_id}")?;
            writeln!(self.writer)?;
            writeln!(self.writer, "| {} |", SEQUENCE_HEADER.join(" | "))?;
            writeln!(self.writer, "|{}", "------|".repeat(SEQUENCE_HEADER.len()))?;
            for row in sequence_rows(groups) {
                writeln!(self.writer, "| {} |", row.join(" | "))?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_data_quality(&mut self, report: &Report) -> anyhow::Result<()> {
        let a = &report.anomalies;
        writeln!(self.writer, "## Data Quality")?;
        writeln!(self.writer)?;
        if a.is_clean() {
            writeln!(self.writer, "No anomalies detected.")?;
        } else {
            writeln!(self.writer, "- Unparsable dates: {}", a.unparsable_dates)?;
            writeln!(self.writer, "- Unknown statuses: {}", a.unknown_statuses)?;
            writeln!(
                self.writer,
                "- Dangling campaign references: {}",
                a.dangling_campaign_refs
            )?;
        }
        Ok(())
    }
}

fn outreach_rows(result: &KpiResult) -> Vec<(&'static str, String)> {
    let o = &result.outreach;
    vec![
        ("Emails Sent", o.emails_sent.to_string()),
        ("Leads Contacted", o.leads_contacted.to_string()),
        ("Bounced", o.campaign_bounced.to_string()),
        ("Sent Connections", o.sent_connections.to_string()),
        ("Accepted Connections", o.accepted_connections.to_string()),
        ("Acceptance Rate", format_rate(o.acceptance_rate)),
        ("Sent Messages", o.sent_messages.to_string()),
        ("Message Replies", o.message_replies.to_string()),
        ("Message Reply Rate", format_rate(o.message_reply_rate)),
        ("Sent InMails", o.sent_inmails.to_string()),
        ("InMail Replies", o.inmail_replies.to_string()),
        ("InMail Reply Rate", format_rate(o.inmail_reply_rate)),
    ]
}

const SEQUENCE_HEADER: [&str; 8] = [
    "Step",
    "Subject",
    "Sent",
    "Contacted",
    "Replies",
    "Interested",
    "Not Interested",
    "Bounced",
];

/// One row per parent step, each followed by its variants.
fn sequence_rows(groups: &[StepGroup]) -> Vec<Vec<String>> {
    let row = |stats: &StepStats| {
        vec![
            stats.label.clone(),
            stats.subject.clone(),
            stats.sent.to_string(),
            stats.leads_contacted.to_string(),
            stats.replies.to_string(),
            stats.interested.to_string(),
            stats.not_interested.to_string(),
            stats.bounced.to_string(),
        ]
    };
    groups
        .iter()
        .flat_map(|group| std::iter::once(&group.step).chain(&group.variants))
        .map(row)
        .collect()
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_report(&mut self, report: &Report) -> anyhow::Result<()> {
        self.print_header(report)?;
        self.print_kpis(report)?;
        self.print_esp(&report.result)?;
        self.print_funnel(&report.result)?;
        self.print_outreach(&report.result)?;
        self.print_sequences(&report.result)?;
        self.print_anomalies(report)?;
        self.writer.flush()?;
        Ok(())
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

fn colored_change(change: &PeriodChange) -> ColoredString {
    let text = change.to_string();
    match change {
        PeriodChange::Up(_) => text.green(),
        PeriodChange::Down(_) => text.red(),
        PeriodChange::Flat | PeriodChange::NotApplicable => text.dimmed(),
    }
}

impl<W: Write> TerminalWriter<W> {
    fn print_header(&mut self, report: &Report) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", "Lead Metrics Report".bold().blue())?;
        writeln!(self.writer, "{}", "===================".blue())?;
        for (label, value) in scope_lines(report) {
            writeln!(self.writer, "  {}: {value}", label.bold())?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_kpis(&mut self, report: &Report) -> anyhow::Result<()> {
        let kpis: &KpiSet = &report.result.kpis;
        let with_change = report.comparison.is_some();
        let mut table = if with_change {
            new_table(vec!["Metric", "Value", "vs. previous"])
        } else {
            new_table(vec!["Metric", "Value"])
        };

        for (name, label) in KPI_ROWS {
            let value = format_metric(name, kpis.get(name).unwrap_or_default());
            let mut row = vec![label.to_string(), value];
            if with_change {
                row.push(
                    change_for(report, name)
                        .map(|c| colored_change(c).to_string())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            table.add_row(row);
        }
        writeln!(self.writer, "{table}")?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_esp(&mut self, result: &KpiResult) -> anyhow::Result<()> {
        if result.esp_distribution.is_empty() {
            return Ok(());
        }
        let total: u64 = result.esp_distribution.values().sum();
        let mut table = new_table(vec!["ESP", "Sent", "Share"]);
        for (esp, count) in &result.esp_distribution {
            table.add_row(vec![
                esp.clone(),
                count.to_string(),
                format_rate(crate::metrics::rates::ratio(*count, total)),
            ]);
        }
        writeln!(self.writer, "{}", "ESP Distribution".bold())?;
        writeln!(self.writer, "{table}")?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_funnel(&mut self, result: &KpiResult) -> anyhow::Result<()> {
        let Some(funnel) = &result.funnel else {
            return Ok(());
        };
        let mut table = new_table(vec!["Stage", "Leads", "Share of First"]);
        for stage in &funnel.stages {
            table.add_row(vec![
                stage.label.clone(),
                stage.count.to_string(),
                format_rate(stage.share_of_first),
            ]);
        }
        writeln!(self.writer, "{}", "LinkedIn Funnel".bold())?;
        writeln!(self.writer, "{table}")?;
        if !funnel.is_monotonic() {
            writeln!(
                self.writer,
                "{}",
                "  note: current-status counts; stages are not cumulative".dimmed()
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_outreach(&mut self, result: &KpiResult) -> anyhow::Result<()> {
        if result.outreach.campaigns == 0 {
            return Ok(());
        }
        let mut table = new_table(vec!["Metric", "Value"]);
        for (label, value) in outreach_rows(result) {
            table.add_row(vec![label.to_string(), value]);
        }
        writeln!(
            self.writer,
            "{}",
            format!("Campaign Outreach ({} campaigns)", result.outreach.campaigns).bold()
        )?;
        writeln!(self.writer, "{table}")?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn print_sequences(&mut self, result: &KpiResult) -> anyhow::Result<()> {
        for (campaign_id, groups) in &result.sequences {
            let mut table = new_table(SEQUENCE_HEADER.to_vec());
            for row in sequence_rows(groups) {
                table.add_row(row);
            }
            writeln!(self.writer, "{}", format!("Sequence Steps: {campaign_id}").bold())?;
            writeln!(self.writer, "{table}")?;
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn print_anomalies(&mut self, report: &Report) -> anyhow::Result<()> {
        let a = &report.anomalies;
        if a.is_clean() {
            writeln!(self.writer, "{} No data anomalies", "✓".green())?;
        } else {
            writeln!(
                self.writer,
                "{} {} anomalies: {} unparsable dates, {} unknown statuses, \
                 {} dangling campaign refs",
                "⚠".yellow(),
                a.count(),
                a.unparsable_dates,
                a.unknown_statuses,
                a.dangling_campaign_refs
            )?;
        }
        Ok(())
    }
}

pub fn create_writer<'a>(
    format: OutputFormat,
    out: Box<dyn Write + 'a>,
) -> Box<dyn OutputWriter + 'a> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(out)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(out)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(out)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Lead, LeadStatus, NormalizedTable, Platform};
    use crate::filter::{FilterCriteria, TableView};
    use crate::metrics::compute;
    use crate::normalize::Anomalies;

    fn report() -> Report {
        let leads = vec![
            Lead::new("a", LeadStatus::Replied),
            Lead::new("b", LeadStatus::Sent),
            Lead::new("c", LeadStatus::Bounced),
            Lead::new("d", LeadStatus::Sent),
        ];
        let table = NormalizedTable::new(Platform::Email, Vec::new(), leads, Vec::new());
        Report {
            platform: Platform::Email,
            criteria: FilterCriteria::all(),
            result: compute(&TableView::of(&table)),
            anomalies: Anomalies {
                unknown_statuses: 2,
                ..Default::default()
            },
            comparison: None,
        }
    }

    #[test]
    fn test_json_writer_round_trips() {
        let report = report();
        let mut buf = Vec::new();
        JsonWriter::new(&mut buf).write_report(&report).unwrap();
        let parsed: Report = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_markdown_writer_sections() {
        let mut buf = Vec::new();
        MarkdownWriter::new(&mut buf).write_report(&report()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("# Lead Metrics Report"));
        assert!(text.contains("| Reply Rate | 25.00% |"));
        assert!(text.contains("| Unspecified | 4 |"));
        assert!(text.contains("- Unknown statuses: 2"));
        assert!(!text.contains("LinkedIn Funnel"));
    }

    #[test]
    fn test_terminal_writer_lists_metrics() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        TerminalWriter::new(&mut buf).write_report(&report()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Lead Metrics Report"));
        assert!(text.contains("Bounce Rate"));
        assert!(text.contains("25.00%"));
        assert!(text.contains("2 anomalies"));
    }

    #[test]
    fn test_metric_formatting() {
        assert_eq!(format_metric("reply_rate", 0.1234), "12.34%");
        assert_eq!(format_metric("total_sent", 12.0), "12");
    }

    /// Accepts writes, then fails on flush like a full disk behind a buffer.
    struct FlushFails;

    impl Write for FlushFails {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("no space left on device"))
        }
    }

    #[test]
    fn test_flush_errors_surface() {
        let report = report();
        for format in [OutputFormat::Json, OutputFormat::Markdown, OutputFormat::Terminal] {
            let mut writer = create_writer(format, Box::new(FlushFails));
            assert!(writer.write_report(&report).is_err(), "{format:?}");
        }
    }

    #[test]
    fn test_markdown_sequence_section() {
        use crate::core::{Campaign, CampaignCounters, CampaignRef, SequenceStep};

        let campaign = Campaign {
            id: "c1".into(),
            name: "Spring".into(),
            workspace: None,
            created_date: None,
            platform: Platform::Email,
            counters: CampaignCounters::default(),
        };
        let mut replied = Lead::new("a", LeadStatus::Replied);
        replied.campaign = Some(CampaignRef(0));
        replied.sequence_num = Some(5);
        replied.reply_count = 1;

        let mut table =
            NormalizedTable::new(Platform::Email, vec![campaign], vec![replied], vec![]);
        table.sequences = vec![SequenceStep {
            sequence_num: 5,
            campaign_id: Some("c1".into()),
            campaign: Some(CampaignRef(0)),
            order: 1,
            variant: false,
            variant_from: None,
            subject: "Quick question".into(),
            wait_in_days: 0,
            thread_reply: false,
            sent: 12,
            leads_contacted: 10,
        }];

        let report = Report {
            result: compute(&TableView::of(&table)),
            ..report()
        };
        let mut buf = Vec::new();
        MarkdownWriter::new(&mut buf).write_report(&report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("## Sequence Steps: c1"));
        assert!(text.contains("| Step 1 | Quick question | 12 | 10 | 1 | 0 | 0 | 0 |"));
    }
}
