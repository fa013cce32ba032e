//! Row normalization: untyped source rows → [`NormalizedTable`].
//!
//! Normalization never fails. Bad values degrade per field:
//!
//! - missing numbers default to 0
//! - missing dates stay absent; unparsable dates become absent and are counted
//! - unmapped statuses become [`LeadStatus::Unknown`] and are counted
//! - lead → campaign references that do not resolve are kept unresolved and counted
//!
//! The counts come back as [`Anomalies`] next to the table.

pub mod dates;
pub mod fields;

pub use dates::{parse_datetime, parse_day};
pub use fields::RawRecord;

use crate::core::{
    Campaign, CampaignCounters, Lead, LeadStatus, NormalizedTable, Platform, SequenceStep,
    StatusMap, WorkspaceId,
};
use fields::{alias, DateValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::AddAssign;

/// Per-kind counts of values that could not be taken at face value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomalies {
    pub unparsable_dates: usize,
    pub unknown_statuses: usize,
    pub dangling_campaign_refs: usize,
}

impl Anomalies {
    pub fn count(&self) -> usize {
        self.unparsable_dates + self.unknown_statuses + self.dangling_campaign_refs
    }

    pub fn is_clean(&self) -> bool {
        self.count() == 0
    }
}

impl AddAssign for Anomalies {
    fn add_assign(&mut self, rhs: Self) {
        self.unparsable_dates += rhs.unparsable_dates;
        self.unknown_statuses += rhs.unknown_statuses;
        self.dangling_campaign_refs += rhs.dangling_campaign_refs;
    }
}

/// A normalized snapshot together with its anomaly counts
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub table: NormalizedTable,
    pub anomalies: Anomalies,
}

/// Normalize with the default status table.
pub fn normalize(
    raw_campaigns: &[RawRecord],
    raw_leads: &[RawRecord],
    platform: Platform,
) -> Normalized {
    Normalizer::default().normalize(raw_campaigns, raw_leads, platform)
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    statuses: StatusMap,
}

impl Normalizer {
    pub fn new(statuses: StatusMap) -> Self {
        Self { statuses }
    }

    pub fn normalize(
        &self,
        raw_campaigns: &[RawRecord],
        raw_leads: &[RawRecord],
        platform: Platform,
    ) -> Normalized {
        let (campaigns, workspaces, mut anomalies) =
            self.normalize_campaigns(raw_campaigns, platform);
        let mut table = NormalizedTable::new(platform, campaigns, Vec::new(), workspaces);

        let (leads, lead_anomalies) = self.normalize_leads(raw_leads, &table);
        table.leads = leads;
        anomalies += lead_anomalies;

        log::debug!(
            "Normalized {} campaigns, {} leads, {} workspaces ({} anomalies)",
            table.campaigns.len(),
            table.leads.len(),
            table.workspaces.len(),
            anomalies.count()
        );

        Normalized { table, anomalies }
    }

    /// Normalize campaign rows, interning workspace names in first-seen order.
    pub fn normalize_campaigns(
        &self,
        rows: &[RawRecord],
        platform: Platform,
    ) -> (Vec<Campaign>, Vec<String>, Anomalies) {
        let mut anomalies = Anomalies::default();
        let mut interner = Interner::default();

        let campaigns = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let created_date = take_date(row, alias::CREATED_DATE, &mut anomalies);
                Campaign {
                    id: fields::text(row, alias::CAMPAIGN_ID)
                        .unwrap_or_else(|| format!("campaign-{idx}")),
                    name: fields::text(row, alias::CAMPAIGN_NAME)
                        .unwrap_or_else(|| "Unknown Campaign".to_string()),
                    workspace: fields::text(row, alias::WORKSPACE)
                        .map(|name| interner.intern(name)),
                    created_date,
                    platform: row_platform(row, platform),
                    counters: read_counters(row),
                }
            })
            .collect();

        (campaigns, interner.names, anomalies)
    }

    /// Normalize lead rows, resolving campaign references against `table`.
    pub fn normalize_leads(
        &self,
        rows: &[RawRecord],
        table: &NormalizedTable,
    ) -> (Vec<Lead>, Anomalies) {
        let mut anomalies = Anomalies::default();

        let leads = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let campaign_id = fields::text(row, alias::LEAD_CAMPAIGN);
                let campaign = campaign_id.as_deref().and_then(|id| table.campaign_ref(id));
                if campaign_id.is_some() && campaign.is_none() {
                    anomalies.dangling_campaign_refs += 1;
                }
                let workspace = campaign
                    .and_then(|r| table.campaign(r))
                    .and_then(|c| c.workspace);

                let status = self.read_status(row);
                if status == LeadStatus::Unknown {
                    anomalies.unknown_statuses += 1;
                }

                Lead {
                    id: fields::text(row, alias::LEAD_ID).unwrap_or_else(|| format!("lead-{idx}")),
                    campaign_id,
                    campaign,
                    workspace,
                    status,
                    sent_date: take_date(row, alias::SENT_DATE, &mut anomalies),
                    reply_date: take_date(row, alias::REPLY_DATE, &mut anomalies),
                    bounce_date: take_date(row, alias::BOUNCE_DATE, &mut anomalies),
                    esp: fields::text(row, alias::LEAD_ESP),
                    sender_esp: fields::text(row, alias::SENDER_ESP),
                    platform: row_platform(row, table.platform),
                    reply_count: fields::count(row, alias::REPLY_COUNT).min(u32::MAX as u64)
                        as u32,
                    human_reply: fields::flag(row, alias::HUMAN_REPLY),
                    sequence_num: fields::id_number(row, alias::SEQUENCE_NUM),
                }
            })
            .collect();

        (leads, anomalies)
    }

    /// Normalize email sequence steps, resolving their campaigns against `table`.
    ///
    /// Rows without a usable `sequence_num` cannot be matched to leads and are
    /// dropped.
    pub fn normalize_sequences(
        &self,
        rows: &[RawRecord],
        table: &NormalizedTable,
    ) -> (Vec<SequenceStep>, Anomalies) {
        let mut anomalies = Anomalies::default();

        let steps: Vec<SequenceStep> = rows
            .iter()
            .filter_map(|row| {
                let sequence_num = fields::id_number(row, alias::SEQUENCE_NUM)?;
                let campaign_id = fields::text(row, alias::STEP_CAMPAIGN);
                let campaign = campaign_id.as_deref().and_then(|id| table.campaign_ref(id));
                if campaign_id.is_some() && campaign.is_none() {
                    anomalies.dangling_campaign_refs += 1;
                }

                Some(SequenceStep {
                    sequence_num,
                    campaign_id,
                    campaign,
                    order: fields::count(row, alias::STEP_ORDER),
                    variant: fields::flag(row, alias::STEP_VARIANT),
                    variant_from: fields::id_number(row, alias::VARIANT_FROM),
                    subject: fields::text(row, alias::SUBJECT).unwrap_or_default(),
                    wait_in_days: fields::count(row, alias::WAIT_DAYS),
                    thread_reply: fields::flag(row, alias::THREAD_REPLY),
                    sent: fields::count(row, alias::STEP_SENT),
                    leads_contacted: fields::count(row, alias::LEADS_CONTACTED),
                })
            })
            .collect();

        if steps.len() < rows.len() {
            log::debug!(
                "Dropped {} sequence rows without a sequence number",
                rows.len() - steps.len()
            );
        }

        (steps, anomalies)
    }

    fn read_status(&self, row: &RawRecord) -> LeadStatus {
        fields::text(row, alias::STATUS)
            .map(|raw| self.statuses.lookup(&raw))
            .unwrap_or(LeadStatus::Unknown)
    }
}

fn take_date(
    row: &RawRecord,
    aliases: &[&str],
    anomalies: &mut Anomalies,
) -> Option<chrono::NaiveDateTime> {
    let value = fields::date(row, aliases);
    if value == DateValue::Unparsable {
        anomalies.unparsable_dates += 1;
    }
    value.value()
}

fn row_platform(row: &RawRecord, default: Platform) -> Platform {
    fields::text(row, alias::PLATFORM)
        .and_then(|tag| Platform::from_tag(&tag))
        .unwrap_or(default)
}

fn read_counters(row: &RawRecord) -> CampaignCounters {
    CampaignCounters {
        emails_sent: fields::count(row, alias::EMAILS_SENT),
        leads_contacted: fields::count(row, alias::LEADS_CONTACTED),
        bounced: fields::count(row, alias::BOUNCED),
        sent_connections: fields::count(row, alias::SENT_CONNECTIONS),
        accepted_connections: fields::count(row, alias::ACCEPTED_CONNECTIONS),
        sent_messages: fields::count(row, alias::SENT_MESSAGES),
        replies: fields::count(row, alias::REPLIES),
        sent_inmails: fields::count(row, alias::SENT_INMAILS),
        inmail_replies: fields::count(row, alias::INMAIL_REPLIES),
    }
}

#[derive(Default)]
struct Interner {
    names: Vec<String>,
    ids: HashMap<String, WorkspaceId>,
}

impl Interner {
    fn intern(&mut self, name: String) -> WorkspaceId {
        if let Some(id) = self.ids.get(&name) {
            return *id;
        }
        let id = WorkspaceId(self.names.len() as u32);
        self.names.push(name.clone());
        self.ids.insert(name, id);
        id
    }
}
