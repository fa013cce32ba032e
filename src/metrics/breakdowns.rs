//! Grouped breakdowns: distributions, ESP matrix and keyed KPI groups.

use super::kpis::{KpiSet, Tally};
use crate::core::Lead;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bucket for leads without an ESP tag
pub const UNSPECIFIED: &str = "Unspecified";

/// Bucket for leads without a resolved campaign or workspace
pub const UNASSIGNED: &str = "Unassigned";

fn esp_key(esp: &Option<String>) -> String {
    esp.clone().unwrap_or_else(|| UNSPECIFIED.to_string())
}

/// Counts of sent leads per lead ESP; sums to the number of sent leads.
pub fn esp_distribution<'a, I>(leads: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a Lead>,
{
    count_sent_by(leads, |lead| esp_key(&lead.esp))
}

/// Counts of sent leads per sending-inbox ESP.
pub fn sender_esp_distribution<'a, I>(leads: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a Lead>,
{
    count_sent_by(leads, |lead| esp_key(&lead.sender_esp))
}

fn count_sent_by<'a, I, F>(leads: I, key: F) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a Lead>,
    F: Fn(&Lead) -> String,
{
    leads
        .into_iter()
        .filter(|lead| lead.status.is_sent())
        .fold(BTreeMap::new(), |mut acc, lead| {
            *acc.entry(key(lead)).or_default() += 1;
            acc
        })
}

/// Lead counts per status label, including unsent and unknown leads.
pub fn status_breakdown<'a, I>(leads: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a Lead>,
{
    leads.into_iter().fold(BTreeMap::new(), |mut acc, lead| {
        *acc.entry(lead.status.label().to_string()).or_default() += 1;
        acc
    })
}

/// One sender-ESP × lead-ESP cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EspCell {
    pub sent: u64,
    pub responses: u64,
    pub human_replies: u64,
}

/// Sender ESP → lead ESP → cell, over sent leads.
pub type EspMatrix = BTreeMap<String, BTreeMap<String, EspCell>>;

pub fn esp_matrix<'a, I>(leads: I) -> EspMatrix
where
    I: IntoIterator<Item = &'a Lead>,
{
    leads
        .into_iter()
        .filter(|lead| lead.status.is_sent())
        .fold(EspMatrix::new(), |mut acc, lead| {
            let cell = acc
                .entry(esp_key(&lead.sender_esp))
                .or_default()
                .entry(esp_key(&lead.esp))
                .or_default();
            cell.sent += 1;
            if lead.has_response() {
                cell.responses += 1;
            }
            if lead.human_reply {
                cell.human_replies += 1;
            }
            acc
        })
}

/// Tally leads per key; leads for which `key` returns `None` are skipped.
pub fn tally_by<'a, I, K, F>(leads: I, key: F) -> BTreeMap<K, Tally>
where
    I: IntoIterator<Item = &'a Lead>,
    K: Ord,
    F: Fn(&Lead) -> Option<K>,
{
    leads.into_iter().fold(BTreeMap::new(), |mut acc, lead| {
        if let Some(k) = key(lead) {
            acc.entry(k).or_insert_with(Tally::default).record(lead);
        }
        acc
    })
}

/// [`tally_by`] with every group turned into a rounded [`KpiSet`].
pub fn group_kpis<'a, I, K, F>(leads: I, key: F, precision: u32) -> BTreeMap<K, KpiSet>
where
    I: IntoIterator<Item = &'a Lead>,
    K: Ord,
    F: Fn(&Lead) -> Option<K>,
{
    tally_by(leads, key)
        .into_iter()
        .map(|(k, tally)| (k, tally.to_kpis(precision)))
        .collect()
}
