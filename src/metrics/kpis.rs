//! Integer tallies over leads and the rounded KPI set derived from them.

use super::rates::rate;
use crate::core::{Lead, LeadStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw counts accumulated over a set of leads.
///
/// Replies and responses are only credited to sent leads, so every rate
/// over `sent` stays within `[0, 1]`.
///
/// Rates are never stored here; they are derived from the counts when a
/// [`KpiSet`] is assembled, so grouped breakdowns never inherit rounding
/// from their parents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total_leads: u64,
    pub sent: u64,
    pub replied: u64,
    pub bounced: u64,
    pub interested: u64,
    pub not_interested: u64,
    pub objection: u64,
    pub automated: u64,
    pub revisit: u64,
    pub unsubscribed: u64,
    pub unknown: u64,
    pub human_replies: u64,
    pub responses: u64,
}

impl Tally {
    pub fn from_leads<'a, I>(leads: I) -> Self
    where
        I: IntoIterator<Item = &'a Lead>,
    {
        leads.into_iter().fold(Tally::default(), |mut acc, lead| {
            acc.record(lead);
            acc
        })
    }

    pub fn record(&mut self, lead: &Lead) {
        self.total_leads += 1;
        if lead.status.is_sent() {
            self.sent += 1;
            if lead.human_reply {
                self.human_replies += 1;
            }
            if lead.has_response() {
                self.responses += 1;
            }
        }
        match lead.status {
            LeadStatus::Replied => self.replied += 1,
            LeadStatus::Bounced => self.bounced += 1,
            LeadStatus::Interested => self.interested += 1,
            LeadStatus::NotInterested => self.not_interested += 1,
            LeadStatus::Objection => self.objection += 1,
            LeadStatus::AutomatedReply => self.automated += 1,
            LeadStatus::RevisitLater => self.revisit += 1,
            LeadStatus::Unsubscribed => self.unsubscribed += 1,
            LeadStatus::Unknown => self.unknown += 1,
            _ => {}
        }
    }

    pub fn to_kpis(&self, precision: u32) -> KpiSet {
        KpiSet {
            total_leads: self.total_leads,
            total_sent: self.sent,
            replied: self.replied,
            bounced: self.bounced,
            reply_rate: rate(self.replied, self.sent, precision),
            bounce_rate: rate(self.bounced, self.sent, precision),
            interested_count: self.interested,
            objection_count: self.objection,
            not_interested_count: self.not_interested,
            automated_count: self.automated,
            revisit_count: self.revisit,
            unsubscribed_count: self.unsubscribed,
            unknown_count: self.unknown,
            human_replies: self.human_replies,
            human_reply_rate: rate(self.human_replies, self.sent, precision),
            responses: self.responses,
            response_rate: rate(self.responses, self.sent, precision),
            interested_rate: rate(self.interested, self.human_replies, precision),
            objection_rate: rate(self.objection, self.human_replies, precision),
        }
    }
}

/// KPI values for one slice of leads
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSet {
    pub total_leads: u64,
    pub total_sent: u64,
    pub replied: u64,
    pub bounced: u64,
    pub reply_rate: f64,
    pub bounce_rate: f64,
    pub interested_count: u64,
    pub objection_count: u64,
    pub not_interested_count: u64,
    pub automated_count: u64,
    pub revisit_count: u64,
    pub unsubscribed_count: u64,
    pub unknown_count: u64,
    pub human_replies: u64,
    pub human_reply_rate: f64,
    pub responses: u64,
    pub response_rate: f64,
    pub interested_rate: f64,
    pub objection_rate: f64,
}

impl KpiSet {
    /// Metric name → value view of the set.
    pub fn metrics(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("total_leads", self.total_leads as f64),
            ("total_sent", self.total_sent as f64),
            ("replied", self.replied as f64),
            ("bounced", self.bounced as f64),
            ("reply_rate", self.reply_rate),
            ("bounce_rate", self.bounce_rate),
            ("interested_count", self.interested_count as f64),
            ("objection_count", self.objection_count as f64),
            ("not_interested_count", self.not_interested_count as f64),
            ("automated_count", self.automated_count as f64),
            ("revisit_count", self.revisit_count as f64),
            ("unsubscribed_count", self.unsubscribed_count as f64),
            ("unknown_count", self.unknown_count as f64),
            ("human_replies", self.human_replies as f64),
            ("human_reply_rate", self.human_reply_rate),
            ("responses", self.responses as f64),
            ("response_rate", self.response_rate),
            ("interested_rate", self.interested_rate),
            ("objection_rate", self.objection_rate),
        ])
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics().get(name).copied()
    }
}
