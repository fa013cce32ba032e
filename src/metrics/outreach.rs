//! Rollup of the campaigns' cached counters.
//!
//! Kept apart from the lead KPIs: these numbers are whatever the record
//! source cached on the campaign rows and are not recomputed from leads.

use super::rates::rate;
use crate::core::{Campaign, CampaignCounters};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OutreachSummary {
    pub campaigns: u64,
    pub emails_sent: u64,
    pub leads_contacted: u64,
    pub campaign_bounced: u64,
    pub sent_connections: u64,
    pub accepted_connections: u64,
    pub acceptance_rate: f64,
    pub sent_messages: u64,
    pub message_replies: u64,
    pub message_reply_rate: f64,
    pub sent_inmails: u64,
    pub inmail_replies: u64,
    pub inmail_reply_rate: f64,
}

/// Sum the counters of `campaigns`; totals saturate at `u64::MAX`.
pub fn outreach_summary<'a, I>(campaigns: I, precision: u32) -> OutreachSummary
where
    I: IntoIterator<Item = &'a Campaign>,
{
    let (count, totals) = campaigns.into_iter().fold(
        (0u64, CampaignCounters::default()),
        |(n, acc), campaign| (n.saturating_add(1), acc.saturating_add(campaign.counters)),
    );

    OutreachSummary {
        campaigns: count,
        emails_sent: totals.emails_sent,
        leads_contacted: totals.leads_contacted,
        campaign_bounced: totals.bounced,
        sent_connections: totals.sent_connections,
        accepted_connections: totals.accepted_connections,
        acceptance_rate: rate(totals.accepted_connections, totals.sent_connections, precision),
        sent_messages: totals.sent_messages,
        message_replies: totals.replies,
        message_reply_rate: rate(totals.replies, totals.sent_messages, precision),
        sent_inmails: totals.sent_inmails,
        inmail_replies: totals.inmail_replies,
        inmail_reply_rate: rate(totals.inmail_replies, totals.sent_inmails, precision),
    }
}
