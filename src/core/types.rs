//! Canonical record types produced by normalization.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outreach channel a campaign or lead belongs to
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Email,
    #[value(name = "linkedin")]
    LinkedIn,
}

impl Platform {
    /// Parse a free-form platform tag (`"Email"`, `"linkedin"`, `"Linked In"`)
    pub fn from_tag(tag: &str) -> Option<Self> {
        let compact: String = tag
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match compact.as_str() {
            "email" | "mail" => Some(Platform::Email),
            "linkedin" => Some(Platform::LinkedIn),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Email => "Email",
            Platform::LinkedIn => "LinkedIn",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Closed set of lead states.
///
/// Raw status strings are mapped onto this enum once, at the normalization
/// boundary (see [`crate::core::status::StatusMap`]); anything unmapped
/// becomes [`LeadStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Queued but not yet contacted
    Pending,
    Sent,
    Connected,
    Messaged,
    Replied,
    Interested,
    NotInterested,
    Objection,
    AutomatedReply,
    RevisitLater,
    Bounced,
    Unsubscribed,
    Unknown,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 13] = [
        LeadStatus::Pending,
        LeadStatus::Sent,
        LeadStatus::Connected,
        LeadStatus::Messaged,
        LeadStatus::Replied,
        LeadStatus::Interested,
        LeadStatus::NotInterested,
        LeadStatus::Objection,
        LeadStatus::AutomatedReply,
        LeadStatus::RevisitLater,
        LeadStatus::Bounced,
        LeadStatus::Unsubscribed,
        LeadStatus::Unknown,
    ];

    /// Human-readable label, as used in breakdown keys
    pub fn label(&self) -> &'static str {
        match self {
            LeadStatus::Pending => "Pending",
            LeadStatus::Sent => "Sent",
            LeadStatus::Connected => "Connected",
            LeadStatus::Messaged => "Messaged",
            LeadStatus::Replied => "Replied",
            LeadStatus::Interested => "Interested",
            LeadStatus::NotInterested => "Not Interested",
            LeadStatus::Objection => "Objection",
            LeadStatus::AutomatedReply => "Automated Reply",
            LeadStatus::RevisitLater => "Revisit Later",
            LeadStatus::Bounced => "Bounced",
            LeadStatus::Unsubscribed => "Unsubscribed",
            LeadStatus::Unknown => "Unknown",
        }
    }

    /// Every state other than `Pending` implies the lead was contacted.
    pub fn is_sent(&self) -> bool {
        !matches!(self, LeadStatus::Pending)
    }

    /// States that can only be reached after the lead answered.
    pub fn implies_reply(&self) -> bool {
        matches!(
            self,
            LeadStatus::Replied
                | LeadStatus::Interested
                | LeadStatus::NotInterested
                | LeadStatus::Objection
                | LeadStatus::AutomatedReply
                | LeadStatus::RevisitLater
        )
    }

    /// Furthest LinkedIn funnel stage (1-based) this status implies, if any.
    pub fn funnel_rank(&self) -> Option<u8> {
        match self {
            LeadStatus::Connected => Some(1),
            LeadStatus::Messaged => Some(2),
            LeadStatus::Replied
            | LeadStatus::NotInterested
            | LeadStatus::Objection
            | LeadStatus::AutomatedReply
            | LeadStatus::RevisitLater => Some(3),
            LeadStatus::Interested => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which lead timestamp a date range applies to.
///
/// Always chosen explicitly by the caller: reply-oriented views filter on
/// `Reply`, volume views on `Sent`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LeadDateField {
    #[default]
    Sent,
    Reply,
    Bounce,
}

/// Index of a campaign inside its [`NormalizedTable`](crate::core::NormalizedTable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CampaignRef(pub usize);

/// Interned workspace name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkspaceId(pub u32);

/// Cached per-campaign counters as reported by the record source.
///
/// These are derived values; lead-level KPIs never read them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignCounters {
    pub emails_sent: u64,
    pub leads_contacted: u64,
    pub bounced: u64,
    pub sent_connections: u64,
    pub accepted_connections: u64,
    pub sent_messages: u64,
    pub replies: u64,
    pub sent_inmails: u64,
    pub inmail_replies: u64,
}

impl CampaignCounters {
    /// Field-wise sum, clamped at `u64::MAX`.
    pub fn saturating_add(self, other: Self) -> Self {
        Self {
            emails_sent: self.emails_sent.saturating_add(other.emails_sent),
            leads_contacted: self.leads_contacted.saturating_add(other.leads_contacted),
            bounced: self.bounced.saturating_add(other.bounced),
            sent_connections: self.sent_connections.saturating_add(other.sent_connections),
            accepted_connections: self
                .accepted_connections
                .saturating_add(other.accepted_connections),
            sent_messages: self.sent_messages.saturating_add(other.sent_messages),
            replies: self.replies.saturating_add(other.replies),
            sent_inmails: self.sent_inmails.saturating_add(other.sent_inmails),
            inmail_replies: self.inmail_replies.saturating_add(other.inmail_replies),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub workspace: Option<WorkspaceId>,
    pub created_date: Option<NaiveDateTime>,
    pub platform: Platform,
    pub counters: CampaignCounters,
}

/// One step (or A/B variant of a step) of a campaign's email sequence.
///
/// `sent` and `leads_contacted` are counters cached by the record source;
/// reply outcomes are recounted from leads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceStep {
    pub sequence_num: u64,
    /// Raw parent campaign id as it appeared in the source row
    pub campaign_id: Option<String>,
    pub campaign: Option<CampaignRef>,
    /// Position within the sequence; variants share their parent's position
    pub order: u64,
    pub variant: bool,
    /// `sequence_num` of the step this variant splits from
    pub variant_from: Option<u64>,
    pub subject: String,
    pub wait_in_days: u64,
    pub thread_reply: bool,
    pub sent: u64,
    pub leads_contacted: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    /// Raw parent campaign id as it appeared in the source row
    pub campaign_id: Option<String>,
    /// Resolved parent campaign; `None` when the id is absent or dangling
    pub campaign: Option<CampaignRef>,
    /// Workspace inherited from the resolved campaign
    pub workspace: Option<WorkspaceId>,
    pub status: LeadStatus,
    pub sent_date: Option<NaiveDateTime>,
    pub reply_date: Option<NaiveDateTime>,
    pub bounce_date: Option<NaiveDateTime>,
    /// Lead mailbox provider
    pub esp: Option<String>,
    /// Sending inbox provider
    pub sender_esp: Option<String>,
    pub platform: Platform,
    pub reply_count: u32,
    pub human_reply: bool,
    /// Email sequence step the lead was last sent, when the source tracks it
    pub sequence_num: Option<u64>,
}

impl Lead {
    /// Create a lead with only identity and status set
    pub fn new(id: impl Into<String>, status: LeadStatus) -> Self {
        Self {
            id: id.into(),
            campaign_id: None,
            campaign: None,
            workspace: None,
            status,
            sent_date: None,
            reply_date: None,
            bounce_date: None,
            esp: None,
            sender_esp: None,
            platform: Platform::Email,
            reply_count: 0,
            human_reply: false,
            sequence_num: None,
        }
    }

    pub fn date(&self, field: LeadDateField) -> Option<NaiveDateTime> {
        match field {
            LeadDateField::Sent => self.sent_date,
            LeadDateField::Reply => self.reply_date,
            LeadDateField::Bounce => self.bounce_date,
        }
    }

    /// A response is either a recorded reply or a status only reachable by replying.
    pub fn has_response(&self) -> bool {
        self.reply_count >= 1 || self.status.implies_reply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_from_tag_variants() {
        assert_eq!(Platform::from_tag("Email"), Some(Platform::Email));
        assert_eq!(Platform::from_tag("Linked In"), Some(Platform::LinkedIn));
        assert_eq!(Platform::from_tag("linked-in"), Some(Platform::LinkedIn));
        assert_eq!(Platform::from_tag("sms"), None);
    }

    #[test]
    fn test_only_pending_is_unsent() {
        let unsent: Vec<_> = LeadStatus::ALL
            .iter()
            .filter(|s| !s.is_sent())
            .collect();
        assert_eq!(unsent, vec![&LeadStatus::Pending]);
    }

    #[test]
    fn test_funnel_rank_ordering() {
        assert!(LeadStatus::Connected.funnel_rank() < LeadStatus::Messaged.funnel_rank());
        assert!(LeadStatus::Messaged.funnel_rank() < LeadStatus::Replied.funnel_rank());
        assert!(LeadStatus::Replied.funnel_rank() < LeadStatus::Interested.funnel_rank());
        assert_eq!(LeadStatus::Bounced.funnel_rank(), None);
    }

    #[test]
    fn test_has_response_from_count_or_status() {
        let mut lead = Lead::new("l1", LeadStatus::Sent);
        assert!(!lead.has_response());
        lead.reply_count = 1;
        assert!(lead.has_response());

        let objection = Lead::new("l2", LeadStatus::Objection);
        assert!(objection.has_response());
    }
}
