pub mod errors;
pub mod status;
pub mod types;

pub use errors::{Error, Result, ResultExt};
pub use status::StatusMap;
pub use types::{
    Campaign, CampaignCounters, CampaignRef, Lead, LeadDateField, LeadStatus, Platform,
    SequenceStep, WorkspaceId,
};

use serde::Serialize;
use std::collections::HashMap;
use xxhash_rust::xxh64::xxh64;

/// Canonical in-memory snapshot of one platform's campaigns and leads.
///
/// Lead → campaign and campaign → workspace references are resolved once,
/// when the table is built, so filtering never re-scans for joins.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedTable {
    pub platform: Platform,
    pub campaigns: Vec<Campaign>,
    pub leads: Vec<Lead>,
    /// Email sequence steps; empty when the source has none
    pub sequences: Vec<SequenceStep>,
    /// Interned workspace names, indexed by [`WorkspaceId`]
    pub workspaces: Vec<String>,
    #[serde(skip)]
    campaign_index: HashMap<String, CampaignRef>,
}

impl NormalizedTable {
    /// Assemble a table; the campaign id index is built here.
    ///
    /// When two campaigns share an id, the first one wins.
    pub fn new(
        platform: Platform,
        campaigns: Vec<Campaign>,
        leads: Vec<Lead>,
        workspaces: Vec<String>,
    ) -> Self {
        let campaign_index = build_campaign_index(&campaigns);
        Self {
            platform,
            campaigns,
            leads,
            sequences: Vec::new(),
            workspaces,
            campaign_index,
        }
    }

    /// Steps belonging to `campaign`, in source order.
    pub fn steps_of(&self, campaign: CampaignRef) -> impl Iterator<Item = &SequenceStep> {
        self.sequences
            .iter()
            .filter(move |step| step.campaign == Some(campaign))
    }

    pub fn campaign(&self, reference: CampaignRef) -> Option<&Campaign> {
        self.campaigns.get(reference.0)
    }

    pub fn campaign_ref(&self, id: &str) -> Option<CampaignRef> {
        self.campaign_index.get(id).copied()
    }

    pub fn workspace_id(&self, name: &str) -> Option<WorkspaceId> {
        self.workspaces
            .iter()
            .position(|w| w == name)
            .map(|idx| WorkspaceId(idx as u32))
    }

    pub fn workspace_name(&self, id: WorkspaceId) -> Option<&str> {
        self.workspaces.get(id.0 as usize).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty() && self.leads.is_empty()
    }

    /// Stable content hash of the snapshot, used as the data version in cache keys.
    pub fn fingerprint(&self) -> Result<u64> {
        let bytes = postcard::to_allocvec(self)?;
        Ok(xxh64(&bytes, 0))
    }
}

fn build_campaign_index(campaigns: &[Campaign]) -> HashMap<String, CampaignRef> {
    campaigns
        .iter()
        .enumerate()
        .fold(HashMap::new(), |mut acc, (idx, campaign)| {
            if acc.contains_key(&campaign.id) {
                log::warn!("Duplicate campaign id '{}', keeping first", campaign.id);
            } else {
                acc.insert(campaign.id.clone(), CampaignRef(idx));
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(id: &str) -> Campaign {
        Campaign {
            id: id.to_string(),
            name: format!("Campaign {id}"),
            workspace: Some(WorkspaceId(0)),
            created_date: None,
            platform: Platform::Email,
            counters: CampaignCounters::default(),
        }
    }

    #[test]
    fn test_campaign_index_first_wins() {
        let mut dup = campaign("7");
        dup.name = "Duplicate".into();
        let table = NormalizedTable::new(
            Platform::Email,
            vec![campaign("7"), dup],
            vec![],
            vec!["Acme".into()],
        );
        let reference = table.campaign_ref("7").unwrap();
        assert_eq!(reference, CampaignRef(0));
        assert_eq!(table.campaign(reference).unwrap().name, "Campaign 7");
    }

    #[test]
    fn test_workspace_lookup() {
        let table = NormalizedTable::new(
            Platform::Email,
            vec![],
            vec![],
            vec!["Acme".into(), "Globex".into()],
        );
        assert_eq!(table.workspace_id("Globex"), Some(WorkspaceId(1)));
        assert_eq!(table.workspace_id("Initech"), None);
        assert_eq!(table.workspace_name(WorkspaceId(0)), Some("Acme"));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = NormalizedTable::new(Platform::Email, vec![campaign("1")], vec![], vec![]);
        let b = a.clone();
        let c = NormalizedTable::new(Platform::Email, vec![campaign("2")], vec![], vec![]);
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_ne!(a.fingerprint().unwrap(), c.fingerprint().unwrap());
    }
}
