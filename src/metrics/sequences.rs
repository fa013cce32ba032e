//! Per-step email sequence statistics.
//!
//! Each campaign's sequence is a list of parent steps ordered by position,
//! each followed by its A/B variants. `sent` and `leads_contacted` come
//! from the step rows; reply outcomes are recounted from the view's leads
//! matched on campaign and sequence number.

use crate::core::{CampaignRef, Lead, LeadStatus, SequenceStep};
use crate::filter::TableView;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStats {
    pub sequence_num: u64,
    /// `Step N`, or `Variant K for Step N`
    pub label: String,
    pub subject: String,
    pub sent: u64,
    pub leads_contacted: u64,
    pub replies: u64,
    pub interested: u64,
    pub not_interested: u64,
    pub bounced: u64,
}

/// A parent step and its variants, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepGroup {
    pub step: StepStats,
    pub variants: Vec<StepStats>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Outcomes {
    replies: u64,
    interested: u64,
    not_interested: u64,
    bounced: u64,
}

impl Outcomes {
    fn record(&mut self, lead: &Lead) {
        if lead.reply_count >= 1 {
            self.replies += 1;
        }
        match lead.status {
            LeadStatus::Interested => self.interested += 1,
            LeadStatus::NotInterested => self.not_interested += 1,
            LeadStatus::Bounced => self.bounced += 1,
            _ => {}
        }
    }
}

/// Sequence breakdown per campaign id, for the campaigns in `view`.
///
/// Campaigns without steps are left out. Variants whose parent step is not
/// in the same campaign are skipped.
pub fn sequence_stats(view: &TableView<'_>) -> BTreeMap<String, Vec<StepGroup>> {
    let table = view.table();
    if table.sequences.is_empty() {
        return BTreeMap::new();
    }

    let outcomes = view
        .leads
        .iter()
        .filter_map(|lead| Some(((lead.campaign?, lead.sequence_num?), lead)))
        .fold(HashMap::new(), |mut acc, (key, lead)| {
            acc.entry(key).or_insert_with(Outcomes::default).record(lead);
            acc
        });

    view.campaigns
        .iter()
        .filter_map(|campaign| {
            let reference = table.campaign_ref(&campaign.id)?;
            let steps: Vec<&SequenceStep> = table.steps_of(reference).collect();
            (!steps.is_empty())
                .then(|| (campaign.id.clone(), group_steps(reference, &steps, &outcomes)))
        })
        .collect()
}

fn group_steps(
    campaign: CampaignRef,
    steps: &[&SequenceStep],
    outcomes: &HashMap<(CampaignRef, u64), Outcomes>,
) -> Vec<StepGroup> {
    let stats = |step: &SequenceStep, label: String| {
        let seen = outcomes
            .get(&(campaign, step.sequence_num))
            .copied()
            .unwrap_or_default();
        StepStats {
            sequence_num: step.sequence_num,
            label,
            subject: step.subject.clone(),
            sent: step.sent,
            leads_contacted: step.leads_contacted,
            replies: seen.replies,
            interested: seen.interested,
            not_interested: seen.not_interested,
            bounced: seen.bounced,
        }
    };

    let mut parents: Vec<&SequenceStep> = steps.iter().copied().filter(|s| !s.variant).collect();
    parents.sort_by_key(|s| (s.order, s.sequence_num));

    let orphans = steps
        .iter()
        .filter(|s| s.variant)
        .filter(|s| !parents.iter().any(|p| Some(p.sequence_num) == s.variant_from))
        .count();
    if orphans > 0 {
        log::debug!("Skipping {orphans} sequence variants without a parent step");
    }

    parents
        .iter()
        .map(|parent| {
            let mut variants: Vec<&SequenceStep> = steps
                .iter()
                .copied()
                .filter(|s| s.variant && s.variant_from == Some(parent.sequence_num))
                .collect();
            variants.sort_by_key(|s| s.sequence_num);

            StepGroup {
                step: stats(*parent, format!("Step {}", parent.order)),
                variants: variants
                    .into_iter()
                    .enumerate()
                    .map(|(idx, v)| {
                        stats(v, format!("Variant {} for Step {}", idx + 1, parent.order))
                    })
                    .collect(),
            }
        })
        .collect()
}
