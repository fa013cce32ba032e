//! LinkedIn conversion funnel: Connected → Messaged → Replied → Interested.
//!
//! Lead rows carry a single current status, not a status history. In the
//! default [`FunnelMode::CurrentStatus`] each stage counts the leads whose
//! current status equals that stage, so later stages can exceed earlier
//! ones; [`Funnel::is_monotonic`] reports whether that happened.
//! [`FunnelMode::Cumulative`] instead credits a lead with every stage up to
//! the furthest one its status implies, which is monotonic by construction
//! but assumes every lead walked the stages in order.

use super::rates::rate;
use crate::core::{Lead, LeadStatus};
use serde::{Deserialize, Serialize};

pub const STAGES: [LeadStatus; 4] = [
    LeadStatus::Connected,
    LeadStatus::Messaged,
    LeadStatus::Replied,
    LeadStatus::Interested,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunnelMode {
    #[default]
    CurrentStatus,
    Cumulative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStage {
    pub label: String,
    pub count: u64,
    /// `count` relative to the first stage (0.0 when the first stage is empty)
    pub share_of_first: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Funnel {
    pub mode: FunnelMode,
    pub stages: Vec<FunnelStage>,
}

impl Funnel {
    /// Whether every stage count is ≤ the one before it.
    pub fn is_monotonic(&self) -> bool {
        self.stages.windows(2).all(|w| w[1].count <= w[0].count)
    }
}

/// Build the funnel over LinkedIn leads only.
pub fn funnel<'a, I>(leads: I, mode: FunnelMode, precision: u32) -> Funnel
where
    I: IntoIterator<Item = &'a Lead>,
{
    let counts = leads
        .into_iter()
        .filter(|lead| lead.platform == crate::core::Platform::LinkedIn)
        .fold([0u64; STAGES.len()], |mut acc, lead| {
            match mode {
                FunnelMode::CurrentStatus => {
                    if let Some(idx) = STAGES.iter().position(|s| *s == lead.status) {
                        acc[idx] += 1;
                    }
                }
                FunnelMode::Cumulative => {
                    let reached = lead.status.funnel_rank().unwrap_or(0) as usize;
                    acc.iter_mut().take(reached).for_each(|c| *c += 1);
                }
            }
            acc
        });

    let first = counts[0];
    Funnel {
        mode,
        stages: STAGES
            .iter()
            .zip(counts)
            .map(|(status, count)| FunnelStage {
                label: status.label().to_string(),
                count,
                share_of_first: rate(count, first, precision),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Platform;

    fn linkedin(status: LeadStatus) -> Lead {
        let mut l = Lead::new("l", status);
        l.platform = Platform::LinkedIn;
        l
    }

    fn counts(f: &Funnel) -> Vec<u64> {
        f.stages.iter().map(|s| s.count).collect()
    }

    #[test]
    fn test_current_status_counts_exact_matches() {
        let leads = vec![
            linkedin(LeadStatus::Connected),
            linkedin(LeadStatus::Interested),
            linkedin(LeadStatus::Interested),
            linkedin(LeadStatus::Objection),
        ];
        let f = funnel(&leads, FunnelMode::CurrentStatus, 4);
        assert_eq!(counts(&f), vec![1, 0, 0, 2]);
        assert!(!f.is_monotonic());
    }

    #[test]
    fn test_cumulative_is_monotonic() {
        let leads = vec![
            linkedin(LeadStatus::Connected),
            linkedin(LeadStatus::Interested),
            linkedin(LeadStatus::Interested),
            linkedin(LeadStatus::Objection),
            linkedin(LeadStatus::Bounced),
        ];
        let f = funnel(&leads, FunnelMode::Cumulative, 4);
        assert_eq!(counts(&f), vec![4, 3, 3, 2]);
        assert!(f.is_monotonic());
        assert_eq!(f.stages[3].share_of_first, 0.5);
    }

    #[test]
    fn test_email_leads_ignored() {
        let leads = vec![Lead::new("e", LeadStatus::Connected)];
        let f = funnel(&leads, FunnelMode::CurrentStatus, 4);
        assert_eq!(counts(&f), vec![0, 0, 0, 0]);
        assert!(f.is_monotonic());
    }

    #[test]
    fn test_stage_labels_in_order() {
        let f = funnel(std::iter::empty::<&Lead>(), FunnelMode::CurrentStatus, 4);
        let labels: Vec<_> = f.stages.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Connected", "Messaged", "Replied", "Interested"]);
    }
}
