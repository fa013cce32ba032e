//! Workspace / campaign / date-range filtering over a [`NormalizedTable`].
//!
//! Filtering borrows: the result is a [`TableView`] of references into the
//! table, so one snapshot can be filtered any number of times.

pub mod presets;

pub use presets::DatePreset;

use crate::core::{Campaign, CampaignRef, Lead, LeadDateField, NormalizedTable, WorkspaceId};
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Workspace dimension of the criteria
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceSelector {
    #[default]
    All,
    Named(String),
}

impl WorkspaceSelector {
    /// `None`, `"all"` and `"All Workspaces"` (any case) select every workspace.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => WorkspaceSelector::All,
            Some(name)
                if name.eq_ignore_ascii_case("all")
                    || name.eq_ignore_ascii_case("all workspaces") =>
            {
                WorkspaceSelector::All
            }
            Some(name) => WorkspaceSelector::Named(name.to_string()),
        }
    }
}

/// Inclusive, day-granular date range bound to an explicit lead date field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub lead_field: LeadDateField,
}

impl DateRange {
    pub fn new(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        lead_field: LeadDateField,
    ) -> Self {
        Self {
            start,
            end,
            lead_field,
        }
    }

    pub fn between(start: NaiveDate, end: NaiveDate, lead_field: LeadDateField) -> Self {
        Self::new(Some(start), Some(end), lead_field)
    }

    /// `start > end`; such a range matches nothing.
    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s > e)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start.is_none_or(|s| day >= s) && self.end.is_none_or(|e| day <= e)
    }

    /// Absent timestamps never match a ranged filter.
    pub fn contains_timestamp(&self, ts: Option<NaiveDateTime>) -> bool {
        ts.is_some_and(|ts| self.contains(ts.date()))
    }

    /// Number of days covered by a closed, valid range.
    pub fn len_days(&self) -> Option<u64> {
        match (self.start, self.end) {
            (Some(s), Some(e)) if s <= e => Some((e - s).num_days() as u64 + 1),
            _ => None,
        }
    }

    /// The equal-length window ending the day before this one starts.
    pub fn preceding(&self) -> Option<DateRange> {
        let len = self.len_days()?;
        let start = self.start?;
        let end = start.pred_opt()?;
        let begin = start.checked_sub_days(Days::new(len))?;
        Some(DateRange::between(begin, end, self.lead_field))
    }
}

/// Filter criteria for one computation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub workspace: WorkspaceSelector,
    pub campaign_id: Option<String>,
    pub range: Option<DateRange>,
}

impl FilterCriteria {
    /// Identity criteria: every row passes.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn workspace(mut self, name: impl AsRef<str>) -> Self {
        self.workspace = WorkspaceSelector::parse(Some(name.as_ref()));
        self
    }

    pub fn campaign(mut self, id: impl Into<String>) -> Self {
        self.campaign_id = Some(id.into());
        self
    }

    pub fn range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Lead date field the view is scoped to (`Sent` when no range is set).
    pub fn lead_date_field(&self) -> LeadDateField {
        self.range.map(|r| r.lead_field).unwrap_or_default()
    }

    /// Same criteria shifted to the preceding window, if the range is closed.
    pub fn preceding(&self) -> Option<FilterCriteria> {
        let range = self.range?.preceding()?;
        Some(FilterCriteria {
            range: Some(range),
            ..self.clone()
        })
    }
}

/// Borrowed, filtered view over a table
#[derive(Debug, Clone)]
pub struct TableView<'a> {
    table: &'a NormalizedTable,
    pub leads: Vec<&'a Lead>,
    pub campaigns: Vec<&'a Campaign>,
    date_field: LeadDateField,
}

impl<'a> TableView<'a> {
    /// Unfiltered view of the whole table.
    pub fn of(table: &'a NormalizedTable) -> Self {
        Self {
            table,
            leads: table.leads.iter().collect(),
            campaigns: table.campaigns.iter().collect(),
            date_field: LeadDateField::default(),
        }
    }

    fn empty(table: &'a NormalizedTable, date_field: LeadDateField) -> Self {
        Self {
            table,
            leads: Vec::new(),
            campaigns: Vec::new(),
            date_field,
        }
    }

    pub fn table(&self) -> &'a NormalizedTable {
        self.table
    }

    /// Lead date field the view was scoped to; date bucketing follows it.
    pub fn date_field(&self) -> LeadDateField {
        self.date_field
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty() && self.campaigns.is_empty()
    }
}

/// Apply `criteria` to `table`.
///
/// Unknown workspace names or campaign ids, and inverted ranges, yield an
/// empty view rather than an error.
pub fn filter<'a>(table: &'a NormalizedTable, criteria: &FilterCriteria) -> TableView<'a> {
    let date_field = criteria.lead_date_field();

    if criteria.range.is_some_and(|r| r.is_inverted()) {
        log::debug!("Inverted date range {:?}, returning empty view", criteria.range);
        return TableView::empty(table, date_field);
    }

    let workspace = match &criteria.workspace {
        WorkspaceSelector::All => None,
        WorkspaceSelector::Named(name) => match table.workspace_id(name) {
            Some(id) => Some(id),
            None => return TableView::empty(table, date_field),
        },
    };

    let campaign = match &criteria.campaign_id {
        None => None,
        Some(id) => match table.campaign_ref(id) {
            Some(reference) => Some(reference),
            None => return TableView::empty(table, date_field),
        },
    };

    let predicate = RowPredicate {
        workspace,
        campaign,
        range: criteria.range,
    };

    TableView {
        table,
        leads: table.leads.iter().filter(|l| predicate.lead(l)).collect(),
        campaigns: table
            .campaigns
            .iter()
            .enumerate()
            .filter(|(idx, c)| predicate.campaign(CampaignRef(*idx), c))
            .map(|(_, c)| c)
            .collect(),
        date_field,
    }
}

struct RowPredicate {
    workspace: Option<WorkspaceId>,
    campaign: Option<CampaignRef>,
    range: Option<DateRange>,
}

impl RowPredicate {
    fn lead(&self, lead: &Lead) -> bool {
        self.workspace.is_none_or(|w| lead.workspace == Some(w))
            && self.campaign.is_none_or(|c| lead.campaign == Some(c))
            && self
                .range
                .is_none_or(|r| r.contains_timestamp(lead.date(r.lead_field)))
    }

    fn campaign(&self, reference: CampaignRef, campaign: &Campaign) -> bool {
        self.workspace.is_none_or(|w| campaign.workspace == Some(w))
            && self.campaign.is_none_or(|c| c == reference)
            && self
                .range
                .is_none_or(|r| r.contains_timestamp(campaign.created_date))
    }
}

/// Workspace names present in the table, sorted.
pub fn workspaces(table: &NormalizedTable) -> Vec<&str> {
    let mut names: Vec<&str> = table.workspaces.iter().map(String::as_str).collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// Campaigns belonging to a workspace, sorted by name then id.
pub fn campaigns_in<'a>(
    table: &'a NormalizedTable,
    selector: &WorkspaceSelector,
) -> Vec<&'a Campaign> {
    let workspace = match selector {
        WorkspaceSelector::All => None,
        WorkspaceSelector::Named(name) => match table.workspace_id(name) {
            Some(id) => Some(id),
            None => return Vec::new(),
        },
    };

    let mut campaigns: Vec<&Campaign> = table
        .campaigns
        .iter()
        .filter(|c| workspace.is_none_or(|w| c.workspace == Some(w)))
        .collect();
    campaigns.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    campaigns
}
