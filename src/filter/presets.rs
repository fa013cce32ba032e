//! Named date windows, resolved against an explicit `today`.

use super::DateRange;
use crate::core::LeadDateField;
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum DatePreset {
    Today,
    ThisWeek,
    LastWeek,
    #[default]
    #[serde(rename = "last-7-days")]
    #[value(name = "last-7-days")]
    Last7Days,
    #[serde(rename = "last-30-days")]
    #[value(name = "last-30-days")]
    Last30Days,
    ThisMonth,
    LastMonth,
    AllTime,
}

impl DatePreset {
    pub fn label(&self) -> &'static str {
        match self {
            DatePreset::Today => "Today",
            DatePreset::ThisWeek => "This Week",
            DatePreset::LastWeek => "Last Week",
            DatePreset::Last7Days => "Last 7 Days",
            DatePreset::Last30Days => "Last 30 Days",
            DatePreset::ThisMonth => "This Month",
            DatePreset::LastMonth => "Last Month",
            DatePreset::AllTime => "All Time",
        }
    }

    /// Resolve to an inclusive range. Weeks start on Monday.
    ///
    /// `AllTime` resolves to no range at all, so undated rows are kept.
    pub fn resolve(&self, today: NaiveDate, lead_field: LeadDateField) -> Option<DateRange> {
        let (start, end) = match self {
            DatePreset::Today => (today, today),
            DatePreset::ThisWeek => (monday_of(today), today),
            DatePreset::LastWeek => {
                let this_monday = monday_of(today);
                let start = days_before(this_monday, 7);
                (start, days_before(this_monday, 1))
            }
            DatePreset::Last7Days => (days_before(today, 7), today),
            DatePreset::Last30Days => (days_before(today, 30), today),
            DatePreset::ThisMonth => (first_of_month(today), today),
            DatePreset::LastMonth => {
                let end = days_before(first_of_month(today), 1);
                (first_of_month(end), end)
            }
            DatePreset::AllTime => return None,
        };
        Some(DateRange::between(start, end, lead_field))
    }
}

fn days_before(day: NaiveDate, n: u64) -> NaiveDate {
    day.checked_sub_days(Days::new(n)).unwrap_or(NaiveDate::MIN)
}

fn monday_of(day: NaiveDate) -> NaiveDate {
    days_before(day, u64::from(day.weekday().num_days_from_monday()))
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2024-03-14 is a Thursday
    const FIELD: LeadDateField = LeadDateField::Sent;

    fn bounds(preset: DatePreset) -> (Option<NaiveDate>, Option<NaiveDate>) {
        let r = preset.resolve(day(2024, 3, 14), FIELD).unwrap();
        (r.start, r.end)
    }

    #[test]
    fn test_today() {
        assert_eq!(bounds(DatePreset::Today), (Some(day(2024, 3, 14)), Some(day(2024, 3, 14))));
    }

    #[test]
    fn test_weeks_start_monday() {
        assert_eq!(
            bounds(DatePreset::ThisWeek),
            (Some(day(2024, 3, 11)), Some(day(2024, 3, 14)))
        );
        assert_eq!(
            bounds(DatePreset::LastWeek),
            (Some(day(2024, 3, 4)), Some(day(2024, 3, 10)))
        );
    }

    #[test]
    fn test_rolling_windows() {
        assert_eq!(
            bounds(DatePreset::Last7Days),
            (Some(day(2024, 3, 7)), Some(day(2024, 3, 14)))
        );
        assert_eq!(
            bounds(DatePreset::Last30Days),
            (Some(day(2024, 2, 13)), Some(day(2024, 3, 14)))
        );
    }

    #[test]
    fn test_months() {
        assert_eq!(
            bounds(DatePreset::ThisMonth),
            (Some(day(2024, 3, 1)), Some(day(2024, 3, 14)))
        );
        assert_eq!(
            bounds(DatePreset::LastMonth),
            (Some(day(2024, 2, 1)), Some(day(2024, 2, 29)))
        );
    }

    #[test]
    fn test_last_month_across_year_boundary() {
        let r = DatePreset::LastMonth.resolve(day(2024, 1, 10), FIELD).unwrap();
        assert_eq!(r.start, Some(day(2023, 12, 1)));
        assert_eq!(r.end, Some(day(2023, 12, 31)));
    }

    #[test]
    fn test_all_time_has_no_range() {
        assert_eq!(DatePreset::AllTime.resolve(day(2024, 3, 14), FIELD), None);
    }

    #[test]
    fn test_resolve_carries_field() {
        let r = DatePreset::Today
            .resolve(day(2024, 3, 14), LeadDateField::Reply)
            .unwrap();
        assert_eq!(r.lead_field, LeadDateField::Reply);
    }
}
