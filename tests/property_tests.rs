//! Property-based checks over randomly generated lead tables.

use chrono::{Days, NaiveDate};
use leadmetrics::{
    compute, filter, normalize, DateRange, FilterCriteria, Lead, LeadDateField, LeadStatus,
    NormalizedTable, Platform, RawRecord, TableView,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn base_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn status_strategy() -> impl Strategy<Value = LeadStatus> {
    prop::sample::select(LeadStatus::ALL.to_vec())
}

fn lead_strategy() -> impl Strategy<Value = Lead> {
    (
        status_strategy(),
        prop::option::of(0u64..60),
        prop::option::of(prop::sample::select(vec!["Google", "Outlook", "Other"])),
        any::<bool>(),
        0u32..3,
    )
        .prop_map(|(status, offset, esp, human, replies)| {
            let mut lead = Lead::new("lead", status);
            lead.sent_date = offset
                .and_then(|o| base_day().checked_add_days(Days::new(o)))
                .and_then(|d| d.and_hms_opt(12, 0, 0));
            lead.esp = esp.map(String::from);
            lead.human_reply = human;
            lead.reply_count = replies;
            lead
        })
}

fn table_strategy() -> impl Strategy<Value = NormalizedTable> {
    prop::collection::vec(lead_strategy(), 0..80)
        .prop_map(|leads| NormalizedTable::new(Platform::Email, Vec::new(), leads, Vec::new()))
}

fn raw_row_strategy() -> impl Strategy<Value = RawRecord> {
    (
        prop::sample::select(vec!["Sent", "replied", "BOUNCED", "Interested", "???", ""]),
        prop::sample::select(vec!["2024-03-01", "03/04/2024", "garbage", ""]),
        prop::option::of(prop::sample::select(vec!["c1", "c2", "missing"])),
    )
        .prop_map(|(status, date, campaign)| {
            let mut row = json!({"status": status, "sent_date": date});
            if let (Some(c), Value::Object(map)) = (campaign, &mut row) {
                map.insert("campaign_id".into(), json!(c));
            }
            match row {
                Value::Object(map) => map,
                _ => unreachable!(),
            }
        })
}

fn in_unit_interval(x: f64) -> bool {
    (0.0..=1.0).contains(&x)
}

proptest! {
    #[test]
    fn prop_rates_are_bounded(table in table_strategy()) {
        let kpis = compute(&TableView::of(&table)).kpis;
        for rate in [
            kpis.reply_rate,
            kpis.bounce_rate,
            kpis.human_reply_rate,
            kpis.response_rate,
        ] {
            prop_assert!(in_unit_interval(rate), "rate {} out of range", rate);
        }
        if kpis.total_sent == 0 {
            prop_assert_eq!(kpis.reply_rate, 0.0);
            prop_assert_eq!(kpis.bounce_rate, 0.0);
        }
    }

    #[test]
    fn prop_esp_buckets_sum_to_total_sent(table in table_strategy()) {
        let result = compute(&TableView::of(&table));
        let sum: u64 = result.esp_distribution.values().sum();
        prop_assert_eq!(sum, result.kpis.total_sent);
        let sender_sum: u64 = result.sender_esp_distribution.values().sum();
        prop_assert_eq!(sender_sum, result.kpis.total_sent);
    }

    #[test]
    fn prop_adjacent_ranges_partition_counts(
        table in table_strategy(),
        start in 0u64..60,
        len in 1u64..30,
        split in 0u64..30,
    ) {
        let split = split % len;
        let a = base_day() + Days::new(start);
        let m = a + Days::new(split);
        let b = a + Days::new(len);
        let count = |from: NaiveDate, to: NaiveDate| {
            let range = DateRange::between(from, to, LeadDateField::Sent);
            let criteria = FilterCriteria::all().range(range);
            let result = compute(&filter(&table, &criteria));
            (result.kpis.total_leads, result.kpis.total_sent, result.kpis.replied)
        };

        let whole = count(a, b);
        let left = count(a, m);
        let right = count(m + Days::new(1), b);
        prop_assert_eq!(whole.0, left.0 + right.0);
        prop_assert_eq!(whole.1, left.1 + right.1);
        prop_assert_eq!(whole.2, left.2 + right.2);
    }

    #[test]
    fn prop_normalize_is_deterministic(rows in prop::collection::vec(raw_row_strategy(), 0..40)) {
        let campaigns: Vec<RawRecord> = ["c1", "c2"]
            .iter()
            .map(|id| match json!({"id": id}) {
                Value::Object(map) => map,
                _ => unreachable!(),
            })
            .collect();
        let first = normalize(&campaigns, &rows, Platform::Email);
        let second = normalize(&campaigns, &rows, Platform::Email);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.table.leads.len(), rows.len());
    }
}
