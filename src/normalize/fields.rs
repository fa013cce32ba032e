//! Alias-based field access and value coercion over untyped source rows.
//!
//! Source exports disagree on column naming (`Status` vs `status`,
//! `Campaign ID` vs `campaign_id`) and on value shapes (linked records
//! arrive as one-element lists, numbers as strings). Everything here is
//! tolerant: unknown fields are ignored and absent values stay absent.

use super::dates::parse_datetime;
use chrono::NaiveDateTime;
use serde_json::{Map, Value};

/// One flat key-value row as delivered by a record source
pub type RawRecord = Map<String, Value>;

pub mod alias {
    pub const LEAD_ID: &[&str] = &["id", "lead_id", "Lead ID"];
    pub const LEAD_CAMPAIGN: &[&str] = &["campaign_id", "Campaign ID", "campaign"];
    pub const STATUS: &[&str] = &["status", "Status"];
    pub const SENT_DATE: &[&str] =
        &["sent_date", "Sent Date", "sent_at", "createdTime", "created_at"];
    pub const REPLY_DATE: &[&str] = &["reply_date", "Reply Date", "replied_at", "Date", "date"];
    pub const BOUNCE_DATE: &[&str] = &["bounce_date", "Bounce Date", "bounced_at"];
    pub const LEAD_ESP: &[&str] = &["lead_esp", "Lead ESP", "esp", "ESP"];
    pub const SENDER_ESP: &[&str] = &["sender_inbox_esp", "Sender Inbox ESP", "sender_esp"];
    pub const REPLY_COUNT: &[&str] = &["unique_replies", "Unique Replies", "replies"];
    pub const HUMAN_REPLY: &[&str] = &["is_human_reply", "Is Human Reply"];
    pub const PLATFORM: &[&str] = &["platform", "Platform"];
    pub const SEQUENCE_NUM: &[&str] = &["sequence_num", "Sequence Num"];

    pub const CAMPAIGN_ID: &[&str] = &["campaign_id", "Campaign ID", "id"];
    pub const CAMPAIGN_NAME: &[&str] = &["Name", "name"];
    pub const WORKSPACE: &[&str] = &["workspace_name", "Workspace Name"];
    pub const CREATED_DATE: &[&str] =
        &["created_date", "created_at", "Created At", "date", "createdTime"];

    pub const EMAILS_SENT: &[&str] = &["emails_sent", "Emails Sent", "total_sent"];
    pub const LEADS_CONTACTED: &[&str] = &["leads_contacted", "Leads Contacted", "total_leads"];
    pub const BOUNCED: &[&str] = &["bounced", "Bounced"];
    pub const SENT_CONNECTIONS: &[&str] = &["sent_connections", "Sent Connections"];
    pub const ACCEPTED_CONNECTIONS: &[&str] = &["accepted_connections", "Accepted Connections"];
    pub const SENT_MESSAGES: &[&str] = &["sent_messages", "Sent Messages"];
    pub const REPLIES: &[&str] = &["replies", "Replies"];
    pub const SENT_INMAILS: &[&str] = &["sent_inmails", "Sent InMails"];
    pub const INMAIL_REPLIES: &[&str] = &["inmail_replies", "InMail Replies"];

    pub const STEP_CAMPAIGN: &[&str] = &["campaign_id", "Campaign ID", "campaign"];
    pub const STEP_ORDER: &[&str] = &["order", "Order"];
    pub const STEP_VARIANT: &[&str] = &["variant", "Variant"];
    pub const VARIANT_FROM: &[&str] = &["variant_from_step_id", "Variant From Step ID"];
    pub const SUBJECT: &[&str] = &["subject", "Subject"];
    pub const WAIT_DAYS: &[&str] = &["wait_in_days", "Wait In Days"];
    pub const THREAD_REPLY: &[&str] = &["thread_reply", "Thread Reply"];
    pub const STEP_SENT: &[&str] = &["sent", "Sent"];
}

static NULL: Value = Value::Null;

/// Outcome of reading a date column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    Absent,
    Parsed(NaiveDateTime),
    Unparsable,
}

impl DateValue {
    pub fn value(self) -> Option<NaiveDateTime> {
        match self {
            DateValue::Parsed(dt) => Some(dt),
            _ => None,
        }
    }
}

/// First present, non-blank value among `aliases`.
pub fn field<'a>(row: &'a RawRecord, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| row.get(*key))
        .map(unwrap_linked)
        .find(|value| !is_blank(value))
}

/// Linked records arrive as lists; only the first element is meaningful.
fn unwrap_linked(value: &Value) -> &Value {
    match value {
        Value::Array(items) => items.first().map(unwrap_linked).unwrap_or(&NULL),
        other => other,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => is_blank_text(s),
        _ => false,
    }
}

fn is_blank_text(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty()
        || ["nan", "none", "null"]
            .iter()
            .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

pub fn text(row: &RawRecord, aliases: &[&str]) -> Option<String> {
    field(row, aliases).and_then(value_to_text)
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(render_number(n)),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integral floats render without a trailing `.0` so numeric ids join cleanly.
fn render_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

/// Numeric value; absent or non-numeric yields 0.
pub fn number(row: &RawRecord, aliases: &[&str]) -> f64 {
    field(row, aliases).map(value_to_number).unwrap_or(0.0)
}

fn value_to_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

/// Non-negative counter; negatives and garbage clamp to 0.
pub fn count(row: &RawRecord, aliases: &[&str]) -> u64 {
    let value = number(row, aliases);
    if value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// Positive identifier number; absent, zero or garbage yields `None`.
pub fn id_number(row: &RawRecord, aliases: &[&str]) -> Option<u64> {
    Some(count(row, aliases)).filter(|n| *n > 0)
}

pub fn flag(row: &RawRecord, aliases: &[&str]) -> bool {
    match field(row, aliases) {
        Some(Value::String(s)) => {
            let s = s.trim();
            ["true", "yes", "y"].iter().any(|t| s.eq_ignore_ascii_case(t))
                || s.parse::<f64>().map(|f| f != 0.0).unwrap_or(false)
        }
        Some(other) => value_to_number(other) != 0.0,
        None => false,
    }
}

pub fn date(row: &RawRecord, aliases: &[&str]) -> DateValue {
    match field(row, aliases) {
        None => DateValue::Absent,
        Some(Value::String(s)) => parse_datetime(s)
            .map(DateValue::Parsed)
            .unwrap_or(DateValue::Unparsable),
        Some(_) => DateValue::Unparsable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_first_non_blank_alias_wins() {
        let r = row(json!({"Status": "", "status": "Replied"}));
        assert_eq!(text(&r, &["Status", "status"]), Some("Replied".into()));
    }

    #[test]
    fn test_blank_markers_are_absent() {
        let r = row(json!({"a": "nan", "b": " None ", "c": null}));
        assert_eq!(text(&r, &["a", "b", "c"]), None);
    }

    #[test]
    fn test_linked_record_lists_unwrap() {
        let r = row(json!({"campaign_id": [42, 43], "empty": []}));
        assert_eq!(text(&r, &["campaign_id"]), Some("42".into()));
        assert_eq!(text(&r, &["empty"]), None);
    }

    #[test]
    fn test_integral_float_ids_drop_fraction() {
        let r = row(json!({"id": 17.0, "ratio": 0.5}));
        assert_eq!(text(&r, &["id"]), Some("17".into()));
        assert_eq!(text(&r, &["ratio"]), Some("0.5".into()));
    }

    #[test]
    fn test_numeric_coercion() {
        let r = row(json!({"a": "12", "b": true, "c": "x", "d": -4}));
        assert_eq!(count(&r, &["a"]), 12);
        assert_eq!(count(&r, &["b"]), 1);
        assert_eq!(count(&r, &["c"]), 0);
        assert_eq!(count(&r, &["d"]), 0);
        assert_eq!(count(&r, &["missing"]), 0);
    }

    #[test]
    fn test_flag_coercion() {
        let r = row(json!({"a": "True", "b": 0, "c": "1", "d": 1.0}));
        assert!(flag(&r, &["a"]));
        assert!(!flag(&r, &["b"]));
        assert!(flag(&r, &["c"]));
        assert!(flag(&r, &["d"]));
        assert!(!flag(&r, &["missing"]));
    }

    #[test]
    fn test_date_outcomes() {
        let r = row(json!({"ok": "2024-01-02", "bad": "soon", "num": 5}));
        assert!(matches!(date(&r, &["ok"]), DateValue::Parsed(_)));
        assert_eq!(date(&r, &["bad"]), DateValue::Unparsable);
        assert_eq!(date(&r, &["num"]), DateValue::Unparsable);
        assert_eq!(date(&r, &["missing"]), DateValue::Absent);
    }

    #[test]
    fn test_id_number_skips_zero_and_garbage() {
        let r = row(json!({"a": ["12"], "b": 0, "c": "x", "d": 7.0}));
        assert_eq!(id_number(&r, &["a"]), Some(12));
        assert_eq!(id_number(&r, &["b"]), None);
        assert_eq!(id_number(&r, &["c"]), None);
        assert_eq!(id_number(&r, &["d"]), Some(7));
        assert_eq!(id_number(&r, &["missing"]), None);
    }
}
