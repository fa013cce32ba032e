//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use leadmetrics::io::JsonFileSource;
use leadmetrics::{load, Normalized, Normalizer, Platform, RawRecord};
use serde_json::Value;
use std::path::PathBuf;

pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

pub fn fixture_source() -> JsonFileSource {
    JsonFileSource::new(data_path("campaigns.json"), data_path("leads.json"))
}

/// The ten-lead email fixture: 6 sent, 2 replied, 2 bounced across three campaigns.
pub fn fixture() -> Normalized {
    load(&fixture_source(), Platform::Email, &Normalizer::default()).unwrap()
}

pub fn rows(value: Value) -> Vec<RawRecord> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => map,
                other => panic!("fixture row must be an object, got {other}"),
            })
            .collect(),
        other => panic!("fixture must be an array, got {other}"),
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
