//! Record sources: where raw campaign and lead rows come from.
//!
//! A [`RecordSource`] hands back untyped rows per platform; everything past
//! that point (normalization, filtering, metrics) is pure. Keeping the
//! source behind a trait lets tests and embedders feed rows from memory.
//!
//! # Accepted file shapes
//!
//! [`JsonFileSource`] reads one JSON document per table in any of:
//!
//! - a plain array of row objects: `[{"Status": "Sent"}, ...]`
//! - an Airtable export: `{"records": [{"id", "createdTime", "fields": {...}}]}`
//! - a data envelope: `{"data": [{...}]}`

use crate::core::{Error, Platform, Result};
use crate::normalize::RawRecord;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Supplier of raw rows for one platform at a time.
///
/// Implementations should be `Send + Sync` so a loaded source can be shared
/// across request handlers.
pub trait RecordSource: Send + Sync {
    /// Raw campaign rows for `platform`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Source`] when the underlying data cannot be read or
    /// is not in a supported shape.
    fn campaigns(&self, platform: Platform) -> Result<Vec<RawRecord>>;

    /// Raw lead rows for `platform`.
    fn leads(&self, platform: Platform) -> Result<Vec<RawRecord>>;

    /// Raw email sequence step rows for `platform`; sources without a
    /// sequence table return none.
    fn sequences(&self, _platform: Platform) -> Result<Vec<RawRecord>> {
        Ok(Vec::new())
    }
}

/// Campaign and lead tables exported as JSON files.
///
/// Each file is one platform's table, so the requested platform is not used
/// to select rows here; per-row platform tags are honored by the normalizer.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    campaigns_path: PathBuf,
    leads_path: PathBuf,
    sequences_path: Option<PathBuf>,
}

impl JsonFileSource {
    pub fn new(campaigns_path: impl Into<PathBuf>, leads_path: impl Into<PathBuf>) -> Self {
        Self {
            campaigns_path: campaigns_path.into(),
            leads_path: leads_path.into(),
            sequences_path: None,
        }
    }

    /// Also read email sequence steps from `path`.
    pub fn with_sequences(mut self, path: impl Into<PathBuf>) -> Self {
        self.sequences_path = Some(path.into());
        self
    }

    pub fn campaigns_path(&self) -> &Path {
        &self.campaigns_path
    }

    pub fn leads_path(&self) -> &Path {
        &self.leads_path
    }
}

impl RecordSource for JsonFileSource {
    fn campaigns(&self, platform: Platform) -> Result<Vec<RawRecord>> {
        let rows = read_rows(&self.campaigns_path)?;
        log::debug!(
            "Read {} {} campaign rows from {}",
            rows.len(),
            platform,
            self.campaigns_path.display()
        );
        Ok(rows)
    }

    fn leads(&self, platform: Platform) -> Result<Vec<RawRecord>> {
        let rows = read_rows(&self.leads_path)?;
        log::debug!(
            "Read {} {} lead rows from {}",
            rows.len(),
            platform,
            self.leads_path.display()
        );
        Ok(rows)
    }

    fn sequences(&self, platform: Platform) -> Result<Vec<RawRecord>> {
        let Some(path) = &self.sequences_path else {
            return Ok(Vec::new());
        };
        let rows = read_rows(path)?;
        log::debug!(
            "Read {} {} sequence rows from {}",
            rows.len(),
            platform,
            path.display()
        );
        Ok(rows)
    }
}

/// Read one JSON table file into rows.
pub fn read_rows(path: &Path) -> Result<Vec<RawRecord>> {
    let contents = fs::read_to_string(path).map_err(|e| Error::source_io(path, e))?;
    let document: Value = serde_json::from_str(&contents)
        .map_err(|e| Error::record_source(format!("invalid JSON: {e}"), path))?;
    rows_from_document(document).map_err(|message| Error::record_source(message, path))
}

/// Unwrap any supported envelope into flat rows.
pub fn rows_from_document(document: Value) -> std::result::Result<Vec<RawRecord>, String> {
    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut envelope) => {
            if let Some(Value::Array(records)) = envelope.remove("records") {
                return records.into_iter().map(flatten_airtable_record).collect();
            }
            match envelope.remove("data") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(
                        "expected a row array, {\"records\": [..]} or {\"data\": [..]}".into(),
                    )
                }
            }
        }
        other => return Err(format!("expected a JSON array or object, found {}", kind(&other))),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(row) => Ok(row),
            other => Err(format!("row {idx} is {}, not an object", kind(&other))),
        })
        .collect()
}

/// `{"id", "createdTime", "fields": {..}}` → the fields plus `id`/`createdTime`
/// when the fields do not already carry them.
fn flatten_airtable_record(record: Value) -> std::result::Result<RawRecord, String> {
    let Value::Object(mut record) = record else {
        return Err(format!("Airtable record is {}, not an object", kind(&record)));
    };

    let mut row = match record.remove("fields") {
        Some(Value::Object(fields)) => fields,
        Some(Value::Null) | None => RawRecord::new(),
        Some(other) => return Err(format!("Airtable fields is {}, not an object", kind(&other))),
    };

    for key in ["id", "createdTime"] {
        if let Some(value) = record.remove(key) {
            row.entry(key).or_insert(value);
        }
    }
    Ok(row)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// In-memory rows keyed by platform, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<Platform, (Vec<RawRecord>, Vec<RawRecord>)>,
    sequences: HashMap<Platform, Vec<RawRecord>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_platform(
        mut self,
        platform: Platform,
        campaigns: Vec<RawRecord>,
        leads: Vec<RawRecord>,
    ) -> Self {
        self.tables.insert(platform, (campaigns, leads));
        self
    }

    pub fn with_sequences(mut self, platform: Platform, steps: Vec<RawRecord>) -> Self {
        self.sequences.insert(platform, steps);
        self
    }
}

impl RecordSource for MemorySource {
    fn campaigns(&self, platform: Platform) -> Result<Vec<RawRecord>> {
        Ok(self
            .tables
            .get(&platform)
            .map(|(campaigns, _)| campaigns.clone())
            .unwrap_or_default())
    }

    fn leads(&self, platform: Platform) -> Result<Vec<RawRecord>> {
        Ok(self
            .tables
            .get(&platform)
            .map(|(_, leads)| leads.clone())
            .unwrap_or_default())
    }

    fn sequences(&self, platform: Platform) -> Result<Vec<RawRecord>> {
        Ok(self.sequences.get(&platform).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_plain_array() {
        let doc = json!([{"Status": "Sent"}, {"Status": "Replied"}]);
        let rows = rows_from_document(doc).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["Status"], json!("Replied"));
    }

    #[test]
    fn test_airtable_envelope_is_flattened() {
        let doc = json!({
            "records": [
                {
                    "id": "rec1",
                    "createdTime": "2024-03-01T10:00:00.000Z",
                    "fields": {"Name": "Spring"}
                },
                {
                    "id": "rec2",
                    "createdTime": "2024-03-02T10:00:00.000Z",
                    "fields": {"id": "own", "Name": "Fall"}
                }
            ]
        });
        let rows = rows_from_document(doc).unwrap();
        assert_eq!(rows[0]["id"], json!("rec1"));
        assert_eq!(rows[0]["createdTime"], json!("2024-03-01T10:00:00.000Z"));
        assert_eq!(rows[1]["id"], json!("own"));
    }

    #[test]
    fn test_data_envelope() {
        let rows = rows_from_document(json!({"data": [{"a": 1}]})).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_unsupported_shapes_rejected() {
        assert!(rows_from_document(json!({"rows": []})).is_err());
        assert!(rows_from_document(json!("text")).is_err());
        assert!(rows_from_document(json!([1, 2])).is_err());
    }

    #[test]
    fn test_json_file_source_reports_path() {
        let mut bad = NamedTempFile::new().unwrap();
        write!(bad, "not json").unwrap();
        let good = NamedTempFile::new().unwrap();
        std::fs::write(good.path(), "[]").unwrap();

        let source = JsonFileSource::new(good.path(), bad.path());
        assert!(source.campaigns(Platform::Email).unwrap().is_empty());
        match source.leads(Platform::Email) {
            Err(Error::Source { path, .. }) => assert_eq!(path.as_deref(), Some(bad.path())),
            other => panic!("expected source error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_source_error() {
        let source = JsonFileSource::new("/nonexistent/c.json", "/nonexistent/l.json");
        assert!(matches!(
            source.campaigns(Platform::Email),
            Err(Error::Source { source: Some(_), .. })
        ));
    }

    #[test]
    fn test_memory_source_by_platform() {
        let row: RawRecord = json!({"Status": "Sent"}).as_object().cloned().unwrap();
        let source = MemorySource::new().with_platform(Platform::LinkedIn, vec![], vec![row]);
        assert_eq!(source.leads(Platform::LinkedIn).unwrap().len(), 1);
        assert!(source.leads(Platform::Email).unwrap().is_empty());
    }

    #[test]
    fn test_sequences_are_optional() {
        let table = NamedTempFile::new().unwrap();
        std::fs::write(table.path(), r#"[{"sequence_num": 1}]"#).unwrap();

        let without = JsonFileSource::new(table.path(), table.path());
        assert!(without.sequences(Platform::Email).unwrap().is_empty());

        let with = without.clone().with_sequences(table.path());
        assert_eq!(with.sequences(Platform::Email).unwrap().len(), 1);
    }
}
