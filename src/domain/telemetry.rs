// Telemetry state domain models - latest-value table and historical buffer
use std::collections::HashMap;

/// Buffer tag under which the root entity's historical series are stored.
pub const ROOT_SOURCE_TAG: &str = "root";

/// A single field value as delivered by the platform: either text or a number.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    /// Map a raw JSON leaf into a field value. Anything that is not a number
    /// is kept as text; the platform mixes string-typed and strictly-typed
    /// payloads freely.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            serde_json::Value::Null => FieldValue::Text(String::new()),
            other => FieldValue::Text(other.to_string()),
        }
    }

    /// Permissive numeric read: numeric strings parse, everything else is 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse().unwrap_or(0.0),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            FieldValue::Number(_) => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Flat per-entity field map.
pub type FieldRecord = HashMap<String, FieldValue>;

/// Latest known state of every entity seen so far. One record per entity id,
/// created lazily on first sighting and never destroyed within a session.
#[derive(Debug, Default)]
pub struct TelemetryStore {
    records: HashMap<String, FieldRecord>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entity_id: &str) -> Option<&FieldRecord> {
        self.records.get(entity_id)
    }

    /// Additive merge: every key present in `fields` overwrites the stored
    /// value (last write wins); keys absent from `fields` are untouched.
    pub fn apply_fields<I>(&mut self, entity_id: &str, fields: I)
    where
        I: IntoIterator<Item = (String, FieldValue)>,
    {
        let record = self.records.entry(entity_id.to_string()).or_default();
        for (key, value) in fields {
            record.insert(key, value);
        }
    }

    pub fn field(&self, entity_id: &str, key: &str) -> Option<&FieldValue> {
        self.records.get(entity_id).and_then(|r| r.get(key))
    }

    /// Numeric field read, defaulting missing or unparseable values to 0.
    pub fn field_f64(&self, entity_id: &str, key: &str) -> f64 {
        self.field(entity_id, key).map(FieldValue::as_f64).unwrap_or(0.0)
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Full session reset. The only destructive operation on the store.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// A single historical sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub ts_ms: i64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(ts_ms: i64, value: f64) -> Self {
        Self { ts_ms, value }
    }
}

/// Historical series grouped by source tag and metric key. Populated once by
/// the historical loader, read-only afterwards.
#[derive(Debug, Default)]
pub struct TimeSeriesBuffer {
    sources: HashMap<String, HashMap<String, Vec<TimeSeriesPoint>>>,
}

impl TimeSeriesBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_source(&mut self, tag: &str, series: HashMap<String, Vec<TimeSeriesPoint>>) {
        self.sources.insert(tag.to_string(), series);
    }

    pub fn series(&self, tag: &str, key: &str) -> Option<&[TimeSeriesPoint]> {
        self.sources
            .get(tag)
            .and_then(|s| s.get(key))
            .map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_not_destructive() {
        let mut store = TelemetryStore::new();
        store.apply_fields("e1", [("temperature".to_string(), FieldValue::from(21.5))]);
        store.apply_fields("e1", [("status".to_string(), FieldValue::from("warning"))]);

        // a frame without `temperature` must not erase it
        assert_eq!(store.field_f64("e1", "temperature"), 21.5);
        assert_eq!(store.field("e1", "status").unwrap().as_str(), Some("warning"));
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut store = TelemetryStore::new();
        store.apply_fields("e1", [("powerUsage".to_string(), FieldValue::from(10.0))]);
        store.apply_fields("e1", [("powerUsage".to_string(), FieldValue::from("42"))]);
        assert_eq!(store.field_f64("e1", "powerUsage"), 42.0);
    }

    #[test]
    fn test_record_created_lazily() {
        let mut store = TelemetryStore::new();
        assert!(store.record("e1").is_none());
        store.apply_fields("e1", []);
        assert!(store.record("e1").is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_permissive_numeric_reads() {
        assert_eq!(FieldValue::from("1200.5").as_f64(), 1200.5);
        assert_eq!(FieldValue::from(" 17 ").as_f64(), 17.0);
        assert_eq!(FieldValue::from("not-a-number").as_f64(), 0.0);
        assert_eq!(FieldValue::Text(String::new()).as_f64(), 0.0);
    }

    #[test]
    fn test_from_json_leaves() {
        let num = FieldValue::from_json(&serde_json::json!(3.5));
        assert_eq!(num, FieldValue::Number(3.5));
        let text = FieldValue::from_json(&serde_json::json!("danger"));
        assert_eq!(text.as_str(), Some("danger"));
        let null = FieldValue::from_json(&serde_json::Value::Null);
        assert_eq!(null.as_f64(), 0.0);
    }

    #[test]
    fn test_buffer_lookup() {
        let mut buffer = TimeSeriesBuffer::new();
        let mut series = HashMap::new();
        series.insert(
            "totalSavedPower".to_string(),
            vec![TimeSeriesPoint::new(1000, 5.0), TimeSeriesPoint::new(2000, 7.0)],
        );
        buffer.insert_source(ROOT_SOURCE_TAG, series);

        let points = buffer.series(ROOT_SOURCE_TAG, "totalSavedPower").unwrap();
        assert_eq!(points.len(), 2);
        assert!(buffer.series(ROOT_SOURCE_TAG, "missing").is_none());
    }
}
