use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Column names the backend normalizes every CSV into.
pub const EQUIPMENT_NAME_FIELD: &str = "Equipment Name";
pub const TYPE_FIELD: &str = "Type";
pub const FLOWRATE_FIELD: &str = "Flowrate";
pub const PRESSURE_FIELD: &str = "Pressure";
pub const TEMPERATURE_FIELD: &str = "Temperature";

/// Server-assigned identity of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadId(pub i64);

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for UploadId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// One row of equipment readings.
///
/// Values are kept exactly as the server sent them, in the server's column
/// order. The row is opaque beyond display and search.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowRecord(Map<String, Value>);

impl RowRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns a field formatted for display; missing fields render empty.
    pub fn display_field(&self, name: &str) -> String {
        match self.0.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => integral_floats_as_ints(other).to_string(),
        }
    }

    pub fn equipment_name(&self) -> String {
        self.display_field(EQUIPMENT_NAME_FIELD)
    }

    pub fn equipment_type(&self) -> String {
        self.display_field(TYPE_FIELD)
    }

    pub fn flowrate(&self) -> String {
        self.display_field(FLOWRATE_FIELD)
    }

    pub fn pressure(&self) -> String {
        self.display_field(PRESSURE_FIELD)
    }

    pub fn temperature(&self) -> String {
        self.display_field(TEMPERATURE_FIELD)
    }

    /// The full serialized content of the row (keys and values), lower-cased.
    ///
    /// This is the text the search filter is matched against. Whole-number
    /// floats are written without a fraction (`5.0` as `5`), the way the
    /// browser dashboard serializes them.
    pub fn search_text(&self) -> String {
        let normalized = Value::Object(
            self.0
                .iter()
                .map(|(key, value)| (key.clone(), integral_floats_as_ints(value)))
                .collect(),
        );
        normalized.to_string().to_lowercase()
    }
}

/// `i64` range as f64; `as` casts inside it are exact for whole numbers.
const I64_SPAN: f64 = 9.223_372_036_854_775e18;

fn integral_floats_as_ints(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < I64_SPAN => Value::from(f as i64),
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(integral_floats_as_ints).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| (key.clone(), integral_floats_as_ints(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Count of records per equipment type, in the order the server listed them.
///
/// Order matters: it drives chart category order and the insight tie-break.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeDistribution(Vec<(String, u64)>);

impl TypeDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a count for `equipment_type`. A repeated key replaces the earlier
    /// count in place so insertion order is preserved.
    pub fn insert(&mut self, equipment_type: impl Into<String>, count: u64) {
        let equipment_type = equipment_type.into();
        if let Some(entry) = self.0.iter_mut().find(|(name, _)| *name == equipment_type) {
            entry.1 = count;
        } else {
            self.0.push((equipment_type, count));
        }
    }

    pub fn get(&self, equipment_type: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(name, _)| name == equipment_type)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, count)| count).sum()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for TypeDistribution {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut distribution = Self::new();
        for (name, count) in iter {
            distribution.insert(name, count);
        }
        distribution
    }
}

impl Serialize for TypeDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, count) in &self.0 {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TypeDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DistributionVisitor;

        impl<'de> Visitor<'de> for DistributionVisitor {
            type Value = TypeDistribution;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of equipment type to count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut distribution = TypeDistribution::new();
                while let Some((name, count)) = access.next_entry::<String, u64>()? {
                    distribution.insert(name, count);
                }
                Ok(distribution)
            }
        }

        deserializer.deserialize_map(DistributionVisitor)
    }
}

/// Server-computed aggregate statistics over an upload's rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total_records: u64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    pub type_distribution: TypeDistribution,
}

impl Summary {
    /// Whether the distribution counts add up to `total_records`.
    pub fn is_consistent(&self) -> bool {
        self.type_distribution.total() == self.total_records
    }
}

/// One completed CSV ingestion: rows plus the server's summary.
///
/// Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: UploadId,
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
    pub rows: Vec<RowRecord>,
    pub summary: Summary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn distribution_keeps_server_order() {
        let distribution: TypeDistribution =
            serde_json::from_value(json!({"Valve": 2, "Pump": 5, "Compressor": 1})).unwrap();

        let names: Vec<&str> = distribution.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Valve", "Pump", "Compressor"]);
        assert_eq!(distribution.total(), 8);
    }

    #[test]
    fn distribution_insert_replaces_in_place() {
        let mut distribution: TypeDistribution = [("Pump", 1), ("Valve", 2)].into_iter().collect();
        distribution.insert("Pump", 4);

        assert_eq!(distribution.get("Pump"), Some(4));
        assert_eq!(distribution.iter().next(), Some(("Pump", 4)));
        assert_eq!(distribution.len(), 2);
    }

    #[test]
    fn distribution_serializes_as_map() {
        let distribution: TypeDistribution = [("Pump", 3), ("Valve", 3)].into_iter().collect();
        let text = serde_json::to_string(&distribution).unwrap();
        assert_eq!(text, r#"{"Pump":3,"Valve":3}"#);
    }

    #[test]
    fn row_display_handles_numbers_and_missing_fields() {
        let row: RowRecord = serde_json::from_value(json!({
            "Equipment Name": "Pump-1",
            "Type": "Pump",
            "Flowrate": 120.5,
            "Pressure": 5
        }))
        .unwrap();

        assert_eq!(row.equipment_name(), "Pump-1");
        assert_eq!(row.flowrate(), "120.5");
        assert_eq!(row.pressure(), "5");
        assert_eq!(row.temperature(), "");
    }

    #[test]
    fn row_search_text_includes_keys_and_values() {
        let row: RowRecord = serde_json::from_value(json!({
            "Equipment Name": "Reactor-A",
            "Type": "Reactor"
        }))
        .unwrap();

        let text = row.search_text();
        assert!(text.contains("equipment name"));
        assert!(text.contains("reactor-a"));
    }

    #[test]
    fn whole_number_floats_lose_their_fraction() {
        let row: RowRecord = serde_json::from_value(json!({
            "Equipment Name": "Pump-1",
            "Pressure": 5.0,
            "Flowrate": 120.5
        }))
        .unwrap();

        let text = row.search_text();
        assert!(text.contains(r#""pressure":5"#));
        assert!(!text.contains("5.0"));
        assert!(text.contains("120.5"));
        assert_eq!(row.pressure(), "5");
        assert_eq!(row.flowrate(), "120.5");
    }

    #[test]
    fn summary_consistency_check() {
        let summary = Summary {
            total_records: 3,
            type_distribution: [("Pump", 2), ("Valve", 1)].into_iter().collect(),
            ..Summary::default()
        };
        assert!(summary.is_consistent());
    }
}
