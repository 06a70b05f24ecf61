//! Reshaping of discriminated result rows into a [`ResultMap`].
//!
//! Rows from a multi-shape query carry `tipo_resultado` (which partition the row
//! belongs to) and `datos` (the partition's records). Depending on the backend,
//! `datos` arrives either as JSON text or as an already-structured value; that is
//! resolved once here through [`Payload`].

use std::collections::BTreeMap;

use serde_json::Value;

use super::executor::Row;

pub const DISCRIMINATOR_COLUMN: &str = "tipo_resultado";
pub const PAYLOAD_COLUMN: &str = "datos";

/// Topic-frequency partition of a topic analysis.
pub const TOPICS_KEY: &str = "temas";
/// Monthly series partition of a topic analysis.
pub const TEMPORAL_KEY: &str = "temporal";

/// One record inside a partition: field name → value.
pub type Record = serde_json::Map<String, Value>;

/// Partition name → records, in the order the query produced them.
pub type ResultMap = BTreeMap<String, Vec<Record>>;

/// The `datos` column of a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// JSON text that still needs decoding.
    Encoded(String),
    /// A value the backend already decoded.
    Structured(Value),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Payload::Encoded(text),
            other => Payload::Structured(other),
        }
    }
}

impl Payload {
    /// Decode into the partition's records. `null` is an empty partition.
    pub fn into_records(self) -> Result<Vec<Record>, serde_json::Error> {
        let value = match self {
            Payload::Encoded(text) => serde_json::from_str(&text)?,
            Payload::Structured(value) => value,
        };

        Ok(match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect(),
            Value::Object(record) => vec![record],
            _ => Vec::new(),
        })
    }
}

/// Index discriminated rows by `tipo_resultado`.
///
/// A later row with the same discriminator replaces an earlier one. Rows without a
/// discriminator or with an undecodable payload are skipped with a warning.
pub fn shape_results(rows: Vec<Row>) -> ResultMap {
    let mut map = ResultMap::new();

    for mut row in rows {
        let kind = match row.get(DISCRIMINATOR_COLUMN).and_then(Value::as_str) {
            Some(kind) => kind.to_string(),
            None => {
                tracing::warn!("result row without {DISCRIMINATOR_COLUMN}, skipping");
                continue;
            }
        };

        let payload = Payload::from(row.remove(PAYLOAD_COLUMN).unwrap_or(Value::Null));
        match payload.into_records() {
            Ok(records) => {
                map.insert(kind, records);
            }
            Err(e) => tracing::warn!(kind = %kind, error = %e, "undecodable result payload"),
        }
    }

    map
}
