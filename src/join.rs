use serde_json::Value;

use crate::key::extract_key;
use crate::schema::FieldSchema;
use crate::types::{EnrichedRecord, FieldValue, GeometryRecord, LookupTable};

/// Left-join tabular rows onto geometry records by extracted key.
///
/// Matching is exact integer equality. Every input record is emitted, in
/// input order: a record with no extractable key, or a key absent from the
/// table, keeps the schema defaults (a miss, not an error). Returns the new
/// collection and the miss count.
pub fn join(
    geometries: &[GeometryRecord],
    table: &LookupTable,
    schema: &FieldSchema,
    key_field: &str,
) -> (Vec<EnrichedRecord>, usize) {
    let mut misses = 0;

    let records = geometries
        .iter()
        .map(|record| {
            let key = record.properties.get(key_field).and_then(key_from_property);
            let row = key.and_then(|k| table.get(k));
            if row.is_none() {
                misses += 1;
            }

            let fields = schema
                .specs()
                .iter()
                .map(|spec| {
                    let value = row
                        .and_then(|r| r.fields.get(&spec.name))
                        .filter(|v| !matches!(v, FieldValue::Null))
                        .cloned()
                        .unwrap_or_else(|| spec.default.clone());
                    (spec.name.clone(), value)
                })
                .collect();

            EnrichedRecord {
                id: record.id,
                geometry: record.geometry.clone(),
                properties: record.properties.clone(),
                key,
                matched: row.is_some(),
                fields,
                fill_color: None,
            }
        })
        .collect();

    (records, misses)
}

/// The key field is normally a composite string identifier, but tolerate a
/// source that already stores it numerically.
fn key_from_property(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => extract_key(s),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}
