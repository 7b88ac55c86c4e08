use ahash::AHashMap;
use geo::MultiPolygon;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// A single tabular cell value. Tabular aggregates are strings, integers,
/// or floats; anything else is carried as `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Null,
}

impl FieldValue {
    /// Numeric view of the value. Strings, nulls, and non-finite floats
    /// yield `None` so they stay out of max/intensity computations.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Float(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Str(s) => json!(s),
            FieldValue::Int(v) => json!(v),
            FieldValue::Float(v) => json!(v),
            FieldValue::Null => Value::Null,
        }
    }

    pub fn from_json(value: &Value) -> FieldValue {
        match value {
            Value::String(s) => FieldValue::Str(s.clone()),
            Value::Number(n) => n
                .as_i64()
                .map(FieldValue::Int)
                .or_else(|| n.as_f64().map(FieldValue::Float))
                .unwrap_or(FieldValue::Null),
            _ => FieldValue::Null,
        }
    }
}

/// One parsed feature: an areal geometry in WGS84 degrees plus its original
/// properties. `id` is the feature's ordinal in the input collection.
#[derive(Debug, Clone)]
pub struct GeometryRecord {
    pub id: usize,
    pub geometry: MultiPolygon<f64>,
    pub properties: Map<String, Value>,
}

/// One tabular row after key normalization.
#[derive(Debug, Clone)]
pub struct TabularRow {
    pub key: i64,
    pub fields: AHashMap<String, FieldValue>,
}

/// Rows keyed by join key, built once and read-only afterwards.
/// The source gives no uniqueness guarantee; duplicates are last-write-wins.
#[derive(Debug, Default)]
pub struct LookupTable {
    rows: AHashMap<i64, TabularRow>,
}

impl LookupTable {
    pub fn from_rows(rows: impl IntoIterator<Item = TabularRow>) -> Self {
        let mut table = AHashMap::new();
        for row in rows {
            table.insert(row.key, row);
        }
        Self { rows: table }
    }

    #[inline] pub fn get(&self, key: i64) -> Option<&TabularRow> { self.rows.get(&key) }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }
}

/// A geometry record with every schema field materialized, either from the
/// matched row or from the schema default. Always a fresh record; the input
/// collection is never mutated.
#[derive(Debug, Clone)]
pub struct EnrichedRecord {
    pub id: usize,
    pub geometry: MultiPolygon<f64>,
    pub properties: Map<String, Value>,
    /// Join key extracted from the key field, if any.
    pub key: Option<i64>,
    /// Whether a tabular row matched the key.
    pub matched: bool,
    /// Schema fields in declaration order.
    pub fields: Vec<(String, FieldValue)>,
    pub fill_color: Option<ColorQuad>,
}

impl EnrichedRecord {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Numeric view of a schema field, falling back to the original
    /// properties for attributes outside the schema.
    pub fn numeric(&self, name: &str) -> Option<f64> {
        if let Some(value) = self.field(name) {
            return value.as_f64();
        }
        self.properties
            .get(name)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    }
}

/// RGBA fill color. Alpha 0 is reserved for "no underlying value" and is
/// never produced for a record that carries a numeric attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorQuad(pub [u8; 4]);

impl ColorQuad {
    /// Fully transparent marker for records with no data, distinct from a
    /// numeric zero (which keeps the scheme's alpha).
    pub const NO_DATA: ColorQuad = ColorQuad([0, 0, 0, 0]);

    #[inline] pub fn alpha(&self) -> u8 { self.0[3] }
}

/// Camera placement point in WGS84 degrees, with the number of geometries
/// that had to be excluded from the mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CentroidResult {
    pub latitude: f64,
    pub longitude: f64,
    pub skipped: usize,
}

/// Per-run diagnostics. Every count here is non-fatal; fatal conditions
/// surface as errors instead.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Features with missing, non-areal, or empty geometry.
    pub features_skipped: usize,
    /// Tabular rows dropped for a non-numeric key.
    pub rows_dropped: usize,
    /// Geometry records with no matching row (kept, with defaults).
    pub join_misses: usize,
    /// Geometries whose simplification collapsed and was reverted.
    pub simplify_fallbacks: usize,
    /// Geometries excluded from the view centroid.
    pub projection_skips: usize,
    pub warnings: Vec<String>,
}
