use std::io::Cursor;

use ahash::AHashMap;
use anyhow::{anyhow, Context, Result};
use polars::prelude::{Column, CsvReader, DataFrame, DataType, SerReader};

use crate::key::strict_key;
use crate::types::{FieldValue, LookupTable, TabularRow};

/// Read delimited tabular bytes (header row expected) into a lookup table
/// keyed by `key_column`.
///
/// The key column is normalized through text; rows whose raw key is not
/// fully numeric are dropped and counted before the table is built, so they
/// can never match. Duplicate keys resolve last-write-wins (the source gives
/// no uniqueness guarantee). A missing key column is fatal.
pub fn read_lookup_table(bytes: &[u8], key_column: &str) -> Result<(LookupTable, usize)> {
    let df = read_csv_bytes(bytes)?;
    lookup_from_frame(&df, key_column)
}

/// Read a Polars DataFrame from CSV bytes.
fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    let cursor = Cursor::new(bytes);
    let df = CsvReader::new(cursor).finish().context("failed to parse CSV bytes")?;
    Ok(df)
}

fn lookup_from_frame(df: &DataFrame, key_column: &str) -> Result<(LookupTable, usize)> {
    let key_col = df
        .column(key_column)
        .map_err(|_| anyhow!("key column '{key_column}' not found in table"))?;

    // The key may arrive as any dtype; normalize through text so the same
    // digit filter applies either way.
    let series = key_col.as_materialized_series();
    let keys = if key_col.dtype() != &DataType::String {
        series.cast(&DataType::String).context("failed to normalize key column to text")?
    } else {
        series.clone()
    };
    let keys = keys.str().map_err(|e| anyhow!("key column is not text after cast: {e}"))?;

    let mut rows = Vec::with_capacity(df.height());
    let mut dropped = 0;

    for idx in 0..df.height() {
        let Some(key) = keys.get(idx).and_then(strict_key) else {
            dropped += 1;
            continue;
        };

        let mut fields = AHashMap::new();
        // The key column itself is materialized as an integer so a matched
        // record re-exposes its own key.
        fields.insert(key_column.to_string(), FieldValue::Int(key));
        for col in df.get_columns() {
            let name = col.name().as_str();
            if name == key_column {
                continue;
            }
            fields.insert(name.to_string(), field_value(col, idx));
        }
        rows.push(TabularRow { key, fields });
    }

    Ok((LookupTable::from_rows(rows), dropped))
}

/// Cell at `idx` as a FieldValue, by column dtype. Nulls and unsupported
/// dtypes become `Null`.
fn field_value(col: &Column, idx: usize) -> FieldValue {
    let value = match col.dtype() {
        DataType::String => col
            .str()
            .ok()
            .and_then(|s| s.get(idx))
            .map(|s| FieldValue::Str(s.to_string())),
        DataType::Int64 => col.i64().ok().and_then(|v| v.get(idx)).map(FieldValue::Int),
        DataType::Int32 => col.i32().ok().and_then(|v| v.get(idx)).map(|v| FieldValue::Int(v as i64)),
        DataType::UInt32 => col.u32().ok().and_then(|v| v.get(idx)).map(|v| FieldValue::Int(v as i64)),
        DataType::Float64 => col.f64().ok().and_then(|v| v.get(idx)).map(FieldValue::Float),
        DataType::Boolean => col.bool().ok().and_then(|v| v.get(idx)).map(|v| FieldValue::Int(v as i64)),
        _ => None,
    };
    value.unwrap_or(FieldValue::Null)
}
