//! Row-to-field-map decoding.

use crate::error::{DbError, DbResult};
use crate::value::SqlValue;
use std::collections::HashMap;
use tokio_postgres::Row;

/// One result row as a column-name → value mapping.
pub type FieldMap = HashMap<String, SqlValue>;

/// Decode a driver row into a [`FieldMap`], keyed by column name.
///
/// Every column is decoded by its driver-reported type into the matching
/// [`SqlValue`] variant; SQL NULL becomes [`SqlValue::Null`].
pub fn row_to_field_map(row: &Row) -> DbResult<FieldMap> {
    let mut map = HashMap::with_capacity(row.columns().len());
    for idx in 0..row.columns().len() {
        let name = row.columns()[idx].name().to_string();
        let value = decode_column(row, idx)?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Decode a single column by its driver-reported type metadata.
pub fn decode_column(row: &Row, idx: usize) -> DbResult<SqlValue> {
    let column = &row.columns()[idx];
    let name = column.name();

    match column.type_().name() {
        "bool" => decode(row, idx, name, SqlValue::Bool),
        "int2" => decode(row, idx, name, SqlValue::Int16),
        "int4" => decode(row, idx, name, SqlValue::Int32),
        "int8" => decode(row, idx, name, SqlValue::Int64),
        "float4" => decode(row, idx, name, SqlValue::Float32),
        "float8" => decode(row, idx, name, SqlValue::Float64),
        "numeric" => decode(row, idx, name, SqlValue::Decimal),
        "text" | "varchar" | "bpchar" | "name" | "unknown" => {
            decode(row, idx, name, SqlValue::Text)
        }
        "bytea" => decode(row, idx, name, SqlValue::Bytes),
        "uuid" => decode(row, idx, name, SqlValue::Uuid),
        "date" => decode(row, idx, name, SqlValue::Date),
        "time" => decode(row, idx, name, SqlValue::Time),
        "timestamp" => decode(row, idx, name, SqlValue::DateTime),
        "timestamptz" => decode(row, idx, name, SqlValue::DateTimeUtc),
        "json" | "jsonb" => decode(row, idx, name, SqlValue::Json),
        other => Err(DbError::decode(
            name,
            format!("unsupported column type '{}'", other),
        )),
    }
}

fn decode<'a, T, F>(row: &'a Row, idx: usize, name: &str, wrap: F) -> DbResult<SqlValue>
where
    T: tokio_postgres::types::FromSql<'a>,
    F: FnOnce(T) -> SqlValue,
{
    match row.try_get::<_, Option<T>>(idx) {
        Ok(Some(v)) => Ok(wrap(v)),
        Ok(None) => Ok(SqlValue::Null),
        Err(e) => Err(DbError::decode(name, e.to_string())),
    }
}
