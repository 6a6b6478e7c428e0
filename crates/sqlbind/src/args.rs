//! Caller-supplied arguments and placeholder binding.

use crate::error::{DbError, DbResult};
use crate::scan::ParsedSql;
use crate::value::SqlValue;
use std::collections::HashMap;
use tokio_postgres::types::ToSql;

/// Arguments for one statement, named or positional.
///
/// The two modes are mutually exclusive by construction: a statement is
/// bound either against a name→value map or against an ordered value list,
/// and a map can never be mistaken for a single positional value.
#[derive(Debug, Clone)]
pub enum SqlArgs {
    /// Values looked up by placeholder name (`@id`, `@user_name`, ...).
    Named(HashMap<String, SqlValue>),
    /// Values referenced by 1-based index (`@p1`, `@p2`, ...).
    Positional(Vec<SqlValue>),
}

impl SqlArgs {
    /// Arguments for a statement without placeholders.
    pub fn none() -> Self {
        Self::Positional(Vec::new())
    }

    /// Build named arguments from `(name, value)` pairs.
    pub fn named<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build positional arguments from an ordered value list.
    pub fn positional<V, I>(values: I) -> Self
    where
        V: Into<SqlValue>,
        I: IntoIterator<Item = V>,
    {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }
}

impl Default for SqlArgs {
    fn default() -> Self {
        Self::none()
    }
}

/// A statement ready for the driver: rewritten SQL plus the ordered
/// parameter values aligned to its markers.
#[derive(Debug, Clone)]
pub struct BoundStatement {
    /// SQL with driver-native markers.
    pub sql: String,
    /// One value per marker, in marker order.
    pub params: Vec<SqlValue>,
}

impl BoundStatement {
    /// Parameter refs in the shape tokio-postgres expects.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }
}

/// Resolve scanned placeholders against caller arguments.
///
/// Named mode looks every scanned name up in the map; a missing key is a
/// binding error naming the placeholder. Positional mode requires every
/// scanned name to be of the form `p<N>` with `N` in `1..=values.len()`;
/// indices may repeat, and repeats duplicate the referenced value. Errors
/// leave no partial result behind.
pub fn bind(parsed: ParsedSql, args: &SqlArgs) -> DbResult<BoundStatement> {
    let mut params = Vec::with_capacity(parsed.names.len());

    match args {
        SqlArgs::Named(map) => {
            for name in &parsed.names {
                let value = map.get(name).ok_or_else(|| {
                    DbError::bind(format!(
                        "no argument supplied for placeholder '@{}'",
                        name
                    ))
                })?;
                params.push(value.clone());
            }
        }
        SqlArgs::Positional(values) => {
            for name in &parsed.names {
                let index = positional_index(name, values.len())?;
                params.push(values[index - 1].clone());
            }
        }
    }

    Ok(BoundStatement {
        sql: parsed.sql,
        params,
    })
}

/// Parse a positional placeholder name into a 1-based index.
fn positional_index(name: &str, supplied: usize) -> DbResult<usize> {
    let digits = name
        .strip_prefix('p')
        .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| {
            DbError::bind(format!(
                "positional arguments were supplied but placeholder '@{}' is not of the form '@p<N>'",
                name
            ))
        })?;

    let index: usize = digits.parse().unwrap_or(0);
    if index == 0 || index > supplied {
        return Err(DbError::bind(format!(
            "positional placeholder '@{}' is out of range ({} value(s) supplied)",
            name, supplied
        )));
    }
    Ok(index)
}
