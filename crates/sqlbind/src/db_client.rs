//! Query façade over a driver handle.

use crate::args::{BoundStatement, SqlArgs, bind};
use crate::client::{DbHandle, StreamingHandle};
use crate::cursor::RowCursor;
use crate::error::DbResult;
use crate::row::{FieldMap, decode_column, row_to_field_map};
use crate::scan::scan_sql;
use crate::value::SqlValue;

/// Executes `@name` / `@pN` SQL against a driver handle.
///
/// Every operation runs the same pipeline: scan the SQL for placeholders,
/// bind the caller's arguments, then make a single driver round trip and
/// shape the result. Binding errors short-circuit before the driver is
/// touched; driver errors come back annotated with the rewritten SQL and
/// the bound argument count (argument values are never logged or captured).
///
/// # Example
///
/// ```ignore
/// use sqlbind::{DbClient, SqlArgs};
///
/// let db = DbClient::new(sqlbind::connect(&url).await?);
/// let user = db
///     .get(
///         "SELECT id, username FROM users WHERE id=@id",
///         &SqlArgs::named([("id", 42_i64)]),
///     )
///     .await?;
/// ```
pub struct DbClient<C> {
    handle: C,
}

impl<C> DbClient<C> {
    /// Wrap a driver handle.
    pub fn new(handle: C) -> Self {
        Self { handle }
    }

    /// Borrow the underlying handle.
    pub fn handle(&self) -> &C {
        &self.handle
    }

    /// Unwrap the underlying handle.
    pub fn into_handle(self) -> C {
        self.handle
    }
}

impl<C: DbHandle> DbClient<C> {
    /// Scan and bind without executing. Fails on any binding error, in
    /// which case no driver call is attempted by the calling operation.
    fn prepare(&self, op: &'static str, sql: &str, args: &SqlArgs) -> DbResult<BoundStatement> {
        let bound = bind(scan_sql(sql, self.handle.marker()), args)?;
        tracing::debug!(
            target: "sqlbind.sql",
            op,
            param_count = bound.params.len(),
            sql = %bound.sql,
        );
        Ok(bound)
    }

    /// Execute a query and return the first column of the first row.
    ///
    /// Returns `Ok(None)` when the result set is empty; this is a valid
    /// outcome, not an error.
    pub async fn scalar(&self, sql: &str, args: &SqlArgs) -> DbResult<Option<SqlValue>> {
        let bound = self.prepare("scalar", sql, args)?;
        let params = bound.params_ref();
        let row = self
            .handle
            .query_opt(&bound.sql, &params)
            .await
            .map_err(|e| e.in_statement(&bound.sql, bound.params.len()))?;
        match row {
            Some(row) => decode_column(&row, 0).map(Some),
            None => Ok(None),
        }
    }

    /// Execute a query and return whether it produced at least one row.
    ///
    /// Only the first row is pulled from the driver.
    pub async fn exists(&self, sql: &str, args: &SqlArgs) -> DbResult<bool> {
        let bound = self.prepare("exists", sql, args)?;
        let params = bound.params_ref();
        let row = self
            .handle
            .query_opt(&bound.sql, &params)
            .await
            .map_err(|e| e.in_statement(&bound.sql, bound.params.len()))?;
        Ok(row.is_some())
    }

    /// Execute a query and return the first row as a [`FieldMap`].
    ///
    /// Returns `Ok(None)` when the result set is empty. Column values are
    /// decoded per the driver's type metadata; NULL columns surface as
    /// [`SqlValue::Null`].
    pub async fn get(&self, sql: &str, args: &SqlArgs) -> DbResult<Option<FieldMap>> {
        let bound = self.prepare("get", sql, args)?;
        let params = bound.params_ref();
        let row = self
            .handle
            .query_opt(&bound.sql, &params)
            .await
            .map_err(|e| e.in_statement(&bound.sql, bound.params.len()))?;
        row.as_ref().map(row_to_field_map).transpose()
    }

    /// Execute a query and eagerly return every row as a [`FieldMap`],
    /// preserving row order.
    pub async fn slice_get(&self, sql: &str, args: &SqlArgs) -> DbResult<Vec<FieldMap>> {
        let bound = self.prepare("slice_get", sql, args)?;
        let params = bound.params_ref();
        let rows = self
            .handle
            .query(&bound.sql, &params)
            .await
            .map_err(|e| e.in_statement(&bound.sql, bound.params.len()))?;
        rows.iter().map(row_to_field_map).collect()
    }

    /// Run a mutating statement and return the driver-reported affected-row
    /// count.
    pub async fn execute(&self, sql: &str, args: &SqlArgs) -> DbResult<u64> {
        let bound = self.prepare("execute", sql, args)?;
        let params = bound.params_ref();
        self.handle
            .execute(&bound.sql, &params)
            .await
            .map_err(|e| e.in_statement(&bound.sql, bound.params.len()))
    }

    /// Run a mutating statement and require an exact affected-row count.
    ///
    /// Fails with [`DbError::Assertion`](crate::DbError::Assertion) when the
    /// driver reports a different count. This catches silently-wrong batch
    /// updates and deletes.
    pub async fn sized_execute(&self, expected: u64, sql: &str, args: &SqlArgs) -> DbResult<()> {
        let actual = self.execute(sql, args).await?;
        if actual != expected {
            return Err(crate::error::DbError::Assertion { expected, actual });
        }
        Ok(())
    }
}

impl<C: StreamingHandle> DbClient<C> {
    /// Execute a query and return a lazy [`RowCursor`] over its rows.
    ///
    /// Rows are decoded as the cursor advances; nothing is materialized up
    /// front. The cursor releases the driver stream on drop, or earlier via
    /// [`RowCursor::close`].
    pub async fn rows(&self, sql: &str, args: &SqlArgs) -> DbResult<RowCursor> {
        let bound = self.prepare("rows", sql, args)?;
        let params = bound.params_ref();
        let stream = self
            .handle
            .query_stream(&bound.sql, &params)
            .await
            .map_err(|e| e.in_statement(&bound.sql, bound.params.len()))?;
        Ok(RowCursor::new(stream))
    }
}
