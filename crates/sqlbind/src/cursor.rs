//! Lazy, forward-only row cursor.

use crate::client::RowStream;
use crate::error::DbResult;
use crate::row::{FieldMap, row_to_field_map};
use futures_util::StreamExt;

/// A forward-only cursor over query results.
///
/// Rows are pulled from the driver one advance at a time and decoded into
/// [`FieldMap`]s. The underlying driver stream is released when the cursor
/// is dropped; [`RowCursor::close`] releases it explicitly and is safe to
/// call repeatedly, after partial consumption, or after an error.
#[must_use]
pub struct RowCursor {
    stream: Option<RowStream>,
}

impl RowCursor {
    pub(crate) fn new(stream: RowStream) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    /// Advance to the next row.
    ///
    /// Returns `None` once the result set is exhausted or the cursor has
    /// been closed. A driver or decode error ends the cursor; subsequent
    /// advances return `None`.
    pub async fn next(&mut self) -> Option<DbResult<FieldMap>> {
        let stream = self.stream.as_mut()?;
        match stream.next().await {
            Some(Ok(row)) => match row_to_field_map(&row) {
                Ok(fields) => Some(Ok(fields)),
                Err(e) => {
                    self.stream = None;
                    Some(Err(e))
                }
            },
            Some(Err(e)) => {
                self.stream = None;
                Some(Err(e))
            }
            None => {
                self.stream = None;
                None
            }
        }
    }

    /// Release the underlying driver stream. Idempotent.
    pub fn close(&mut self) {
        self.stream = None;
    }

    /// Whether the cursor has been exhausted or closed.
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }
}
