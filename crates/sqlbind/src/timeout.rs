//! Execution-timeout wrapper for driver handles.

use crate::client::{DbHandle, RowStream, StreamingHandle};
use crate::error::{DbError, DbResult};
use crate::scan::Marker;
use std::time::Duration;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Bounds every driver round trip of the wrapped handle with a timeout.
///
/// On expiry the call fails with [`DbError::Timeout`] and, when the handle
/// exposes a cancel token, a best-effort server-side cancellation of the
/// in-flight query is fired. The query façade passes the timeout error
/// through unchanged, so callers see it as the driver-side condition it is.
pub struct TimeoutHandle<C> {
    inner: C,
    timeout: Duration,
}

impl<C> TimeoutHandle<C> {
    /// Wrap `inner`, bounding each driver call by `timeout`.
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: DbHandle> TimeoutHandle<C> {
    async fn with_timeout<T, F>(&self, future: F) -> DbResult<T>
    where
        F: std::future::Future<Output = DbResult<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                if let Some(cancel_token) = self.inner.cancel_token() {
                    tokio::spawn(async move {
                        let _ = cancel_token.cancel_query(tokio_postgres::NoTls).await;
                    });
                }
                Err(DbError::Timeout(self.timeout))
            }
        }
    }
}

impl<C: DbHandle> DbHandle for TimeoutHandle<C> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<Row>> {
        self.with_timeout(self.inner.query(sql, params)).await
    }

    async fn query_opt(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Option<Row>> {
        self.with_timeout(self.inner.query_opt(sql, params)).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        self.with_timeout(self.inner.execute(sql, params)).await
    }

    fn marker(&self) -> Marker {
        self.inner.marker()
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        self.inner.cancel_token()
    }
}

impl<C: StreamingHandle> StreamingHandle for TimeoutHandle<C> {
    // The timeout bounds stream acquisition; consumption is caller-paced.
    async fn query_stream(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<RowStream> {
        self.with_timeout(self.inner.query_stream(sql, params))
            .await
    }
}
