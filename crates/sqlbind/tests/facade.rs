//! Façade behavior tests using a fake driver handle.
//!
//! These run without a database: the fake handle serves empty result sets
//! and canned affected-row counts, which is enough to pin down binding
//! short-circuits, error kinds, and empty-result shaping.

use sqlbind::{
    DbClient, DbError, DbHandle, DbResult, RowStream, SqlArgs, StreamingHandle, TimeoutHandle,
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

#[derive(Clone, Copy)]
enum FailKind {
    Connection,
    Timeout,
}

struct FakeHandle {
    affected: u64,
    fail_with: Option<FailKind>,
    calls: AtomicUsize,
    last_sql: Mutex<Option<String>>,
}

impl FakeHandle {
    fn new() -> Self {
        Self {
            affected: 0,
            fail_with: None,
            calls: AtomicUsize::new(0),
            last_sql: Mutex::new(None),
        }
    }

    fn with_affected(affected: u64) -> Self {
        Self {
            affected,
            ..Self::new()
        }
    }

    fn failing(kind: FailKind) -> Self {
        Self {
            fail_with: Some(kind),
            ..Self::new()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_sql(&self) -> Option<String> {
        self.last_sql.lock().unwrap().clone()
    }

    fn record(&self, sql: &str) -> DbResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_sql.lock().unwrap() = Some(sql.to_string());
        match self.fail_with {
            Some(FailKind::Connection) => {
                Err(DbError::Connection("connection refused".to_string()))
            }
            Some(FailKind::Timeout) => Err(DbError::Timeout(Duration::from_millis(10))),
            None => Ok(()),
        }
    }
}

impl DbHandle for FakeHandle {
    async fn query(&self, sql: &str, _params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<Row>> {
        self.record(sql)?;
        Ok(Vec::new())
    }

    async fn query_opt(&self, sql: &str, _params: &[&(dyn ToSql + Sync)]) -> DbResult<Option<Row>> {
        self.record(sql)?;
        Ok(None)
    }

    async fn execute(&self, sql: &str, _params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        self.record(sql)?;
        Ok(self.affected)
    }
}

impl StreamingHandle for FakeHandle {
    async fn query_stream(
        &self,
        sql: &str,
        _params: &[&(dyn ToSql + Sync)],
    ) -> DbResult<RowStream> {
        self.record(sql)?;
        Ok(RowStream::new(futures_util::stream::empty()))
    }
}

struct SlowHandle;

impl DbHandle for SlowHandle {
    async fn query(&self, _sql: &str, _params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<Row>> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(Vec::new())
    }

    async fn query_opt(
        &self,
        _sql: &str,
        _params: &[&(dyn ToSql + Sync)],
    ) -> DbResult<Option<Row>> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(None)
    }

    async fn execute(&self, _sql: &str, _params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(0)
    }
}

#[tokio::test]
async fn binding_error_skips_the_driver() {
    let handle = FakeHandle::new();
    let db = DbClient::new(&handle);

    let err = db
        .scalar(
            "SELECT * FROM t WHERE id=@id",
            &SqlArgs::positional([1_i64]),
        )
        .await
        .unwrap_err();
    assert!(err.is_bind());
    assert_eq!(handle.calls(), 0);
}

#[tokio::test]
async fn missing_named_key_skips_the_driver() {
    let handle = FakeHandle::new();
    let db = DbClient::new(&handle);

    let err = db
        .execute(
            "DELETE FROM t WHERE a=@a AND b=@b",
            &SqlArgs::named([("a", 1_i64)]),
        )
        .await
        .unwrap_err();
    assert!(err.is_bind());
    assert_eq!(handle.calls(), 0);
}

#[tokio::test]
async fn rewritten_sql_reaches_the_driver() {
    let handle = FakeHandle::new();
    let db = DbClient::new(&handle);

    db.execute(
        "DELETE FROM t WHERE id=@id AND vc=@vc",
        &SqlArgs::named([("id", 1_i64), ("vc", 2_i64)]),
    )
    .await
    .unwrap();

    assert_eq!(
        handle.last_sql().as_deref(),
        Some("DELETE FROM t WHERE id=$1 AND vc=$2")
    );
}

#[tokio::test]
async fn scalar_on_empty_result_is_none() {
    let handle = FakeHandle::new();
    let db = DbClient::new(&handle);

    let value = db.scalar("SELECT id FROM t", &SqlArgs::none()).await.unwrap();
    assert!(value.is_none());
    assert_eq!(handle.calls(), 1);
}

#[tokio::test]
async fn exists_on_empty_result_is_false() {
    let handle = FakeHandle::new();
    let db = DbClient::new(&handle);

    assert!(!db.exists("SELECT id FROM t", &SqlArgs::none()).await.unwrap());
}

#[tokio::test]
async fn get_on_empty_result_is_none() {
    let handle = FakeHandle::new();
    let db = DbClient::new(&handle);

    let row = db.get("SELECT * FROM t", &SqlArgs::none()).await.unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn slice_get_on_empty_result_is_empty() {
    let handle = FakeHandle::new();
    let db = DbClient::new(&handle);

    let rows = db.slice_get("SELECT * FROM t", &SqlArgs::none()).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn execute_reports_the_affected_count() {
    let handle = FakeHandle::with_affected(3);
    let db = DbClient::new(&handle);

    let affected = db
        .execute("UPDATE t SET a=@p1", &SqlArgs::positional([1_i64]))
        .await
        .unwrap();
    assert_eq!(affected, 3);
}

#[tokio::test]
async fn sized_execute_accepts_a_matching_count() {
    let handle = FakeHandle::with_affected(1);
    let db = DbClient::new(&handle);

    db.sized_execute(1, "DELETE FROM t WHERE id=@p1", &SqlArgs::positional([1_i64]))
        .await
        .unwrap();
}

#[tokio::test]
async fn sized_execute_mismatch_is_an_assertion_error() {
    let handle = FakeHandle::with_affected(1);
    let db = DbClient::new(&handle);

    let err = db
        .sized_execute(2, "DELETE FROM t WHERE id=@p1", &SqlArgs::positional([1_i64]))
        .await
        .unwrap_err();
    match err {
        DbError::Assertion { expected, actual } => {
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
        }
        other => panic!("expected Assertion, got {other:?}"),
    }
}

#[tokio::test]
async fn driver_errors_carry_statement_context() {
    let handle = FakeHandle::failing(FailKind::Connection);
    let db = DbClient::new(&handle);

    let err = db
        .scalar("SELECT a FROM t WHERE id=@p1", &SqlArgs::positional([1_i64]))
        .await
        .unwrap_err();
    match err {
        DbError::Statement {
            sql, param_count, ..
        } => {
            assert_eq!(sql, "SELECT a FROM t WHERE id=$1");
            assert_eq!(param_count, 1);
        }
        other => panic!("expected Statement, got {other:?}"),
    }
}

#[tokio::test]
async fn driver_timeouts_pass_through_unwrapped() {
    let handle = FakeHandle::failing(FailKind::Timeout);
    let db = DbClient::new(&handle);

    let err = db.scalar("SELECT 1", &SqlArgs::none()).await.unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn cursor_over_empty_stream_ends_and_close_is_idempotent() {
    let handle = FakeHandle::new();
    let db = DbClient::new(&handle);

    let mut cursor = db.rows("SELECT * FROM t", &SqlArgs::none()).await.unwrap();
    assert!(cursor.next().await.is_none());
    assert!(cursor.is_closed());

    cursor.close();
    cursor.close();
    assert!(cursor.next().await.is_none());
}

#[tokio::test]
async fn timeout_handle_bounds_slow_queries() {
    let db = DbClient::new(TimeoutHandle::new(SlowHandle, Duration::from_millis(10)));

    let err = db.scalar("SELECT 1", &SqlArgs::none()).await.unwrap_err();
    assert!(err.is_timeout());
}
