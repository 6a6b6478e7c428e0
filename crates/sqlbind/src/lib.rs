//! # sqlbind
//!
//! Named-placeholder SQL binding and a typed query façade for Postgres.
//!
//! ## Features
//!
//! - **Named placeholders**: write `@name` in SQL and bind a name→value map
//! - **Positional placeholders**: write `@p1`, `@p2`, ... and bind an ordered list
//! - **Quote-aware rewriting**: `@` inside single-quoted literals is left alone,
//!   `@@name` escapes to a literal `@name`
//! - **Typed results**: rows come back as maps of tagged [`SqlValue`]s with
//!   explicit NULL handling
//! - **Result shaping**: scalar, existence, single row, all rows, a lazy row
//!   cursor, and affected-row-checked execution
//! - **Handle-agnostic**: works with a direct client, a transaction, or a
//!   pooled client through the [`DbHandle`] trait
//!
//! ## Quick start
//!
//! ```ignore
//! use sqlbind::{DbClient, SqlArgs};
//!
//! let db = DbClient::new(sqlbind::connect(&database_url).await?);
//!
//! db.execute(
//!     "INSERT INTO users(username, email) VALUES (@username, @email)",
//!     &SqlArgs::named([("username", "alice"), ("email", "alice@example.com")]),
//! )
//! .await?;
//!
//! let row = db
//!     .get("SELECT * FROM users WHERE username=@p1", &SqlArgs::positional(["alice"]))
//!     .await?;
//! ```
//!
//! Binding failures (`DbError::Bind`) are detected before any driver call;
//! `sized_execute` mismatches surface as `DbError::Assertion`; everything
//! else is a driver-side error annotated with the rewritten SQL and the
//! parameter count, never parameter values.

pub mod args;
pub mod client;
pub mod cursor;
pub mod db_client;
pub mod error;
pub mod row;
pub mod scan;
pub mod timeout;
pub mod value;

pub use args::{BoundStatement, SqlArgs, bind};
pub use client::{DbHandle, RowStream, StreamingHandle, connect};
pub use cursor::RowCursor;
pub use db_client::DbClient;
pub use error::{DbError, DbResult};
pub use row::{FieldMap, row_to_field_map};
pub use scan::{Marker, ParsedSql, scan_sql};
pub use timeout::TimeoutHandle;
pub use value::SqlValue;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};

pub mod prelude;
