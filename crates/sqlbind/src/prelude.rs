//! Convenient imports for typical `sqlbind` usage.
//!
//! ```ignore
//! use sqlbind::prelude::*;
//! ```

pub use crate::{
    BoundStatement, DbClient, DbError, DbHandle, DbResult, FieldMap, Marker, ParsedSql, RowCursor,
    SqlArgs, SqlValue, StreamingHandle, TimeoutHandle, bind, connect, scan_sql,
};

#[cfg(feature = "pool")]
pub use crate::{create_pool, create_pool_with_config};
