//! Convenient imports for common functionality.

pub use crate::error::SqlExecutorError;
pub use crate::executor::{
    ExecutorOptions, ExecutorOptionsBuilder, JobHandle, RetryPolicy, SqlExecutor, Submission,
};
pub use crate::literal::value_of;
pub use crate::queryable::{DisconnectListener, DisconnectNotifier, Queryable};
pub use crate::queueable::{Produce, Queueable, Statement, StatementHandle};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::statements::{Insert, InsertResult, Lookup, RawStatement, Record};
pub use crate::types::RowValues;

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteOptions, SqliteOptionsBuilder, SqliteQueryable};
