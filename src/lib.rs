//! Batch independent SQL-producing statements into as few round trips as possible over
//! one shared connection, resolving each statement's own typed result.
//!
//! Callers build statements ([`statements::Insert`], [`statements::Lookup`],
//! [`statements::RawStatement`], or any [`queueable::Produce`] implementation), submit
//! them singly or as ordered batches to an [`executor::SqlExecutor`], and await the
//! per-statement handles. The executor runs one job at a time in submission order.

pub mod error;
pub mod executor;
pub mod literal;
pub mod prelude;
pub mod queryable;
pub mod queueable;
pub mod results;
pub mod statements;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::SqlExecutorError;
pub use executor::{ExecutorOptions, JobHandle, SqlExecutor, Submission};
pub use literal::value_of;
