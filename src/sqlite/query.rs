use std::sync::Arc;

use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::types::Value;
use rusqlite::{Batch, Connection, Statement};

use crate::error::SqlExecutorError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlExecutorError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, SqlExecutorError> {
    let value: Value = row.get(idx)?;
    match value {
        Value::Null => Ok(RowValues::Null),
        Value::Integer(i) => Ok(RowValues::Int(i)),
        Value::Real(f) => Ok(RowValues::Float(f)),
        Value::Text(s) => Ok(RowValues::Text(s)),
        Value::Blob(b) => Ok(RowValues::Blob(b)),
    }
}

/// Run every statement in `sql` and return one `ResultSet` per statement.
///
/// Row-returning statements yield their rows; everything else yields `rows_affected`.
///
/// # Errors
/// Returns `SqlExecutorError::SqliteError` for the first statement that fails; earlier
/// statements stay applied.
pub fn execute_script(conn: &Connection, sql: &str) -> Result<Vec<ResultSet>, SqlExecutorError> {
    let mut batch = Batch::new(conn, sql);
    let mut results = Vec::new();
    while let Some(mut stmt) = batch.next()? {
        results.push(statement_result(&mut stmt)?);
    }
    Ok(results)
}

fn statement_result(stmt: &mut Statement<'_>) -> Result<ResultSet, SqlExecutorError> {
    if stmt.column_count() == 0 {
        let affected = stmt.execute([])?;
        return Ok(ResultSet::affected(affected));
    }
    build_result_set(stmt)
}

/// Build a result set from a row-returning `SQLite` statement.
///
/// # Errors
/// Returns `SqlExecutorError` if query execution or value extraction fails.
pub fn build_result_set(stmt: &mut Statement<'_>) -> Result<ResultSet, SqlExecutorError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows_iter = stmt.query([])?;
    while let Some(row) = rows_iter.next()? {
        let row_values = (0..col_count)
            .map(|i| sqlite_extract_value_sync(row, i))
            .collect::<Result<Vec<_>, _>>()?;
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}
