use crate::error::SqlExecutorError;
use crate::queueable::Produce;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::RowValues;

type Extract<T> = fn(Option<&CustomDbRow>, &[String]) -> T;

/// `SELECT` of one or more columns, resolved from the first returned row.
///
/// An absent row resolves to `None`; a column missing from a present row reads as
/// `RowValues::Null`.
#[derive(Clone)]
pub struct Lookup<T> {
    query: String,
    columns: Vec<String>,
    extract: Extract<T>,
}

impl<T> Lookup<T> {
    fn build(table: &str, columns: Vec<String>, predicate: &str, extract: Extract<T>) -> Self {
        let mut query = format!("SELECT {} FROM {table}", columns.join(","));
        let predicate = predicate.trim();
        if !predicate.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(predicate);
        }
        Self {
            query,
            columns,
            extract,
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Lookup<Option<RowValues>> {
    /// Look up a single column. An empty `predicate` omits the `WHERE` clause.
    #[must_use]
    pub fn value(table: &str, column: impl Into<String>, predicate: &str) -> Self {
        Self::build(table, vec![column.into()], predicate, |row, columns| {
            row.map(|row| column_value(row, &columns[0]))
        })
    }
}

impl Lookup<Option<Vec<RowValues>>> {
    /// Look up several columns, resolving to their values in request order.
    #[must_use]
    pub fn values<S: Into<String>>(
        table: &str,
        columns: impl IntoIterator<Item = S>,
        predicate: &str,
    ) -> Self {
        let columns = columns.into_iter().map(Into::into).collect();
        Self::build(table, columns, predicate, |row, columns| {
            row.map(|row| columns.iter().map(|c| column_value(row, c)).collect())
        })
    }
}

impl<T> std::fmt::Debug for Lookup<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lookup")
            .field("query", &self.query)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

fn column_value(row: &CustomDbRow, column: &str) -> RowValues {
    row.get(column).cloned().unwrap_or(RowValues::Null)
}

impl<T: Send + 'static> Produce for Lookup<T> {
    type Output = T;

    fn query(&self) -> Result<String, SqlExecutorError> {
        if self.columns.is_empty() {
            return Err(SqlExecutorError::BuildError(
                "Lookup needs at least one column".into(),
            ));
        }
        Ok(self.query.clone())
    }

    fn produce(&self, results: &[ResultSet]) -> Result<T, SqlExecutorError> {
        let row = results.first().and_then(ResultSet::first);
        Ok((self.extract)(row, &self.columns))
    }
}
