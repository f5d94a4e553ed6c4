use crate::error::SqlExecutorError;
use crate::queueable::Produce;
use crate::results::ResultSet;

/// Caller-written SQL declaring how many statements it contains. Resolves to its own
/// slice of result sets.
#[derive(Debug, Clone)]
pub struct RawStatement {
    sql: String,
    statement_count: usize,
}

impl RawStatement {
    /// A single statement.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self::with_count(sql, 1)
    }

    /// `sql` expands to `statement_count` statements (and as many result sets).
    #[must_use]
    pub fn with_count(sql: impl Into<String>, statement_count: usize) -> Self {
        Self {
            sql: sql.into(),
            statement_count,
        }
    }
}

impl Produce for RawStatement {
    type Output = Vec<ResultSet>;

    fn query(&self) -> Result<String, SqlExecutorError> {
        if self.sql.trim().is_empty() {
            return Err(SqlExecutorError::BuildError("empty SQL statement".into()));
        }
        if self.statement_count == 0 {
            return Err(SqlExecutorError::BuildError(
                "statement count must be at least 1".into(),
            ));
        }
        Ok(self.sql.clone())
    }

    fn statement_count(&self) -> usize {
        self.statement_count
    }

    fn produce(&self, results: &[ResultSet]) -> Result<Vec<ResultSet>, SqlExecutorError> {
        Ok(results.to_vec())
    }
}
