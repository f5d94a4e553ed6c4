use crate::error::SqlExecutorError;
use crate::literal::value_of;
use crate::queueable::Produce;
use crate::results::ResultSet;

use super::record::Record;

/// Outcome of an `Insert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertResult {
    pub affected_rows: usize,
}

/// Multi-row `INSERT` into one table. The first row (or an explicit field list) fixes the
/// column order; later rows are rendered in that order.
#[derive(Debug, Clone)]
pub struct Insert {
    table: String,
    fields: Vec<String>,
    values: Vec<String>,
}

impl Insert {
    fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_fields<S: Into<String>>(
        table: impl Into<String>,
        fields: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut insert = Self::new(table);
        insert.fields = fields.into_iter().map(Into::into).collect();
        insert
    }

    /// # Errors
    /// See [`Insert::add_row`].
    pub fn from_row(table: impl Into<String>, row: &Record) -> Result<Self, SqlExecutorError> {
        let mut insert = Self::new(table);
        insert.add_row(row)?;
        Ok(insert)
    }

    /// # Errors
    /// See [`Insert::add_row`].
    pub fn from_rows<'a>(
        table: impl Into<String>,
        rows: impl IntoIterator<Item = &'a Record>,
    ) -> Result<Self, SqlExecutorError> {
        let mut insert = Self::new(table);
        insert.add_rows(rows)?;
        Ok(insert)
    }

    /// Render `row` into the pending VALUES list.
    ///
    /// # Errors
    /// `BuildError` if the row has no fields or lacks one of the fixed fields;
    /// `UnsupportedType` if a value cannot be rendered as a literal.
    pub fn add_row(&mut self, row: &Record) -> Result<(), SqlExecutorError> {
        // The first successfully rendered row fixes the column order.
        let derived: Option<Vec<String>> = self
            .fields
            .is_empty()
            .then(|| row.field_names().map(str::to_string).collect());
        let fields = derived.as_deref().unwrap_or(&self.fields);
        if fields.is_empty() {
            return Err(SqlExecutorError::BuildError(
                "Cannot insert a row without fields".into(),
            ));
        }
        let rendered = render_row(&self.table, fields, row)?;
        if let Some(derived) = derived {
            self.fields = derived;
        }
        self.values.push(rendered);
        Ok(())
    }

    /// # Errors
    /// See [`Insert::add_row`]; rows before the failing one stay added.
    pub fn add_rows<'a>(
        &mut self,
        rows: impl IntoIterator<Item = &'a Record>,
    ) -> Result<(), SqlExecutorError> {
        for row in rows {
            self.add_row(row)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.values.len()
    }
}

fn render_row(table: &str, fields: &[String], row: &Record) -> Result<String, SqlExecutorError> {
    let rendered = fields
        .iter()
        .map(|field| {
            row.get(field)
                .ok_or_else(|| {
                    SqlExecutorError::BuildError(format!("row for {table} is missing field {field}"))
                })
                .and_then(value_of)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("({})", rendered.join(",")))
}

impl Produce for Insert {
    type Output = InsertResult;

    fn query(&self) -> Result<String, SqlExecutorError> {
        if self.values.is_empty() {
            return Err(SqlExecutorError::BuildError(
                "Insert has no rows to insert".into(),
            ));
        }
        Ok(format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table,
            self.fields.join(","),
            self.values.join(",")
        ))
    }

    fn produce(&self, results: &[ResultSet]) -> Result<InsertResult, SqlExecutorError> {
        let result = results.first().ok_or(SqlExecutorError::ResultsExhausted {
            offset: 0,
            available: 0,
        })?;
        Ok(InsertResult {
            affected_rows: result.rows_affected,
        })
    }
}
