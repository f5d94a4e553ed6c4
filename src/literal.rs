//! Rendering of scalar values as SQL literal text.

use crate::error::SqlExecutorError;
use crate::types::RowValues;

/// Render a scalar as SQL literal syntax.
///
/// Numbers render as decimal text, booleans as `1`/`0`, and text is single-quoted with
/// embedded quotes doubled. Any other value is rejected.
///
/// ```rust
/// use sql_batch_executor::prelude::*;
///
/// assert_eq!(value_of(&RowValues::Bool(true)).unwrap(), "1");
/// assert_eq!(value_of(&RowValues::Int(3)).unwrap(), "3");
/// assert_eq!(value_of(&RowValues::Text("hi".into())).unwrap(), "'hi'");
/// assert!(value_of(&RowValues::Null).is_err());
/// ```
///
/// # Errors
/// Returns `SqlExecutorError::UnsupportedType` naming the variant for `Null`, `JSON`,
/// `Blob`, or a non-finite float.
pub fn value_of(value: &RowValues) -> Result<String, SqlExecutorError> {
    match value {
        RowValues::Int(i) => Ok(i.to_string()),
        RowValues::Float(f) if f.is_finite() => Ok(f.to_string()),
        RowValues::Float(f) => Err(SqlExecutorError::UnsupportedType(format!(
            "non-finite float {f}"
        ))),
        RowValues::Text(s) => Ok(quote(s)),
        RowValues::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
        other => Err(SqlExecutorError::UnsupportedType(other.type_name().to_string())),
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}
