//! SQL building and row parsing helpers for the `records` table.

use cap_store::{Condition, RecordFilter, StoreError};
use serde_json::Value;

/// Convert a JSON scalar to the value `json_extract` yields for it.
///
/// Booleans become integers, strings stay text, and arrays or objects
/// compare as their JSON text.
#[must_use]
pub fn to_sql_value(value: &Value) -> libsql::Value {
    match value {
        Value::Null => libsql::Value::Null,
        Value::Bool(b) => libsql::Value::Integer(i64::from(*b)),
        Value::Number(n) => n.as_i64().map_or_else(
            || libsql::Value::Real(n.as_f64().unwrap_or_default()),
            libsql::Value::Integer,
        ),
        Value::String(s) => libsql::Value::Text(s.clone()),
        other => libsql::Value::Text(other.to_string()),
    }
}

fn json_path(field: &str) -> String {
    format!("json_extract(body, '$.{field}')")
}

/// Build the `SELECT` for `list`, returning the SQL and its positional params.
///
/// # Errors
///
/// Returns `StoreError::Corrupt` if a filter field is not a plain identifier.
pub fn list_query(kind: &str, filter: &RecordFilter) -> Result<(String, Vec<libsql::Value>), StoreError> {
    filter.validate()?;
    let mut sql = String::from("SELECT body FROM records WHERE kind = ?");
    let mut params = vec![libsql::Value::Text(kind.to_string())];

    for condition in filter.conditions() {
        let path = json_path(condition.field());
        match condition {
            Condition::Eq { value: Value::Null, .. } | Condition::IsNull { .. } => {
                sql.push_str(&format!(" AND {path} IS NULL"));
            }
            Condition::Eq { value, .. } => {
                sql.push_str(&format!(" AND {path} = ?"));
                params.push(to_sql_value(value));
            }
            Condition::In { values, .. } if values.is_empty() => {
                sql.push_str(" AND 0");
            }
            Condition::In { values, .. } => {
                let placeholders = vec!["?"; values.len()].join(", ");
                sql.push_str(&format!(" AND {path} IN ({placeholders})"));
                params.extend(values.iter().map(to_sql_value));
            }
        }
    }

    sql.push_str(if filter.is_newest_first() {
        " ORDER BY rowid DESC"
    } else {
        " ORDER BY rowid ASC"
    });
    if let Some(limit) = filter.max_results() {
        sql.push_str(" LIMIT ?");
        params.push(libsql::Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
    }
    Ok((sql, params))
}

/// Parse a `body` column into JSON.
///
/// # Errors
///
/// Returns `StoreError::Corrupt` if the column is missing or not valid JSON.
pub fn parse_body(row: &libsql::Row) -> Result<Value, StoreError> {
    let text = row
        .get::<String>(0)
        .map_err(|e| StoreError::Corrupt(format!("body column: {e}")))?;
    Ok(serde_json::from_str(&text)?)
}
