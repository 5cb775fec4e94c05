//! Field predicates over stored record bodies.
//!
//! Only top-level fields are addressable. Field names are restricted to
//! `[a-z_]` so backends can splice them into JSON paths.

use serde_json::Value;

use crate::StoreError;

/// One predicate on a top-level body field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value.
    Eq { field: String, value: Value },
    /// Field is missing or `null`.
    IsNull { field: String },
    /// Field equals any of the values.
    In { field: String, values: Vec<Value> },
}

impl Condition {
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Eq { field, .. } | Self::IsNull { field } | Self::In { field, .. } => field,
        }
    }

    #[must_use]
    pub fn matches(&self, body: &Value) -> bool {
        let actual = body.get(self.field()).unwrap_or(&Value::Null);
        match self {
            Self::Eq { value, .. } => actual == value,
            Self::IsNull { .. } => actual.is_null(),
            Self::In { values, .. } => values.iter().any(|v| v == actual),
        }
    }
}

/// Conjunction of conditions plus ordering and an optional limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    conditions: Vec<Condition>,
    limit: Option<usize>,
    newest_first: bool,
}

impl RecordFilter {
    /// Matches every record.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn is_null(mut self, field: &str) -> Self {
        self.conditions.push(Condition::IsNull {
            field: field.to_string(),
        });
        self
    }

    #[must_use]
    pub fn any_of<V: Into<Value>>(mut self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.conditions.push(Condition::In {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    #[must_use]
    pub const fn max_results(&self) -> Option<usize> {
        self.limit
    }

    #[must_use]
    pub const fn is_newest_first(&self) -> bool {
        self.newest_first
    }

    #[must_use]
    pub fn matches(&self, body: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(body))
    }

    /// Reject field names that are not plain `snake_case` identifiers.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Corrupt` naming the offending field.
    pub fn validate(&self) -> Result<(), StoreError> {
        for condition in &self.conditions {
            let field = condition.field();
            if field.is_empty() || !field.bytes().all(|b| b.is_ascii_lowercase() || b == b'_') {
                return Err(StoreError::Corrupt(format!("invalid filter field '{field}'")));
            }
        }
        Ok(())
    }
}
