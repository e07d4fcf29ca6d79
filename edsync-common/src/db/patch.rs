//! Typed column patches
//!
//! A [`RowPatch`] is a mapping from allow-listed column name to typed value,
//! assembled at transform time and rendered into parameterized SQL by the
//! store. Column names come from the entity's static allow-list, never from
//! inbound data, so dynamic SET/INSERT clauses cannot smuggle in arbitrary
//! identifiers.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::query::Query;

/// A typed value destined for one destination column
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
    /// Serialized to JSON text on bind
    Json(Value),
    /// Day-only column, bound as `YYYY-MM-DD`
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Optional text helper: `None` becomes SQL NULL
    pub fn opt_text(value: Option<String>) -> Self {
        match value {
            Some(s) => SqlValue::Text(s),
            None => SqlValue::Null,
        }
    }

    /// Optional boolean helper
    pub fn opt_bool(value: Option<bool>) -> Self {
        match value {
            Some(b) => SqlValue::Bool(b),
            None => SqlValue::Null,
        }
    }

    /// Optional integer helper
    pub fn opt_integer(value: Option<i64>) -> Self {
        match value {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Null,
        }
    }

    /// Optional timestamp helper
    pub fn opt_timestamp(value: Option<DateTime<Utc>>) -> Self {
        match value {
            Some(ts) => SqlValue::Timestamp(ts),
            None => SqlValue::Null,
        }
    }

    /// Bind this value onto a sqlx query
    pub fn bind_to<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Integer(i) => query.bind(*i),
            SqlValue::Real(r) => query.bind(*r),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Json(v) => query.bind(v.to_string()),
            SqlValue::Date(d) => query.bind(d.format("%Y-%m-%d").to_string()),
            SqlValue::Timestamp(ts) => query.bind(*ts),
        }
    }
}

/// An ordered set of (column, value) assignments validated against a static
/// allow-list
#[derive(Debug, Clone)]
pub struct RowPatch {
    allowed: &'static [&'static str],
    columns: Vec<(&'static str, SqlValue)>,
}

impl RowPatch {
    pub fn new(allowed: &'static [&'static str]) -> Self {
        Self {
            allowed,
            columns: Vec::new(),
        }
    }

    /// Set a column value; rejects columns outside the allow-list.
    /// Setting the same column twice replaces the earlier value.
    pub fn set(&mut self, column: &str, value: SqlValue) -> Result<()> {
        let name = self
            .allowed
            .iter()
            .find(|c| **c == column)
            .copied()
            .ok_or_else(|| {
                Error::Internal(format!("column '{}' is not allow-listed", column))
            })?;

        if let Some(entry) = self.columns.iter_mut().find(|(c, _)| *c == name) {
            entry.1 = value;
        } else {
            self.columns.push((name, value));
        }
        Ok(())
    }

    /// Set a column only when it is allow-listed; returns whether it was
    pub fn try_set(&mut self, column: &str, value: SqlValue) -> bool {
        self.set(column, value).is_ok()
    }

    /// Whether a column already carries a non-null value
    pub fn has_value(&self, column: &str) -> bool {
        self.columns
            .iter()
            .any(|(c, v)| *c == column && *v != SqlValue::Null)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(c, _)| *c)
    }

    pub fn values(&self) -> impl Iterator<Item = &SqlValue> + '_ {
        self.columns.iter().map(|(_, v)| v)
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v)
    }

    /// Remove a column from the patch, returning its value
    pub fn remove(&mut self, column: &str) -> Option<SqlValue> {
        let idx = self.columns.iter().position(|(c, _)| *c == column)?;
        Some(self.columns.remove(idx).1)
    }

    /// `"col1" = ?, "col2" = ?` fragments for an UPDATE statement
    pub fn set_clause(&self) -> String {
        self.columns
            .iter()
            .map(|(c, _)| format!("\"{}\" = ?", c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `"col1", "col2"` fragment for an INSERT column list
    pub fn insert_columns(&self) -> String {
        self.columns
            .iter()
            .map(|(c, _)| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `?, ?` placeholder fragment matching the column count
    pub fn placeholders(&self) -> String {
        vec!["?"; self.columns.len()].join(", ")
    }

    /// Bind every value in column order
    pub fn bind_all<'q>(
        &self,
        mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        for (_, value) in &self.columns {
            query = value.bind_to(query);
        }
        query
    }
}
