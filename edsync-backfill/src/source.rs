//! Source snapshot types
//!
//! Backfill inputs are NDJSON exports of the source stores (relational
//! rows and document-store documents), one record per line. Decode
//! failures skip the line with a warning instead of aborting the file.

use edsync_common::coerce::to_text;
use edsync_common::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

/// Read an NDJSON snapshot file; returns the decoded rows and the number
/// of lines skipped
pub fn read_ndjson<T: DeserializeOwned>(path: &Path) -> Result<(Vec<T>, usize)> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(row) => rows.push(row),
            Err(err) => {
                warn!("Skipping undecodable line {} of {}: {}", idx + 1, path.display(), err);
                skipped += 1;
            }
        }
    }

    Ok((rows, skipped))
}

/// Core cohort row from the source store
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCohort {
    pub cohort_id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// One row of the source field-values table
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFieldValue {
    pub item_id: String,
    pub field_id: String,
    #[serde(default)]
    pub value: Value,
}

/// Field values indexed by owning item, with first-or-self extraction
#[derive(Debug, Default)]
pub struct FieldValueSet {
    by_item: HashMap<String, Vec<SourceFieldValue>>,
}

impl FieldValueSet {
    pub fn load(path: &Path) -> Result<(Self, usize)> {
        let (rows, skipped) = read_ndjson::<SourceFieldValue>(path)?;
        Ok((Self::from_rows(rows), skipped))
    }

    pub fn from_rows(rows: Vec<SourceFieldValue>) -> Self {
        let mut by_item: HashMap<String, Vec<SourceFieldValue>> = HashMap::new();
        for row in rows {
            by_item.entry(row.item_id.clone()).or_default().push(row);
        }
        Self { by_item }
    }

    pub fn values_for(&self, item_id: &str) -> &[SourceFieldValue] {
        self.by_item
            .get(item_id)
            .map(|rows| rows.as_slice())
            .unwrap_or(&[])
    }

    /// First field value for (item, field) as text; array values yield
    /// their first element
    pub fn first_value(&self, item_id: &str, field_id: &str) -> Option<String> {
        let row = self
            .values_for(item_id)
            .iter()
            .find(|row| row.field_id == field_id)?;
        first_or_self(&row.value)
    }
}

/// Source arrays carry one logical answer; take the first element, then
/// coerce to text
pub fn first_or_self(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.first().and_then(to_text),
        other => to_text(other),
    }
}

/// Cohort membership row joined with its academic year
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCohortMember {
    pub cohort_membership_id: String,
    pub cohort_id: String,
    pub user_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub academic_year_id: Option<String>,
}

/// Registration row from the tenant/role mapping join
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRegistration {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub role_id: Option<String>,
    #[serde(default)]
    pub tenant_regn_date: Option<String>,
    #[serde(default)]
    pub role_assigned_date: Option<String>,
}

/// Solution document from the project source store
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSolution {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub scope: Option<SolutionScope>,
    #[serde(default)]
    pub start_date: Option<Value>,
    #[serde(default)]
    pub end_date: Option<Value>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
}

/// Scope attributes arrive as single values or arrays
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionScope {
    #[serde(default)]
    pub board: Option<Value>,
    #[serde(default)]
    pub medium: Option<Value>,
    #[serde(default)]
    pub subject: Option<Value>,
    #[serde(default, rename = "class")]
    pub grade: Option<Value>,
    #[serde(default)]
    pub course_type: Option<Value>,
}

/// Project document carrying the task tree (and optionally its cohort)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceProjectDoc {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub solution_id: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub tasks: Vec<edsync_common::events::TaskNode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_or_self() {
        assert_eq!(first_or_self(&json!(["a", "b"])), Some("a".to_string()));
        assert_eq!(first_or_self(&json!("c")), Some("c".to_string()));
        assert_eq!(first_or_self(&json!([])), None);
        assert_eq!(first_or_self(&json!(null)), None);
    }

    #[test]
    fn test_field_value_set_lookup() {
        let set = FieldValueSet::from_rows(vec![
            SourceFieldValue {
                item_id: "c-1".into(),
                field_id: "f-1".into(),
                value: json!(["regular"]),
            },
            SourceFieldValue {
                item_id: "c-1".into(),
                field_id: "f-2".into(),
                value: json!("CBSE"),
            },
        ]);

        assert_eq!(set.first_value("c-1", "f-1"), Some("regular".to_string()));
        assert_eq!(set.first_value("c-1", "f-2"), Some("CBSE".to_string()));
        assert_eq!(set.first_value("c-1", "f-3"), None);
        assert_eq!(set.first_value("c-2", "f-1"), None);
    }

    #[test]
    fn test_read_ndjson_skips_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.ndjson");
        std::fs::write(
            &path,
            "{\"itemId\":\"i-1\",\"fieldId\":\"f-1\",\"value\":\"x\"}\nnot json\n\n",
        )
        .unwrap();

        let (rows, skipped) = read_ndjson::<SourceFieldValue>(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(skipped, 1);
    }
}
