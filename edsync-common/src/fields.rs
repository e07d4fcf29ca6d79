//! Custom-field resolution
//!
//! Source entities (users, cohorts) carry an open-ended `customFields`
//! sequence. Each field is self-describing: a stable `fieldId`, a display
//! `label`, and a `selectedValues` list whose entries are either plain
//! strings or reference objects. Resolution extracts a single string value
//! per field and never fails: malformed input degrades to `None`.
//!
//! Multi-valued answers are deliberately lossy: only the first selected
//! value is consumed. Downstream consumers depend on first-wins behavior.

use crate::uuid_utils::is_uuid;
use serde::Deserialize;
use serde_json::Value;

/// One custom field attached to a source entity
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    #[serde(default)]
    pub field_id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub selected_values: Vec<SelectedValue>,
}

/// One selected value of a custom field
///
/// The wire format mixes plain strings with reference objects; anything
/// else (numbers, booleans, nested arrays) resolves to nothing.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SelectedValue {
    Text(String),
    Reference {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        value: Option<Value>,
        #[serde(default)]
        uuid: Option<String>,
        #[serde(default)]
        identifier: Option<String>,
    },
    Other(Value),
}

impl SelectedValue {
    fn value_as_string(value: &Option<Value>) -> Option<String> {
        match value {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// Resolution used for label lookups: plain strings verbatim,
    /// reference objects yield their `id`.
    fn resolve_for_label(&self) -> Option<String> {
        match self {
            SelectedValue::Text(s) => Some(s.clone()),
            SelectedValue::Reference { id, .. } => id.clone(),
            SelectedValue::Other(_) => None,
        }
    }

    /// Resolution used for fieldId lookups: plain strings verbatim,
    /// reference objects yield `value` falling back to `id`.
    fn resolve_for_field_id(&self) -> Option<String> {
        match self {
            SelectedValue::Text(s) => Some(s.clone()),
            SelectedValue::Reference { id, value, .. } => {
                Self::value_as_string(value).or_else(|| id.clone())
            }
            SelectedValue::Other(_) => None,
        }
    }

    /// Resolution used when a UUID is required: `id`, `uuid`, `value`,
    /// `identifier` in that order, each accepted only if it parses as a UUID.
    fn resolve_uuid(&self) -> Option<String> {
        let candidates: Vec<Option<String>> = match self {
            SelectedValue::Text(s) => vec![Some(s.clone())],
            SelectedValue::Reference {
                id,
                value,
                uuid,
                identifier,
            } => vec![
                id.clone(),
                uuid.clone(),
                Self::value_as_string(value),
                identifier.clone(),
            ],
            SelectedValue::Other(_) => return None,
        };
        candidates
            .into_iter()
            .flatten()
            .find(|c| is_uuid(c))
            .map(|c| c.trim().to_string())
    }
}

/// Resolve a custom field by exact (case-sensitive) label match.
///
/// First matching field wins; a match with empty `selectedValues` resolves
/// to `None` rather than falling through to a later field.
pub fn resolve_by_label(fields: &[CustomField], label: &str) -> Option<String> {
    let field = fields.iter().find(|f| f.label.as_deref() == Some(label))?;
    field.selected_values.first()?.resolve_for_label()
}

/// Resolve a custom field by its stable field identifier.
pub fn resolve_by_field_id(fields: &[CustomField], field_id: &str) -> Option<String> {
    let field = fields
        .iter()
        .find(|f| f.field_id.as_deref() == Some(field_id))?;
    field.selected_values.first()?.resolve_for_field_id()
}

/// Resolve a custom field to a UUID string, for reference-typed columns.
pub fn resolve_uuid_by_field_id(fields: &[CustomField], field_id: &str) -> Option<String> {
    let field = fields
        .iter()
        .find(|f| f.field_id.as_deref() == Some(field_id))?;
    field.selected_values.first()?.resolve_uuid()
}
