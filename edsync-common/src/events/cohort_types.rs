//! Cohort and cohort-member event payloads

use crate::fields::CustomField;
use serde::Deserialize;
use serde_json::{Map, Value};

/// COHORT_CREATED / COHORT_UPDATED payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortEventData {
    pub cohort_id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Raw cohort classification from the source ("COHORT", "BATCH", ...)
    #[serde(rename = "type", default)]
    pub cohort_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

/// COHORT_MEMBER_CREATED / COHORT_MEMBER_UPDATED payload
///
/// Field names vary between producers; the aliases cover both casings seen
/// on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortMemberEventData {
    #[serde(default)]
    pub cohort_membership_id: Option<String>,
    #[serde(default, alias = "UserID")]
    pub user_id: Option<String>,
    #[serde(default, alias = "CohortID")]
    pub cohort_id: Option<String>,
    #[serde(default, alias = "MemberStatus")]
    pub status: Option<String>,
    #[serde(default, alias = "AcademicYearID")]
    pub academic_year_id: Option<String>,
    /// Direct fields map variant: `{ "fields": { "Subject": "x", ... } }`
    #[serde(default)]
    pub fields: Option<Map<String, Value>>,
    /// Member custom fields use `{ label, value }` pairs, not selectedValues
    #[serde(default)]
    pub custom_fields: Vec<MemberFieldUpdate>,
}

/// One `{ label, value }` pair on a cohort-member event
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberFieldUpdate {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}
