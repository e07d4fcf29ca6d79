//! User event payloads

use crate::fields::CustomField;
use serde::Deserialize;
use serde_json::Value;

/// USER_CREATED / USER_UPDATED payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEventData {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Arrives as either a number or a string
    #[serde(default)]
    pub mobile: Option<Value>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    #[serde(default)]
    pub tenant_data: Vec<TenantData>,
    #[serde(default)]
    pub cohorts: Vec<CohortAssignment>,
    #[serde(default)]
    pub reason: Option<String>,
    /// USER_LOGIN events carry only userId and this timestamp
    #[serde(default)]
    pub last_login: Option<String>,
}

/// Tenant membership attached to a user event
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantData {
    pub tenant_id: String,
    #[serde(default)]
    pub roles: Vec<TenantRole>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Role assignment inside a tenant membership
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRole {
    pub role_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Cohort/batch assignment attached to a user event
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortAssignment {
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub cohort_member_status: Option<String>,
    #[serde(default)]
    pub academic_year_id: Option<String>,
    #[serde(default)]
    pub cohort_member_id: Option<String>,
}
