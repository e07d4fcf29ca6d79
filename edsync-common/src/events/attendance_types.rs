//! Attendance event payloads

use serde::Deserialize;
use serde_json::{Map, Value};

/// ATTENDANCE_CREATED / ATTENDANCE_UPDATED payload
///
/// One event records one person's attendance for one absolute date within
/// one context (center, batch, event, ...).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEventData {
    pub user_id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub context_id: Option<String>,
    #[serde(default)]
    pub attendance_date: Value,
    #[serde(default)]
    pub attendance: Option<String>,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub latitude: Option<Value>,
    #[serde(default)]
    pub longitude: Option<Value>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub late_mark: Option<Value>,
    #[serde(default)]
    pub absent_reason: Option<String>,
    #[serde(default)]
    pub valid_location: Option<Value>,
    /// Free-form metadata merged into the day value; fixed attributes win
    /// on key collision
    #[serde(default)]
    pub meta_data: Option<Map<String, Value>>,
}
