//! Destination row models and transform output records

use crate::db::patch::RowPatch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Reconciled outcome of one natural-key operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// A transformed user: fixed identity plus mapped destination columns
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: String,
    pub columns: RowPatch,
}

/// A transformed cohort: core identity columns plus mapped field columns
#[derive(Debug, Clone)]
pub struct CohortRecord {
    pub cohort_id: String,
    pub tenant_id: Option<String>,
    pub cohort_name: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub parent_id: Option<String>,
    pub fields: RowPatch,
}

/// Cohort row read back from the destination
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CohortRow {
    #[sqlx(rename = "CohortID")]
    pub cohort_id: String,
    #[sqlx(rename = "TenantID")]
    pub tenant_id: Option<String>,
    #[sqlx(rename = "CohortName")]
    pub cohort_name: Option<String>,
    #[sqlx(rename = "ParentID")]
    pub parent_id: Option<String>,
    #[sqlx(rename = "Type")]
    pub cohort_type: Option<String>,
    #[sqlx(rename = "Status")]
    pub status: Option<String>,
}

/// A transformed cohort membership
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortMemberRecord {
    pub cohort_member_id: Option<String>,
    pub user_id: String,
    pub cohort_id: String,
    pub member_status: String,
    pub academic_year_id: Option<String>,
}

/// CohortMember row read back from the destination
#[derive(Debug, Clone, FromRow)]
pub struct CohortMemberRow {
    #[sqlx(rename = "CohortMemberID")]
    pub cohort_member_id: String,
    #[sqlx(rename = "UserID")]
    pub user_id: String,
    #[sqlx(rename = "CohortID")]
    pub cohort_id: String,
    #[sqlx(rename = "MemberStatus")]
    pub member_status: Option<String>,
    #[sqlx(rename = "AcademicYearID")]
    pub academic_year_id: Option<String>,
}

/// One attendance event reshaped onto its monthly row: the natural key plus
/// exactly one day column
#[derive(Debug, Clone)]
pub struct AttendanceDayRecord {
    pub tenant_id: Option<String>,
    pub context: Option<String>,
    pub context_id: Option<String>,
    pub user_id: String,
    pub year: i32,
    pub month: u32,
    pub day_column: &'static str,
    pub day_value: Value,
}

/// A monthly attendance group assembled by the backfill (several days of
/// the same natural key at once)
#[derive(Debug, Clone)]
pub struct AttendanceMonthRecord {
    pub tenant_id: Option<String>,
    pub context: Option<String>,
    pub context_id: Option<String>,
    pub user_id: String,
    pub year: i32,
    pub month: u32,
    /// day column name -> structured day value
    pub days: Vec<(&'static str, Value)>,
}

/// A transformed registration tracker entry
#[derive(Debug, Clone)]
pub struct RegistrationRecord {
    pub user_id: String,
    pub role_id: String,
    pub tenant_id: String,
    pub platform_regn_date: Option<DateTime<Utc>>,
    pub tenant_regn_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub reason: Option<String>,
}

/// A registration status update without a role scope: touches every row for
/// (UserID, TenantID)
#[derive(Debug, Clone)]
pub struct RegistrationStatusUpdate {
    pub user_id: String,
    pub tenant_id: String,
    pub is_active: bool,
    pub tenant_regn_date: Option<DateTime<Utc>>,
    pub platform_regn_date: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

/// A transformed project
#[derive(Debug, Clone, Default)]
pub struct ProjectRecord {
    pub project_id: String,
    pub project_name: Option<String>,
    pub board: Option<String>,
    pub medium: Option<String>,
    pub subject: Option<String>,
    pub grade: Option<String>,
    pub project_type: Option<String>,
    /// Day-only `YYYY-MM-DD` strings on the way out
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_by: Option<String>,
    pub tenant_id: Option<String>,
    pub academic_year: Option<String>,
}

/// A transformed project task row (parent or child, flattened)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectTaskRecord {
    pub project_task_id: String,
    pub project_id: String,
    pub task_name: Option<String>,
    /// Parent's referenceId; null on parent rows
    pub parent_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub learning_resource: Option<Value>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

/// ProjectTask row read back from the destination
#[derive(Debug, Clone, FromRow)]
pub struct ProjectTaskRow {
    #[sqlx(rename = "ProjectTaskId")]
    pub project_task_id: String,
    #[sqlx(rename = "ProjectId")]
    pub project_id: String,
    #[sqlx(rename = "TaskName")]
    pub task_name: Option<String>,
    #[sqlx(rename = "ParentId")]
    pub parent_id: Option<String>,
}

/// A task completion signal, logically keyed by
/// (ProjectId, ProjectTaskId, CohortId)
#[derive(Debug, Clone)]
pub struct TaskTrackingRecord {
    pub project_id: String,
    pub project_task_id: String,
    pub cohort_id: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

/// A transformed assessment tracker entry
#[derive(Debug, Clone, Default)]
pub struct AssessmentRecord {
    pub assess_tracking_id: String,
    pub assessment_id: Option<String>,
    pub course_id: Option<String>,
    pub assessment_name: Option<String>,
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
    pub total_max_score: Option<f64>,
    pub total_score: Option<f64>,
    pub time_spent: Option<f64>,
    pub assessment_summary: Option<String>,
    pub attempt_id: Option<String>,
    pub assessment_type: Option<String>,
    pub evaluated_by: Option<String>,
}

/// A transformed course tracker entry
#[derive(Debug, Clone, Default)]
pub struct CourseTrackerRecord {
    pub user_id: String,
    pub tenant_id: Option<String>,
    pub course_id: String,
    pub course_name: Option<String>,
    pub course_tracking_status: Option<String>,
    pub certificate_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// A course status change keyed on (TenantId, UserId, CourseId); update-only
#[derive(Debug, Clone, Default)]
pub struct CourseStatusUpdate {
    pub user_id: String,
    pub tenant_id: Option<String>,
    pub course_id: String,
    pub status: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub completed_on: Option<Option<DateTime<Utc>>>,
    pub certificate_id: Option<Option<String>>,
}

/// A transformed content tracker entry
#[derive(Debug, Clone, Default)]
pub struct ContentTrackerRecord {
    pub content_tracker_id: String,
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
    pub content_id: Option<String>,
    pub course_id: Option<String>,
    pub content_name: Option<String>,
    pub content_type: Option<String>,
    pub content_tracking_status: String,
    pub time_spent: f64,
    pub created_at: Option<DateTime<Utc>>,
}
