//! Project and project-task event payloads
//!
//! Two distinct shapes arrive for project data: the planner template event
//! (solution + template + flat task list joined via externalId) and the
//! sync/update message (task tree with referenceIds and nested children).

use serde::Deserialize;
use serde_json::Value;

/// COURSE_PLANNER_PROJECT_CREATED payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTemplateEvent {
    #[serde(default)]
    pub solution: Option<SolutionRef>,
    #[serde(default)]
    pub project_template: Option<ProjectTemplate>,
    #[serde(default)]
    pub project_template_tasks: Option<Vec<ProjectTemplateTask>>,
    #[serde(default)]
    pub program: Option<ProgramWindow>,
    #[serde(default)]
    pub total_tasks: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionRef {
    #[serde(default)]
    pub solution_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTemplate {
    #[serde(default)]
    pub project_template_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub meta_data: Option<TemplateMetaData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetaData {
    #[serde(default)]
    pub board: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default, rename = "class")]
    pub grade: Option<String>,
    #[serde(default, rename = "type")]
    pub project_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramWindow {
    #[serde(default)]
    pub start_date: Option<Value>,
    #[serde(default)]
    pub end_date: Option<Value>,
}

/// One flat task row in the planner template event
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTemplateTask {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Carries the externalId of the parent task
    #[serde(default)]
    pub parent_task_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<Value>,
    #[serde(default)]
    pub end_date: Option<Value>,
    #[serde(default)]
    pub learning_resources: Option<Value>,
}

/// PROJECT_SYNC_CREATED / PROJECT_SYNC_UPDATED / PROJECT_TASK_UPDATED payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSyncEvent {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub solution_id: Option<String>,
    /// Cohort scope of the sync; tracking rows carry it as CohortId
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub tasks: Option<Vec<TaskNode>>,
}

/// One node in the two-level task tree
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNode {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    /// Stable destination key; nodes without one are skipped with a warning
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_date: Option<Value>,
    #[serde(default)]
    pub end_date: Option<Value>,
    #[serde(default)]
    pub meta_information: Option<TaskMetaInformation>,
    #[serde(default)]
    pub learning_resources: Option<Value>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub children: Vec<TaskNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetaInformation {
    #[serde(default)]
    pub start_date: Option<Value>,
    #[serde(default)]
    pub end_date: Option<Value>,
}
