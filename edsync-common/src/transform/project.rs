//! Project and task-tree transformation
//!
//! Two source shapes produce task rows. The planner template event carries
//! a flat task list whose parent linkage goes through `externalId`, so a
//! one-time externalId map is built before any row is emitted, since source
//! order is not trusted to put parents first. Sync/update messages carry a
//! two-level tree keyed by `referenceId`; children always land with their
//! parent's referenceId in `ParentId`.

use crate::coerce::{format_date_only, parse_datetime_value};
use crate::db::models::{ProjectRecord, ProjectTaskRecord, TaskTrackingRecord};
use crate::error::require;
use crate::events::{ProjectSyncEvent, ProjectTemplateEvent, TaskNode};
use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Day-only string for an optional inbound date value
fn date_only(value: Option<&Value>) -> Option<String> {
    value
        .and_then(parse_datetime_value)
        .map(|dt| format_date_only(&dt))
}

/// Transform a planner template event into its project record
pub fn transform_project(data: &ProjectTemplateEvent) -> Result<ProjectRecord> {
    let solution = require(data.solution.as_ref(), "solution")?;
    let project_id = require(solution.solution_id.clone(), "solutionId")?;
    let template = require(data.project_template.as_ref(), "projectTemplate")?;

    let meta = template.meta_data.as_ref();

    Ok(ProjectRecord {
        project_id,
        project_name: template.title.clone(),
        board: meta.and_then(|m| m.board.clone()),
        medium: meta.and_then(|m| m.medium.clone()),
        subject: meta.and_then(|m| m.subject.clone()),
        grade: meta.and_then(|m| m.grade.clone()),
        project_type: meta.and_then(|m| m.project_type.clone()),
        start_date: date_only(data.program.as_ref().and_then(|p| p.start_date.as_ref())),
        end_date: date_only(data.program.as_ref().and_then(|p| p.end_date.as_ref())),
        created_by: None,
        tenant_id: None,
        academic_year: None,
    })
}

/// Flatten the planner template task list, resolving parent linkage through
/// the externalId map
pub fn transform_template_tasks(data: &ProjectTemplateEvent) -> Result<Vec<ProjectTaskRecord>> {
    let solution = require(data.solution.as_ref(), "solution")?;
    let project_id = require(solution.solution_id.clone(), "solutionId")?;
    let tasks = require(data.project_template_tasks.as_ref(), "projectTemplateTasks")?;

    // Parent references use externalId; the parent may appear after its
    // children, so build the whole map first
    let external_to_id: HashMap<&str, &str> = tasks
        .iter()
        .filter_map(|task| {
            Some((task.external_id.as_deref()?, task.id.as_deref()?))
        })
        .collect();

    let mut rows = Vec::with_capacity(tasks.len());
    for task in tasks {
        let Some(task_id) = task.id.clone() else {
            warn!("Skipping template task without id: {:?}", task.name);
            continue;
        };
        let parent_id = task
            .parent_task_id
            .as_deref()
            .and_then(|external| external_to_id.get(external))
            .map(|id| (*id).to_string());

        rows.push(ProjectTaskRecord {
            project_task_id: task_id,
            project_id: project_id.clone(),
            task_name: task.name.clone(),
            parent_id,
            start_date: date_only(task.start_date.as_ref()),
            end_date: date_only(task.end_date.as_ref()),
            learning_resource: task.learning_resources.clone().filter(|v| !v.is_null()),
            created_by: None,
            updated_by: None,
        });
    }

    Ok(rows)
}

fn node_dates(node: &TaskNode) -> (Option<String>, Option<String>) {
    let start = node
        .meta_information
        .as_ref()
        .and_then(|m| m.start_date.as_ref())
        .or(node.start_date.as_ref());
    let end = node
        .meta_information
        .as_ref()
        .and_then(|m| m.end_date.as_ref())
        .or(node.end_date.as_ref());
    (date_only(start), date_only(end))
}

fn node_to_task(node: &TaskNode, project_id: &str, parent_id: Option<&str>) -> ProjectTaskRecord {
    let (start_date, end_date) = node_dates(node);
    ProjectTaskRecord {
        // Callers check referenceId presence before getting here
        project_task_id: node.reference_id.clone().unwrap_or_default(),
        project_id: project_id.to_string(),
        task_name: node.name.clone(),
        parent_id: parent_id.map(|p| p.to_string()),
        start_date,
        end_date,
        learning_resource: node.learning_resources.clone().filter(|v| !v.is_null()),
        created_by: node.created_by.clone(),
        updated_by: node.updated_by.clone(),
    }
}

/// Flatten a sync-message task tree into destination task rows.
///
/// Parents emit with `ParentId` null, children with the parent's
/// referenceId. Nodes without a referenceId are skipped with a warning.
pub fn transform_task_update(data: &ProjectSyncEvent) -> Result<Vec<ProjectTaskRecord>> {
    let project_id = require(data.solution_id.clone(), "solutionId")?;
    let tasks = require(data.tasks.as_ref(), "tasks")?;

    let mut rows = Vec::new();
    for task in tasks {
        let Some(parent_reference) = task.reference_id.as_deref() else {
            warn!(
                "Skipping task without referenceId: {:?}",
                task.name.as_deref().or(task.id.as_deref())
            );
            continue;
        };

        rows.push(node_to_task(task, &project_id, None));

        for child in &task.children {
            if child.reference_id.is_none() {
                warn!(
                    "Skipping child task without referenceId: {:?}",
                    child.name.as_deref().or(child.id.as_deref())
                );
                continue;
            }
            rows.push(node_to_task(child, &project_id, Some(parent_reference)));
        }
    }

    Ok(rows)
}

/// Extract completion tracking rows from a sync-message task tree.
///
/// Only nodes whose status is case-insensitively "completed" AND which
/// carry a referenceId produce a row; absence of a row is the only signal
/// for non-completion.
pub fn transform_task_trackings(data: &ProjectSyncEvent) -> Result<Vec<TaskTrackingRecord>> {
    let project_id = require(data.solution_id.clone(), "solutionId")?;
    let tasks = require(data.tasks.as_ref(), "tasks")?;
    let cohort_id = data.entity_id.clone();

    let mut rows = Vec::new();
    let mut push_completed = |node: &TaskNode| {
        let completed = node
            .status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("completed"))
            .unwrap_or(false);
        if !completed {
            return;
        }
        let Some(reference_id) = node.reference_id.clone() else {
            return;
        };
        rows.push(TaskTrackingRecord {
            project_id: project_id.clone(),
            project_task_id: reference_id,
            cohort_id: cohort_id.clone(),
            created_by: node.updated_by.clone(),
            updated_by: node.updated_by.clone(),
        });
    };

    for task in tasks {
        push_completed(task);
        for child in &task.children {
            push_completed(child);
        }
    }

    Ok(rows)
}

/// Validate the identifying fields of a sync message before any processing
pub fn validate_sync_event(data: &ProjectSyncEvent) -> Result<()> {
    if data.solution_id.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return Err(Error::missing("solutionId"));
    }
    if data.tasks.is_none() {
        return Err(Error::missing("tasks"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sync_event(value: Value) -> ProjectSyncEvent {
        serde_json::from_value(value).unwrap()
    }

    fn template_event(value: Value) -> ProjectTemplateEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_transform_project_maps_template() {
        let data = template_event(json!({
            "solution": { "solutionId": "s-1" },
            "projectTemplate": {
                "projectTemplateId": "pt-1",
                "title": "Science fair",
                "metaData": { "board": "CBSE", "class": "8", "type": "project" }
            },
            "program": {
                "startDate": "2025-01-10T00:00:00.000Z",
                "endDate": "2025-03-01T00:00:00.000Z"
            },
            "projectTemplateTasks": []
        }));

        let project = transform_project(&data).unwrap();

        assert_eq!(project.project_id, "s-1");
        assert_eq!(project.project_name.as_deref(), Some("Science fair"));
        assert_eq!(project.grade.as_deref(), Some("8"));
        assert_eq!(project.start_date.as_deref(), Some("2025-01-10"));
    }

    #[test]
    fn test_transform_project_requires_solution_id() {
        let data = template_event(json!({ "projectTemplate": { "title": "x" } }));
        assert!(transform_project(&data).is_err());
    }

    #[test]
    fn test_template_tasks_resolve_parent_out_of_order() {
        // Child appears before its parent in source order
        let data = template_event(json!({
            "solution": { "solutionId": "s-1" },
            "projectTemplateTasks": [
                { "_id": "t-child", "externalId": "ext-child",
                  "name": "Child", "parentTaskId": "ext-parent" },
                { "_id": "t-parent", "externalId": "ext-parent", "name": "Parent" }
            ]
        }));

        let tasks = transform_template_tasks(&data).unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].parent_id.as_deref(), Some("t-parent"));
        assert_eq!(tasks[1].parent_id, None);
    }

    #[test]
    fn test_template_tasks_unknown_parent_reference() {
        let data = template_event(json!({
            "solution": { "solutionId": "s-1" },
            "projectTemplateTasks": [
                { "_id": "t-1", "externalId": "ext-1", "parentTaskId": "ext-missing" }
            ]
        }));
        let tasks = transform_template_tasks(&data).unwrap();
        assert_eq!(tasks[0].parent_id, None);
    }

    #[test]
    fn test_task_update_flattens_tree() {
        let data = sync_event(json!({
            "solutionId": "s-1",
            "tasks": [
                {
                    "referenceId": "T1",
                    "name": "Parent",
                    "metaInformation": { "startDate": "17-12-2025" },
                    "children": [
                        { "referenceId": "T2", "name": "Child" },
                        { "name": "No reference" }
                    ]
                }
            ]
        }));

        let tasks = transform_task_update(&data).unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].project_task_id, "T1");
        assert_eq!(tasks[0].parent_id, None);
        assert_eq!(tasks[0].start_date.as_deref(), Some("2025-12-17"));
        assert_eq!(tasks[1].project_task_id, "T2");
        assert_eq!(tasks[1].parent_id.as_deref(), Some("T1"));
    }

    #[test]
    fn test_task_update_skips_parent_without_reference() {
        let data = sync_event(json!({
            "solutionId": "s-1",
            "tasks": [
                { "name": "No reference", "children": [ { "referenceId": "T2" } ] }
            ]
        }));
        // Children of an unkeyed parent are skipped with it
        let tasks = transform_task_update(&data).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_trackings_only_completed_with_reference() {
        let data = sync_event(json!({
            "solutionId": "s-1",
            "entityId": "cohort-9",
            "tasks": [
                { "referenceId": "T1", "status": "Completed", "updatedBy": "u-1",
                  "children": [
                      { "referenceId": "T2", "status": "pending" },
                      { "referenceId": "T3", "status": "completed" },
                      { "status": "completed" }
                  ] },
                { "referenceId": "T4", "status": "started" }
            ]
        }));

        let rows = transform_task_trackings(&data).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].project_task_id, "T1");
        assert_eq!(rows[0].cohort_id.as_deref(), Some("cohort-9"));
        assert_eq!(rows[1].project_task_id, "T3");
    }

    #[test]
    fn test_validate_sync_event() {
        assert!(validate_sync_event(&sync_event(json!({ "tasks": [] }))).is_err());
        assert!(validate_sync_event(&sync_event(json!({ "solutionId": "s-1" }))).is_err());
        assert!(validate_sync_event(&sync_event(
            json!({ "solutionId": "s-1", "tasks": [] })
        ))
        .is_ok());
    }
}
