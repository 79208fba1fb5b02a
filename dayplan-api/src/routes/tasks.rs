/// Task scheduling and completion endpoints
///
/// # Endpoints
///
/// - `GET    /v1/tasks` - List tasks, enriched with completion data
/// - `POST   /v1/tasks` - Create a task
/// - `PUT    /v1/tasks/:id` - Update a task
/// - `DELETE /v1/tasks/:id` - Delete a task
/// - `POST   /v1/tasks/:id/complete` - Mark a task complete for a day
/// - `GET    /v1/tasks/history` - Completion history across all tasks
///
/// Times cross the boundary as `HH:mm` display strings in both directions;
/// everything behind the boundary works on `NaiveTime`/`NaiveDate`.

use crate::{
    app::{AppState, CurrentUser},
    error::{ApiError, ApiResult, ValidationErrorDetail},
    response::ApiResponse,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use dayplan_shared::models::{
    completion::{CompletionHistoryEntry, TaskCompletion},
    task::{
        format_display_time, parse_display_time, CreateTask, Priority, Recurrence, Task,
        UpdateTask,
    },
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

/// Create/update request body
///
/// The same shape serves both operations; update simply cannot move the
/// task to another day.
#[derive(Debug, Deserialize, Validate)]
pub struct TaskRequest {
    /// Task name
    #[validate(length(min = 1, message = "Task name is required"))]
    pub name: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Priority, defaulting to Medium
    #[serde(default)]
    pub priority: Priority,

    /// Window start as "HH:mm"
    pub start_time: String,

    /// Window end as "HH:mm"
    pub end_time: String,

    /// Recurrence label, defaulting to Daily
    #[serde(default)]
    pub recurrence: Recurrence,
}

/// Mark-complete request body
#[derive(Debug, Deserialize)]
pub struct MarkCompleteRequest {
    /// Day being completed; defaults to today
    pub date: Option<NaiveDate>,

    /// Percentage done; defaults to 100
    pub completion_percentage: Option<i32>,
}

/// A task as clients see it: times formatted back to display strings
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub recurrence: Recurrence,
    pub created_at: DateTime<Utc>,
}

impl TaskResponse {
    fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            description: task.description.clone(),
            priority: task.priority,
            date: task.date,
            start_time: format_display_time(task.start_time),
            end_time: format_display_time(task.end_time),
            recurrence: task.recurrence,
            created_at: task.created_at,
        }
    }
}

/// One day of a task's completion history
#[derive(Debug, Serialize)]
pub struct CompletionEntry {
    pub date: NaiveDate,
    pub completion_percentage: i32,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A listed task, enriched with today's status and its history
#[derive(Debug, Serialize)]
pub struct EnrichedTaskResponse {
    #[serde(flatten)]
    pub task: TaskResponse,

    /// Today's completion percentage, 0 when no record exists
    pub completion_percentage: i32,

    /// Every recorded day, newest first
    pub completion_history: Vec<CompletionEntry>,
}

/// Parses the window strings out of a request body
///
/// Returns `(start, end)` or a 400 naming the expected format. The
/// end-after-start check is the task store's job, not this function's.
fn parse_window(start: &str, end: &str) -> ApiResult<(NaiveTime, NaiveTime)> {
    let parse = |value: &str| {
        parse_display_time(value).ok_or_else(|| {
            ApiError::BadRequest("Invalid time format. Use HH:mm (e.g., 08:00)".to_string())
        })
    };

    Ok((parse(start)?, parse(end)?))
}

/// Create a new task anchored to today
///
/// # Errors
///
/// - `422`: Validation failed
/// - `400`: Bad time format, or end not after start
/// - `409`: Window overlaps an existing task (conflict list in `data`)
pub async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<TaskRequest>,
) -> ApiResult<ApiResponse<TaskResponse>> {
    req.validate()?;

    let (start_time, end_time) = parse_window(&req.start_time, &req.end_time)?;

    let task = Task::create(
        &state.db,
        CreateTask {
            user_id: user.id,
            name: req.name.trim().to_string(),
            description: req.description,
            priority: req.priority,
            date: Utc::now().date_naive(),
            start_time,
            end_time,
            recurrence: req.recurrence,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, task_id = %task.id, "Task created");

    Ok(ApiResponse::created(
        TaskResponse::from_task(&task),
        "Task created successfully",
    ))
}

/// List the caller's tasks, newest first, enriched with completion data
///
/// The enrichment is two queries total (tasks, completions) joined in
/// memory rather than one completion query per task.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<ApiResponse<Vec<EnrichedTaskResponse>>> {
    let tasks = Task::list_by_owner(&state.db, user.id).await?;
    let completions = TaskCompletion::list_by_owner(&state.db, user.id).await?;

    // Group records per task; list_by_owner returns them newest-day first,
    // which is the order history is served in.
    let mut by_task: HashMap<Uuid, Vec<&TaskCompletion>> = HashMap::new();
    for record in &completions {
        by_task.entry(record.task_id).or_default().push(record);
    }

    let today = Utc::now().date_naive();

    let enriched = tasks
        .iter()
        .map(|task| {
            let history = by_task.get(&task.id).map(|v| v.as_slice()).unwrap_or(&[]);

            let completion_percentage = history
                .iter()
                .find(|r| r.date == today)
                .map(|r| r.completion_percentage)
                .unwrap_or(0);

            EnrichedTaskResponse {
                task: TaskResponse::from_task(task),
                completion_percentage,
                completion_history: history
                    .iter()
                    .map(|r| CompletionEntry {
                        date: r.date,
                        completion_percentage: r.completion_percentage,
                        completed_at: r.completed_at,
                    })
                    .collect(),
            }
        })
        .collect();

    Ok(ApiResponse::ok(enriched, "Tasks fetched successfully"))
}

/// Update a task, keeping it anchored to its stored day
///
/// # Errors
///
/// - `404` / `403`: Unknown task / someone else's task
/// - `422` / `400`: Validation or window failures, as for create
/// - `409`: New window overlaps a sibling task that day
pub async fn update_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<TaskRequest>,
) -> ApiResult<ApiResponse<TaskResponse>> {
    req.validate()?;

    let (start_time, end_time) = parse_window(&req.start_time, &req.end_time)?;

    let task = Task::update(
        &state.db,
        id,
        user.id,
        UpdateTask {
            name: req.name.trim().to_string(),
            description: req.description,
            priority: req.priority,
            start_time,
            end_time,
            recurrence: req.recurrence,
        },
    )
    .await?;

    Ok(ApiResponse::ok(
        TaskResponse::from_task(&task),
        "Task updated successfully",
    ))
}

/// Delete a task
///
/// # Errors
///
/// - `404` / `403`: Unknown task / someone else's task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    Task::delete(&state.db, id, user.id).await?;

    tracing::info!(user_id = %user.id, task_id = %id, "Task deleted");

    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "Task deleted successfully",
    ))
}

/// Mark a task complete (or partially complete) for a day
///
/// Upserts the day's record: repeating the call overwrites the stored
/// percentage rather than adding a second record.
///
/// # Errors
///
/// - `404` / `403`: Unknown task / someone else's task
/// - `422`: Percentage outside [0, 100]
pub async fn mark_complete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<MarkCompleteRequest>,
) -> ApiResult<ApiResponse<TaskCompletion>> {
    let task = Task::find_owned(&state.db, id, user.id).await?;

    let percentage = req.completion_percentage.unwrap_or(100);
    if !(0..=100).contains(&percentage) {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "completion_percentage".to_string(),
            message: "Completion percentage must be between 0 and 100".to_string(),
        }]));
    }

    let date = req.date.unwrap_or_else(|| Utc::now().date_naive());

    let record = TaskCompletion::upsert(&state.db, task.id, user.id, date, percentage).await?;

    Ok(ApiResponse::ok(record, "Task marked as completed"))
}

/// The caller's completion history across all tasks, newest day first
pub async fn completion_history(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<ApiResponse<Vec<CompletionHistoryEntry>>> {
    let history = TaskCompletion::history_for_owner(&state.db, user.id).await?;

    Ok(ApiResponse::ok(
        history,
        "Task history fetched successfully",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window_valid() {
        let (start, end) = parse_window("09:00", "10:30").expect("should parse");
        assert_eq!(start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(end, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_window_rejects_bad_format() {
        assert!(parse_window("9 am", "10:00").is_err());
        assert!(parse_window("09:00", "25:00").is_err());
        assert!(parse_window("", "10:00").is_err());
    }

    #[test]
    fn test_task_request_deserialization_defaults() {
        let req: TaskRequest = serde_json::from_str(
            r#"{"name": "Walk", "start_time": "07:00", "end_time": "07:30"}"#,
        )
        .expect("should deserialize");

        assert_eq!(req.priority, Priority::Medium);
        assert_eq!(req.recurrence, Recurrence::Daily);
        assert!(req.description.is_none());
    }

    #[test]
    fn test_task_request_explicit_enums() {
        let req: TaskRequest = serde_json::from_str(
            r#"{"name": "Gym", "start_time": "18:00", "end_time": "19:00",
                "priority": "High", "recurrence": "Weekly"}"#,
        )
        .expect("should deserialize");

        assert_eq!(req.priority, Priority::High);
        assert_eq!(req.recurrence, Recurrence::Weekly);
    }

    #[test]
    fn test_enriched_response_flattens_task_fields() {
        let task = Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Read".to_string(),
            description: None,
            priority: Priority::Low,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            recurrence: Recurrence::Daily,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let enriched = EnrichedTaskResponse {
            task: TaskResponse::from_task(&task),
            completion_percentage: 40,
            completion_history: vec![],
        };

        let json = serde_json::to_value(&enriched).expect("serialize");
        assert_eq!(json["name"], "Read");
        assert_eq!(json["start_time"], "20:00");
        assert_eq!(json["end_time"], "21:00");
        assert_eq!(json["completion_percentage"], 40);
        assert_eq!(json["priority"], "Low");
    }
}
