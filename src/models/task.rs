use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use validator::Validate;

use crate::models::project::ProjectSummary;
use crate::paging::SortDir;

/// Task lifecycle state. Corresponds to the `task_status` SQL enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// A task row as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload to create or update a task. `project_id` must reference an
/// existing project; updates may move the task to another project.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub project_id: i64,

    /// Must be non-blank and at most 200 characters.
    #[validate(custom = "crate::models::not_blank")]
    #[validate(length(max = 200, message = "size must be between 0 and 200"))]
    pub title: String,

    /// Must be non-blank and at most 2000 characters.
    #[validate(custom = "crate::models::not_blank")]
    #[validate(length(max = 2000, message = "size must be between 0 and 2000"))]
    pub description: String,

    pub status: TaskStatus,
}

/// The task snapshot returned to callers, embedding a summary of the
/// owning project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub project: ProjectSummary,
}

/// Lightweight task view embedded in project snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub updated_at: DateTime<Utc>,
}

/// One page of tasks with paging and sorting metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub total_tasks: i64,
    pub page_number: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub first: bool,
    pub last: bool,
    pub sort_dir: SortDir,
    pub sort_by: String,
    pub tasks: Vec<TaskResponse>,
}
