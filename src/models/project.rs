use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::task::TaskSummary;
use crate::paging::SortDir;

/// A project row as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload to create or update a project.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProjectInput {
    /// Must be non-blank and at most 100 characters.
    #[validate(custom = "crate::models::not_blank")]
    #[validate(length(max = 100, message = "size must be between 0 and 100"))]
    pub name: String,

    /// Must be non-blank and at most 1000 characters.
    #[validate(custom = "crate::models::not_blank")]
    #[validate(length(max = 1000, message = "size must be between 0 and 1000"))]
    pub description: String,
}

/// The project snapshot returned to callers, embedding summaries of the
/// project's tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tasks: Vec<TaskSummary>,
}

/// Lightweight project view embedded in task snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

/// One page of projects with paging and sorting metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPage {
    pub total_projects: i64,
    pub page_number: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub first: bool,
    pub last: bool,
    pub sort_dir: SortDir,
    pub sort_by: String,
    pub projects: Vec<ProjectResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_project_input_validation() {
        let valid = ProjectInput {
            name: "Website Redesign".to_string(),
            description: "Marketing site redesign for Q4".to_string(),
        };
        assert!(valid.validate().is_ok());

        let blank_name = ProjectInput {
            name: "  ".to_string(),
            description: "Marketing site redesign for Q4".to_string(),
        };
        assert!(blank_name.validate().is_err());

        let long_name = ProjectInput {
            name: "a".repeat(101),
            description: "ok".to_string(),
        };
        assert!(long_name.validate().is_err());

        let long_description = ProjectInput {
            name: "Website Redesign".to_string(),
            description: "b".repeat(1001),
        };
        assert!(long_description.validate().is_err());

        let at_limit = ProjectInput {
            name: "a".repeat(100),
            description: "b".repeat(1000),
        };
        assert!(at_limit.validate().is_ok());
    }
}
