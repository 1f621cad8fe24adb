//! sqlx-backed store implementations.
//!
//! Sort columns are resolved from the allow-listed API field names, so
//! interpolating them into `ORDER BY` is safe. Multi-statement writes
//! (project cascade delete) run inside a transaction; reads are single
//! fetches against the pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::ApiError;
use crate::models::{Project, ProjectInput, ProjectSummary, Task, TaskInput, TaskStatus, TaskSummary};
use crate::paging::PageQuery;
use crate::storage::{ProjectStore, TaskStore};

#[derive(Clone)]
pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn project_sort_column(sort_by: &str) -> &'static str {
    match sort_by {
        "name" => "name",
        "createdAt" => "created_at",
        "updatedAt" => "updated_at",
        _ => "id",
    }
}

fn task_sort_column(sort_by: &str) -> &'static str {
    match sort_by {
        "title" => "title",
        "status" => "status",
        "project" => "project_id",
        "createdAt" => "created_at",
        "updatedAt" => "updated_at",
        _ => "id",
    }
}

// Ties are broken by id so pages stay stable across requests.
fn order_clause(column: &str, query: &PageQuery) -> String {
    if column == "id" {
        format!("id {}", query.sort_dir.as_sql())
    } else {
        format!("{} {}, id ASC", column, query.sort_dir.as_sql())
    }
}

const PROJECT_COLUMNS: &str = "id, name, description, created_at, updated_at";
const TASK_COLUMNS: &str = "id, project_id, title, description, status, created_at, updated_at";

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn insert(&self, input: &ProjectInput) -> Result<Project, ApiError> {
        let project = sqlx::query_as::<_, Project>(
            "INSERT INTO projects (name, description, created_at, updated_at) \
             VALUES ($1, $2, now(), now()) \
             RETURNING id, name, description, created_at, updated_at",
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(project)
    }

    async fn update(&self, id: i64, input: &ProjectInput) -> Result<Option<Project>, ApiError> {
        let project = sqlx::query_as::<_, Project>(
            "UPDATE projects SET name = $1, description = $2, updated_at = now() \
             WHERE id = $3 \
             RETURNING id, name, description, created_at, updated_at",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    async fn find(&self, id: i64) -> Result<Option<Project>, ApiError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE id = $1",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    async fn page(&self, query: &PageQuery) -> Result<(Vec<Project>, i64), ApiError> {
        let order = order_clause(project_sort_column(&query.sort_by), query);
        let sql = format!(
            "SELECT {} FROM projects ORDER BY {} LIMIT $1 OFFSET $2",
            PROJECT_COLUMNS, order
        );
        let items = sqlx::query_as::<_, Project>(&sql)
            .bind(query.limit())
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.pool)
            .await?;
        Ok((items, total))
    }

    async fn delete(&self, id: i64) -> Result<Option<Project>, ApiError> {
        let mut tx = self.pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE id = $1",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let project = match project {
            Some(project) => project,
            None => return Ok(None),
        };

        // Child rows first, then the parent, in one transaction.
        sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(project))
    }

    async fn exists(&self, id: i64) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn summaries_by_ids(&self, ids: &[i64]) -> Result<Vec<ProjectSummary>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let summaries = sqlx::query_as::<_, ProjectSummary>(
            "SELECT id, name, updated_at FROM projects WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(summaries)
    }
}

#[derive(FromRow)]
struct TaskSummaryRow {
    project_id: i64,
    id: i64,
    title: String,
    status: TaskStatus,
    updated_at: DateTime<Utc>,
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert(&self, input: &TaskInput) -> Result<Task, ApiError> {
        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (project_id, title, description, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, now(), now()) \
             RETURNING id, project_id, title, description, status, created_at, updated_at",
        )
        .bind(input.project_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }

    async fn update(&self, id: i64, input: &TaskInput) -> Result<Option<Task>, ApiError> {
        let task = sqlx::query_as::<_, Task>(
            "UPDATE tasks SET project_id = $1, title = $2, description = $3, status = $4, \
             updated_at = now() \
             WHERE id = $5 \
             RETURNING id, project_id, title, description, status, created_at, updated_at",
        )
        .bind(input.project_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn find(&self, id: i64) -> Result<Option<Task>, ApiError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn page(&self, query: &PageQuery) -> Result<(Vec<Task>, i64), ApiError> {
        let order = order_clause(task_sort_column(&query.sort_by), query);
        let sql = format!(
            "SELECT {} FROM tasks ORDER BY {} LIMIT $1 OFFSET $2",
            TASK_COLUMNS, order
        );
        let items = sqlx::query_as::<_, Task>(&sql)
            .bind(query.limit())
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(&self.pool)
            .await?;
        Ok((items, total))
    }

    async fn delete(&self, id: i64) -> Result<Option<Task>, ApiError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn summaries_for_projects(
        &self,
        project_ids: &[i64],
    ) -> Result<Vec<(i64, TaskSummary)>, ApiError> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, TaskSummaryRow>(
            "SELECT project_id, id, title, status, updated_at FROM tasks \
             WHERE project_id = ANY($1) ORDER BY id",
        )
        .bind(project_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.project_id,
                    TaskSummary {
                        id: row.id,
                        title: row.title,
                        status: row.status,
                        updated_at: row.updated_at,
                    },
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::{PageParams, SortDir};

    fn query(sort_by: &str, sort_dir: SortDir) -> PageQuery {
        let mut query = PageParams::default()
            .into_query(&["id", "name", "title", "status", "project", "createdAt", "updatedAt"])
            .unwrap();
        query.sort_by = sort_by.to_string();
        query.sort_dir = sort_dir;
        query
    }

    #[test]
    fn test_sort_column_mapping() {
        assert_eq!(project_sort_column("createdAt"), "created_at");
        assert_eq!(project_sort_column("updatedAt"), "updated_at");
        assert_eq!(project_sort_column("name"), "name");
        assert_eq!(project_sort_column("id"), "id");

        assert_eq!(task_sort_column("project"), "project_id");
        assert_eq!(task_sort_column("status"), "status");
        assert_eq!(task_sort_column("createdAt"), "created_at");
    }

    #[test]
    fn test_order_clause_breaks_ties_by_id() {
        let q = query("name", SortDir::Desc);
        assert_eq!(order_clause(project_sort_column(&q.sort_by), &q), "name DESC, id ASC");

        let q = query("id", SortDir::Desc);
        assert_eq!(order_clause(project_sort_column(&q.sort_by), &q), "id DESC");
    }
}
