//! Persistence collaborators.
//!
//! The services talk to the relational store through the [`ProjectStore`]
//! and [`TaskStore`] traits: find-by-id, find-all-paged, save, delete,
//! plus the by-foreign-key summary queries used to embed snapshots.
//! [`postgres`] implements them with sqlx; [`memory`] is a map-backed
//! implementation used by the HTTP-level test suite.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{Project, ProjectInput, ProjectSummary, Task, TaskInput, TaskSummary};
use crate::paging::PageQuery;

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert(&self, input: &ProjectInput) -> Result<Project, ApiError>;

    /// Returns the updated row, or `None` if the id does not exist.
    async fn update(&self, id: i64, input: &ProjectInput) -> Result<Option<Project>, ApiError>;

    async fn find(&self, id: i64) -> Result<Option<Project>, ApiError>;

    /// One page of projects plus the total row count.
    async fn page(&self, query: &PageQuery) -> Result<(Vec<Project>, i64), ApiError>;

    /// Deletes the project and all its tasks in one transaction.
    /// Returns the deleted row, or `None` if the id does not exist.
    async fn delete(&self, id: i64) -> Result<Option<Project>, ApiError>;

    async fn exists(&self, id: i64) -> Result<bool, ApiError>;

    /// Summaries for the given project ids, for embedding in task
    /// snapshots.
    async fn summaries_by_ids(&self, ids: &[i64]) -> Result<Vec<ProjectSummary>, ApiError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, input: &TaskInput) -> Result<Task, ApiError>;

    /// Returns the updated row, or `None` if the id does not exist.
    async fn update(&self, id: i64, input: &TaskInput) -> Result<Option<Task>, ApiError>;

    async fn find(&self, id: i64) -> Result<Option<Task>, ApiError>;

    /// One page of tasks plus the total row count.
    async fn page(&self, query: &PageQuery) -> Result<(Vec<Task>, i64), ApiError>;

    /// Returns the deleted row, or `None` if the id does not exist.
    async fn delete(&self, id: i64) -> Result<Option<Task>, ApiError>;

    /// Task summaries for the given project ids, keyed by project id,
    /// for embedding in project snapshots.
    async fn summaries_for_projects(
        &self,
        project_ids: &[i64],
    ) -> Result<Vec<(i64, TaskSummary)>, ApiError>;
}
