use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{Project, ProjectInput, ProjectPage, ProjectResponse, TaskSummary};
use crate::paging::PageQuery;
use crate::storage::{ProjectStore, TaskStore};

/// Project CRUD on top of the storage traits. Produces snapshots with
/// embedded task summaries.
pub struct ProjectService {
    projects: Arc<dyn ProjectStore>,
    tasks: Arc<dyn TaskStore>,
}

impl ProjectService {
    pub fn new(projects: Arc<dyn ProjectStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self { projects, tasks }
    }

    pub async fn create(&self, input: ProjectInput) -> Result<ProjectResponse, ApiError> {
        log::info!("Creating project name='{}'", input.name);
        let project = self.projects.insert(&input).await?;
        let response = self.assemble_one(project).await?;
        log::info!("Created project id={} name='{}'", response.id, response.name);
        Ok(response)
    }

    pub async fn update(&self, id: i64, input: ProjectInput) -> Result<ProjectResponse, ApiError> {
        log::info!("Updating project id={}", id);
        let updated = match self.projects.update(id, &input).await? {
            Some(project) => project,
            None => {
                log::warn!("Update failed: project id={} not found", id);
                return Err(ApiError::NotFound(format!("Project {} not found", id)));
            }
        };
        let response = self.assemble_one(updated).await?;
        log::info!("Updated project id={} -> name='{}'", id, response.name);
        Ok(response)
    }

    pub async fn get(&self, id: i64) -> Result<ProjectResponse, ApiError> {
        log::debug!("Fetching project id={}", id);
        let project = match self.projects.find(id).await? {
            Some(project) => project,
            None => {
                log::warn!("Get failed: project id={} not found", id);
                return Err(ApiError::NotFound(format!("Project {} not found", id)));
            }
        };
        let response = self.assemble_one(project).await?;
        log::debug!("Fetched project id={} (name='{}')", id, response.name);
        Ok(response)
    }

    pub async fn page(&self, query: PageQuery) -> Result<ProjectPage, ApiError> {
        log::debug!(
            "Listing projects page={} size={} sortBy={} sortDir={:?}",
            query.page_number,
            query.page_size,
            query.sort_by,
            query.sort_dir
        );
        let (items, total) = self.projects.page(&query).await?;
        let total_pages = query.total_pages(total);
        if query.page_number >= total_pages && total_pages > 0 {
            log::warn!(
                "Requested page {} is out of range (totalPages={})",
                query.page_number,
                total_pages
            );
            return Err(ApiError::BadRequest("This page does not exist.".into()));
        }

        let projects = self.assemble(items).await?;
        let page = ProjectPage {
            total_projects: total,
            page_number: query.page_number,
            page_size: query.page_size,
            total_pages,
            first: query.page_number == 0,
            last: query.page_number + 1 >= total_pages,
            sort_dir: query.sort_dir,
            sort_by: query.sort_by,
            projects,
        };
        log::debug!("Listed projects: total={} totalPages={}", total, total_pages);
        Ok(page)
    }

    pub async fn delete(&self, id: i64) -> Result<ProjectResponse, ApiError> {
        log::info!("Deleting project id={}", id);
        let project = match self.projects.find(id).await? {
            Some(project) => project,
            None => {
                log::warn!("Delete failed: project id={} not found", id);
                return Err(ApiError::NotFound(format!("Project {} not found", id)));
            }
        };

        // Snapshot first: the cascade removes the task rows the snapshot
        // embeds.
        let response = self.assemble_one(project).await?;
        if self.projects.delete(id).await?.is_none() {
            log::warn!("Delete failed: project id={} not found", id);
            return Err(ApiError::NotFound(format!("Project {} not found", id)));
        }
        log::info!("Deleted project id={} (name='{}')", id, response.name);
        Ok(response)
    }

    async fn assemble_one(&self, project: Project) -> Result<ProjectResponse, ApiError> {
        let mut responses = self.assemble(vec![project]).await?;
        responses
            .pop()
            .ok_or_else(|| ApiError::Internal("empty snapshot assembly".into()))
    }

    async fn assemble(&self, projects: Vec<Project>) -> Result<Vec<ProjectResponse>, ApiError> {
        let ids: Vec<i64> = projects.iter().map(|p| p.id).collect();
        let mut grouped: HashMap<i64, Vec<TaskSummary>> = HashMap::new();
        for (project_id, summary) in self.tasks.summaries_for_projects(&ids).await? {
            grouped.entry(project_id).or_default().push(summary);
        }
        Ok(projects
            .into_iter()
            .map(|p| ProjectResponse {
                id: p.id,
                name: p.name,
                description: p.description,
                created_at: p.created_at,
                updated_at: p.updated_at,
                tasks: grouped.remove(&p.id).unwrap_or_default(),
            })
            .collect())
    }
}
