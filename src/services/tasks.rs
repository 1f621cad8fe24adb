use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{ProjectSummary, Task, TaskInput, TaskPage, TaskResponse};
use crate::paging::PageQuery;
use crate::storage::{ProjectStore, TaskStore};

/// Task CRUD on top of the storage traits. Every write checks that the
/// referenced project exists; snapshots embed the owning project's
/// summary.
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    projects: Arc<dyn ProjectStore>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>, projects: Arc<dyn ProjectStore>) -> Self {
        Self { tasks, projects }
    }

    pub async fn create(&self, input: TaskInput) -> Result<TaskResponse, ApiError> {
        log::info!(
            "Creating task for projectId={} title='{}'",
            input.project_id,
            input.title
        );
        if !self.projects.exists(input.project_id).await? {
            log::warn!("Create failed: project id={} not found", input.project_id);
            return Err(ApiError::NotFound(format!(
                "Project {} not found",
                input.project_id
            )));
        }

        let task = self.tasks.insert(&input).await?;
        let response = self.assemble_one(task).await?;
        log::info!(
            "Created task id={} under projectId={} status={}",
            response.id,
            response.project.id,
            response.status
        );
        Ok(response)
    }

    pub async fn update(&self, id: i64, input: TaskInput) -> Result<TaskResponse, ApiError> {
        log::info!("Updating task id={}", id);
        let existing = match self.tasks.find(id).await? {
            Some(task) => task,
            None => {
                log::warn!("Update failed: task id={} not found", id);
                return Err(ApiError::NotFound(format!("Task {} not found", id)));
            }
        };

        // Moving the task to another project requires the target to
        // exist; the task is left untouched otherwise.
        if existing.project_id != input.project_id
            && !self.projects.exists(input.project_id).await?
        {
            log::warn!("Update failed: target project id={} not found", input.project_id);
            return Err(ApiError::NotFound(format!(
                "Project {} not found",
                input.project_id
            )));
        }

        let updated = match self.tasks.update(id, &input).await? {
            Some(task) => task,
            None => {
                log::warn!("Update failed: task id={} not found", id);
                return Err(ApiError::NotFound(format!("Task {} not found", id)));
            }
        };
        let response = self.assemble_one(updated).await?;
        log::info!(
            "Updated task id={} -> title='{}', status={}, projectId={}",
            id,
            response.title,
            response.status,
            response.project.id
        );
        Ok(response)
    }

    pub async fn get(&self, id: i64) -> Result<TaskResponse, ApiError> {
        log::debug!("Fetching task id={}", id);
        let task = match self.tasks.find(id).await? {
            Some(task) => task,
            None => {
                log::warn!("Get failed: task id={} not found", id);
                return Err(ApiError::NotFound(format!("Task {} not found", id)));
            }
        };
        let response = self.assemble_one(task).await?;
        log::debug!("Fetched task id={} (title='{}')", id, response.title);
        Ok(response)
    }

    pub async fn page(&self, query: PageQuery) -> Result<TaskPage, ApiError> {
        log::debug!(
            "Listing tasks page={} size={} sortBy={} sortDir={:?}",
            query.page_number,
            query.page_size,
            query.sort_by,
            query.sort_dir
        );
        let (items, total) = self.tasks.page(&query).await?;
        let total_pages = query.total_pages(total);
        if query.page_number >= total_pages && total_pages > 0 {
            log::warn!(
                "Requested page {} is out of range (totalPages={})",
                query.page_number,
                total_pages
            );
            return Err(ApiError::BadRequest("This page does not exist.".into()));
        }

        let tasks = self.assemble(items).await?;
        let page = TaskPage {
            total_tasks: total,
            page_number: query.page_number,
            page_size: query.page_size,
            total_pages,
            first: query.page_number == 0,
            last: query.page_number + 1 >= total_pages,
            sort_dir: query.sort_dir,
            sort_by: query.sort_by,
            tasks,
        };
        log::debug!("Listed tasks: total={} totalPages={}", total, total_pages);
        Ok(page)
    }

    pub async fn delete(&self, id: i64) -> Result<TaskResponse, ApiError> {
        log::info!("Deleting task id={}", id);
        let task = match self.tasks.find(id).await? {
            Some(task) => task,
            None => {
                log::warn!("Delete failed: task id={} not found", id);
                return Err(ApiError::NotFound(format!("Task {} not found", id)));
            }
        };

        let response = self.assemble_one(task).await?;
        if self.tasks.delete(id).await?.is_none() {
            log::warn!("Delete failed: task id={} not found", id);
            return Err(ApiError::NotFound(format!("Task {} not found", id)));
        }
        log::info!("Deleted task id={} (title='{}')", id, response.title);
        Ok(response)
    }

    async fn assemble_one(&self, task: Task) -> Result<TaskResponse, ApiError> {
        let mut responses = self.assemble(vec![task]).await?;
        responses
            .pop()
            .ok_or_else(|| ApiError::Internal("empty snapshot assembly".into()))
    }

    async fn assemble(&self, tasks: Vec<Task>) -> Result<Vec<TaskResponse>, ApiError> {
        let mut ids: Vec<i64> = tasks.iter().map(|t| t.project_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let summaries: HashMap<i64, ProjectSummary> = self
            .projects
            .summaries_by_ids(&ids)
            .await?
            .into_iter()
            .map(|summary| (summary.id, summary))
            .collect();

        tasks
            .into_iter()
            .map(|task| -> Result<TaskResponse, ApiError> {
                let project = summaries.get(&task.project_id).cloned().ok_or_else(|| {
                    ApiError::Internal(format!(
                        "project {} missing for task {}",
                        task.project_id, task.id
                    ))
                })?;
                Ok(TaskResponse {
                    id: task.id,
                    title: task.title,
                    description: task.description,
                    status: task.status,
                    created_at: task.created_at,
                    updated_at: task.updated_at,
                    project,
                })
            })
            .collect()
    }
}
