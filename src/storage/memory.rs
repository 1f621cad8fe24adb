//! Map-backed store used by the HTTP-level test suite.
//!
//! Behaves like the Postgres stores: ids are assigned monotonically,
//! timestamps are server-side, the project delete cascades to tasks, and
//! paging applies the same sort semantics (allow-listed field, direction,
//! id tie-break).

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::ApiError;
use crate::models::{Project, ProjectInput, ProjectSummary, Task, TaskInput, TaskSummary};
use crate::paging::{PageQuery, SortDir};
use crate::storage::{ProjectStore, TaskStore};

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    projects: BTreeMap<i64, Project>,
    tasks: BTreeMap<i64, Task>,
    next_project_id: i64,
    next_task_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store lock poisoned")
    }
}

fn apply_dir(ord: std::cmp::Ordering, dir: SortDir) -> std::cmp::Ordering {
    match dir {
        SortDir::Asc => ord,
        SortDir::Desc => ord.reverse(),
    }
}

fn sort_projects(items: &mut [Project], query: &PageQuery) {
    items.sort_by(|a, b| {
        let ord = match query.sort_by.as_str() {
            "name" => a.name.cmp(&b.name),
            "createdAt" => a.created_at.cmp(&b.created_at),
            "updatedAt" => a.updated_at.cmp(&b.updated_at),
            _ => a.id.cmp(&b.id),
        };
        apply_dir(ord, query.sort_dir).then(a.id.cmp(&b.id))
    });
}

fn sort_tasks(items: &mut [Task], query: &PageQuery) {
    items.sort_by(|a, b| {
        let ord = match query.sort_by.as_str() {
            "title" => a.title.cmp(&b.title),
            "status" => a.status.cmp(&b.status),
            "project" => a.project_id.cmp(&b.project_id),
            "createdAt" => a.created_at.cmp(&b.created_at),
            "updatedAt" => a.updated_at.cmp(&b.updated_at),
            _ => a.id.cmp(&b.id),
        };
        apply_dir(ord, query.sort_dir).then(a.id.cmp(&b.id))
    });
}

fn slice_page<T>(items: Vec<T>, query: &PageQuery) -> Vec<T> {
    items
        .into_iter()
        .skip(query.offset() as usize)
        .take(query.limit() as usize)
        .collect()
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn insert(&self, input: &ProjectInput) -> Result<Project, ApiError> {
        let mut inner = self.lock();
        inner.next_project_id += 1;
        let now = Utc::now();
        let project = Project {
            id: inner.next_project_id,
            name: input.name.clone(),
            description: input.description.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn update(&self, id: i64, input: &ProjectInput) -> Result<Option<Project>, ApiError> {
        let mut inner = self.lock();
        match inner.projects.get_mut(&id) {
            Some(project) => {
                project.name = input.name.clone();
                project.description = input.description.clone();
                project.updated_at = Utc::now();
                Ok(Some(project.clone()))
            }
            None => Ok(None),
        }
    }

    async fn find(&self, id: i64) -> Result<Option<Project>, ApiError> {
        Ok(self.lock().projects.get(&id).cloned())
    }

    async fn page(&self, query: &PageQuery) -> Result<(Vec<Project>, i64), ApiError> {
        let inner = self.lock();
        let total = inner.projects.len() as i64;
        let mut items: Vec<Project> = inner.projects.values().cloned().collect();
        sort_projects(&mut items, query);
        Ok((slice_page(items, query), total))
    }

    async fn delete(&self, id: i64) -> Result<Option<Project>, ApiError> {
        let mut inner = self.lock();
        let project = inner.projects.remove(&id);
        if project.is_some() {
            inner.tasks.retain(|_, task| task.project_id != id);
        }
        Ok(project)
    }

    async fn exists(&self, id: i64) -> Result<bool, ApiError> {
        Ok(self.lock().projects.contains_key(&id))
    }

    async fn summaries_by_ids(&self, ids: &[i64]) -> Result<Vec<ProjectSummary>, ApiError> {
        let inner = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| inner.projects.get(id))
            .map(|p| ProjectSummary {
                id: p.id,
                name: p.name.clone(),
                updated_at: p.updated_at,
            })
            .collect())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert(&self, input: &TaskInput) -> Result<Task, ApiError> {
        let mut inner = self.lock();
        inner.next_task_id += 1;
        let now = Utc::now();
        let task = Task {
            id: inner.next_task_id,
            project_id: input.project_id,
            title: input.title.clone(),
            description: input.description.clone(),
            status: input.status,
            created_at: now,
            updated_at: now,
        };
        inner.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update(&self, id: i64, input: &TaskInput) -> Result<Option<Task>, ApiError> {
        let mut inner = self.lock();
        match inner.tasks.get_mut(&id) {
            Some(task) => {
                task.project_id = input.project_id;
                task.title = input.title.clone();
                task.description = input.description.clone();
                task.status = input.status;
                task.updated_at = Utc::now();
                Ok(Some(task.clone()))
            }
            None => Ok(None),
        }
    }

    async fn find(&self, id: i64) -> Result<Option<Task>, ApiError> {
        Ok(self.lock().tasks.get(&id).cloned())
    }

    async fn page(&self, query: &PageQuery) -> Result<(Vec<Task>, i64), ApiError> {
        let inner = self.lock();
        let total = inner.tasks.len() as i64;
        let mut items: Vec<Task> = inner.tasks.values().cloned().collect();
        sort_tasks(&mut items, query);
        Ok((slice_page(items, query), total))
    }

    async fn delete(&self, id: i64) -> Result<Option<Task>, ApiError> {
        Ok(self.lock().tasks.remove(&id))
    }

    async fn summaries_for_projects(
        &self,
        project_ids: &[i64],
    ) -> Result<Vec<(i64, TaskSummary)>, ApiError> {
        let inner = self.lock();
        Ok(inner
            .tasks
            .values()
            .filter(|task| project_ids.contains(&task.project_id))
            .map(|task| {
                (
                    task.project_id,
                    TaskSummary {
                        id: task.id,
                        title: task.title.clone(),
                        status: task.status,
                        updated_at: task.updated_at,
                    },
                )
            })
            .collect())
    }
}
