use crate::{
    error::{ApiError, RequestError},
    models::TaskInput,
    paging::PageParams,
    services::TaskService,
};
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

/// Sort fields accepted by the task list endpoint; `project` sorts by the
/// owning project's id.
pub const SORTABLE_FIELDS: &[&str] = &["id", "title", "status", "project", "createdAt", "updatedAt"];

const CONTROLLER: &str = "tasks";

/// Creates a new task under an existing project. ADMIN or USER.
///
/// ## Responses:
/// - `201 Created`: the created snapshot; `Location` points to the new
///   resource.
/// - `404 Not Found`: the referenced project does not exist.
#[post("")]
pub async fn create_task(
    service: web::Data<TaskService>,
    body: web::Json<TaskInput>,
    req: HttpRequest,
) -> Result<impl Responder, RequestError> {
    body.validate()
        .map_err(|e| ApiError::from(e).at(&req, CONTROLLER, "create_task"))?;

    let created = service
        .create(body.into_inner())
        .await
        .map_err(|e| e.at(&req, CONTROLLER, "create_task"))?;

    Ok(HttpResponse::Created()
        .insert_header(("Location", format!("/api/v1/tasks/{}", created.id)))
        .json(created))
}

/// Updates title/description/status and optionally moves the task to
/// another project. ADMIN or USER.
///
/// ## Responses:
/// - `200 OK`: the updated snapshot.
/// - `404 Not Found`: the task, or the target project of a move, does
///   not exist. A failed move leaves the task unchanged.
#[post("/{id}")]
pub async fn update_task(
    service: web::Data<TaskService>,
    id: web::Path<i64>,
    body: web::Json<TaskInput>,
    req: HttpRequest,
) -> Result<impl Responder, RequestError> {
    body.validate()
        .map_err(|e| ApiError::from(e).at(&req, CONTROLLER, "update_task"))?;

    let updated = service
        .update(id.into_inner(), body.into_inner())
        .await
        .map_err(|e| e.at(&req, CONTROLLER, "update_task"))?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Returns a task by id. ADMIN or USER.
#[get("/{id}")]
pub async fn get_task(
    service: web::Data<TaskService>,
    id: web::Path<i64>,
    req: HttpRequest,
) -> Result<impl Responder, RequestError> {
    let task = service
        .get(id.into_inner())
        .await
        .map_err(|e| e.at(&req, CONTROLLER, "get_task"))?;

    Ok(HttpResponse::Ok().json(task))
}

/// Returns a page of tasks. ADMIN or USER. Takes the same paging
/// parameters as the project list.
#[get("")]
pub async fn get_tasks(
    service: web::Data<TaskService>,
    params: web::Query<PageParams>,
    req: HttpRequest,
) -> Result<impl Responder, RequestError> {
    params
        .validate()
        .map_err(|e| ApiError::from(e).at(&req, CONTROLLER, "get_tasks"))?;

    let query = params
        .into_inner()
        .into_query(SORTABLE_FIELDS)
        .map_err(|e| e.at(&req, CONTROLLER, "get_tasks"))?;

    let page = service
        .page(query)
        .await
        .map_err(|e| e.at(&req, CONTROLLER, "get_tasks"))?;

    Ok(HttpResponse::Ok().json(page))
}

/// Deletes a task by id and returns its snapshot. ADMIN only.
#[delete("/{id}")]
pub async fn delete_task(
    service: web::Data<TaskService>,
    id: web::Path<i64>,
    req: HttpRequest,
) -> Result<impl Responder, RequestError> {
    let deleted = service
        .delete(id.into_inner())
        .await
        .map_err(|e| e.at(&req, CONTROLLER, "delete_task"))?;

    Ok(HttpResponse::Ok().json(deleted))
}
