use crate::{
    error::{ApiError, RequestError},
    models::ProjectInput,
    paging::PageParams,
    services::ProjectService,
};
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

/// Sort fields accepted by the project list endpoint.
pub const SORTABLE_FIELDS: &[&str] = &["id", "name", "createdAt", "updatedAt"];

const CONTROLLER: &str = "projects";

/// Creates a new project. ADMIN only (enforced by the auth middleware).
///
/// ## Responses:
/// - `201 Created`: the created snapshot; `Location` points to the new
///   resource.
/// - `400 Bad Request`: validation failure with a field-error list.
#[post("")]
pub async fn create_project(
    service: web::Data<ProjectService>,
    body: web::Json<ProjectInput>,
    req: HttpRequest,
) -> Result<impl Responder, RequestError> {
    body.validate()
        .map_err(|e| ApiError::from(e).at(&req, CONTROLLER, "create_project"))?;

    let created = service
        .create(body.into_inner())
        .await
        .map_err(|e| e.at(&req, CONTROLLER, "create_project"))?;

    Ok(HttpResponse::Created()
        .insert_header(("Location", format!("/api/v1/projects/{}", created.id)))
        .json(created))
}

/// Updates an existing project by id. ADMIN only.
///
/// ## Responses:
/// - `200 OK`: the updated snapshot.
/// - `404 Not Found`: no project with that id.
#[post("/{id}")]
pub async fn update_project(
    service: web::Data<ProjectService>,
    id: web::Path<i64>,
    body: web::Json<ProjectInput>,
    req: HttpRequest,
) -> Result<impl Responder, RequestError> {
    body.validate()
        .map_err(|e| ApiError::from(e).at(&req, CONTROLLER, "update_project"))?;

    let updated = service
        .update(id.into_inner(), body.into_inner())
        .await
        .map_err(|e| e.at(&req, CONTROLLER, "update_project"))?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Returns a project by id. Any authenticated caller.
#[get("/{id}")]
pub async fn get_project(
    service: web::Data<ProjectService>,
    id: web::Path<i64>,
    req: HttpRequest,
) -> Result<impl Responder, RequestError> {
    let project = service
        .get(id.into_inner())
        .await
        .map_err(|e| e.at(&req, CONTROLLER, "get_project"))?;

    Ok(HttpResponse::Ok().json(project))
}

/// Returns a page of projects. Any authenticated caller.
///
/// ## Query Parameters:
/// - `pageNumber`: zero-based page index (default 0).
/// - `pageSize`: 1..=200 (default 20).
/// - `sortBy`: one of id|name|createdAt|updatedAt (default id).
/// - `sortDir`: asc|desc, case-insensitive (default asc).
///
/// A page index past the last page and a sort field outside the
/// allow-list are both rejected with 400.
#[get("")]
pub async fn get_projects(
    service: web::Data<ProjectService>,
    params: web::Query<PageParams>,
    req: HttpRequest,
) -> Result<impl Responder, RequestError> {
    params
        .validate()
        .map_err(|e| ApiError::from(e).at(&req, CONTROLLER, "get_projects"))?;

    let query = params
        .into_inner()
        .into_query(SORTABLE_FIELDS)
        .map_err(|e| e.at(&req, CONTROLLER, "get_projects"))?;

    let page = service
        .page(query)
        .await
        .map_err(|e| e.at(&req, CONTROLLER, "get_projects"))?;

    Ok(HttpResponse::Ok().json(page))
}

/// Deletes a project by id and returns a snapshot of the deleted
/// resource, including its (also deleted) tasks. ADMIN only.
#[delete("/{id}")]
pub async fn delete_project(
    service: web::Data<ProjectService>,
    id: web::Path<i64>,
    req: HttpRequest,
) -> Result<impl Responder, RequestError> {
    let deleted = service
        .delete(id.into_inner())
        .await
        .map_err(|e| e.at(&req, CONTROLLER, "delete_project"))?;

    Ok(HttpResponse::Ok().json(deleted))
}
