pub mod health;
pub mod projects;
pub mod tasks;

use actix_web::web;

/// Registers the resource routes under the caller's scope (`/api/v1`).
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/projects")
            .service(projects::get_projects)
            .service(projects::create_project)
            .service(projects::get_project)
            .service(projects::update_project)
            .service(projects::delete_project),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
