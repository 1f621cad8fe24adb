use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::sync::Arc;

use projectdesk::auth::AuthMiddleware;
use projectdesk::config::Config;
use projectdesk::error::{json_error_handler, path_error_handler, query_error_handler};
use projectdesk::routes;
use projectdesk::services::{ProjectService, TaskService};
use projectdesk::storage::postgres::{PgProjectStore, PgTaskStore};
use projectdesk::storage::{ProjectStore, TaskStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let auth_settings = Arc::new(config.auth_settings());
    let projects: Arc<dyn ProjectStore> = Arc::new(PgProjectStore::new(pool.clone()));
    let tasks: Arc<dyn TaskStore> = Arc::new(PgTaskStore::new(pool));
    let project_service = web::Data::new(ProjectService::new(projects.clone(), tasks.clone()));
    let task_service = web::Data::new(TaskService::new(tasks, projects));

    log::info!("Starting server at {}", config.server_url());
    let bind_addr = (config.server_host.clone(), config.server_port);
    HttpServer::new(move || {
        App::new()
            .app_data(project_service.clone())
            .app_data(task_service.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .wrap(Logger::default())
            .wrap(cors())
            .service(routes::health::health)
            .service(
                web::scope("/api/v1")
                    .wrap(AuthMiddleware::new(auth_settings.clone()))
                    .configure(routes::config),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}

// Mirrors the browser clients we serve during development: any localhost
// port, credentials allowed.
fn cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|origin, _| origin.as_bytes().starts_with(b"http://localhost"))
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allow_any_header()
        .expose_headers(vec!["Authorization", "WWW-Authenticate"])
        .supports_credentials()
        .max_age(3600)
}
