//! Shared helpers for the HTTP-level tests: an app over the in-memory
//! store and signed access tokens for each role.

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use std::sync::Arc;

use projectdesk::auth::{AuthMiddleware, AuthSettings};
use projectdesk::error::{json_error_handler, path_error_handler, query_error_handler};
use projectdesk::routes;
use projectdesk::services::{ProjectService, TaskService};
use projectdesk::storage::memory::MemoryStore;
use projectdesk::storage::{ProjectStore, TaskStore};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_ISSUER: &str = "https://issuer.test/projectdesk";
pub const TEST_CLIENT_ID: &str = "projectdesk-client";

pub fn auth_settings() -> Arc<AuthSettings> {
    Arc::new(AuthSettings::new(
        TEST_SECRET,
        TEST_ISSUER.to_string(),
        TEST_CLIENT_ID.to_string(),
    ))
}

pub fn build_app(
    store: MemoryStore,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let projects: Arc<dyn ProjectStore> = Arc::new(store.clone());
    let tasks: Arc<dyn TaskStore> = Arc::new(store);
    App::new()
        .app_data(web::Data::new(ProjectService::new(
            projects.clone(),
            tasks.clone(),
        )))
        .app_data(web::Data::new(TaskService::new(tasks, projects)))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(routes::health::health)
        .service(
            web::scope("/api/v1")
                .wrap(AuthMiddleware::new(auth_settings()))
                .configure(routes::config),
        )
}

pub fn token_with_groups(groups: &[&str]) -> String {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp();
    let claims = json!({
        "sub": "it-user",
        "username": "it-user",
        "exp": exp,
        "iss": TEST_ISSUER,
        "token_use": "access",
        "client_id": TEST_CLIENT_ID,
        "groups": groups,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("failed to sign test token")
}

pub fn admin_token() -> String {
    token_with_groups(&["ADMIN"])
}

pub fn user_token() -> String {
    token_with_groups(&["USER"])
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
