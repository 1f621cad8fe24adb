mod common;

use actix_web::{http::StatusCode, rt, test, HttpServer};
use serde_json::json;
use std::net::TcpListener;

use common::{admin_token, bearer, build_app, token_with_groups, user_token};
use projectdesk::storage::memory::MemoryStore;

async fn create_project(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    name: &str,
) -> i64 {
    let req = test::TestRequest::post()
        .uri("/api/v1/projects")
        .append_header(bearer(&admin_token()))
        .set_json(json!({"name": name, "description": format!("{} description", name)}))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "project setup failed");
    let body: serde_json::Value = test::read_body_json(resp).await;
    body["id"].as_i64().expect("project id")
}

#[test_log::test(actix_rt::test)]
async fn test_task_crud_flow() {
    let app = test::init_service(build_app(MemoryStore::new())).await;
    let user = user_token();
    let project_id = create_project(&app, "Website Redesign").await;

    // Create (USER role is enough)
    let req = test::TestRequest::post()
        .uri("/api/v1/tasks")
        .append_header(bearer(&user))
        .set_json(json!({
            "projectId": project_id,
            "title": "Prepare sprint demo",
            "description": "Slides and talking points",
            "status": "TODO"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let created: serde_json::Value = test::read_body_json(resp).await;
    let task_id = created["id"].as_i64().expect("task id");
    assert_eq!(location.as_deref(), Some(&*format!("/api/v1/tasks/{}", task_id)));
    assert_eq!(created["title"], "Prepare sprint demo");
    assert_eq!(created["status"], "TODO");
    assert_eq!(created["project"]["id"], json!(project_id));
    assert_eq!(created["project"]["name"], "Website Redesign");
    assert!(created["updatedAt"].as_str() >= created["createdAt"].as_str());

    // The project snapshot now embeds the task summary
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/projects/{}", project_id))
        .append_header(bearer(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let project: serde_json::Value = test::read_body_json(resp).await;
    let tasks = project["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], json!(task_id));
    assert_eq!(tasks[0]["status"], "TODO");

    // Update
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/tasks/{}", task_id))
        .append_header(bearer(&user))
        .set_json(json!({
            "projectId": project_id,
            "title": "Prepare sprint demo",
            "description": "Recording added",
            "status": "IN_PROGRESS"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(updated["status"], "IN_PROGRESS");
    assert_eq!(updated["description"], "Recording added");

    // Page
    let req = test::TestRequest::get()
        .uri("/api/v1/tasks?sortBy=status")
        .append_header(bearer(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(page["totalTasks"], 1);
    assert_eq!(page["totalPages"], 1);
    assert_eq!(page["sortBy"], "status");
    assert_eq!(page["tasks"][0]["id"], json!(task_id));

    // Delete is admin-only: the user is refused, the admin gets the
    // snapshot back
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/tasks/{}", task_id))
        .append_header(bearer(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/tasks/{}", task_id))
        .append_header(bearer(&admin_token()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(deleted["id"], json!(task_id));

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/tasks/{}", task_id))
        .append_header(bearer(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_create_task_under_missing_project_is_not_found() {
    let app = test::init_service(build_app(MemoryStore::new())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/tasks")
        .append_header(bearer(&user_token()))
        .set_json(json!({
            "projectId": 777,
            "title": "Orphan",
            "description": "No home",
            "status": "TODO"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Project 777 not found");
}

#[actix_rt::test]
async fn test_move_to_missing_project_leaves_task_unchanged() {
    let app = test::init_service(build_app(MemoryStore::new())).await;
    let user = user_token();
    let project_id = create_project(&app, "Home").await;

    let req = test::TestRequest::post()
        .uri("/api/v1/tasks")
        .append_header(bearer(&user))
        .set_json(json!({
            "projectId": project_id,
            "title": "Stay put",
            "description": "Anchored",
            "status": "TODO"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let created: serde_json::Value = test::read_body_json(resp).await;
    let task_id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/tasks/{}", task_id))
        .append_header(bearer(&user))
        .set_json(json!({
            "projectId": 999,
            "title": "Moved",
            "description": "Gone",
            "status": "DONE"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/tasks/{}", task_id))
        .append_header(bearer(&user))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let unchanged: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(unchanged["project"]["id"], json!(project_id));
    assert_eq!(unchanged["title"], "Stay put");
    assert_eq!(unchanged["status"], "TODO");
}

#[actix_rt::test]
async fn test_deleting_project_cascades_to_tasks() {
    let app = test::init_service(build_app(MemoryStore::new())).await;
    let project_id = create_project(&app, "Doomed").await;

    let req = test::TestRequest::post()
        .uri("/api/v1/tasks")
        .append_header(bearer(&user_token()))
        .set_json(json!({
            "projectId": project_id,
            "title": "Goes down with the ship",
            "description": "Cascade target",
            "status": "TODO"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let created: serde_json::Value = test::read_body_json(resp).await;
    let task_id = created["id"].as_i64().unwrap();

    // The deleted-project snapshot still lists the task
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/projects/{}", project_id))
        .append_header(bearer(&admin_token()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(deleted["tasks"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/tasks/{}", task_id))
        .append_header(bearer(&user_token()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_invalid_status_literal_is_rejected() {
    let app = test::init_service(build_app(MemoryStore::new())).await;
    let project_id = create_project(&app, "Enum check").await;

    let req = test::TestRequest::post()
        .uri("/api/v1/tasks")
        .append_header(bearer(&user_token()))
        .set_json(json!({
            "projectId": project_id,
            "title": "Bad status",
            "description": "Typo in status",
            "status": "TODOasdasd"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        body["message"],
        "Invalid task status. Accepted values: TODO, IN_PROGRESS, DONE."
    );
}

#[actix_rt::test]
async fn test_non_numeric_task_id_is_rejected() {
    let app = test::init_service(build_app(MemoryStore::new())).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/tasks/not-a-number")
        .append_header(bearer(&user_token()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Invalid path parameter"));
}

#[actix_rt::test]
async fn test_token_without_roles_cannot_reach_tasks() {
    let app = test::init_service(build_app(MemoryStore::new())).await;
    let roleless = token_with_groups(&[]);

    // Project reads only need authentication...
    let req = test::TestRequest::get()
        .uri("/api/v1/projects")
        .append_header(bearer(&roleless))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // ...but every task route requires ADMIN or USER.
    let req = test::TestRequest::get()
        .uri("/api/v1/tasks")
        .append_header(bearer(&roleless))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_unauthenticated_request_is_rejected() {
    // Full server round-trip: no Authorization header at all.
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let store = MemoryStore::new();
    let server_handle = rt::spawn(async move {
        HttpServer::new(move || build_app(store.clone()))
            .bind(("127.0.0.1", port))
            .unwrap_or_else(|_| panic!("Failed to bind to port {}", port))
            .run()
            .await
    });

    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{}/api/v1/tasks", port))
        .json(&json!({
            "projectId": 1,
            "title": "No token",
            "description": "Should be refused",
            "status": "TODO"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    // Health stays reachable without a token
    let resp = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    server_handle.abort();
}
