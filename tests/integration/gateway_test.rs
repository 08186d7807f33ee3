// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_test::TestServer;
use scrapectl::application::gateway::DispatchGateway;
use scrapectl::infrastructure::repositories::outcome_repo_impl::InMemoryOutcomeRepository;
use scrapectl::presentation::routes;
use scrapectl::queue::task_queue::{BoundedTaskQueue, TaskQueue};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    server: TestServer,
    queue: Arc<BoundedTaskQueue>,
    outcomes: Arc<InMemoryOutcomeRepository>,
}

fn create_test_app(capacity: usize) -> TestApp {
    let queue = Arc::new(BoundedTaskQueue::new(capacity));
    let outcomes = Arc::new(InMemoryOutcomeRepository::new());
    let gateway = Arc::new(DispatchGateway::new(queue.clone(), outcomes.clone()));
    let server = TestServer::new(routes::routes(gateway)).unwrap();

    TestApp {
        server,
        queue,
        outcomes,
    }
}

#[tokio::test]
async fn health_check_returns_ok() {
    let queue = Arc::new(BoundedTaskQueue::new(1));
    let outcomes = Arc::new(InMemoryOutcomeRepository::new());
    let app = routes::routes(Arc::new(DispatchGateway::new(queue, outcomes)));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn start_task_is_accepted_and_enqueued() {
    let app = create_test_app(4);

    let response = app
        .server
        .post("/start-task")
        .json(&json!({"queries": "Barbershop in Montreal"}))
        .await;

    response.assert_status(StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["status"], "Task started successfully");
    let dispatch_id: Uuid = body["dispatch_id"].as_str().unwrap().parse().unwrap();

    let job = tokio::time::timeout(Duration::from_secs(1), app.queue.dequeue(Uuid::nil()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.dispatch_id, dispatch_id);
    assert_eq!(job.request.queries, vec!["Barbershop in Montreal"]);
}

#[tokio::test]
async fn status_of_accepted_dispatch_is_pending() {
    let app = create_test_app(4);

    let accepted: Value = app
        .server
        .post("/start-task")
        .json(&json!({"queries": ["a", "b"]}))
        .await
        .json();
    let dispatch_id = accepted["dispatch_id"].as_str().unwrap();

    let response = app
        .server
        .get(&format!("/start-task/{}", dispatch_id))
        .await;

    response.assert_status_ok();
    let record: Value = response.json();
    assert_eq!(record["status"], "pending");
    assert_eq!(record["dispatch_id"], dispatch_id);
}

#[tokio::test]
async fn missing_queries_are_rejected_without_enqueue() {
    let app = create_test_app(4);

    let response = app
        .server
        .post("/start-task")
        .json(&json!({"country": "CA"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Queries are required for scraping.");
    assert!(app.outcomes.is_empty());

    app.queue.close().await;
    assert!(app.queue.dequeue(Uuid::nil()).await.is_none());
}

#[tokio::test]
async fn empty_payload_is_invalid() {
    let app = create_test_app(4);

    for body in ["", "null", "{}", "{broken"] {
        let response = app.server.post("/start-task").text(body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let json: Value = response.json();
        assert_eq!(json["error"], "Invalid payload");
    }
    assert!(app.outcomes.is_empty());
}

#[tokio::test]
async fn full_queue_returns_service_unavailable() {
    let app = create_test_app(1);

    app.server
        .post("/start-task")
        .json(&json!({"queries": "a"}))
        .await
        .assert_status(StatusCode::ACCEPTED);

    let response = app
        .server
        .post("/start-task")
        .json(&json!({"queries": "b"}))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(app.outcomes.len(), 1);
}

#[tokio::test]
async fn unknown_dispatch_is_not_found() {
    let app = create_test_app(1);

    let response = app
        .server
        .get(&format!("/start-task/{}", Uuid::new_v4()))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn string_typed_optional_fields_are_accepted() {
    let app = create_test_app(4);

    let response = app
        .server
        .post("/start-task")
        .json(&json!({
            "queries": "x",
            "max_cities": "5",
            "max_results": "100",
            "randomize_cities": "true",
            "zoom_level": 14.5
        }))
        .await;

    response.assert_status(StatusCode::ACCEPTED);

    let job = tokio::time::timeout(Duration::from_secs(1), app.queue.dequeue(Uuid::nil()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.request.max_cities, Some(5));
    assert_eq!(job.request.max_results, Some(100));
    assert_eq!(job.request.randomize_cities, Some(true));
}
