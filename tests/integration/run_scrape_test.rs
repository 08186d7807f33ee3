// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{ready_backend, results_json, task_client, task_json, RecordingSink};
use scrapectl::application::usecases::scrape_task::{ScrapeOptions, ScrapeTaskUseCase};
use scrapectl::domain::models::dispatch_request::DispatchRequest;
use scrapectl::domain::models::task::{TaskId, TaskStatus};
use scrapectl::infrastructure::storage::InMemoryStorage;
use scrapectl::utils::errors::{ApiError, RunError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options() -> ScrapeOptions {
    ScrapeOptions {
        scraper_name: Some("google_maps_scraper".to_string()),
        sync: true,
        poll_interval: Duration::from_millis(10),
        poll_timeout: Duration::from_secs(5),
    }
}

fn request(queries: &[&str]) -> DispatchRequest {
    DispatchRequest {
        queries: queries.iter().map(|q| q.to_string()).collect(),
        ..DispatchRequest::default()
    }
}

async fn mount_task_lifecycle(server: &MockServer, id: i64) {
    Mock::given(method("POST"))
        .and(path("/api/tasks/create-task-sync"))
        .and(body_partial_json(json!({
            "data": {"queries": ["a", "b"]},
            "scraper_name": "google_maps_scraper"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(id, "completed")))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/tasks/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(id, "completed")))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/api/tasks/{}/results", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_json(vec![
            json!({"name": "A"}),
            json!({"name": "B"}),
        ])))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/api/tasks/{}/download", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", "attachment; filename=\"results.json\"")
                .set_body_bytes(br#"[{"name":"A"},{"name":"B"}]"#.to_vec()),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/api/tasks/{}/abort", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/api/tasks/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn run_executes_full_sequence() {
    let server = ready_backend().await;
    mount_task_lifecycle(&server, 21).await;

    let storage = InMemoryStorage::new();
    let client = task_client(&server, &storage, true).await;
    let sink = Arc::new(RecordingSink::default());
    let use_case = ScrapeTaskUseCase::new(client, sink.clone(), options());

    let summary = use_case.run(&request(&["a", "b"])).await.unwrap();

    assert_eq!(summary.task_id, TaskId::from(21));
    assert_eq!(summary.status, TaskStatus::Completed);
    assert_eq!(summary.query, "a, b");
    assert_eq!(summary.result_count, 2);
    assert_eq!(summary.download_filename, "results.json");
    assert!(summary.download_bytes > 0);

    let rows = sink.rows.lock().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "a, b");
    assert_eq!(
        rows[0].1["results"],
        json!([{"name": "A"}, {"name": "B"}])
    );

    let keys = storage.keys().await;
    assert!(keys.contains(&"results.json".to_string()));
    assert!(keys.contains(&"create_create-task-sync.json".to_string()));
    assert!(keys.contains(&"abort_task.json".to_string()));
}

#[tokio::test]
async fn empty_queries_fail_before_any_call() {
    let server = ready_backend().await;
    let storage = InMemoryStorage::new();
    let client = task_client(&server, &storage, false).await;
    let health_checks = server.received_requests().await.unwrap().len();

    let use_case = ScrapeTaskUseCase::new(client, Arc::new(RecordingSink::default()), options());
    let err = use_case.run(&request(&[])).await.unwrap_err();

    assert!(matches!(err, RunError::Dispatch(_)));
    assert_eq!(err.to_string(), "Validation error: Queries are required for scraping.");
    assert_eq!(server.received_requests().await.unwrap().len(), health_checks);
}

#[tokio::test]
async fn client_error_propagates_with_backend_message() {
    let server = ready_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/create-task-sync"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid scraper"})),
        )
        .mount(&server)
        .await;

    let storage = InMemoryStorage::new();
    let client = task_client(&server, &storage, false).await;
    let sink = Arc::new(RecordingSink::default());
    let use_case = ScrapeTaskUseCase::new(client, sink.clone(), options());

    let err = use_case.run(&request(&["a"])).await.unwrap_err();

    assert!(matches!(
        err,
        RunError::Api(ApiError::Client { status: 400, .. })
    ));
    assert_eq!(err.to_string(), "API error: Invalid scraper");
    assert!(sink.rows.lock().await.is_empty());
}
