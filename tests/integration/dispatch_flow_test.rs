// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{ready_backend, results_json, task_client, task_json};
use scrapectl::application::gateway::DispatchGateway;
use scrapectl::application::usecases::scrape_task::{ScrapeOptions, ScrapeTaskUseCase};
use scrapectl::domain::models::dispatch_request::DispatchRequest;
use scrapectl::domain::models::outcome::{DispatchRecord, DispatchStatus};
use scrapectl::domain::models::task::TaskStatus;
use scrapectl::infrastructure::repositories::outcome_repo_impl::InMemoryOutcomeRepository;
use scrapectl::infrastructure::repositories::scraped_data_repo_impl::LoggingResultSink;
use scrapectl::infrastructure::storage::InMemoryStorage;
use scrapectl::domain::repositories::outcome_repository::OutcomeRepository;
use scrapectl::queue::task_queue::{BoundedTaskQueue, DispatchJob, TaskQueue};
use scrapectl::workers::dispatch_worker::DispatchWorker;
use scrapectl::workers::manager::WorkerManager;
use scrapectl::workers::worker::Worker;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options() -> ScrapeOptions {
    ScrapeOptions {
        scraper_name: Some("google_maps_scraper".to_string()),
        sync: false,
        poll_interval: Duration::from_millis(10),
        poll_timeout: Duration::from_secs(5),
    }
}

async fn start_pool(server: &MockServer, workers: usize) -> (DispatchGateway, WorkerManager) {
    let storage = InMemoryStorage::new();
    let client = task_client(server, &storage, false).await;
    let use_case = Arc::new(ScrapeTaskUseCase::new(
        client,
        Arc::new(LoggingResultSink),
        options(),
    ));

    let queue = Arc::new(BoundedTaskQueue::new(8));
    let outcomes = Arc::new(InMemoryOutcomeRepository::new());

    let mut manager = WorkerManager::new(queue.clone(), use_case, outcomes.clone());
    manager.start_workers(workers);

    (DispatchGateway::new(queue, outcomes), manager)
}

async fn wait_finished(gateway: &DispatchGateway, dispatch_id: Uuid) -> DispatchRecord {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let record = gateway.status(dispatch_id).unwrap();
        if record.status.is_finished() {
            return record;
        }
        assert!(Instant::now() < deadline, "dispatch did not finish in time");
        sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn accepted_dispatch_completes_in_background() {
    let server = ready_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/create-task-async"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(task_json(1, "pending"))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(1, "completed")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/1/results"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(results_json(vec![json!({"name": "Barber A"})])),
        )
        .mount(&server)
        .await;

    let (gateway, mut manager) = start_pool(&server, 2).await;

    let started = Instant::now();
    let accepted = gateway
        .submit(json!({"queries": "Barbershop in Montreal"}))
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_millis(200));
    assert!(!gateway.status(accepted.dispatch_id).unwrap().status.is_finished());

    let record = wait_finished(&gateway, accepted.dispatch_id).await;
    match record.status {
        DispatchStatus::Completed { task, results } => {
            assert_eq!(task.status, TaskStatus::Completed);
            assert_eq!(results.results, vec![json!({"name": "Barber A"})]);
        }
        other => panic!("unexpected status: {:?}", other),
    }

    manager.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn backend_failure_is_recorded() {
    let server = ready_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/create-task-async"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (gateway, mut manager) = start_pool(&server, 1).await;

    let accepted = gateway.submit(json!({"queries": ["a"]})).await.unwrap();
    let record = wait_finished(&gateway, accepted.dispatch_id).await;

    match record.status {
        DispatchStatus::Failed { error } => assert!(error.contains("500")),
        other => panic!("unexpected status: {:?}", other),
    }

    manager.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn workers_keep_running_after_a_failed_job() {
    let server = ready_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/create-task-async"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "Bad input"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/create-task-async"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(2, "completed")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(2, "completed")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/2/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results_json(vec![])))
        .mount(&server)
        .await;

    let (gateway, mut manager) = start_pool(&server, 1).await;

    let first = gateway.submit(json!({"queries": "a"})).await.unwrap();
    let second = gateway.submit(json!({"queries": "b"})).await.unwrap();

    let first = wait_finished(&gateway, first.dispatch_id).await;
    let second = wait_finished(&gateway, second.dispatch_id).await;

    assert!(matches!(first.status, DispatchStatus::Failed { ref error } if error == "Bad input"));
    assert!(matches!(second.status, DispatchStatus::Completed { .. }));

    manager.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn worker_drains_queue_and_returns_after_close() {
    let server = ready_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/create-task-async"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let storage = InMemoryStorage::new();
    let client = task_client(&server, &storage, false).await;
    let use_case = Arc::new(ScrapeTaskUseCase::new(
        client,
        Arc::new(LoggingResultSink),
        options(),
    ));
    let queue = Arc::new(BoundedTaskQueue::new(4));
    let outcomes = Arc::new(InMemoryOutcomeRepository::new());

    let ids: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
    for id in &ids {
        outcomes.register(*id);
        let request = DispatchRequest::parse(json!({"queries": "a"})).unwrap();
        queue.enqueue(DispatchJob::new(*id, request)).await.unwrap();
    }
    queue.close().await;

    let worker = DispatchWorker::new(queue.clone(), use_case, outcomes.clone());
    assert!(worker.name().starts_with("dispatch-worker-"));
    tokio::time::timeout(Duration::from_secs(5), worker.run())
        .await
        .unwrap();

    for id in ids {
        let record = outcomes.get(id).unwrap();
        assert!(matches!(record.status, DispatchStatus::Failed { .. }));
    }
}
