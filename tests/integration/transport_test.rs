// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{closed_port_url, transport};
use reqwest::Method;
use scrapectl::utils::errors::ApiError;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn success_body_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let body = transport(&server.uri())
        .send(
            Method::GET,
            "api/tasks",
            None,
            Some(&[("page", "2".to_string())]),
        )
        .await
        .unwrap();

    assert_eq!(body, json!({"results": []}));
}

#[tokio::test]
async fn client_error_carries_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Task not found"})))
        .mount(&server)
        .await;

    let err = transport(&server.uri())
        .send(Method::GET, "api/tasks/9", None, None)
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        ApiError::Client { status: 404, message: Some(m) } if m == "Task not found"
    ));
    assert_eq!(err.to_string(), "Task not found");
}

#[tokio::test]
async fn client_error_without_message_is_generic() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/create-task-sync"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"detail": "bad"})))
        .mount(&server)
        .await;

    let err = transport(&server.uri())
        .send(Method::POST, "api/tasks/create-task-sync", Some(&json!({})), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Client { status: 422, message: None }));
    assert_eq!(err.to_string(), "422 Client Error");
}

#[tokio::test]
async fn server_error_ignores_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;

    let err = transport(&server.uri())
        .send(Method::DELETE, "api/tasks/1", None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Server { status: 500 }));
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn connection_refused_is_unreachable() {
    let base = closed_port_url();

    let err = transport(&base)
        .send(Method::GET, "api/tasks", None, None)
        .await
        .unwrap_err();

    assert!(err.is_unreachable());
    assert!(err.to_string().contains(&base));
}
