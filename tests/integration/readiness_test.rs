// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{closed_port_url, fast_policy, transport};
use scrapectl::infrastructure::api::ReadinessProber;
use scrapectl::utils::errors::ApiError;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn succeeds_on_third_attempt_after_two_503() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let prober = ReadinessProber::new(transport(&server.uri()), fast_policy(5));
    let report = prober.probe().await;

    assert!(report.ready);
    assert!(report.error.is_none());
    assert_eq!(report.attempts, 3);
    assert_eq!(
        report.delays,
        vec![Duration::from_millis(10), Duration::from_millis(20)]
    );
}

#[tokio::test]
async fn never_accepting_backend_fails_after_budget() {
    let prober = ReadinessProber::new(transport(&closed_port_url()), fast_policy(4));
    let report = prober.probe().await;

    assert!(!report.ready);
    assert_eq!(report.attempts, 4);
    assert_eq!(report.delays.len(), 3);
    assert!(report.delays.windows(2).all(|w| w[0] <= w[1]));
    assert!(report.delays.iter().all(|d| *d <= Duration::from_millis(40)));

    let err = report.error.unwrap();
    assert!(err.is_unreachable());
    assert!(err.to_string().contains("different endpoint"));
}

#[tokio::test]
async fn wait_until_ready_surfaces_unreachable() {
    let prober = ReadinessProber::new(transport(&closed_port_url()), fast_policy(2));
    let err = prober.wait_until_ready().await.unwrap_err();
    assert!(err.is_unreachable());
}

#[tokio::test]
async fn reachable_but_never_ready_returns_false() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let prober = ReadinessProber::new(transport(&server.uri()), fast_policy(3));

    assert!(!prober.wait_until_ready().await.unwrap());
}

#[tokio::test]
async fn stalled_health_check_times_out_before_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(8)))
        .mount(&server)
        .await;

    let readiness = ReadinessProber::new(transport(&server.uri()), fast_policy(2));
    let started = Instant::now();
    let report = readiness.probe().await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!report.ready);
    assert_eq!(report.attempts, 2);
    assert!(matches!(report.error, Some(ApiError::Transport(_))));
}
