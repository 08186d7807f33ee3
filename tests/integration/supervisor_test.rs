// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#![cfg(unix)]

use super::helpers::{closed_port_url, fast_policy, ready_backend, transport};
use scrapectl::config::settings::SupervisorSettings;
use scrapectl::infrastructure::api::ReadinessProber;
use scrapectl::infrastructure::process::BackendSupervisor;
use scrapectl::utils::errors::SupervisorError;

fn settings(command: &str, args: &[&str]) -> SupervisorSettings {
    SupervisorSettings {
        command: command.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        working_dir: None,
        startup_attempts: 2,
        startup_base_wait_ms: 10,
        startup_max_wait_ms: 20,
        stop_timeout_secs: 2,
    }
}

fn unreachable_prober() -> ReadinessProber {
    ReadinessProber::new(transport(&closed_port_url()), fast_policy(2))
}

#[tokio::test]
async fn stop_without_start_is_noop() {
    let mut supervisor = BackendSupervisor::new(settings("sleep", &["30"]), unreachable_prober());

    supervisor.stop().await;
    supervisor.stop().await;

    assert!(!supervisor.is_running());
    assert_eq!(supervisor.pid(), None);
}

#[tokio::test]
async fn spawn_then_stop_terminates_child() {
    let mut supervisor = BackendSupervisor::new(settings("sleep", &["30"]), unreachable_prober());

    supervisor.spawn().unwrap();
    assert!(supervisor.is_running());
    assert!(supervisor.pid().is_some());

    supervisor.stop().await;
    assert!(!supervisor.is_running());

    // 第二次停止不做任何事
    supervisor.stop().await;
    assert!(!supervisor.is_running());
}

#[tokio::test]
async fn start_fails_fast_for_missing_command() {
    let mut supervisor = BackendSupervisor::new(
        settings("scrapectl-definitely-missing-binary", &[]),
        unreachable_prober(),
    );

    assert!(!supervisor.start().await);
    assert!(!supervisor.is_running());
}

#[tokio::test]
async fn start_succeeds_when_backend_is_ready() {
    let server = ready_backend().await;
    let prober = ReadinessProber::new(transport(&server.uri()), fast_policy(2));
    let mut supervisor = BackendSupervisor::new(settings("sleep", &["30"]), prober);

    assert!(supervisor.start().await);
    assert!(supervisor.is_running());

    supervisor.stop().await;
    assert!(!supervisor.is_running());
}

#[tokio::test]
async fn early_exit_is_reported() {
    let mut supervisor = BackendSupervisor::new(settings("true", &[]), unreachable_prober());

    supervisor.spawn().unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let err = supervisor.wait_until_ready().await.unwrap_err();
    assert!(matches!(err, SupervisorError::Exited(_)));

    supervisor.stop().await;
}

#[tokio::test]
async fn never_ready_backend_gives_up() {
    let mut supervisor = BackendSupervisor::new(settings("sleep", &["30"]), unreachable_prober());

    supervisor.spawn().unwrap();
    let err = supervisor.wait_until_ready().await.unwrap_err();

    assert!(matches!(err, SupervisorError::NotReady { attempts: 2 }));
    supervisor.stop().await;
}
