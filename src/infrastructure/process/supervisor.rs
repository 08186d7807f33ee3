// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::SupervisorSettings;
use crate::infrastructure::api::ReadinessProber;
use crate::utils::errors::{ApiError, SupervisorError};
use crate::utils::retry_policy::retry_with_backoff;
use std::process::{ExitStatus, Stdio};
use sysinfo::{Pid, ProcessesToUpdate, Signal, System};
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{error, info, warn};

/// 启动检查中单次尝试的失败原因
#[derive(Error, Debug)]
enum StartupFailure {
    #[error("backend process exited with {0}")]
    Exited(ExitStatus),

    #[error("backend reachable but not ready")]
    NotReady,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// 后端进程监管器
///
/// 独占持有至多一个子进程句柄：启动、等待就绪、停止。
/// `stop` 可重复调用；句柄被丢弃时子进程也会被终止。
pub struct BackendSupervisor {
    settings: SupervisorSettings,
    prober: ReadinessProber,
    child: Option<Child>,
}

impl BackendSupervisor {
    pub fn new(settings: SupervisorSettings, prober: ReadinessProber) -> Self {
        Self {
            settings,
            prober,
            child: None,
        }
    }

    /// 子进程ID（未启动或已停止时为 `None`）
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// 子进程是否仍在运行
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// 启动子进程，不做就绪检查
    pub fn spawn(&mut self) -> Result<(), SupervisorError> {
        if self.is_running() {
            warn!(pid = ?self.pid(), "Backend process already running");
            return Ok(());
        }

        info!(
            command = %self.settings.command,
            args = ?self.settings.args,
            "Starting the API server..."
        );

        let mut command = Command::new(&self.settings.command);
        command
            .args(&self.settings.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &self.settings.working_dir {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(SupervisorError::Spawn)?;
        info!(pid = ?child.id(), "Backend process spawned");
        self.child = Some(child);
        Ok(())
    }

    /// 启动后端并等待就绪
    ///
    /// 子进程无法启动时立即返回 false，不做任何探测
    pub async fn start(&mut self) -> bool {
        if let Err(e) = self.spawn() {
            error!("Failed to start API server: {}", e);
            return false;
        }

        match self.wait_until_ready().await {
            Ok(()) => {
                info!("API server is up and running.");
                true
            }
            Err(e) => {
                error!("Failed to start the API server after multiple attempts: {}", e);
                false
            }
        }
    }

    /// 外层就绪等待
    ///
    /// 每次尝试都调用带自身重试的 `ReadinessProber`，两层退避相互叠加。
    /// 子进程提前退出时立即放弃。
    pub async fn wait_until_ready(&mut self) -> Result<(), SupervisorError> {
        let policy = self.settings.startup_policy();
        let prober = self.prober.clone();
        let child = &mut self.child;

        let report = retry_with_backoff(
            &policy,
            |e: &StartupFailure| !matches!(e, StartupFailure::Exited(_)),
            |attempt| {
                let exited = child
                    .as_mut()
                    .and_then(|c| c.try_wait().ok().flatten());
                let prober = prober.clone();
                let max_attempts = policy.max_attempts;

                async move {
                    if let Some(status) = exited {
                        return Err(StartupFailure::Exited(status));
                    }

                    match prober.wait_until_ready().await {
                        Ok(true) => Ok(()),
                        Ok(false) => Err(StartupFailure::NotReady),
                        Err(e) => {
                            info!(
                                "Waiting for API to start... Attempt {}/{}",
                                attempt, max_attempts
                            );
                            Err(e.into())
                        }
                    }
                }
            },
        )
        .await;

        match report.result {
            Ok(()) => Ok(()),
            Err(StartupFailure::Exited(status)) => Err(SupervisorError::Exited(status.to_string())),
            Err(_) => Err(SupervisorError::NotReady {
                attempts: report.attempts,
            }),
        }
    }

    /// 停止子进程
    ///
    /// 先发送 SIGTERM 并等待 `stop_timeout_secs`，超时或无法发送信号时强制终止。
    /// 未启动或已停止时什么也不做。
    pub async fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        if let Ok(Some(status)) = child.try_wait() {
            info!(%status, "API server already exited");
            return;
        }

        info!("Stopping the API server...");
        let stop_timeout = self.settings.stop_timeout();

        if child.id().is_some_and(send_terminate) {
            match timeout(stop_timeout, child.wait()).await {
                Ok(Ok(status)) => {
                    info!(%status, "API server stopped.");
                    return;
                }
                Ok(Err(e)) => warn!("Failed to wait for API server: {}", e),
                Err(_) => warn!(
                    timeout_secs = stop_timeout.as_secs(),
                    "API server did not exit in time, killing"
                ),
            }
        }

        match child.kill().await {
            Ok(()) => info!("API server stopped."),
            Err(e) => warn!("Failed to kill API server: {}", e),
        }
    }
}

impl Drop for BackendSupervisor {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            if matches!(child.try_wait(), Ok(None)) {
                warn!("Supervisor dropped with a running backend, killing it");
                let _ = child.start_kill();
            }
        }
    }
}

/// 通过 sysinfo 发送 SIGTERM，平台不支持时返回 false
fn send_terminate(pid: u32) -> bool {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    system
        .process(pid)
        .and_then(|process| process.kill_with(Signal::Term))
        .unwrap_or(false)
}
