// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::transport::TransportClient;
use crate::utils::errors::ApiError;
use crate::utils::retry_policy::{retry_with_backoff, RetryPolicy};
use metrics::{counter, histogram};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// 健康检查单次超时的下限
const MIN_HEALTH_TIMEOUT: Duration = Duration::from_secs(1);

/// 单次探测失败的原因
#[derive(Error, Debug)]
pub enum ProbeFailure {
    /// 已连接但后端尚未就绪
    #[error("backend answered {0}")]
    NotReady(StatusCode),

    /// 传输层失败
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ProbeFailure {
    fn is_retryable(&self) -> bool {
        match self {
            ProbeFailure::NotReady(_) => true,
            ProbeFailure::Api(err) => {
                matches!(err, ApiError::Unreachable(_) | ApiError::Transport(_))
            }
        }
    }
}

/// 探测报告
#[derive(Debug)]
pub struct ProbeReport {
    /// 是否就绪
    pub ready: bool,
    /// 实际尝试次数
    pub attempts: u32,
    /// 每次重试前的等待时间
    pub delays: Vec<Duration>,
    /// 最后一次失败（后端始终无法连接或遇到不可重试的错误）
    pub error: Option<ApiError>,
}

/// 就绪探测器
///
/// 反复调用健康检查端点直到返回200，或用尽重试预算。
/// 每次健康检查的超时取退避上限（不低于1秒），卡住的后端不会占满整个请求超时。
#[derive(Clone, Debug)]
pub struct ReadinessProber {
    transport: TransportClient,
    policy: RetryPolicy,
}

impl ReadinessProber {
    pub fn new(transport: TransportClient, policy: RetryPolicy) -> Self {
        let health_timeout = policy.max_backoff.max(MIN_HEALTH_TIMEOUT);
        Self {
            transport: transport.with_health_timeout(health_timeout),
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 执行一次健康检查
    pub async fn probe_once(&self) -> Result<(), ProbeFailure> {
        let status = self.transport.health().await?;
        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(ProbeFailure::NotReady(status))
        }
    }

    /// 按退避策略探测，返回完整报告
    ///
    /// `ready` 为 false 且 `error` 为空表示后端可以连接但一直未返回200
    pub async fn probe(&self) -> ProbeReport {
        let report = retry_with_backoff(&self.policy, ProbeFailure::is_retryable, |_| {
            self.probe_once()
        })
        .await;

        histogram!("readiness_probe_attempts").record(report.attempts as f64);

        let (ready, error) = match report.result {
            Ok(()) => {
                info!(
                    url = %self.transport.base_url(),
                    attempts = report.attempts,
                    "Backend is ready"
                );
                (true, None)
            }
            Err(ProbeFailure::NotReady(status)) => {
                warn!(
                    url = %self.transport.base_url(),
                    attempts = report.attempts,
                    %status,
                    "Backend reachable but not ready"
                );
                counter!("readiness_probe_failures_total").increment(1);
                (false, None)
            }
            Err(ProbeFailure::Api(err)) => {
                counter!("readiness_probe_failures_total").increment(1);
                (false, Some(err))
            }
        };

        ProbeReport {
            ready,
            attempts: report.attempts,
            delays: report.delays,
            error,
        }
    }

    /// 等待后端就绪
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 后端返回200
    /// * `Ok(false)` - 后端可以连接但用尽尝试次数仍未就绪
    /// * `Err(ApiError)` - 后端始终无法连接，错误信息提示运维人员检查地址
    pub async fn wait_until_ready(&self) -> Result<bool, ApiError> {
        let report = self.probe().await;
        match report.error {
            Some(err) => Err(err),
            None => Ok(report.ready),
        }
    }
}
