// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// 重试策略配置
///
/// 第 `i` 次失败后的等待时间为 `min(initial_backoff * multiplier^(i-1), max_backoff)`
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// 最大尝试次数（包含第一次）
    pub max_attempts: u32,
    /// 初始退避时间
    pub initial_backoff: Duration,
    /// 最大退避时间
    pub max_backoff: Duration,
    /// 退避乘数
    pub backoff_multiplier: f64,
    /// 抖动因子 (0.0-1.0)，0 表示不抖动
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        }
    }
}

impl RetryPolicy {
    /// 创建指数退避策略（乘数为2，无抖动）
    pub fn exponential(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff,
            ..Self::default()
        }
    }

    /// 设置抖动因子
    pub fn with_jitter(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor.clamp(0.0, 1.0);
        self
    }

    /// 计算第 `attempt` 次失败后的退避时间（attempt 从 1 开始）
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let backoff_secs =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);

        // 限制最大退避时间
        let capped_backoff = backoff_secs.min(self.max_backoff.as_secs_f64());

        let final_backoff = if self.jitter_factor > 0.0 && capped_backoff > 0.0 {
            let jitter_range = capped_backoff * self.jitter_factor;
            let jitter = rand::random_range(-jitter_range..jitter_range);
            (capped_backoff + jitter).max(0.0)
        } else {
            capped_backoff
        };

        Duration::from_secs_f64(final_backoff)
    }

    /// 第 `attempt` 次失败后是否还能重试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// 重试执行报告
#[derive(Debug)]
pub struct RetryReport<T, E> {
    /// 最后一次尝试的结果
    pub result: Result<T, E>,
    /// 实际尝试次数
    pub attempts: u32,
    /// 每次重试前的等待时间
    pub delays: Vec<Duration>,
}

/// 按策略重复执行异步操作，直到成功、遇到不可重试的错误或用尽尝试次数
///
/// `operation` 接收当前尝试序号（从 1 开始）。
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    retryable: R,
    mut operation: F,
) -> RetryReport<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let mut delays = Vec::new();
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation(attempt).await {
            Ok(value) => {
                return RetryReport {
                    result: Ok(value),
                    attempts: attempt,
                    delays,
                }
            }
            Err(err) => {
                if !retryable(&err) || !policy.should_retry(attempt) {
                    return RetryReport {
                        result: Err(err),
                        attempts: attempt,
                        delays,
                    };
                }

                let delay = policy.calculate_backoff(attempt);
                debug!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Attempt failed, backing off"
                );
                sleep(delay).await;
                delays.push(delay);
            }
        }
    }
}
