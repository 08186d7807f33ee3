// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::retry_policy::RetryPolicy;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 进程启动时构建一次，之后只读
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 后端API配置
    pub backend: BackendSettings,
    /// 就绪探测配置
    pub readiness: ReadinessSettings,
    /// 后端进程监管配置
    pub supervisor: SupervisorSettings,
    /// 异步分发配置
    pub dispatch: DispatchSettings,
    /// Webhook 服务配置
    pub webhook: WebhookSettings,
    /// 结果数据库配置
    pub database: DatabaseSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 后端API配置
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    /// 后端基础URL
    pub base_url: String,
    /// 是否为每个成功响应写入诊断文件
    pub create_response_files: bool,
    /// 诊断文件目录
    pub response_dir: String,
    /// 单个HTTP请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 默认抓取器名称
    pub scraper_name: String,
    /// 是否同步创建任务
    pub sync: bool,
}

impl BackendSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 就绪探测配置
#[derive(Debug, Clone, Deserialize)]
pub struct ReadinessSettings {
    /// 最大尝试次数
    pub max_attempts: u32,
    /// 最小等待时间（毫秒）
    pub min_wait_ms: u64,
    /// 最大等待时间（毫秒）
    pub max_wait_ms: u64,
}

impl ReadinessSettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            self.max_attempts,
            Duration::from_millis(self.min_wait_ms),
            Duration::from_millis(self.max_wait_ms),
        )
    }
}

/// 后端进程监管配置
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorSettings {
    /// 启动后端的可执行文件
    pub command: String,
    /// 启动参数
    pub args: Vec<String>,
    /// 工作目录
    pub working_dir: Option<String>,
    /// 启动就绪检查的外层尝试次数
    pub startup_attempts: u32,
    /// 外层退避基础时间（毫秒）
    pub startup_base_wait_ms: u64,
    /// 外层退避上限（毫秒）
    pub startup_max_wait_ms: u64,
    /// 停止时等待子进程退出的时间（秒）
    pub stop_timeout_secs: u64,
}

impl SupervisorSettings {
    pub fn startup_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            self.startup_attempts,
            Duration::from_millis(self.startup_base_wait_ms),
            Duration::from_millis(self.startup_max_wait_ms),
        )
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

/// 异步分发配置
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSettings {
    /// 工作器数量
    pub workers: usize,
    /// 队列容量
    pub queue_capacity: usize,
    /// 任务轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 任务轮询超时（秒）
    pub poll_timeout_secs: u64,
    /// 关闭时等待工作器的时间（秒）
    pub shutdown_grace_secs: u64,
    /// 已结束的分发记录保留时间（秒）
    pub outcome_retention_secs: u64,
    /// 最多保留的已结束分发记录数
    pub max_finished_outcomes: usize,
}

impl DispatchSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn outcome_retention(&self) -> Duration {
        Duration::from_secs(self.outcome_retention_secs)
    }
}

/// Webhook 服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookSettings {
    /// 监听主机地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 结果数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL，未设置时结果只写日志
    pub url: Option<String>,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
}

/// 指标导出配置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 导出端口
    pub port: u16,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 以及 `SCRAPECTL__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::builder_with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("SCRAPECTL")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("supervisor.args"),
            );

        builder.build()?.try_deserialize()
    }

    /// 只包含内置默认值的配置
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder_with_defaults()?.build()?.try_deserialize()
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            // Backend API
            .set_default("backend.base_url", "http://127.0.0.1:8000")?
            .set_default("backend.create_response_files", true)?
            .set_default("backend.response_dir", "output/responses")?
            .set_default("backend.request_timeout_secs", 600)?
            .set_default("backend.scraper_name", "google_maps_scraper")?
            .set_default("backend.sync", true)?
            // Readiness probe
            .set_default("readiness.max_attempts", 5)?
            .set_default("readiness.min_wait_ms", 1000)?
            .set_default("readiness.max_wait_ms", 10000)?
            // Backend process
            .set_default("supervisor.command", "python")?
            .set_default("supervisor.args", vec!["run.py", "backend", "--force"])?
            .set_default("supervisor.startup_attempts", 10)?
            .set_default("supervisor.startup_base_wait_ms", 2000)?
            .set_default("supervisor.startup_max_wait_ms", 60000)?
            .set_default("supervisor.stop_timeout_secs", 10)?
            // Dispatch pool
            .set_default("dispatch.workers", 5)?
            .set_default("dispatch.queue_capacity", 100)?
            .set_default("dispatch.poll_interval_ms", 2000)?
            .set_default("dispatch.poll_timeout_secs", 1800)?
            .set_default("dispatch.shutdown_grace_secs", 30)?
            .set_default("dispatch.outcome_retention_secs", 3600)?
            .set_default("dispatch.max_finished_outcomes", 1000)?
            // Webhook server
            .set_default("webhook.host", "0.0.0.0")?
            .set_default("webhook.port", 5000)?
            // Result database (url has no default)
            .set_default("database.max_connections", 5)?
            .set_default("database.connect_timeout", 10)?
            // Metrics
            .set_default("metrics.enabled", false)?
            .set_default("metrics.port", 9000)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
