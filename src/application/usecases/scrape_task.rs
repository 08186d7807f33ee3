// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::settings::Settings;
use crate::domain::models::dispatch_request::DispatchRequest;
use crate::domain::models::task::{
    DownloadOptions, ResultsQuery, Task, TaskId, TaskResultPage, TaskStatus,
};
use crate::domain::repositories::result_sink::ResultSink;
use crate::infrastructure::api::TaskClient;
use crate::utils::errors::{ApiError, RunError};

// === Section: Options ===

/// 抓取序列参数
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// 抓取器名称
    pub scraper_name: Option<String>,
    /// 是否同步创建任务
    pub sync: bool,
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 轮询超时
    pub poll_timeout: Duration,
}

impl ScrapeOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let scraper_name = Some(settings.backend.scraper_name.clone()).filter(|s| !s.is_empty());
        Self {
            scraper_name,
            sync: settings.backend.sync,
            poll_interval: settings.dispatch.poll_interval(),
            poll_timeout: settings.dispatch.poll_timeout(),
        }
    }
}

// === Section: Outputs ===

/// 任务及其第一页结果
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutcome {
    pub task: Task,
    pub results: TaskResultPage,
}

/// 同步运行的摘要
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub query: String,
    pub result_count: u64,
    pub download_filename: String,
    pub download_bytes: usize,
}

// === Section: Use Case Definition ===

/// 抓取任务用例
///
/// 工作器只执行 `fetch`（创建、轮询、取结果）；同步模式的 `run`
/// 在此基础上依次写入结果、下载JSON、中止并删除任务，任何一步失败都直接返回。
pub struct ScrapeTaskUseCase {
    client: TaskClient,
    sink: Arc<dyn ResultSink>,
    options: ScrapeOptions,
}

impl ScrapeTaskUseCase {
    pub fn new(client: TaskClient, sink: Arc<dyn ResultSink>, options: ScrapeOptions) -> Self {
        Self {
            client,
            sink,
            options,
        }
    }

    pub fn client(&self) -> &TaskClient {
        &self.client
    }

    /// 创建任务，轮询到终态，并取回第一页结果
    #[instrument(skip(self, request), fields(query = %request.query_label()))]
    pub async fn fetch(&self, request: &DispatchRequest) -> Result<ScrapeOutcome, ApiError> {
        let created = self
            .client
            .create_task(
                &request.to_scrape_input(),
                self.options.scraper_name.as_deref(),
                self.options.sync,
            )
            .await?;
        info!(task_id = %created.id, status = %created.status, "Task created");

        let task = self
            .client
            .poll_task(
                &created.id,
                self.options.poll_interval,
                self.options.poll_timeout,
            )
            .await?;

        let results = self
            .client
            .get_task_results(&task.id, &ResultsQuery::new().with_page(1))
            .await?;
        info!(
            task_id = %task.id,
            status = %task.status,
            rows = results.results.len(),
            "Fetched task results"
        );

        Ok(ScrapeOutcome { task, results })
    }

    /// 同步执行完整序列
    ///
    /// 创建、轮询、取结果、写入结果、下载JSON、中止、删除
    pub async fn run(&self, request: &DispatchRequest) -> Result<RunSummary, RunError> {
        request.ensure_valid()?;

        let ScrapeOutcome { task, results } = self.fetch(request).await?;

        let query = request.query_label();
        let rows = serde_json::to_value(&results).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.sink.insert(&query, &rows).await?;

        let download = self
            .client
            .download_task_results(&task.id, &DownloadOptions::format("json"))
            .await?;
        info!(filename = %download.filename, "Downloaded results");

        self.client.abort_task(&task.id).await?;
        info!(task_id = %task.id, "Aborted task");

        self.client.delete_task(&task.id).await?;
        info!(task_id = %task.id, "Deleted task");

        Ok(RunSummary {
            task_id: task.id,
            status: task.status,
            query,
            result_count: results.count.unwrap_or(results.results.len() as u64),
            download_filename: download.filename,
            download_bytes: download.content.len(),
        })
    }
}
