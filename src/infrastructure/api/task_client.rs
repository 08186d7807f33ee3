// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::readiness::ReadinessProber;
use super::response_recorder::ResponseRecorder;
use super::transport::TransportClient;
use crate::domain::models::task::{
    DownloadOptions, DownloadedResults, ResultsQuery, Task, TaskId, TaskPage, TaskResultPage,
};
use crate::utils::errors::ApiError;
use crate::utils::url_utils::filename_from_content_disposition;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument};

/// 任务生命周期客户端
///
/// 在传输层之上提供任务的创建、查询、轮询、下载、中止和删除操作。
/// 每个操作对应一次后端调用，失败原样返回，不做重试。
#[derive(Clone)]
pub struct TaskClient {
    transport: TransportClient,
    recorder: ResponseRecorder,
}

impl TaskClient {
    /// 连接后端
    ///
    /// 先执行一次就绪探测，后端未就绪时拒绝构造客户端
    ///
    /// # 返回值
    ///
    /// * `Ok(TaskClient)` - 后端已就绪
    /// * `Err(ApiError)` - 后端无法连接或一直未就绪
    pub async fn connect(
        prober: &ReadinessProber,
        transport: TransportClient,
        recorder: ResponseRecorder,
    ) -> Result<Self, ApiError> {
        info!(url = %transport.base_url(), "Connecting to backend API");

        if !prober.wait_until_ready().await? {
            return Err(ApiError::Unreachable(format!(
                "API at {} is not running. Please check if the API is up and running.",
                transport.base_url()
            )));
        }

        Ok(Self {
            transport,
            recorder,
        })
    }

    pub fn transport(&self) -> &TransportClient {
        &self.transport
    }

    /// 创建单个任务
    ///
    /// `sync` 为 true 时后端在抓取完成后才返回
    #[instrument(skip(self, data))]
    pub async fn create_task(
        &self,
        data: &Value,
        scraper_name: Option<&str>,
        sync: bool,
    ) -> Result<Task, ApiError> {
        let task_type = task_type(sync);
        let payload = json!({
            "data": data,
            "scraper_name": scraper_name,
        });

        let body = self
            .transport
            .send(
                Method::POST,
                &format!("api/tasks/{}", task_type),
                Some(&payload),
                None,
            )
            .await?;
        self.recorder
            .record_json(&format!("create_{}", task_type), &body)
            .await;

        // 后端可能以数组形式返回单个任务
        let task = match body {
            Value::Array(items) => items
                .into_iter()
                .next()
                .ok_or_else(|| ApiError::Decode("empty task list in create response".into()))?,
            other => other,
        };
        decode(task)
    }

    /// 批量创建任务，一次请求
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn create_tasks(
        &self,
        items: &[Value],
        scraper_name: Option<&str>,
        sync: bool,
    ) -> Result<Vec<Task>, ApiError> {
        let task_type = task_type(sync);
        let payload: Vec<Value> = items
            .iter()
            .map(|data| json!({"data": data, "scraper_name": scraper_name}))
            .collect();

        let body = self
            .transport
            .send(
                Method::POST,
                &format!("api/tasks/{}", task_type),
                Some(&Value::Array(payload)),
                None,
            )
            .await?;
        self.recorder
            .record_json(&format!("create_{}_tasks", task_type), &body)
            .await;

        match body {
            Value::Array(_) => decode(body),
            other => Ok(vec![decode(other)?]),
        }
    }

    /// 分页列出任务
    pub async fn list_tasks(
        &self,
        page: u32,
        per_page: Option<u32>,
        with_results: bool,
    ) -> Result<TaskPage, ApiError> {
        let mut query = vec![
            ("with_results", with_results.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(per_page) = per_page {
            query.push(("per_page", per_page.to_string()));
        }

        let body = self
            .transport
            .send(Method::GET, "api/tasks", None, Some(&query))
            .await?;
        let tasks: TaskPage = decode(body.clone())?;
        self.recorder
            .record_page("get_tasks", page, &tasks, &body)
            .await;
        Ok(tasks)
    }

    /// 获取单个任务
    pub async fn get_task(&self, task_id: &TaskId) -> Result<Task, ApiError> {
        let body = self
            .transport
            .send(Method::GET, &format!("api/tasks/{}", task_id), None, None)
            .await?;
        self.recorder.record_json("get_task", &body).await;
        decode(body)
    }

    /// 轮询任务直到进入终态
    ///
    /// 每次都重新查询后端；超过 `timeout` 仍未结束时返回 `ApiError::PollTimeout`
    #[instrument(skip(self))]
    pub async fn poll_task(
        &self,
        task_id: &TaskId,
        interval: Duration,
        timeout: Duration,
    ) -> Result<Task, ApiError> {
        let started = Instant::now();

        loop {
            let task = self.get_task(task_id).await?;
            if task.status.is_terminal() {
                return Ok(task);
            }

            let waited = started.elapsed();
            if waited + interval > timeout {
                return Err(ApiError::PollTimeout {
                    task_id: task_id.to_string(),
                    waited,
                });
            }

            debug!(%task_id, status = %task.status, "Task not finished yet");
            sleep(interval).await;
        }
    }

    /// 获取任务结果
    ///
    /// 只有设置过的过滤、排序、视图和分页字段会出现在请求体中
    pub async fn get_task_results(
        &self,
        task_id: &TaskId,
        query: &ResultsQuery,
    ) -> Result<TaskResultPage, ApiError> {
        let payload = serde_json::to_value(query).map_err(|e| ApiError::Decode(e.to_string()))?;

        let body = self
            .transport
            .send(
                Method::POST,
                &format!("api/tasks/{}/results", task_id),
                Some(&payload),
                None,
            )
            .await?;
        let results: TaskResultPage = decode(body.clone())?;
        self.recorder
            .record_page("get_task_results", query.page.unwrap_or(1), &results, &body)
            .await;
        Ok(results)
    }

    /// 下载任务结果文件
    ///
    /// 文件名取自 `Content-Disposition` 响应头，缺失时使用 `{task_id}.{format}`
    pub async fn download_task_results(
        &self,
        task_id: &TaskId,
        options: &DownloadOptions,
    ) -> Result<DownloadedResults, ApiError> {
        let payload =
            serde_json::to_value(options).map_err(|e| ApiError::Decode(e.to_string()))?;

        let response = self
            .transport
            .send_raw(
                Method::POST,
                &format!("api/tasks/{}/download", task_id),
                Some(&payload),
                None,
            )
            .await?;

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_content_disposition)
            .unwrap_or_else(|| fallback_filename(task_id, options.format.as_deref()));

        let content = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        self.recorder.record_file(&filename, &content).await;
        info!(%task_id, %filename, bytes = content.len(), "Downloaded task results");

        Ok(DownloadedResults { content, filename })
    }

    /// 中止任务
    pub async fn abort_task(&self, task_id: &TaskId) -> Result<Value, ApiError> {
        let body = self
            .transport
            .send(
                Method::PATCH,
                &format!("api/tasks/{}/abort", task_id),
                None,
                None,
            )
            .await?;
        self.recorder.record_json("abort_task", &body).await;
        Ok(body)
    }

    /// 删除任务
    pub async fn delete_task(&self, task_id: &TaskId) -> Result<Value, ApiError> {
        let body = self
            .transport
            .send(Method::DELETE, &format!("api/tasks/{}", task_id), None, None)
            .await?;
        self.recorder.record_json("delete_task", &body).await;
        Ok(body)
    }

    /// 批量中止任务
    pub async fn abort_tasks(&self, task_ids: &[TaskId]) -> Result<Value, ApiError> {
        self.bulk("bulk-abort", "abort_tasks", task_ids).await
    }

    /// 批量删除任务
    pub async fn delete_tasks(&self, task_ids: &[TaskId]) -> Result<Value, ApiError> {
        self.bulk("bulk-delete", "delete_tasks", task_ids).await
    }

    async fn bulk(
        &self,
        action: &str,
        record_as: &str,
        task_ids: &[TaskId],
    ) -> Result<Value, ApiError> {
        let payload = json!({ "task_ids": task_ids });
        let body = self
            .transport
            .send(
                Method::POST,
                &format!("api/tasks/{}", action),
                Some(&payload),
                None,
            )
            .await?;
        self.recorder.record_json(record_as, &body).await;
        Ok(body)
    }
}

fn task_type(sync: bool) -> &'static str {
    if sync {
        "create-task-sync"
    } else {
        "create-task-async"
    }
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn fallback_filename(task_id: &TaskId, format: Option<&str>) -> String {
    let extension = match format {
        Some("excel") => "xlsx",
        Some(other) if !other.is_empty() => other,
        _ => "json",
    };
    format!("{}.{}", task_id, extension)
}
