// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::ApiError;
use crate::utils::url_utils::{join_url, normalize_base_url};
use metrics::counter;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// 后端健康检查路径
pub const HEALTH_PATH: &str = "api";

/// 健康检查的默认单次超时
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// 传输层客户端
///
/// 负责向后端发送HTTP请求，并将响应分类为成功、客户端错误或服务端错误。
/// 除健康检查外不做任何重试，失败直接交给调用方处理。
#[derive(Clone, Debug)]
pub struct TransportClient {
    client: Client,
    base_url: String,
    health_timeout: Duration,
}

impl TransportClient {
    /// 创建新的传输层客户端
    ///
    /// # 参数
    ///
    /// * `base_url` - 后端基础URL，主机之后的路径会被丢弃
    /// * `timeout` - 单个请求的超时时间
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(concat!("scrapectl/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        })
    }

    /// 设置健康检查的单次超时，不影响其他请求
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn health_timeout(&self) -> Duration {
        self.health_timeout
    }

    /// 规范化后的基础URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 构建完整URL
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// 发送请求并把成功响应解析为JSON
    ///
    /// # 返回值
    ///
    /// * `Ok(Value)` - 2xx 响应体
    /// * `Err(ApiError)` - 分类后的失败
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: Option<&[(&str, String)]>,
    ) -> Result<Value, ApiError> {
        let response = self.send_raw(method, path, body, query).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// 发送请求，返回经过状态分类的原始响应
    pub async fn send_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: Option<&[(&str, String)]>,
    ) -> Result<Response, ApiError> {
        let url = self.url(path);
        debug!(%method, %url, "Sending backend request");

        let mut request = self.client.request(method, &url);
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        Self::classify(response).await
    }

    /// 调用健康检查端点，返回后端的状态码
    ///
    /// 连接失败时返回 `ApiError::Unreachable`；超时返回 `ApiError::Transport`；
    /// 任何HTTP状态都视为已连接
    pub async fn health(&self) -> Result<StatusCode, ApiError> {
        let url = self.url(HEALTH_PATH);
        let response = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Ok(response.status())
    }

    /// 根据状态码分类响应
    async fn classify(response: Response) -> Result<Response, ApiError> {
        let status = response.status();

        if status.is_client_error() {
            counter!("backend_requests_total", "outcome" => "client_error").increment(1);
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| extract_message(&body));
            return Err(ApiError::Client {
                status: status.as_u16(),
                message,
            });
        }

        if status.is_server_error() {
            counter!("backend_requests_total", "outcome" => "server_error").increment(1);
            return Err(ApiError::Server {
                status: status.as_u16(),
            });
        }

        counter!("backend_requests_total", "outcome" => "success").increment(1);
        Ok(response)
    }

    /// 把 reqwest 错误映射为 `ApiError`
    fn map_send_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_connect() {
            counter!("backend_requests_total", "outcome" => "unreachable").increment(1);
            ApiError::Unreachable(unreachable_message(&self.base_url))
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// 从4xx响应体中提取 `message` 字段
fn extract_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// 后端无法连接时给运维人员的提示
pub fn unreachable_message(base_url: &str) -> String {
    format!(
        "API at {} is not running. Check the network connection, or verify if the API is running on a different endpoint. \
         In case the API is running on a different endpoint, pass it with --api-url or SCRAPECTL__BACKEND__BASE_URL.",
        base_url
    )
}
