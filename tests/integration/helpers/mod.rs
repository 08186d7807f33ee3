// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scrapectl::domain::repositories::result_sink::{ResultSink, SinkError};
use scrapectl::infrastructure::api::{ReadinessProber, ResponseRecorder, TaskClient, TransportClient};
use scrapectl::infrastructure::storage::InMemoryStorage;
use scrapectl::utils::retry_policy::RetryPolicy;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 测试用的快速退避策略
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::exponential(
        max_attempts,
        Duration::from_millis(10),
        Duration::from_millis(40),
    )
}

pub fn transport(base_url: &str) -> TransportClient {
    TransportClient::new(base_url, Duration::from_secs(5)).unwrap()
}

/// 一个没有进程监听的本地地址
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// 启动一个健康检查返回200的模拟后端
pub async fn ready_backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "API is running"})))
        .mount(&server)
        .await;
    server
}

/// 连接模拟后端的任务客户端
pub async fn task_client(server: &MockServer, storage: &InMemoryStorage, record: bool) -> TaskClient {
    let transport = transport(&server.uri());
    let prober = ReadinessProber::new(transport.clone(), fast_policy(3));
    let recorder = ResponseRecorder::new(Arc::new(storage.clone()), record);
    TaskClient::connect(&prober, transport, recorder).await.unwrap()
}

pub fn task_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "status": status,
        "scraper_name": "google_maps_scraper",
        "data": {"queries": ["Barbershop in Montreal"]}
    })
}

pub fn results_json(rows: Vec<Value>) -> Value {
    json!({
        "count": rows.len(),
        "total_pages": 1,
        "page": 1,
        "per_page": 25,
        "next": null,
        "previous": null,
        "results": rows
    })
}

/// 记录所有写入的结果接收器
#[derive(Default)]
pub struct RecordingSink {
    pub rows: Mutex<Vec<(String, Value)>>,
}

#[async_trait::async_trait]
impl ResultSink for RecordingSink {
    async fn insert(&self, query: &str, results: &Value) -> Result<(), SinkError> {
        self.rows
            .lock()
            .await
            .push((query.to_string(), results.clone()));
        Ok(())
    }
}
