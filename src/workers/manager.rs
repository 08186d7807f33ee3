// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::usecases::scrape_task::ScrapeTaskUseCase;
use crate::domain::repositories::outcome_repository::OutcomeRepository;
use crate::queue::task_queue::TaskQueue;
use crate::workers::dispatch_worker::DispatchWorker;
use crate::workers::worker::Worker;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// 工作管理器
///
/// 持有固定数量的分发工作器，所有请求共享同一个工作池
pub struct WorkerManager {
    queue: Arc<dyn TaskQueue>,
    use_case: Arc<ScrapeTaskUseCase>,
    outcomes: Arc<dyn OutcomeRepository>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        use_case: Arc<ScrapeTaskUseCase>,
        outcomes: Arc<dyn OutcomeRepository>,
    ) -> Self {
        Self {
            queue,
            use_case,
            outcomes,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作进程数量，至少为1
    pub fn start_workers(&mut self, count: usize) {
        for _ in 0..count.max(1) {
            let worker = DispatchWorker::new(
                self.queue.clone(),
                self.use_case.clone(),
                self.outcomes.clone(),
            );

            let handle = tokio::spawn(async move { worker.run().await });
            self.handles.push(handle);
        }

        info!("Started {} dispatch workers", self.handles.len());
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// 关闭工作进程
    ///
    /// 关闭队列后等待工作器处理完已入队的作业，超过 `grace` 仍未结束的工作器被中止
    pub async fn shutdown(&mut self, grace: Duration) {
        info!("Shutting down workers...");
        self.queue.close().await;

        let handles = std::mem::take(&mut self.handles);
        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();

        match timeout(grace, futures::future::join_all(handles)).await {
            Ok(results) => {
                for e in results.into_iter().filter_map(Result::err) {
                    error!("Worker task failed: {}", e);
                }
            }
            Err(_) => {
                warn!(
                    grace_secs = grace.as_secs(),
                    "Workers did not finish in time, aborting"
                );
                for abort in aborts {
                    abort.abort();
                }
            }
        }

        info!("Workers shut down successfully");
    }
}
