// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::usecases::scrape_task::ScrapeTaskUseCase;
use crate::domain::models::outcome::DispatchStatus;
use crate::domain::repositories::outcome_repository::OutcomeRepository;
use crate::queue::task_queue::{DispatchJob, TaskQueue};
use crate::workers::worker::Worker;
use async_trait::async_trait;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// 分发工作器
///
/// 从队列取出作业，执行创建、轮询、取结果，并把结果或错误记录到结果仓库。
/// 单个作业失败不会终止工作器。
pub struct DispatchWorker {
    worker_id: Uuid,
    name: String,
    queue: Arc<dyn TaskQueue>,
    use_case: Arc<ScrapeTaskUseCase>,
    outcomes: Arc<dyn OutcomeRepository>,
}

impl DispatchWorker {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        use_case: Arc<ScrapeTaskUseCase>,
        outcomes: Arc<dyn OutcomeRepository>,
    ) -> Self {
        let worker_id = Uuid::new_v4();
        Self {
            worker_id,
            name: format!("dispatch-worker-{}", worker_id),
            queue,
            use_case,
            outcomes,
        }
    }

    pub fn worker_id(&self) -> Uuid {
        self.worker_id
    }

    /// 处理单个作业
    #[instrument(skip(self, job), fields(worker_id = %self.worker_id, dispatch_id = %job.dispatch_id))]
    pub async fn process_job(&self, job: DispatchJob) {
        info!("Processing dispatch");
        self.outcomes.update(job.dispatch_id, DispatchStatus::Running);

        let started = Instant::now();
        let status = match self.use_case.fetch(&job.request).await {
            Ok(outcome) => {
                counter!("dispatch_completed_total", "outcome" => "completed").increment(1);
                info!(task_id = %outcome.task.id, "Dispatch completed");
                DispatchStatus::Completed {
                    task: Box::new(outcome.task),
                    results: outcome.results,
                }
            }
            Err(e) => {
                counter!("dispatch_completed_total", "outcome" => "failed").increment(1);
                error!(error = %e, "API error");
                DispatchStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        histogram!("dispatch_duration_seconds").record(started.elapsed().as_secs_f64());

        self.outcomes.update(job.dispatch_id, status);
    }
}

#[async_trait]
impl Worker for DispatchWorker {
    async fn run(&self) {
        info!("{} started", self.name());

        while let Some(job) = self.queue.dequeue(self.worker_id).await {
            self.process_job(job).await;
        }

        info!("{} stopped", self.name());
    }

    fn name(&self) -> &str {
        &self.name
    }
}
