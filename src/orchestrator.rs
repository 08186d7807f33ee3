// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::gateway::DispatchGateway;
use crate::application::usecases::scrape_task::{RunSummary, ScrapeOptions, ScrapeTaskUseCase};
use crate::config::settings::Settings;
use crate::domain::models::dispatch_request::DispatchRequest;
use crate::domain::repositories::outcome_repository::OutcomeRepository;
use crate::domain::repositories::result_sink::ResultSink;
use crate::infrastructure::api::{ReadinessProber, ResponseRecorder, TaskClient, TransportClient};
use crate::infrastructure::database::connection;
use crate::infrastructure::process::BackendSupervisor;
use crate::infrastructure::repositories::outcome_repo_impl::InMemoryOutcomeRepository;
use crate::infrastructure::repositories::scraped_data_repo_impl::{
    LoggingResultSink, ScrapedDataRepositoryImpl,
};
use crate::infrastructure::storage::LocalStorage;
use crate::presentation::routes;
use crate::queue::task_queue::{BoundedTaskQueue, TaskQueue};
use crate::utils::errors::ApiError;
use crate::utils::shutdown::wait_for_shutdown_signal;
use crate::workers::manager::WorkerManager;
use anyhow::Context;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// 运行模式
#[derive(Debug, Clone)]
pub enum RunMode {
    /// 同步执行单个请求
    Single(DispatchRequest),
    /// 启动 webhook 服务直到收到终止信号
    Serve,
}

/// 编排器
///
/// 进程内唯一的上下文：持有不可变配置，负责把监管器、客户端、网关和工作池组装起来。
/// 启用监管时，后端进程在任何退出路径上都会被停止。
pub struct Orchestrator {
    settings: Arc<Settings>,
    supervise: bool,
}

impl Orchestrator {
    pub fn new(settings: Settings, supervise: bool) -> Self {
        Self {
            settings: Arc::new(settings),
            supervise,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn transport(&self) -> Result<TransportClient, ApiError> {
        TransportClient::new(
            &self.settings.backend.base_url,
            self.settings.backend.request_timeout(),
        )
    }

    pub fn prober(&self) -> Result<ReadinessProber, ApiError> {
        Ok(ReadinessProber::new(
            self.transport()?,
            self.settings.readiness.policy(),
        ))
    }

    pub fn recorder(&self) -> ResponseRecorder {
        ResponseRecorder::new(
            Arc::new(LocalStorage::new(&self.settings.backend.response_dir)),
            self.settings.backend.create_response_files,
        )
    }

    /// 连接后端，未就绪时失败
    pub async fn connect_client(&self) -> Result<TaskClient, ApiError> {
        TaskClient::connect(&self.prober()?, self.transport()?, self.recorder()).await
    }

    /// 根据配置选择结果接收器
    pub async fn result_sink(&self) -> anyhow::Result<Arc<dyn ResultSink>> {
        match &self.settings.database.url {
            Some(url) => {
                let db = connection::connect(url, &self.settings.database)
                    .await
                    .context("Failed to connect to result database")?;
                info!("Database connection established");
                Ok(Arc::new(ScrapedDataRepositoryImpl::new(Arc::new(db))))
            }
            None => Ok(Arc::new(LoggingResultSink)),
        }
    }

    /// 运行编排器
    ///
    /// 按需启动后端，执行指定模式，最后总是停止后端
    pub async fn run(&self, mode: RunMode) -> anyhow::Result<()> {
        if let RunMode::Single(request) = &mode {
            request.ensure_valid()?;
        }

        let mut supervisor = None;
        if self.supervise {
            let mut backend = BackendSupervisor::new(self.settings.supervisor.clone(), self.prober()?);
            if !backend.start().await {
                backend.stop().await;
                anyhow::bail!("Backend API server could not be started");
            }
            supervisor = Some(backend);
        }

        let result = match mode {
            RunMode::Single(request) => self.run_single(&request).await.map(|summary| {
                info!(
                    task_id = %summary.task_id,
                    rows = summary.result_count,
                    file = %summary.download_filename,
                    "Run completed"
                );
            }),
            RunMode::Serve => self.serve(wait_for_shutdown_signal()).await,
        };

        if let Err(e) = &result {
            error!("Orchestration failed: {:#}", e);
        }

        if let Some(mut backend) = supervisor {
            backend.stop().await;
        }

        result
    }

    /// 同步执行完整抓取序列，失败直接返回给调用方
    pub async fn run_single(&self, request: &DispatchRequest) -> anyhow::Result<RunSummary> {
        let client = self.connect_client().await?;
        let sink = self.result_sink().await?;
        let use_case =
            ScrapeTaskUseCase::new(client, sink, ScrapeOptions::from_settings(&self.settings));

        Ok(use_case.run(request).await?)
    }

    /// 启动 webhook 服务和工作池，直到 `shutdown` 完成
    pub async fn serve<F>(&self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let client = self.connect_client().await?;
        let use_case = Arc::new(ScrapeTaskUseCase::new(
            client,
            Arc::new(LoggingResultSink),
            ScrapeOptions::from_settings(&self.settings),
        ));

        let queue: Arc<dyn TaskQueue> =
            Arc::new(BoundedTaskQueue::new(self.settings.dispatch.queue_capacity));
        let dispatch = &self.settings.dispatch;
        let outcomes: Arc<dyn OutcomeRepository> = Arc::new(InMemoryOutcomeRepository::with_retention(
            dispatch.outcome_retention(),
            dispatch.max_finished_outcomes,
        ));

        let mut manager = WorkerManager::new(queue.clone(), use_case, outcomes.clone());
        manager.start_workers(self.settings.dispatch.workers);

        let gateway = Arc::new(DispatchGateway::new(queue, outcomes));
        let app = routes::routes(gateway);

        let webhook = &self.settings.webhook;
        let addr = format!("{}:{}", webhook.host, webhook.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind webhook server on {}", addr))?;
        info!("Starting webhook server on {}...", addr);

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        manager
            .shutdown(self.settings.dispatch.shutdown_grace())
            .await;

        served.context("Webhook server failed")
    }
}
