// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::dispatch_request::DispatchRequest;
use crate::domain::models::outcome::DispatchRecord;
use crate::domain::repositories::outcome_repository::OutcomeRepository;
use crate::queue::task_queue::{DispatchJob, TaskQueue};
use crate::utils::errors::DispatchError;
use metrics::counter;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 接受回执
#[derive(Debug, Clone, Serialize)]
pub struct Accepted {
    pub status: &'static str,
    pub dispatch_id: Uuid,
}

/// 异步分发网关
///
/// 校验入站负载后放入有界队列立即返回，不等待任务完成。
/// 校验失败时不会产生任何网络调用，也不会调度工作器。
#[derive(Clone)]
pub struct DispatchGateway {
    queue: Arc<dyn TaskQueue>,
    outcomes: Arc<dyn OutcomeRepository>,
}

impl DispatchGateway {
    pub fn new(queue: Arc<dyn TaskQueue>, outcomes: Arc<dyn OutcomeRepository>) -> Self {
        Self { queue, outcomes }
    }

    /// 提交原始负载
    ///
    /// # 返回值
    ///
    /// * `Ok(Accepted)` - 已入队
    /// * `Err(DispatchError)` - 校验失败或队列不可用
    pub async fn submit(&self, raw: Value) -> Result<Accepted, DispatchError> {
        let request = DispatchRequest::parse(raw).inspect_err(|e| {
            counter!("dispatch_rejected_total", "reason" => "validation").increment(1);
            warn!(error = %e, "Rejected dispatch payload");
        })?;

        let dispatch_id = Uuid::new_v4();
        self.outcomes.register(dispatch_id);

        if let Err(e) = self
            .queue
            .enqueue(DispatchJob::new(dispatch_id, request))
            .await
        {
            self.outcomes.remove(dispatch_id);
            counter!("dispatch_rejected_total", "reason" => "queue").increment(1);
            warn!(error = %e, "Dispatch queue unavailable");
            return Err(e.into());
        }

        counter!("dispatch_accepted_total").increment(1);
        info!(%dispatch_id, "Task started successfully");

        Ok(Accepted {
            status: "Task started successfully",
            dispatch_id,
        })
    }

    /// 查询分发状态
    pub fn status(&self, dispatch_id: Uuid) -> Result<DispatchRecord, DispatchError> {
        self.outcomes
            .get(dispatch_id)
            .ok_or(DispatchError::UnknownDispatch(dispatch_id))
    }
}
