// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::{Task, TaskResultPage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 分发状态
///
/// 后台工作器执行结果：`{task, results}` 或 `{error}`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchStatus {
    /// 已入队，等待工作器
    Pending,
    /// 工作器执行中
    Running,
    /// 执行成功
    Completed {
        task: Box<Task>,
        results: TaskResultPage,
    },
    /// 执行失败
    Failed { error: String },
}

impl DispatchStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            DispatchStatus::Completed { .. } | DispatchStatus::Failed { .. }
        )
    }
}

/// 分发记录
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRecord {
    pub dispatch_id: Uuid,
    #[serde(flatten)]
    pub status: DispatchStatus,
    pub accepted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DispatchRecord {
    pub fn pending(dispatch_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            dispatch_id,
            status: DispatchStatus::Pending,
            accepted_at: now,
            updated_at: now,
        }
    }
}
