// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::outcome::{DispatchRecord, DispatchStatus};
use crate::domain::repositories::outcome_repository::OutcomeRepository;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const DEFAULT_RETENTION: Duration = Duration::from_secs(3600);
const DEFAULT_MAX_FINISHED: usize = 1000;

/// 内存中的分发结果仓库
///
/// 进程重启后记录丢失。已结束的记录在超过保留时间后，或数量超过上限时
/// （最早结束的先删除），于下一次 `register`/`update` 时被清理；
/// 等待中和执行中的记录从不清理。
#[derive(Debug)]
pub struct InMemoryOutcomeRepository {
    records: DashMap<Uuid, DispatchRecord>,
    retention: chrono::Duration,
    max_finished: usize,
}

impl Default for InMemoryOutcomeRepository {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION, DEFAULT_MAX_FINISHED)
    }
}

impl InMemoryOutcomeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定保留时间和已结束记录上限
    pub fn with_retention(retention: Duration, max_finished: usize) -> Self {
        Self {
            records: DashMap::new(),
            retention: chrono::Duration::from_std(retention)
                .unwrap_or_else(|_| chrono::Duration::days(36500)),
            max_finished,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 清理过期或超出上限的已结束记录，返回删除的数量
    pub fn evict_finished(&self) -> usize {
        self.evict_at(Utc::now())
    }

    fn evict_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.records.len();
        let cutoff = now - self.retention;

        self.records
            .retain(|_, record| !(record.status.is_finished() && record.updated_at < cutoff));

        let mut finished: Vec<(DateTime<Utc>, Uuid)> = self
            .records
            .iter()
            .filter(|entry| entry.status.is_finished())
            .map(|entry| (entry.updated_at, entry.dispatch_id))
            .collect();

        if finished.len() > self.max_finished {
            finished.sort();
            let excess = finished.len() - self.max_finished;
            for (_, dispatch_id) in finished.into_iter().take(excess) {
                self.records.remove(&dispatch_id);
            }
        }

        let evicted = before.saturating_sub(self.records.len());
        if evicted > 0 {
            debug!(evicted, "Evicted finished dispatch records");
        }
        evicted
    }
}

impl OutcomeRepository for InMemoryOutcomeRepository {
    fn register(&self, dispatch_id: Uuid) -> DispatchRecord {
        self.evict_finished();
        let record = DispatchRecord::pending(dispatch_id);
        self.records.insert(dispatch_id, record.clone());
        record
    }

    fn update(&self, dispatch_id: Uuid, status: DispatchStatus) {
        let finished = status.is_finished();
        if let Some(mut record) = self.records.get_mut(&dispatch_id) {
            record.status = status;
            record.updated_at = Utc::now();
        }
        if finished {
            self.evict_finished();
        }
    }

    fn get(&self, dispatch_id: Uuid) -> Option<DispatchRecord> {
        self.records.get(&dispatch_id).map(|r| r.value().clone())
    }

    fn remove(&self, dispatch_id: Uuid) {
        self.records.remove(&dispatch_id);
    }
}
