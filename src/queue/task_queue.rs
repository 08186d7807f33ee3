// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::dispatch_request::DispatchRequest;
use crate::utils::errors::DispatchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::gauge;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// 队列已满
    #[error("Queue full")]
    Full,

    /// 队列已关闭
    #[error("Queue closed")]
    Closed,
}

impl From<QueueError> for DispatchError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Full => DispatchError::QueueFull,
            QueueError::Closed => DispatchError::QueueClosed,
        }
    }
}

/// 分发作业
///
/// 网关接受请求后放入队列的工作单元
#[derive(Debug, Clone)]
pub struct DispatchJob {
    pub dispatch_id: Uuid,
    pub request: DispatchRequest,
    pub enqueued_at: DateTime<Utc>,
}

impl DispatchJob {
    pub fn new(dispatch_id: Uuid, request: DispatchRequest) -> Self {
        Self {
            dispatch_id,
            request,
            enqueued_at: Utc::now(),
        }
    }
}

/// 任务队列特质
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// 入队作业，不等待队列空位
    async fn enqueue(&self, job: DispatchJob) -> Result<(), QueueError>;

    /// 出队作业
    ///
    /// 队列为空时等待；队列关闭且已取空时返回 `None`
    async fn dequeue(&self, worker_id: Uuid) -> Option<DispatchJob>;

    /// 关闭队列，已入队的作业仍可被取出
    async fn close(&self);
}

/// 有界内存任务队列
pub struct BoundedTaskQueue {
    sender: Mutex<Option<mpsc::Sender<DispatchJob>>>,
    receiver: Mutex<mpsc::Receiver<DispatchJob>>,
    capacity: usize,
}

impl BoundedTaskQueue {
    /// 创建指定容量的队列
    ///
    /// # 参数
    ///
    /// * `capacity` - 最大排队作业数，至少为1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(receiver),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[async_trait]
impl TaskQueue for BoundedTaskQueue {
    async fn enqueue(&self, job: DispatchJob) -> Result<(), QueueError> {
        let guard = self.sender.lock().await;
        let sender = guard.as_ref().ok_or(QueueError::Closed)?;

        sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })?;

        gauge!("dispatch_queue_depth").set((self.capacity - sender.capacity()) as f64);
        Ok(())
    }

    async fn dequeue(&self, _worker_id: Uuid) -> Option<DispatchJob> {
        let mut receiver = self.receiver.lock().await;
        let job = receiver.recv().await;
        gauge!("dispatch_queue_depth").set(receiver.len() as f64);
        job
    }

    async fn close(&self) {
        self.sender.lock().await.take();
    }
}

#[async_trait]
impl<T: TaskQueue + ?Sized> TaskQueue for Arc<T> {
    async fn enqueue(&self, job: DispatchJob) -> Result<(), QueueError> {
        (**self).enqueue(job).await
    }

    async fn dequeue(&self, worker_id: Uuid) -> Option<DispatchJob> {
        (**self).dequeue(worker_id).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
