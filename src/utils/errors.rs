// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// 后端API错误类型
///
/// 传输层对每个响应进行分类后产生的失败类型
#[derive(Error, Debug)]
pub enum ApiError {
    /// 无法建立连接
    #[error("{0}")]
    Unreachable(String),

    /// 后端拒绝请求 (4xx)
    #[error("{}", client_error_message(.status, .message))]
    Client { status: u16, message: Option<String> },

    /// 后端内部错误 (5xx)
    #[error("{status} Server Error")]
    Server { status: u16 },

    /// 响应体无法解析
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// 其他传输错误（超时等）
    #[error("Request failed: {0}")]
    Transport(String),

    /// 轮询超时
    #[error("Task {task_id} did not reach a terminal state within {waited:?}")]
    PollTimeout { task_id: String, waited: Duration },
}

fn client_error_message(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("{} Client Error", status),
    }
}

impl ApiError {
    /// 是否为连接失败
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Unreachable(_))
    }

    /// 获取HTTP状态码（如果有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Client { status, .. } | ApiError::Server { status } => Some(*status),
            _ => None,
        }
    }
}

/// 分发错误类型
#[derive(Error, Debug)]
pub enum DispatchError {
    /// 请求负载校验失败
    #[error("Validation error: {0}")]
    Validation(String),

    /// 队列已满
    #[error("Dispatch queue is full")]
    QueueFull,

    /// 队列已关闭
    #[error("Dispatch queue is closed")]
    QueueClosed,

    /// 未知的分发ID
    #[error("Dispatch {0} not found")]
    UnknownDispatch(Uuid),
}

/// 后端进程监管错误类型
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// 无法启动子进程
    #[error("Failed to start backend process: {0}")]
    Spawn(#[source] std::io::Error),

    /// 子进程未能就绪
    #[error("Backend did not become ready after {attempts} attempts")]
    NotReady { attempts: u32 },

    /// 子进程在就绪前退出
    #[error("Backend process exited before becoming ready: {0}")]
    Exited(String),
}

/// 同步运行错误类型
#[derive(Error, Debug)]
pub enum RunError {
    /// 请求负载无效
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// 后端调用失败
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// 结果写入失败
    #[error(transparent)]
    Sink(#[from] crate::domain::repositories::result_sink::SinkError),
}
