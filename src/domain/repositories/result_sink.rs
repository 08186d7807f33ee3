// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// 结果写入错误类型
#[derive(Error, Debug)]
pub enum SinkError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(String),
    /// 其他错误
    #[error("Sink error: {0}")]
    Other(String),
}

/// 抓取结果接收端
///
/// 接收 `(query, results)` 对，例如写入关系型数据库
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// 写入一条结果记录
    async fn insert(&self, query: &str, results: &Value) -> Result<(), SinkError>;
}
