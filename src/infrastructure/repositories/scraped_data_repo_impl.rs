// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::result_sink::{ResultSink, SinkError};
use crate::infrastructure::database::entities::scraped_data;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// 抓取结果仓库实现
///
/// 每次调用向 `scraped_data` 表插入一行 `(query, results)`
pub struct ScrapedDataRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ScrapedDataRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResultSink for ScrapedDataRepositoryImpl {
    async fn insert(&self, query: &str, results: &Value) -> Result<(), SinkError> {
        let active_model = scraped_data::ActiveModel {
            query: Set(query.to_string()),
            results: Set(results.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        scraped_data::Entity::insert(active_model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| SinkError::Database(e.to_string()))?;

        info!(query, "Data inserted into scraped_data");
        Ok(())
    }
}

/// 只记录日志的结果接收器，未配置数据库时使用
#[derive(Debug, Default, Clone)]
pub struct LoggingResultSink;

#[async_trait]
impl ResultSink for LoggingResultSink {
    async fn insert(&self, query: &str, results: &Value) -> Result<(), SinkError> {
        let rows = results
            .get("results")
            .and_then(Value::as_array)
            .map(|rows| rows.len());
        info!(query, ?rows, "No database configured, result rows logged only");
        Ok(())
    }
}
