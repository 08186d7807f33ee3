// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::Page;
use crate::domain::repositories::storage_repository::StorageRepository;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// 诊断响应记录器
///
/// 把成功的后端响应写入存储，供事后查看；客户端自身从不读回这些文件。
/// 写入失败只记录警告，不影响调用结果。
#[derive(Clone)]
pub struct ResponseRecorder {
    storage: Arc<dyn StorageRepository>,
    enabled: bool,
}

impl ResponseRecorder {
    pub fn new(storage: Arc<dyn StorageRepository>, enabled: bool) -> Self {
        Self { storage, enabled }
    }

    /// 不写任何文件的记录器
    pub fn disabled(storage: Arc<dyn StorageRepository>) -> Self {
        Self::new(storage, false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 以 `{name}.json` 写入格式化的JSON
    pub async fn record_json(&self, name: &str, body: &Value) {
        if !self.enabled {
            return;
        }

        match serde_json::to_vec_pretty(body) {
            Ok(bytes) => self.record_file(&format!("{}.json", name), &bytes).await,
            Err(e) => warn!(name, error = %e, "Failed to serialize response file"),
        }
    }

    /// 写入分页响应，多页时文件名附带请求的页码
    pub async fn record_page<T>(
        &self,
        name: &str,
        requested_page: u32,
        page: &Page<T>,
        body: &Value,
    ) {
        let name = page_file_name(name, requested_page, page);
        self.record_json(&name, body).await;
    }

    /// 原样写入文件内容
    pub async fn record_file(&self, filename: &str, content: &[u8]) {
        if !self.enabled {
            return;
        }

        match self.storage.save(filename, content).await {
            Ok(path) => debug!(%path, "View response at"),
            Err(e) => warn!(filename, error = %e, "Failed to write response file"),
        }
    }
}

/// 分页响应的文件名
///
/// 页码取自请求而不是响应体，后端省略 `page` 时各页也不会互相覆盖
pub fn page_file_name<T>(name: &str, requested_page: u32, page: &Page<T>) -> String {
    if page.has_many_pages() {
        format!("{}-page-{}", name, requested_page)
    } else {
        name.to_string()
    }
}
