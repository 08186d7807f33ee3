// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 任务ID
///
/// 由后端分配的不透明标识符，可能是整数也可能是字符串
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(i64),
    Text(String),
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskId::Number(id) => write!(f, "{}", id),
            TaskId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        TaskId::Number(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        TaskId::Text(id.to_string())
    }
}

/// 任务状态枚举
///
/// 状态由后端维护，客户端只观察不控制：
/// Pending → InProgress → Completed/Failed/Aborted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// 等待执行
    #[default]
    Pending,
    /// 执行中
    #[serde(alias = "running")]
    InProgress,
    /// 已完成
    #[serde(alias = "finished")]
    Completed,
    /// 已失败
    Failed,
    /// 已中止
    Aborted,
    /// 后端返回了未知状态
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Aborted
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Aborted => write!(f, "aborted"),
            TaskStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// 任务实体
///
/// 后端任务的瞬时副本，每次读取都是一次新的请求，不做本地缓存
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// 任务ID
    pub id: TaskId,
    /// 任务状态
    #[serde(default)]
    pub status: TaskStatus,
    /// 抓取器名称
    #[serde(default)]
    pub scraper_name: Option<String>,
    /// 提交的负载
    #[serde(default)]
    pub data: Option<Value>,
    /// 后端返回的其余字段
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 分页结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// 总条数
    #[serde(default)]
    pub count: Option<u64>,
    /// 总页数
    #[serde(default)]
    pub total_pages: u64,
    /// 当前页
    #[serde(default)]
    pub page: Option<u64>,
    /// 每页条数
    #[serde(default)]
    pub per_page: Option<u64>,
    /// 下一页
    #[serde(default)]
    pub next: Option<Value>,
    /// 上一页
    #[serde(default)]
    pub previous: Option<Value>,
    /// 当前页的数据
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// 是否有多页
    pub fn has_many_pages(&self) -> bool {
        self.total_pages > 1
    }
}

/// 任务列表页
pub type TaskPage = Page<Task>;

/// 任务结果页
pub type TaskResultPage = Page<Value>;

fn is_blank(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

/// 任务结果查询条件
///
/// 只有显式设置的字段会出现在请求体中
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultsQuery {
    #[serde(skip_serializing_if = "is_blank")]
    pub filters: Option<Value>,
    #[serde(skip_serializing_if = "is_blank")]
    pub sort: Option<Value>,
    #[serde(skip_serializing_if = "is_blank")]
    pub view: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl ResultsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filters(mut self, filters: Value) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_sort(mut self, sort: impl Into<Value>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_view(mut self, view: impl Into<Value>) -> Self {
        self.view = Some(view.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// 结果下载选项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadOptions {
    /// 下载格式 (json, csv, excel)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub filters: Option<Value>,
    #[serde(skip_serializing_if = "is_blank")]
    pub sort: Option<Value>,
    #[serde(skip_serializing_if = "is_blank")]
    pub view: Option<Value>,
    /// 是否转换为英文
    #[serde(skip_serializing_if = "is_false")]
    pub convert_to_english: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            format: None,
            filters: None,
            sort: None,
            view: None,
            convert_to_english: true,
        }
    }
}

impl DownloadOptions {
    pub fn format(format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
            ..Self::default()
        }
    }
}

/// 下载得到的结果文件
#[derive(Debug, Clone)]
pub struct DownloadedResults {
    /// 文件内容
    pub content: bytes::Bytes,
    /// 文件名
    pub filename: String,
}
