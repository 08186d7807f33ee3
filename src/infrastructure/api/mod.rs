// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 后端API客户端
///
/// - 传输层（transport）：发送请求并分类响应
/// - 就绪探测（readiness）：带退避的健康检查
/// - 任务客户端（task_client）：任务生命周期操作
/// - 响应记录（response_recorder）：诊断响应文件
pub mod readiness;
pub mod response_recorder;
pub mod task_client;
pub mod transport;

pub use readiness::{ProbeReport, ReadinessProber};
pub use response_recorder::ResponseRecorder;
pub use task_client::TaskClient;
pub use transport::TransportClient;
