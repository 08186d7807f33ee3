// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 后端API客户端（api）：传输、就绪探测、任务生命周期
/// - 数据库（database）：结果表的连接与实体映射
/// - 指标（metrics）：Prometheus 导出
/// - 进程监管（process）：后端子进程的启动与停止
/// - 仓库实现（repositories）：领域仓库接口的具体实现
/// - 存储（storage）：诊断文件存储
/// - 监视器（watcher）：响应目录文件变更
pub mod api;
pub mod database;
pub mod metrics;
pub mod process;
pub mod repositories;
pub mod storage;
pub mod watcher;
