// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 分发网关和抓取用例
pub mod application;

/// 命令行模块
pub mod cli;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心实体和仓库接口
pub mod domain;

/// 基础设施模块
///
/// 后端API客户端、进程监管、数据库、存储等
pub mod infrastructure;

/// 编排模块
pub mod orchestrator;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由和处理器
pub mod presentation;

/// 队列模块
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 实现后台分发工作器和工作器管理
pub mod workers;
