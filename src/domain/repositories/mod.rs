// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义外部协作方（结果数据库、文件存储、分发结果记录）的抽象接口
pub mod outcome_repository;
pub mod result_sink;
pub mod storage_repository;
