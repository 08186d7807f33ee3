// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模块
///
/// 包含任务、分发请求等核心实体以及外部协作方的仓库接口
pub mod models;
pub mod repositories;
