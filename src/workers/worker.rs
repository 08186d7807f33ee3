// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;

/// Worker trait定义
///
/// 后台工作器的统一接口；`run` 在数据源耗尽时返回。
/// 单个作业的失败由工作器自行记录，不会终止 `run`。
#[async_trait]
pub trait Worker: Send + Sync {
    /// 运行工作器
    async fn run(&self);

    /// 获取工作器名称
    fn name(&self) -> &str;
}
