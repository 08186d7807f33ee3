// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::outcome::{DispatchRecord, DispatchStatus};
use uuid::Uuid;

/// 分发结果仓库特质
///
/// 后台工作器把每个分发请求的执行结果记录在这里，供状态查询使用
pub trait OutcomeRepository: Send + Sync {
    /// 登记新接受的分发请求
    fn register(&self, dispatch_id: Uuid) -> DispatchRecord;

    /// 更新分发状态，未登记的ID会被忽略
    fn update(&self, dispatch_id: Uuid, status: DispatchStatus);

    /// 查询分发记录
    fn get(&self, dispatch_id: Uuid) -> Option<DispatchRecord>;

    /// 删除分发记录
    fn remove(&self, dispatch_id: Uuid);
}
