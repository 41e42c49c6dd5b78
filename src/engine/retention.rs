// ==========================================
// 滚动班次目录 - 过期班次清理
// ==========================================
// 职责: 删除 departure_date <= cutoff 的全部班次（单次批量操作）
// 幂等: 相同或更早的 cutoff 重复调用不再删除任何记录
// ==========================================

use crate::repository::{RepositoryResult, RunStore};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

pub struct RetentionPruner {
    store: Arc<dyn RunStore>,
}

impl RetentionPruner {
    pub fn new(store: Arc<dyn RunStore>) -> Self {
        Self { store }
    }

    /// 清理过期班次
    ///
    /// # 返回
    /// - Ok(usize): 删除数量
    pub fn prune_expired(&self, cutoff: NaiveDate) -> RepositoryResult<usize> {
        let deleted = self.store.bulk_delete_through(cutoff)?;
        info!(cutoff = %cutoff, deleted, "过期班次清理完成");
        Ok(deleted)
    }
}
