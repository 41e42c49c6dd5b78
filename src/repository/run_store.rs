// ==========================================
// 滚动班次目录 - 存储协作方接口
// ==========================================
// 职责: 定义补种/清理引擎所依赖的最小存储能力
// 红线: 违反 run_number 唯一约束的插入必须是 no-op（返回 false），不得报错
// ==========================================

use crate::domain::run::RunInstance;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;
use std::collections::HashSet;

/// 班次存储接口
///
/// 引擎层只依赖该 trait，便于测试时替换为故障注入实现。
pub trait RunStore: Send + Sync {
    /// 条件插入：run_number 已存在（按存储的唯一性范围）时不插入
    ///
    /// # 返回
    /// - Ok(true): 已插入
    /// - Ok(false): 已存在，未插入
    fn insert_if_absent(&self, run_number: i64, run: &RunInstance) -> RepositoryResult<bool>;

    /// 批量删除 departure_date <= cutoff 的班次（单条语句，原子）
    fn bulk_delete_through(&self, cutoff: NaiveDate) -> RepositoryResult<usize>;

    /// 查询某出发日期的全部班次
    fn find_by_departure_date(&self, date: NaiveDate) -> RepositoryResult<Vec<RunInstance>>;

    /// 库内全部 run_number
    fn all_run_numbers(&self) -> RepositoryResult<HashSet<i64>>;

    /// 某出发日期的 run_number
    fn run_numbers_on(&self, date: NaiveDate) -> RepositoryResult<HashSet<i64>> {
        Ok(self
            .find_by_departure_date(date)?
            .into_iter()
            .map(|run| run.run_number)
            .collect())
    }
}
