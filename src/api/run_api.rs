// ==========================================
// 滚动班次目录 - 班次记录 API
// ==========================================
// 职责: 班次的创建、查询、更新、删除、检索
// 约束: 创建/更新时 run_number 冲突返回 Conflict（由存储唯一索引判定）
// ==========================================

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{parse_run_id, validate_run_fields};
use crate::domain::run::{NewRunInstance, RunInstance, RunSearchFilter};
use crate::repository::{RepositoryError, RunInstanceRepository, RunStore};

// ==========================================
// RunApi - 班次记录 API
// ==========================================

/// 班次记录API
///
/// 职责：
/// 1. 人工录入班次（服务端分配 id）
/// 2. 按 id 查询/更新/删除
/// 3. 按线路+日期、按 run_number 检索
pub struct RunApi {
    run_repo: Arc<RunInstanceRepository>,
}

impl RunApi {
    pub fn new(run_repo: Arc<RunInstanceRepository>) -> Self {
        Self { run_repo }
    }

    /// 创建班次
    ///
    /// # 返回
    /// - Ok(RunInstance): 含新分配 id 的班次
    /// - Err(InvalidInput): 字段校验失败
    /// - Err(Conflict): run_number 已存在
    pub fn create(&self, fields: NewRunInstance) -> ApiResult<RunInstance> {
        validate_run_fields(&fields)?;

        let run = RunInstance::from_new(fields);
        self.run_repo
            .insert(&run)
            .map_err(|e| conflict_message(e, run.run_number))?;

        info!(id = %run.id, run_number = run.run_number, "班次已创建");
        Ok(run)
    }

    /// 按 id 查询
    pub fn get(&self, id: &str) -> ApiResult<RunInstance> {
        self.get_by_id(parse_run_id(id)?)
    }

    pub fn get_by_id(&self, id: Uuid) -> ApiResult<RunInstance> {
        self.run_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("班次(id={})不存在", id)))
    }

    /// 查询全部班次
    pub fn list(&self) -> ApiResult<Vec<RunInstance>> {
        Ok(self.run_repo.find_all()?)
    }

    /// 全字段更新
    pub fn update(&self, id: &str, fields: NewRunInstance) -> ApiResult<RunInstance> {
        let id = parse_run_id(id)?;
        validate_run_fields(&fields)?;

        let mut run = self.get_by_id(id)?;
        run.apply(fields);
        self.run_repo
            .update(&run)
            .map_err(|e| conflict_message(e, run.run_number))?;

        info!(id = %run.id, run_number = run.run_number, "班次已更新");
        Ok(run)
    }

    /// 删除班次
    pub fn delete(&self, id: &str) -> ApiResult<()> {
        let id = parse_run_id(id)?;
        if !self.run_repo.delete_by_id(id)? {
            return Err(ApiError::NotFound(format!("班次(id={})不存在", id)));
        }
        info!(id = %id, "班次已删除");
        Ok(())
    }

    /// 按线路 + 日期精确检索
    pub fn search(
        &self,
        source: &str,
        destination: &str,
        departure_date: NaiveDate,
    ) -> ApiResult<Vec<RunInstance>> {
        if source.trim().is_empty() || destination.trim().is_empty() {
            return Err(ApiError::InvalidInput("出发地/目的地不能为空".to_string()));
        }
        Ok(self
            .run_repo
            .find_by_route(source.trim(), destination.trim(), departure_date)?)
    }

    /// 组合条件检索
    ///
    /// - 指定 run_number: 取该号全部班次，再按出发地/目的地（忽略大小写）与日期过滤
    /// - 未指定 run_number 且三项齐全: 按线路 + 日期精确检索
    /// - 其它: 返回全部
    pub fn search_filtered(&self, filter: &RunSearchFilter) -> ApiResult<Vec<RunInstance>> {
        let source = non_empty(filter.source.as_deref());
        let destination = non_empty(filter.destination.as_deref());

        if let Some(run_number) = filter.run_number {
            let runs = self
                .run_repo
                .find_by_run_number(run_number)?
                .into_iter()
                .filter(|r| source.map_or(true, |s| r.source.eq_ignore_ascii_case(s)))
                .filter(|r| destination.map_or(true, |d| r.destination.eq_ignore_ascii_case(d)))
                .filter(|r| filter.departure_date.map_or(true, |d| r.departure_date == d))
                .collect();
            return Ok(runs);
        }

        match (source, destination, filter.departure_date) {
            (Some(s), Some(d), Some(date)) => self.search(s, d, date),
            _ => self.list(),
        }
    }

    /// 某日期的全部班次
    pub fn list_by_departure_date(&self, date: NaiveDate) -> ApiResult<Vec<RunInstance>> {
        Ok(self.run_repo.find_by_departure_date(date)?)
    }

    /// 某日期是否已有班次
    pub fn has_runs_for_date(&self, date: NaiveDate) -> ApiResult<bool> {
        Ok(self.run_repo.exists_by_departure_date(date)?)
    }

    /// 库内全部出发日期
    pub fn distinct_departure_dates(&self) -> ApiResult<BTreeSet<NaiveDate>> {
        Ok(self.run_repo.find_distinct_departure_dates()?)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn conflict_message(err: RepositoryError, run_number: i64) -> ApiError {
    match err {
        RepositoryError::Conflict(_) => {
            ApiError::Conflict(format!("run_number {} 已存在", run_number))
        }
        other => other.into(),
    }
}
