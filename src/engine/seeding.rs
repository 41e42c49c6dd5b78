// ==========================================
// 滚动班次目录 - 目录补种引擎
// ==========================================
// 职责: 幂等地保证某日期的班次与模板一致（只插入，不更新）
// 红线: 同一 run_number 不得被重复插入（唯一性由存储兜底）
// ==========================================
// 流程:
// 1. 读取已存在的 run_number（GLOBAL: 全库；PER_DATE: 当日）
// 2. 生成模板
// 3. 按模板顺序：已存在则跳过，否则条件插入并记为已存在
// 4. 返回插入数量
// ==========================================

use crate::domain::run::RunInstance;
use crate::domain::types::UniquenessScope;
use crate::engine::template_generator::{generate_route_templates, TemplateParams};
use crate::repository::{RepositoryResult, RunStore};
use chrono::{Duration, NaiveDate};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

// ==========================================
// CatalogSeedingEngine - 目录补种引擎
// ==========================================
pub struct CatalogSeedingEngine {
    store: Arc<dyn RunStore>,
    params: TemplateParams,
    scope: UniquenessScope,
}

impl CatalogSeedingEngine {
    /// 创建新的补种引擎
    ///
    /// # 参数
    /// - store: 存储协作方
    /// - params: 模板生成参数
    /// - scope: 唯一性范围（需与存储的唯一索引一致）
    pub fn new(store: Arc<dyn RunStore>, params: TemplateParams, scope: UniquenessScope) -> Self {
        Self {
            store,
            params,
            scope,
        }
    }

    pub fn template_params(&self) -> &TemplateParams {
        &self.params
    }

    pub fn scope(&self) -> UniquenessScope {
        self.scope
    }

    /// 保证指定日期的目录存在
    ///
    /// # 返回
    /// - Ok(usize): 本次插入数量（重复调用返回 0）
    /// - Err: 存储不可用等错误，本次不自动重试
    pub fn ensure_catalog_for_date(&self, date: NaiveDate) -> RepositoryResult<usize> {
        let mut present: HashSet<i64> = match self.scope {
            UniquenessScope::Global => self.store.all_run_numbers()?,
            UniquenessScope::PerDate => self.store.run_numbers_on(date)?,
        };

        let templates = generate_route_templates(&self.params);
        let mut inserted = 0usize;
        let mut absorbed = 0usize;

        for template in &templates {
            if present.contains(&template.run_number) {
                continue;
            }

            let run = RunInstance::from_template(template, date);
            if self.store.insert_if_absent(template.run_number, &run)? {
                inserted += 1;
            } else {
                // 并发写入方已插入同号班次，视为已存在
                absorbed += 1;
            }
            present.insert(template.run_number);
        }

        if absorbed > 0 {
            debug!(
                date = %date,
                absorbed,
                "条件插入被唯一约束吸收"
            );
        }
        debug!(
            date = %date,
            scope = %self.scope,
            templates = templates.len(),
            inserted,
            "日期目录补种完成"
        );

        Ok(inserted)
    }

    /// 从 start 起连续补种 days 天（遇错即停，由调用方决定是否重试）
    pub fn seed_window(&self, start: NaiveDate, days: u32) -> RepositoryResult<usize> {
        let mut total = 0usize;
        for offset in 0..days {
            let date = start + Duration::days(i64::from(offset));
            info!(date = %date, "补种日期目录");
            total += self.ensure_catalog_for_date(date)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryError;
    use chrono::NaiveTime;
    use std::sync::Mutex;

    /// 内存存储（测试用），按范围模拟唯一约束
    struct MemoryStore {
        runs: Mutex<Vec<RunInstance>>,
        scope: UniquenessScope,
    }

    impl MemoryStore {
        fn new(scope: UniquenessScope) -> Self {
            Self {
                runs: Mutex::new(Vec::new()),
                scope,
            }
        }

        fn len(&self) -> usize {
            self.runs.lock().unwrap().len()
        }
    }

    impl RunStore for MemoryStore {
        fn insert_if_absent(&self, run_number: i64, run: &RunInstance) -> RepositoryResult<bool> {
            let mut runs = self.runs.lock().unwrap();
            let clash = runs.iter().any(|r| {
                r.run_number == run_number
                    && (self.scope == UniquenessScope::Global
                        || r.departure_date == run.departure_date)
            });
            if clash {
                return Ok(false);
            }
            runs.push(run.clone());
            Ok(true)
        }

        fn bulk_delete_through(&self, cutoff: NaiveDate) -> RepositoryResult<usize> {
            let mut runs = self.runs.lock().unwrap();
            let before = runs.len();
            runs.retain(|r| r.departure_date > cutoff);
            Ok(before - runs.len())
        }

        fn find_by_departure_date(&self, date: NaiveDate) -> RepositoryResult<Vec<RunInstance>> {
            let runs = self.runs.lock().unwrap();
            Ok(runs.iter().filter(|r| r.departure_date == date).cloned().collect())
        }

        fn all_run_numbers(&self) -> RepositoryResult<HashSet<i64>> {
            let runs = self.runs.lock().unwrap();
            Ok(runs.iter().map(|r| r.run_number).collect())
        }
    }

    /// 永远不可用的存储
    struct DownStore;

    impl RunStore for DownStore {
        fn insert_if_absent(&self, _: i64, _: &RunInstance) -> RepositoryResult<bool> {
            Err(RepositoryError::TransientStore("down".to_string()))
        }
        fn bulk_delete_through(&self, _: NaiveDate) -> RepositoryResult<usize> {
            Err(RepositoryError::TransientStore("down".to_string()))
        }
        fn find_by_departure_date(&self, _: NaiveDate) -> RepositoryResult<Vec<RunInstance>> {
            Err(RepositoryError::TransientStore("down".to_string()))
        }
        fn all_run_numbers(&self) -> RepositoryResult<HashSet<i64>> {
            Err(RepositoryError::TransientStore("down".to_string()))
        }
    }

    fn abc_params() -> TemplateParams {
        TemplateParams {
            locations: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            base_run_number: 1000,
            base_departure_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            departure_increment_minutes: 5,
            journey_duration_minutes: 30,
            capacity: 100,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let store = Arc::new(MemoryStore::new(UniquenessScope::Global));
        let engine = CatalogSeedingEngine::new(store.clone(), abc_params(), UniquenessScope::Global);

        assert_eq!(engine.ensure_catalog_for_date(d(2025, 1, 1)).unwrap(), 6);
        assert_eq!(engine.ensure_catalog_for_date(d(2025, 1, 1)).unwrap(), 0);
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn test_global_scope_blocks_other_dates() {
        let store = Arc::new(MemoryStore::new(UniquenessScope::Global));
        let engine = CatalogSeedingEngine::new(store.clone(), abc_params(), UniquenessScope::Global);

        assert_eq!(engine.ensure_catalog_for_date(d(2025, 1, 1)).unwrap(), 6);
        assert_eq!(engine.ensure_catalog_for_date(d(2025, 1, 2)).unwrap(), 0);
    }

    #[test]
    fn test_per_date_scope_fills_each_date() {
        let store = Arc::new(MemoryStore::new(UniquenessScope::PerDate));
        let engine =
            CatalogSeedingEngine::new(store.clone(), abc_params(), UniquenessScope::PerDate);

        assert_eq!(engine.seed_window(d(2025, 1, 1), 3).unwrap(), 18);
        assert_eq!(engine.seed_window(d(2025, 1, 1), 3).unwrap(), 0);
    }

    #[test]
    fn test_existing_number_is_skipped() {
        let store = Arc::new(MemoryStore::new(UniquenessScope::Global));
        let template = &generate_route_templates(&abc_params())[3];
        store
            .insert_if_absent(
                template.run_number,
                &RunInstance::from_template(template, d(2025, 1, 5)),
            )
            .unwrap();

        let engine = CatalogSeedingEngine::new(store.clone(), abc_params(), UniquenessScope::Global);
        assert_eq!(engine.ensure_catalog_for_date(d(2025, 1, 1)).unwrap(), 5);
    }

    #[test]
    fn test_store_down_is_transient() {
        let engine =
            CatalogSeedingEngine::new(Arc::new(DownStore), abc_params(), UniquenessScope::Global);
        let err = engine.ensure_catalog_for_date(d(2025, 1, 1)).unwrap_err();
        assert!(err.is_transient());
    }
}
