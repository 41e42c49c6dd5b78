// ==========================================
// 滚动班次目录 - 维护编排器
// ==========================================
// 用途: 协调清理与补种的执行顺序
// 状态: Idle --(定时 | 启动 | 手动)--> Running --(本轮完成)--> Idle
// 红线:
// - 单飞: Running 时再次触发直接跳过并记录日志，不排队、不阻塞
// - 清理失败不阻断补种
// - 单日补种失败不影响其它日期（逐日结果显式收集）
// - 本轮维护永不向外抛错，结束后必回到 Idle
// ==========================================

use crate::config::MaintenanceWindow;
use crate::domain::types::{MaintenanceState, PassTrigger};
use crate::engine::retention::RetentionPruner;
use crate::engine::seeding::CatalogSeedingEngine;
use crate::repository::RepositoryError;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{error, info, warn};

// ==========================================
// 本轮结果
// ==========================================

/// 单步结果（成功数量或失败原因）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepOutcome {
    Ok { count: usize },
    Failed { error: String, transient: bool },
}

impl StepOutcome {
    fn from_result(result: Result<usize, RepositoryError>) -> Self {
        match result {
            Ok(count) => StepOutcome::Ok { count },
            Err(e) => StepOutcome::Failed {
                transient: e.is_transient(),
                error: e.to_string(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, StepOutcome::Ok { .. })
    }

    pub fn count(&self) -> usize {
        match self {
            StepOutcome::Ok { count } => *count,
            StepOutcome::Failed { .. } => 0,
        }
    }
}

/// 单日补种结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateSeedResult {
    pub date: NaiveDate,
    pub outcome: StepOutcome,
}

/// 一轮维护报告
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub trigger: PassTrigger,
    pub today: NaiveDate,
    pub cutoff: NaiveDate,
    pub prune: StepOutcome,
    pub dates: Vec<DateSeedResult>,
    pub elapsed_ms: u64,
}

impl PassReport {
    pub fn total_inserted(&self) -> usize {
        self.dates.iter().map(|d| d.outcome.count()).sum()
    }

    pub fn failed_dates(&self) -> Vec<NaiveDate> {
        self.dates
            .iter()
            .filter(|d| !d.outcome.is_ok())
            .map(|d| d.date)
            .collect()
    }

    /// 清理与全部日期均成功
    pub fn is_clean(&self) -> bool {
        self.prune.is_ok() && self.dates.iter().all(|d| d.outcome.is_ok())
    }
}

/// 触发结果
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassOutcome {
    /// 已有一轮在执行，本次跳过
    Skipped,
    Completed(PassReport),
}

// ==========================================
// MaintenanceOrchestrator - 维护编排器
// ==========================================

pub struct MaintenanceOrchestrator {
    pruner: RetentionPruner,
    seeder: CatalogSeedingEngine,
    window: MaintenanceWindow,
    running: AtomicBool,
}

/// Running 标志守卫，drop 时回到 Idle（含 panic 展开）
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl MaintenanceOrchestrator {
    pub fn new(
        pruner: RetentionPruner,
        seeder: CatalogSeedingEngine,
        window: MaintenanceWindow,
    ) -> Self {
        Self {
            pruner,
            seeder,
            window,
            running: AtomicBool::new(false),
        }
    }

    pub fn window(&self) -> &MaintenanceWindow {
        &self.window
    }

    /// 当前状态
    pub fn state(&self) -> MaintenanceState {
        if self.running.load(Ordering::Acquire) {
            MaintenanceState::Running
        } else {
            MaintenanceState::Idle
        }
    }

    /// Idle → Running；已在 Running 时返回 None
    fn try_begin(&self) -> Option<RunningGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunningGuard(&self.running))
    }

    /// 以参考时区的当前日期执行一轮维护
    pub fn run_pass(&self, trigger: PassTrigger) -> PassOutcome {
        let today = self.window.today_at(Utc::now());
        self.run_pass_on(today, trigger)
    }

    /// 以指定“今天”执行一轮维护
    pub fn run_pass_on(&self, today: NaiveDate, trigger: PassTrigger) -> PassOutcome {
        let _guard = match self.try_begin() {
            Some(guard) => guard,
            None => {
                warn!(trigger = %trigger, "上一轮维护仍在执行，本次触发跳过");
                return PassOutcome::Skipped;
            }
        };

        let started = Instant::now();
        let cutoff = self.window.cutoff_for(today);

        info!(
            trigger = %trigger,
            today = %today,
            cutoff = %cutoff,
            window_size_days = self.window.window_size_days,
            "开始执行班次目录维护"
        );

        // ==========================================
        // 步骤1: 清理过期班次（失败不阻断补种）
        // ==========================================
        let prune = StepOutcome::from_result(self.pruner.prune_expired(cutoff));
        if let StepOutcome::Failed { error, transient } = &prune {
            error!(cutoff = %cutoff, transient, error = %error, "过期班次清理失败，继续补种");
        }

        // ==========================================
        // 步骤2: 逐日补种（单日隔离）
        // ==========================================
        let mut dates = Vec::with_capacity(self.window.window_size_days as usize);
        for date in self.window.dates_from(today) {
            let outcome = StepOutcome::from_result(self.seeder.ensure_catalog_for_date(date));
            if let StepOutcome::Failed { error, transient } = &outcome {
                error!(date = %date, transient, error = %error, "日期目录补种失败，跳过该日期");
            }
            dates.push(DateSeedResult { date, outcome });
        }

        let report = PassReport {
            trigger,
            today,
            cutoff,
            prune,
            dates,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            trigger = %trigger,
            pruned = report.prune.count(),
            inserted = report.total_inserted(),
            failed_dates = report.failed_dates().len(),
            elapsed_ms = report.elapsed_ms,
            "班次目录维护完成"
        );

        PassOutcome::Completed(report)
    }
}
