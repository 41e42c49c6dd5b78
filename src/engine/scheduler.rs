// ==========================================
// 滚动班次目录 - 维护调度器
// ==========================================
// 职责: 启动时立即执行一轮维护，之后按定时表达式周期触发
// 约束:
// - 调度器是显式持有的对象（start/stop），无全局单例/静态定时器
// - 维护在阻塞线程池执行且不被定时循环等待，慢任务不拖延定时器
// - 重叠触发由编排器单飞守卫拒绝
// ==========================================

use crate::config::MaintenanceConfig;
use crate::domain::types::{PassTrigger, MaintenanceState};
use crate::engine::orchestrator::{MaintenanceOrchestrator, PassOutcome};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub struct MaintenanceScheduler {
    orchestrator: Arc<MaintenanceOrchestrator>,
    config: MaintenanceConfig,
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    completed_passes: Arc<AtomicU64>,
}

impl MaintenanceScheduler {
    pub fn new(orchestrator: Arc<MaintenanceOrchestrator>, config: MaintenanceConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            orchestrator,
            config,
            shutdown_tx,
            handle: Mutex::new(None),
            completed_passes: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn orchestrator(&self) -> &Arc<MaintenanceOrchestrator> {
        &self.orchestrator
    }

    /// 已完成（非跳过）的维护轮数
    pub fn completed_passes(&self) -> u64 {
        self.completed_passes.load(Ordering::Acquire)
    }

    pub fn is_started(&self) -> bool {
        self.handle
            .lock()
            .map(|h| h.as_ref().map(|h| !h.is_finished()).unwrap_or(false))
            .unwrap_or(false)
    }

    /// 启动调度（需在 tokio 运行时内调用）
    ///
    /// # 返回
    /// - true: 已启动
    /// - false: 已在运行，本次调用忽略
    pub fn start(&self) -> bool {
        let mut slot = match self.handle.lock() {
            Ok(slot) => slot,
            Err(e) => {
                warn!("调度器句柄锁获取失败: {}", e);
                return false;
            }
        };

        if slot.as_ref().map(|h| !h.is_finished()).unwrap_or(false) {
            warn!("维护调度器已在运行，忽略重复启动");
            return false;
        }

        self.shutdown_tx.send_replace(false);
        let shutdown_rx = self.shutdown_tx.subscribe();
        let orchestrator = Arc::clone(&self.orchestrator);
        let config = self.config.clone();
        let completed = Arc::clone(&self.completed_passes);

        *slot = Some(tokio::spawn(run_loop(
            orchestrator,
            config,
            completed,
            shutdown_rx,
        )));
        true
    }

    /// 停止调度并等待定时循环退出（进行中的一轮维护不被中断）
    pub async fn stop(&self) {
        self.shutdown_tx.send_replace(true);

        let handle = self.handle.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("维护调度循环异常退出: {}", e);
            }
        }
        info!("维护调度器已停止");
    }
}

async fn run_loop(
    orchestrator: Arc<MaintenanceOrchestrator>,
    config: MaintenanceConfig,
    completed: Arc<AtomicU64>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!(
        cron = %config.interval_cron,
        time_zone = %config.window.reference_time_zone,
        "维护调度器已启动"
    );

    // 启动即执行一轮，避免等待整个周期
    dispatch(&orchestrator, &completed, PassTrigger::Startup);

    loop {
        let now = Utc::now();
        let next = match config.next_fire_after(now) {
            Some(next) => next,
            None => {
                warn!(cron = %config.interval_cron, "定时表达式没有后续触发时间，调度结束");
                break;
            }
        };
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        debug!(next_fire = %next, "等待下一次维护触发");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                dispatch(&orchestrator, &completed, PassTrigger::Timer);
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}

/// 在阻塞线程池执行一轮维护（不等待结果）
fn dispatch(
    orchestrator: &Arc<MaintenanceOrchestrator>,
    completed: &Arc<AtomicU64>,
    trigger: PassTrigger,
) {
    if orchestrator.state() == MaintenanceState::Running {
        warn!(trigger = %trigger, "上一轮维护仍在执行，本次触发跳过");
        return;
    }

    let orchestrator = Arc::clone(orchestrator);
    let completed = Arc::clone(completed);
    let pass = tokio::task::spawn_blocking(move || {
        if let PassOutcome::Completed(_) = orchestrator.run_pass(trigger) {
            completed.fetch_add(1, Ordering::AcqRel);
        }
    });

    // 单独等待结果，panic 的维护轮次也要留下日志
    tokio::spawn(async move {
        if let Err(e) = pass.await {
            error!(trigger = %trigger, error = %e, "维护任务异常终止");
        }
    });
}
