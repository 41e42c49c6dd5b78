// ==========================================
// 维护调度器集成测试
// ==========================================
// 测试范围:
// 1. 启动即执行一轮维护
// 2. 定时触发周期执行
// 3. 运行中到点的触发被跳过，不排队
// 4. 维护轮次 panic 后调度循环继续
// 5. 重复启动被忽略，stop 后可再次启动
// ==========================================


use run_catalog::config::{MaintenanceConfig, MaintenanceWindow};
use run_catalog::{
    CatalogSeedingEngine, MaintenanceOrchestrator, MaintenanceScheduler, MaintenanceState,
    RetentionPruner, RunStore, UniquenessScope,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use test_helpers::*;

// 2099 年才触发，测试期间只有启动那一轮
const FAR_FUTURE_CRON: &str = "0 0 0 1 1 * 2099";

// 每秒触发
const EVERY_SECOND_CRON: &str = "* * * * * *";

fn build_scheduler(
    store: Arc<dyn RunStore>,
    cron: &str,
    scope: UniquenessScope,
) -> MaintenanceScheduler {
    let mut config = MaintenanceConfig::with_cron(cron).expect("定时表达式解析失败");
    config.window = MaintenanceWindow {
        window_size_days: 2,
        ..MaintenanceWindow::default()
    };
    config.uniqueness_scope = scope;

    let orchestrator = Arc::new(MaintenanceOrchestrator::new(
        RetentionPruner::new(store.clone()),
        CatalogSeedingEngine::new(store, abc_params(), scope),
        config.window.clone(),
    ));
    MaintenanceScheduler::new(orchestrator, config)
}

async fn wait_for_passes(scheduler: &MaintenanceScheduler, n: u64) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while scheduler.completed_passes() < n {
        assert!(
            tokio::time::Instant::now() < deadline,
            "等待维护轮次超时 (已完成 {})",
            scheduler.completed_passes()
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_启动即执行一轮维护() {
    let (_file, _path, repo) = create_repo(UniquenessScope::PerDate);
    let scheduler = build_scheduler(repo.clone(), FAR_FUTURE_CRON, UniquenessScope::PerDate);

    assert!(scheduler.start());
    assert!(scheduler.is_started());
    assert!(!scheduler.start(), "重复启动应被忽略");

    wait_for_passes(&scheduler, 1).await;
    assert_eq!(repo.count().unwrap(), 12);

    scheduler.stop().await;
    assert!(!scheduler.is_started());
    assert_eq!(scheduler.completed_passes(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_定时触发_周期执行维护() {
    let (_file, _path, repo) = create_repo(UniquenessScope::PerDate);
    let scheduler = build_scheduler(repo.clone(), EVERY_SECOND_CRON, UniquenessScope::PerDate);

    assert!(scheduler.start());

    // 启动一轮 + 至少两轮定时触发
    wait_for_passes(&scheduler, 3).await;
    scheduler.stop().await;

    // 定时轮次幂等
    assert_eq!(repo.count().unwrap(), 12);
    assert_eq!(scheduler.orchestrator().state(), MaintenanceState::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_运行中到点触发_跳过不排队() {
    let (_file, _path, repo) = create_repo(UniquenessScope::PerDate);
    let gate = Arc::new(GateStore::new(repo.clone()));
    let entered = gate.entered.clone();
    let release = gate.release.clone();
    let scheduler = build_scheduler(gate.clone(), EVERY_SECOND_CRON, UniquenessScope::PerDate);

    assert!(scheduler.start());

    // 启动轮次阻塞在清理步骤
    tokio::task::spawn_blocking(move || entered.wait())
        .await
        .expect("等待启动轮次失败");
    assert_eq!(scheduler.orchestrator().state(), MaintenanceState::Running);

    // 阻塞期间跨过至少两次定时触发
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(gate.prune_calls.load(Ordering::Acquire), 1);

    // 先停定时循环再放行: 若触发被排队，放行后会出现额外的清理调用
    scheduler.stop().await;
    tokio::task::spawn_blocking(move || release.wait())
        .await
        .expect("放行启动轮次失败");

    wait_for_passes(&scheduler, 1).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(gate.prune_calls.load(Ordering::Acquire), 1);
    assert_eq!(scheduler.completed_passes(), 1);
    assert_eq!(scheduler.orchestrator().state(), MaintenanceState::Idle);
    assert_eq!(repo.count().unwrap(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_维护轮次panic_调度循环继续() {
    run_catalog::logging::init_test();
    let scheduler = build_scheduler(Arc::new(PanicStore), EVERY_SECOND_CRON, UniquenessScope::Global);

    assert!(scheduler.start());
    tokio::time::sleep(Duration::from_millis(2500)).await;

    assert!(scheduler.is_started(), "维护 panic 不应终止定时循环");
    assert_eq!(scheduler.completed_passes(), 0);

    scheduler.stop().await;
    assert!(!scheduler.is_started());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_停止后可再次启动() {
    let (_file, _path, repo) = create_repo(UniquenessScope::PerDate);
    let scheduler = build_scheduler(repo.clone(), FAR_FUTURE_CRON, UniquenessScope::PerDate);

    assert!(scheduler.start());
    wait_for_passes(&scheduler, 1).await;
    scheduler.stop().await;

    assert!(scheduler.start());
    wait_for_passes(&scheduler, 2).await;
    scheduler.stop().await;

    // 第二轮幂等，不重复插入
    assert_eq!(repo.count().unwrap(), 12);
}
