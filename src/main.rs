// ==========================================
// 滚动班次目录 - 服务主入口
// ==========================================
// 启动即执行一轮维护，之后按定时表达式周期执行，Ctrl-C 退出
//
// 用法:
//   run-catalog [db_path]
// ==========================================

use run_catalog::app::{get_default_db_path, AppState};
use run_catalog::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", run_catalog::APP_NAME);
    tracing::info!("系统版本: {}", run_catalog::VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::args()
        .nth(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path)?;

    state.scheduler.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("收到退出信号，正在停止维护调度器");

    state.scheduler.stop().await;
    tracing::info!("服务已退出");
    Ok(())
}
