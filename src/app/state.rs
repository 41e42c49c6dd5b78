// ==========================================
// 滚动班次目录 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态（连接、仓储、引擎、调度器、API）
// ==========================================

use std::sync::{Arc, Mutex};

use anyhow::Context;

use crate::api::RunApi;
use crate::config::{ConfigManager, MaintenanceConfig};
use crate::db::{lock_connection, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::{
    CatalogSeedingEngine, MaintenanceOrchestrator, MaintenanceScheduler, RetentionPruner,
    TemplateParams,
};
use crate::repository::{RunInstanceRepository, RunStore};

/// 应用状态
///
/// 所有组件共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 维护任务配置（启动时加载）
    pub maintenance_config: MaintenanceConfig,

    /// 模板参数（启动时加载）
    pub template_params: TemplateParams,

    /// 班次仓储
    pub run_repo: Arc<RunInstanceRepository>,

    /// 班次记录API
    pub run_api: Arc<RunApi>,

    /// 维护编排器
    pub orchestrator: Arc<MaintenanceOrchestrator>,

    /// 维护调度器
    pub scheduler: Arc<MaintenanceScheduler>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// 该方法会：
    /// 1. 打开数据库并建表
    /// 2. 加载配置（维护窗口、定时表达式、模板参数）
    /// 3. 初始化仓储、引擎、调度器与API（调度器不自动启动）
    pub fn new(db_path: String) -> anyhow::Result<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone()).context("无法初始化ConfigManager")?,
        );
        let maintenance_config = config_manager
            .load_maintenance_config()
            .context("维护配置无效")?;
        let template_params = config_manager
            .load_template_params()
            .context("模板参数无效")?;

        {
            let guard = lock_connection(&conn);
            match read_schema_version(&guard)? {
                Some(v) if v != CURRENT_SCHEMA_VERSION => tracing::warn!(
                    expected = CURRENT_SCHEMA_VERSION,
                    actual = v,
                    "schema_version 与当前代码不一致"
                ),
                _ => {}
            }
        }

        // ==========================================
        // 仓储 / 引擎
        // ==========================================
        let run_repo = Arc::new(
            RunInstanceRepository::new(conn.clone(), maintenance_config.uniqueness_scope)
                .context("无法创建RunInstanceRepository")?,
        );
        let store: Arc<dyn RunStore> = run_repo.clone();

        let orchestrator = Arc::new(MaintenanceOrchestrator::new(
            RetentionPruner::new(store.clone()),
            CatalogSeedingEngine::new(
                store,
                template_params.clone(),
                maintenance_config.uniqueness_scope,
            ),
            maintenance_config.window.clone(),
        ));
        let scheduler = Arc::new(MaintenanceScheduler::new(
            orchestrator.clone(),
            maintenance_config.clone(),
        ));

        let run_api = Arc::new(RunApi::new(run_repo.clone()));

        tracing::info!(
            window_size_days = maintenance_config.window.window_size_days,
            retention_cutoff_offset_days = maintenance_config.window.retention_cutoff_offset_days,
            time_zone = %maintenance_config.window.reference_time_zone,
            cron = %maintenance_config.interval_cron,
            scope = %maintenance_config.uniqueness_scope,
            templates = template_params.expected_template_count(),
            "AppState初始化完成"
        );

        Ok(Self {
            db_path,
            config_manager,
            maintenance_config,
            template_params,
            run_repo,
            run_api,
            orchestrator,
            scheduler,
        })
    }
}

/// 默认数据库路径
///
/// 优先级: RUN_CATALOG_DB_PATH 环境变量 → 用户数据目录 → ./run_catalog.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("RUN_CATALOG_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./run_catalog.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("run-catalog");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("run_catalog.db");
        }
    }

    path.to_string_lossy().to_string()
}
