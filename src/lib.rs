// ==========================================
// 滚动班次目录 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + tokio
// 系统定位: 为未来 N 天的滚动窗口维护确定性的班次目录，
//           同时清理已过期的班次
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 模板 / 补种 / 清理 / 编排 / 调度
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 班次记录接口
pub mod api;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    MaintenanceState, NewRunInstance, PassTrigger, RouteTemplate, RunInstance, RunSearchFilter,
    UniquenessScope,
};

// 引擎
pub use engine::{
    generate_route_templates, CatalogSeedingEngine, MaintenanceOrchestrator, MaintenanceScheduler,
    PassOutcome, PassReport, RetentionPruner, TemplateParams,
};

// 仓储
pub use repository::{RepositoryError, RepositoryResult, RunInstanceRepository, RunStore};

// API
pub use api::{ApiError, ApiResult, RunApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "滚动班次目录维护服务";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
