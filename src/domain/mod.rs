// ==========================================
// 滚动班次目录 - 领域层
// ==========================================
// 职责: 领域实体与类型，不依赖数据库
// ==========================================

pub mod run;
pub mod types;

// 重导出领域实体
pub use run::{NewRunInstance, RouteTemplate, RunInstance, RunSearchFilter};
pub use types::{MaintenanceState, PassTrigger, UniquenessScope};
