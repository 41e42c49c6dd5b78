// ==========================================
// 滚动班次目录 - 引擎层
// ==========================================
// 职责: 模板生成、目录补种、过期清理、维护编排与调度
// 红线: Engine 不拼 SQL，只通过 RunStore 访问存储
// ==========================================

pub mod orchestrator;
pub mod retention;
pub mod scheduler;
pub mod seeding;
pub mod template_generator;

// 重导出核心引擎
pub use orchestrator::{DateSeedResult, MaintenanceOrchestrator, PassOutcome, PassReport, StepOutcome};
pub use retention::RetentionPruner;
pub use scheduler::MaintenanceScheduler;
pub use seeding::CatalogSeedingEngine;
pub use template_generator::{generate_route_templates, TemplateParams};
