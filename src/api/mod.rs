// ==========================================
// 滚动班次目录 - API 层
// ==========================================
// 职责: 提供班次记录接口（不含鉴权）
// ==========================================

pub mod error;
pub mod run_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use run_api::RunApi;
