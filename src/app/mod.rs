// ==========================================
// 滚动班次目录 - 应用层
// ==========================================
// 职责: 组装共享状态，供二进制入口使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
