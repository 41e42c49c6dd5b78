// ==========================================
// 滚动班次目录 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: NotFound / Conflict / TransientStore / Validation
// ==========================================

use rusqlite::ErrorCode;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    /// 唯一约束冲突（补种时视为“已存在”吸收，不向上抛出）
    #[error("唯一约束冲突: {0}")]
    Conflict(String),

    // ===== 存储可用性错误 =====
    /// 存储不可达/忙/超时，下一轮定时维护自然重试
    #[error("存储暂不可用: {0}")]
    TransientStore(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 数据质量错误 =====
    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },
}

impl RepositoryError {
    /// 是否为可在下一轮重试的暂时性错误
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::TransientStore(_))
    }

    /// 是否为唯一约束冲突
    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Conflict(_))
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy)
            | Some(ErrorCode::DatabaseLocked)
            | Some(ErrorCode::CannotOpen)
            | Some(ErrorCode::SystemIoFailure) => {
                return RepositoryError::TransientStore(err.to_string())
            }
            _ => {}
        }

        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::Conflict(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    #[test]
    fn test_busy_is_transient() {
        let err = rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        );
        let repo_err: RepositoryError = err.into();
        assert!(repo_err.is_transient());
    }

    #[test]
    fn test_unique_violation_is_conflict() {
        let err = rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed: run_instance.run_number".to_string()),
        );
        let repo_err: RepositoryError = err.into();
        assert!(repo_err.is_conflict());
        assert!(!repo_err.is_transient());
    }

    #[test]
    fn test_no_rows_is_not_found() {
        let repo_err: RepositoryError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(repo_err, RepositoryError::NotFound { .. }));
    }
}
