// ==========================================
// 滚动班次目录 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为调用方可理解的错误消息
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 调用方错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("唯一约束冲突: {0}")]
    Conflict(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("存储暂不可用: {0}")]
    TransientStore(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::Conflict(msg) => ApiError::Conflict(msg),
            RepositoryError::TransientStore(msg) => ApiError::TransientStore(msg),
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("{}: {}", field, message))
            }
        }
    }
}

/// API Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_mapping() {
        let not_found: ApiError = RepositoryError::NotFound {
            entity: "RunInstance".to_string(),
            id: "x".to_string(),
        }
        .into();
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let conflict: ApiError = RepositoryError::Conflict("UNIQUE".to_string()).into();
        assert!(matches!(conflict, ApiError::Conflict(_)));

        let busy: ApiError = RepositoryError::TransientStore("database is locked".to_string()).into();
        assert!(matches!(busy, ApiError::TransientStore(_)));

        let field: ApiError = RepositoryError::FieldValueError {
            field: "run_number".to_string(),
            message: "不一致".to_string(),
        }
        .into();
        assert!(matches!(field, ApiError::InvalidInput(_)));
    }
}
