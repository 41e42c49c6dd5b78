// ==========================================
// 滚动班次目录 - 录入校验
// ==========================================
// 职责: 记录 API 边界上的输入校验（InvalidInput）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::run::NewRunInstance;
use uuid::Uuid;

/// 校验创建/更新载荷
///
/// 规则:
/// - run_number > 0
/// - source / destination 非空且不相同
/// - capacity > 0
pub fn validate_run_fields(fields: &NewRunInstance) -> ApiResult<()> {
    if fields.run_number <= 0 {
        return Err(ApiError::InvalidInput(format!(
            "run_number 必须为正数: {}",
            fields.run_number
        )));
    }
    if fields.source.trim().is_empty() {
        return Err(ApiError::InvalidInput("出发地不能为空".to_string()));
    }
    if fields.destination.trim().is_empty() {
        return Err(ApiError::InvalidInput("目的地不能为空".to_string()));
    }
    if fields.source.trim() == fields.destination.trim() {
        return Err(ApiError::InvalidInput(format!(
            "出发地与目的地相同: {}",
            fields.source
        )));
    }
    if fields.capacity <= 0 {
        return Err(ApiError::InvalidInput(format!(
            "运力必须为正数: {}",
            fields.capacity
        )));
    }
    Ok(())
}

/// 解析班次 id
pub fn parse_run_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|e| ApiError::InvalidInput(format!("班次ID格式错误 ({}): {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn fields() -> NewRunInstance {
        NewRunInstance {
            run_number: 13039,
            source: "Bangalore".to_string(),
            destination: "Delhi".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(),
            departure_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            arrival_time: NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
            capacity: 320,
        }
    }

    #[test]
    fn test_valid_fields() {
        assert!(validate_run_fields(&fields()).is_ok());
    }

    #[test]
    fn test_invalid_fields() {
        let mut f = fields();
        f.capacity = 0;
        assert!(validate_run_fields(&f).is_err());

        let mut f = fields();
        f.destination = " Bangalore ".to_string();
        assert!(validate_run_fields(&f).is_err());

        let mut f = fields();
        f.source = "  ".to_string();
        assert!(validate_run_fields(&f).is_err());

        let mut f = fields();
        f.run_number = -1;
        assert!(validate_run_fields(&f).is_err());
    }

    #[test]
    fn test_parse_run_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_run_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_run_id("13039"), Err(ApiError::InvalidInput(_))));
    }
}
