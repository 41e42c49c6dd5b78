// ==========================================
// 滚动班次目录 - 维护配置
// ==========================================
// 职责: 滚动窗口、保留截止偏移、参考时区、定时表达式
// ==========================================

use crate::domain::types::UniquenessScope;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::str::FromStr;
use thiserror::Error;

use crate::repository::RepositoryError;

pub const DEFAULT_WINDOW_SIZE_DAYS: u32 = 30;
pub const DEFAULT_RETENTION_CUTOFF_OFFSET_DAYS: u32 = 1;
pub const DEFAULT_REFERENCE_TIME_ZONE: &str = "Asia/Kolkata";
/// 每两小时整点（秒 分 时 日 月 周）
pub const DEFAULT_MAINTENANCE_INTERVAL_CRON: &str = "0 0 */2 * * *";

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置值无效 (key={key}, value={value}): {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("配置读取失败: {0}")]
    Storage(#[from] RepositoryError),
}

impl ConfigError {
    pub fn invalid(key: &str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

// ==========================================
// MaintenanceWindow - 滚动窗口
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceWindow {
    pub window_size_days: u32,
    pub retention_cutoff_offset_days: u32,
    pub reference_time_zone: Tz,
}

impl Default for MaintenanceWindow {
    fn default() -> Self {
        Self {
            window_size_days: DEFAULT_WINDOW_SIZE_DAYS,
            retention_cutoff_offset_days: DEFAULT_RETENTION_CUTOFF_OFFSET_DAYS,
            reference_time_zone: chrono_tz::Asia::Kolkata,
        }
    }
}

impl MaintenanceWindow {
    /// 参考时区下的“今天”
    pub fn today_at(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.reference_time_zone).date_naive()
    }

    /// 保留截止日期: today − offset（含当天删除）
    pub fn cutoff_for(&self, today: NaiveDate) -> NaiveDate {
        today - Duration::days(i64::from(self.retention_cutoff_offset_days))
    }

    /// 窗口内日期 [today, today + window_size_days)
    pub fn dates_from(&self, today: NaiveDate) -> Vec<NaiveDate> {
        (0..self.window_size_days)
            .map(|offset| today + Duration::days(i64::from(offset)))
            .collect()
    }
}

// ==========================================
// MaintenanceConfig - 维护任务配置
// ==========================================
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    pub window: MaintenanceWindow,
    pub interval_cron: String,
    pub schedule: Schedule,
    pub uniqueness_scope: UniquenessScope,
}

impl MaintenanceConfig {
    /// 由定时表达式构建（其余取默认值）
    pub fn with_cron(interval_cron: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            window: MaintenanceWindow::default(),
            interval_cron: interval_cron.to_string(),
            schedule: parse_cron(interval_cron)?,
            uniqueness_scope: UniquenessScope::default(),
        })
    }

    /// 下一次触发时间（参考时区计算，返回 UTC）
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local_now = now.with_timezone(&self.window.reference_time_zone);
        self.schedule
            .after(&local_now)
            .next()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// 解析定时表达式
pub fn parse_cron(raw: &str) -> Result<Schedule, ConfigError> {
    Schedule::from_str(raw.trim())
        .map_err(|e| ConfigError::invalid("maintenance_interval_cron", raw, e.to_string()))
}

/// 解析 IANA 时区名
pub fn parse_time_zone(raw: &str) -> Result<Tz, ConfigError> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|e| ConfigError::invalid("reference_time_zone", raw, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_window() {
        let w = MaintenanceWindow::default();
        assert_eq!(w.window_size_days, 30);
        assert_eq!(w.retention_cutoff_offset_days, 1);
        assert_eq!(w.reference_time_zone, chrono_tz::Asia::Kolkata);
    }

    #[test]
    fn test_today_follows_reference_zone() {
        let w = MaintenanceWindow::default();
        // UTC 2025-01-01 20:00 = IST 2025-01-02 01:30
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(w.today_at(now), NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }

    #[test]
    fn test_cutoff_and_dates() {
        let w = MaintenanceWindow {
            window_size_days: 3,
            ..MaintenanceWindow::default()
        };
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        assert_eq!(w.cutoff_for(today), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(
            w.dates_from(today),
            vec![
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            ]
        );
    }

    #[test]
    fn test_next_fire_every_two_hours() {
        let config = MaintenanceConfig::with_cron(DEFAULT_MAINTENANCE_INTERVAL_CRON).unwrap();
        // IST 10:15 → 下一次 IST 12:00 = UTC 06:30
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 4, 45, 0).unwrap();
        let next = config.next_fire_after(now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 1, 6, 30, 0).unwrap());
    }

    #[test]
    fn test_invalid_cron_and_zone() {
        assert!(parse_cron("every two hours").is_err());
        assert!(parse_time_zone("Mars/Olympus").is_err());
        assert_eq!(parse_time_zone("UTC").unwrap(), chrono_tz::UTC);
    }
}
