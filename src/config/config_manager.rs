// ==========================================
// 滚动班次目录 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::maintenance_config::{
    parse_cron, parse_time_zone, ConfigError, MaintenanceConfig, MaintenanceWindow,
    DEFAULT_MAINTENANCE_INTERVAL_CRON, DEFAULT_REFERENCE_TIME_ZONE,
    DEFAULT_RETENTION_CUTOFF_OFFSET_DAYS, DEFAULT_WINDOW_SIZE_DAYS,
};
use crate::db::{configure_sqlite_connection, ensure_schema, lock_connection};
use crate::domain::types::UniquenessScope;
use crate::engine::template_generator::TemplateParams;
use crate::repository::RepositoryResult;
use chrono::NaiveTime;
use rusqlite::{params, Connection};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA 并建表（均幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = lock_connection(&conn);
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> MutexGuard<'_, Connection> {
        lock_connection(&self.conn)
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn();

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn();
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有 global 配置（按 key 排序）
    pub fn list_global_configs(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn();
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    // ===== 维护任务配置 =====

    /// 加载维护任务配置
    pub fn load_maintenance_config(&self) -> Result<MaintenanceConfig, ConfigError> {
        let window_size_days = self.get_ranged(
            config_keys::WINDOW_SIZE_DAYS,
            DEFAULT_WINDOW_SIZE_DAYS,
            1,
            366,
        )?;
        let retention_cutoff_offset_days = self.get_ranged(
            config_keys::RETENTION_CUTOFF_OFFSET_DAYS,
            DEFAULT_RETENTION_CUTOFF_OFFSET_DAYS,
            0,
            365,
        )?;

        let tz_raw = self.get_config_or_default(
            config_keys::REFERENCE_TIME_ZONE,
            DEFAULT_REFERENCE_TIME_ZONE,
        )?;
        let reference_time_zone = parse_time_zone(&tz_raw)?;

        let interval_cron = self.get_config_or_default(
            config_keys::MAINTENANCE_INTERVAL_CRON,
            DEFAULT_MAINTENANCE_INTERVAL_CRON,
        )?;
        let schedule = parse_cron(&interval_cron)?;

        let scope_raw = self.get_config_or_default(
            config_keys::RUN_UNIQUENESS_SCOPE,
            UniquenessScope::default().as_str(),
        )?;
        let uniqueness_scope = UniquenessScope::parse(&scope_raw).ok_or_else(|| {
            ConfigError::invalid(
                config_keys::RUN_UNIQUENESS_SCOPE,
                &scope_raw,
                "应为 GLOBAL 或 PER_DATE",
            )
        })?;

        Ok(MaintenanceConfig {
            window: MaintenanceWindow {
                window_size_days,
                retention_cutoff_offset_days,
                reference_time_zone,
            },
            interval_cron,
            schedule,
            uniqueness_scope,
        })
    }

    /// 加载模板生成参数
    pub fn load_template_params(&self) -> Result<TemplateParams, ConfigError> {
        let defaults = TemplateParams::default();

        let locations = match self.get_global_config_value(config_keys::ROUTE_LOCATIONS)? {
            Some(raw) if !raw.trim().is_empty() => parse_locations(&raw)?,
            _ => defaults.locations,
        };

        let base_run_number =
            self.get_ranged(config_keys::BASE_RUN_NUMBER, defaults.base_run_number, 1, i64::MAX / 2)?;

        let base_departure_time = match self.get_global_config_value(config_keys::BASE_DEPARTURE_TIME)? {
            Some(raw) if !raw.trim().is_empty() => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                .map_err(|e| ConfigError::invalid(config_keys::BASE_DEPARTURE_TIME, &raw, e.to_string()))?,
            _ => defaults.base_departure_time,
        };

        let departure_increment_minutes = self.get_ranged(
            config_keys::DEPARTURE_INCREMENT_MINUTES,
            defaults.departure_increment_minutes,
            0,
            1440,
        )?;
        let journey_duration_minutes = self.get_ranged(
            config_keys::JOURNEY_DURATION_MINUTES,
            defaults.journey_duration_minutes,
            0,
            1440,
        )?;
        let capacity = self.get_ranged(config_keys::RUN_CAPACITY, defaults.capacity, 1, i32::MAX)?;

        Ok(TemplateParams {
            locations,
            base_run_number,
            base_departure_time,
            departure_increment_minutes,
            journey_duration_minutes,
            capacity,
        })
    }

    /// 读取数值配置并做范围校验
    fn get_ranged<T>(&self, key: &str, default: T, min: T, max: T) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + Copy + std::fmt::Display,
        T::Err: std::fmt::Display,
    {
        let raw = match self.get_global_config_value(key)? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(default),
        };

        let value = raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::invalid(key, &raw, e.to_string()))?;

        if value < min || value > max {
            return Err(ConfigError::invalid(
                key,
                &raw,
                format!("超出范围 [{}, {}]", min, max),
            ));
        }
        Ok(value)
    }
}

/// 解析地点列表（JSON 数组）
fn parse_locations(raw: &str) -> Result<Vec<String>, ConfigError> {
    let names: Vec<String> = serde_json::from_str(raw)
        .map_err(|e| ConfigError::invalid(config_keys::ROUTE_LOCATIONS, raw, e.to_string()))?;

    let names: Vec<String> = names.into_iter().map(|n| n.trim().to_string()).collect();
    if names.iter().any(|n| n.is_empty()) {
        return Err(ConfigError::invalid(
            config_keys::ROUTE_LOCATIONS,
            raw,
            "地点名称不能为空",
        ));
    }

    // 重名地点会让自环判断失效，产生重复线路
    let mut seen = HashSet::with_capacity(names.len());
    if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
        return Err(ConfigError::invalid(
            config_keys::ROUTE_LOCATIONS,
            raw,
            format!("地点名称重复: {}", dup),
        ));
    }
    Ok(names)
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 定时
    pub const MAINTENANCE_INTERVAL_CRON: &str = "maintenance_interval_cron";

    // 滚动窗口
    pub const WINDOW_SIZE_DAYS: &str = "window_size_days";
    pub const RETENTION_CUTOFF_OFFSET_DAYS: &str = "retention_cutoff_offset_days";
    pub const REFERENCE_TIME_ZONE: &str = "reference_time_zone";

    // 唯一性
    pub const RUN_UNIQUENESS_SCOPE: &str = "run_uniqueness_scope";

    // 模板
    pub const ROUTE_LOCATIONS: &str = "route_locations"; // JSON 数组
    pub const BASE_RUN_NUMBER: &str = "base_run_number";
    pub const BASE_DEPARTURE_TIME: &str = "base_departure_time"; // HH:MM
    pub const DEPARTURE_INCREMENT_MINUTES: &str = "departure_increment_minutes";
    pub const JOURNEY_DURATION_MINUTES: &str = "journey_duration_minutes";
    pub const RUN_CAPACITY: &str = "run_capacity";
}
