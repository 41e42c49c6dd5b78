// ==========================================
// 滚动班次目录 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 唯一性范围 (Uniqueness Scope)
// ==========================================
// GLOBAL: run_number 在全库唯一（默认）
// PER_DATE: run_number 仅在同一出发日期内唯一
// 序列化格式: SCREAMING_SNAKE_CASE (与 config_kv 一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UniquenessScope {
    #[default]
    Global,
    PerDate,
}

impl UniquenessScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            UniquenessScope::Global => "GLOBAL",
            UniquenessScope::PerDate => "PER_DATE",
        }
    }

    pub fn parse(s: &str) -> Option<UniquenessScope> {
        match s.trim().to_uppercase().as_str() {
            "GLOBAL" => Some(UniquenessScope::Global),
            "PER_DATE" => Some(UniquenessScope::PerDate),
            _ => None,
        }
    }
}

impl fmt::Display for UniquenessScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 维护状态 (Maintenance State)
// ==========================================
// Idle --(定时触发 | 启动触发)--> Running --(本轮完成)--> Idle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceState {
    Idle,
    Running,
}

impl fmt::Display for MaintenanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaintenanceState::Idle => write!(f, "IDLE"),
            MaintenanceState::Running => write!(f, "RUNNING"),
        }
    }
}

// ==========================================
// 触发来源 (Pass Trigger)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassTrigger {
    Startup, // 进程启动
    Timer,   // 定时表达式
    Manual,  // 手动/一次性
}

impl fmt::Display for PassTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassTrigger::Startup => write!(f, "STARTUP"),
            PassTrigger::Timer => write!(f, "TIMER"),
            PassTrigger::Manual => write!(f, "MANUAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniqueness_scope_parse() {
        assert_eq!(UniquenessScope::parse("GLOBAL"), Some(UniquenessScope::Global));
        assert_eq!(UniquenessScope::parse(" per_date "), Some(UniquenessScope::PerDate));
        assert_eq!(UniquenessScope::parse("weekly"), None);
    }

    #[test]
    fn test_uniqueness_scope_default_is_global() {
        assert_eq!(UniquenessScope::default(), UniquenessScope::Global);
    }
}
