// ==========================================
// 滚动班次目录 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少维护任务与记录 API 并发写入时的偶发 busy 错误
// - 建表幂等（CREATE TABLE IF NOT EXISTS）
// ==========================================

use crate::domain::types::UniquenessScope;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::warn;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 全局唯一索引名（仅 GLOBAL 范围存在）
pub const RUN_NUMBER_GLOBAL_INDEX: &str = "ux_run_instance_run_number";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 获取共享连接
///
/// 锁被 panic 线程污染时取回守卫并清除 poisoned 标记（语句级自动提交，Connection 仍可用）
pub fn lock_connection(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(|poisoned| {
        warn!("数据库连接锁已被 panic 线程污染，恢复后继续使用");
        conn.clear_poison();
        poisoned.into_inner()
    })
}

/// 建表（幂等）
///
/// 表:
/// - schema_version: 版本记录
/// - config_scope / config_kv: 配置存储
/// - run_instance: 班次实例，(run_number, departure_date) 恒唯一
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS run_instance (
            id TEXT PRIMARY KEY,
            run_number INTEGER NOT NULL,
            source TEXT NOT NULL,
            destination TEXT NOT NULL,
            departure_date TEXT NOT NULL,
            departure_time TEXT NOT NULL,
            arrival_time TEXT NOT NULL,
            capacity INTEGER NOT NULL CHECK(capacity > 0),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(run_number, departure_date)
        );

        CREATE INDEX IF NOT EXISTS idx_run_instance_departure_date
          ON run_instance(departure_date);

        CREATE INDEX IF NOT EXISTS idx_run_instance_route
          ON run_instance(source, destination, departure_date);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 按唯一性范围维护 run_number 全局唯一索引
///
/// - GLOBAL: 建立 run_number 唯一索引（存量数据违反时返回错误）
/// - PER_DATE: 删除该索引，仅保留 (run_number, departure_date) 唯一
pub fn ensure_uniqueness_index(conn: &Connection, scope: UniquenessScope) -> rusqlite::Result<()> {
    match scope {
        UniquenessScope::Global => conn.execute_batch(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON run_instance(run_number);",
            RUN_NUMBER_GLOBAL_INDEX
        )),
        UniquenessScope::PerDate => conn.execute_batch(&format!(
            "DROP INDEX IF EXISTS {};",
            RUN_NUMBER_GLOBAL_INDEX
        )),
    }
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
