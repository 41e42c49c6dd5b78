// ==========================================
// 滚动班次目录 - 班次数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化
// 唯一性: 由数据库唯一索引保证，条件插入使用 ON CONFLICT DO NOTHING
// ==========================================

use crate::db::{ensure_schema, ensure_uniqueness_index, lock_connection};
use crate::domain::run::RunInstance;
use crate::domain::types::UniquenessScope;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::run_store::RunStore;
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

const RUN_COLUMNS: &str = "id, run_number, source, destination, departure_date, departure_time, arrival_time, capacity";

// ==========================================
// RunInstanceRepository - 班次仓储
// ==========================================
/// 班次仓储
/// 职责: 管理 run_instance 表的 CRUD 操作
pub struct RunInstanceRepository {
    conn: Arc<Mutex<Connection>>,
    scope: UniquenessScope,
}

impl RunInstanceRepository {
    /// 从已有连接创建仓储实例
    ///
    /// 说明：建表与唯一索引维护均为幂等操作。
    /// GLOBAL 范围下若存量数据已有重复 run_number，建索引失败并返回错误。
    pub fn new(conn: Arc<Mutex<Connection>>, scope: UniquenessScope) -> RepositoryResult<Self> {
        {
            let guard = lock_connection(&conn);
            ensure_schema(&guard)?;
            ensure_uniqueness_index(&guard, scope)?;
        }
        Ok(Self { conn, scope })
    }

    /// 当前唯一性范围
    pub fn scope(&self) -> UniquenessScope {
        self.scope
    }

    /// 获取数据库连接
    fn get_conn(&self) -> MutexGuard<'_, Connection> {
        lock_connection(&self.conn)
    }

    /// 插入班次（人工录入），唯一约束冲突返回 Conflict
    pub fn insert(&self, run: &RunInstance) -> RepositoryResult<()> {
        let conn = self.get_conn();
        conn.execute(
            r#"
            INSERT INTO run_instance (
                id, run_number, source, destination,
                departure_date, departure_time, arrival_time, capacity
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                run.id.to_string(),
                run.run_number,
                run.source,
                run.destination,
                run.departure_date,
                run.departure_time,
                run.arrival_time,
                run.capacity,
            ],
        )?;
        Ok(())
    }

    /// 按 id 查询
    ///
    /// # 返回
    /// - Ok(Some(RunInstance)): 找到
    /// - Ok(None): 未找到
    /// - Err: 数据库错误
    pub fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<RunInstance>> {
        let conn = self.get_conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM run_instance WHERE id = ?1",
            RUN_COLUMNS
        ))?;

        match stmt.query_row(params![id.to_string()], map_row) {
            Ok(run) => Ok(Some(run)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部班次（按日期、发车时间排序）
    pub fn find_all(&self) -> RepositoryResult<Vec<RunInstance>> {
        let conn = self.get_conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM run_instance ORDER BY departure_date ASC, departure_time ASC, run_number ASC",
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(runs)
    }

    /// 按 run_number 查询
    pub fn find_by_run_number(&self, run_number: i64) -> RepositoryResult<Vec<RunInstance>> {
        let conn = self.get_conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM run_instance WHERE run_number = ?1 ORDER BY departure_date ASC",
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map(params![run_number], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(runs)
    }

    /// 按线路 + 日期精确查询
    pub fn find_by_route(
        &self,
        source: &str,
        destination: &str,
        departure_date: NaiveDate,
    ) -> RepositoryResult<Vec<RunInstance>> {
        let conn = self.get_conn();
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM run_instance
            WHERE source = ?1 AND destination = ?2 AND departure_date = ?3
            ORDER BY departure_time ASC, run_number ASC
            "#,
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map(params![source, destination, departure_date], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(runs)
    }

    /// 某日期是否存在班次
    pub fn exists_by_departure_date(&self, date: NaiveDate) -> RepositoryResult<bool> {
        let conn = self.get_conn();
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM run_instance WHERE departure_date = ?1)",
            params![date],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// 库内全部不同的出发日期
    pub fn find_distinct_departure_dates(&self) -> RepositoryResult<BTreeSet<NaiveDate>> {
        let conn = self.get_conn();
        let mut stmt = conn.prepare("SELECT DISTINCT departure_date FROM run_instance")?;
        let dates = stmt
            .query_map([], |row| row.get::<_, NaiveDate>(0))?
            .collect::<SqliteResult<BTreeSet<_>>>()?;
        Ok(dates)
    }

    /// 班次总数
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM run_instance", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// 全字段更新（id 不变）
    ///
    /// # 返回
    /// - Err(NotFound): id 不存在
    /// - Err(Conflict): 新 run_number 与库内冲突
    pub fn update(&self, run: &RunInstance) -> RepositoryResult<()> {
        let conn = self.get_conn();
        let affected = conn.execute(
            r#"
            UPDATE run_instance SET
                run_number = ?2,
                source = ?3,
                destination = ?4,
                departure_date = ?5,
                departure_time = ?6,
                arrival_time = ?7,
                capacity = ?8
            WHERE id = ?1
            "#,
            params![
                run.id.to_string(),
                run.run_number,
                run.source,
                run.destination,
                run.departure_date,
                run.departure_time,
                run.arrival_time,
                run.capacity,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "RunInstance".to_string(),
                id: run.id.to_string(),
            });
        }
        Ok(())
    }

    /// 按 id 删除
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 记录不存在
    pub fn delete_by_id(&self, id: Uuid) -> RepositoryResult<bool> {
        let conn = self.get_conn();
        let affected = conn.execute(
            "DELETE FROM run_instance WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

impl RunStore for RunInstanceRepository {
    fn insert_if_absent(&self, run_number: i64, run: &RunInstance) -> RepositoryResult<bool> {
        if run_number != run.run_number {
            return Err(RepositoryError::FieldValueError {
                field: "run_number".to_string(),
                message: format!("参数 {} 与实例 {} 不一致", run_number, run.run_number),
            });
        }

        let conn = self.get_conn();
        let affected = conn.execute(
            r#"
            INSERT INTO run_instance (
                id, run_number, source, destination,
                departure_date, departure_time, arrival_time, capacity
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT DO NOTHING
            "#,
            params![
                run.id.to_string(),
                run_number,
                run.source,
                run.destination,
                run.departure_date,
                run.departure_time,
                run.arrival_time,
                run.capacity,
            ],
        )?;
        Ok(affected == 1)
    }

    fn bulk_delete_through(&self, cutoff: NaiveDate) -> RepositoryResult<usize> {
        let conn = self.get_conn();
        let deleted = conn.execute(
            "DELETE FROM run_instance WHERE departure_date <= ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }

    fn find_by_departure_date(&self, date: NaiveDate) -> RepositoryResult<Vec<RunInstance>> {
        let conn = self.get_conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM run_instance WHERE departure_date = ?1 ORDER BY run_number ASC",
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map(params![date], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(runs)
    }

    fn all_run_numbers(&self) -> RepositoryResult<HashSet<i64>> {
        let conn = self.get_conn();
        let mut stmt = conn.prepare("SELECT DISTINCT run_number FROM run_instance")?;
        let numbers = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<SqliteResult<HashSet<_>>>()?;
        Ok(numbers)
    }

    fn run_numbers_on(&self, date: NaiveDate) -> RepositoryResult<HashSet<i64>> {
        let conn = self.get_conn();
        let mut stmt =
            conn.prepare("SELECT run_number FROM run_instance WHERE departure_date = ?1")?;
        let numbers = stmt
            .query_map(params![date], |row| row.get::<_, i64>(0))?
            .collect::<SqliteResult<HashSet<_>>>()?;
        Ok(numbers)
    }
}

fn map_row(row: &Row<'_>) -> SqliteResult<RunInstance> {
    let id_text: String = row.get(0)?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

    Ok(RunInstance {
        id,
        run_number: row.get(1)?,
        source: row.get(2)?,
        destination: row.get(3)?,
        departure_date: row.get(4)?,
        departure_time: row.get(5)?,
        arrival_time: row.get(6)?,
        capacity: row.get(7)?,
    })
}
