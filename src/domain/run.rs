// ==========================================
// 滚动班次目录 - 班次领域模型
// ==========================================
// 职责: 班次实例 (RunInstance) 与路线模板 (RouteTemplate)
// 红线: 同一时刻库内 run_number 不得重复 (全局唯一)
// ==========================================

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// RunInstance - 班次实例
// ==========================================
// 对齐: run_instance 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInstance {
    // ===== 主键 =====
    pub id: Uuid, // 创建时分配，永不复用

    // ===== 业务标识 =====
    pub run_number: i64, // 对外可见的线路编号

    // ===== 线路 =====
    pub source: String,
    pub destination: String,

    // ===== 时间 =====
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,

    // ===== 运力 =====
    pub capacity: i32,
}

impl RunInstance {
    /// 按模板生成指定日期的班次实例（分配新 id）
    pub fn from_template(template: &RouteTemplate, departure_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_number: template.run_number,
            source: template.source.clone(),
            destination: template.destination.clone(),
            departure_date,
            departure_time: template.departure_time,
            arrival_time: template.arrival_time,
            capacity: template.capacity,
        }
    }

    /// 由人工录入数据生成班次实例（分配新 id）
    pub fn from_new(new_run: NewRunInstance) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_number: new_run.run_number,
            source: new_run.source,
            destination: new_run.destination,
            departure_date: new_run.departure_date,
            departure_time: new_run.departure_time,
            arrival_time: new_run.arrival_time,
            capacity: new_run.capacity,
        }
    }

    /// 用人工录入数据整体覆盖（id 保持不变）
    pub fn apply(&mut self, fields: NewRunInstance) {
        self.run_number = fields.run_number;
        self.source = fields.source;
        self.destination = fields.destination;
        self.departure_date = fields.departure_date;
        self.departure_time = fields.departure_time;
        self.arrival_time = fields.arrival_time;
        self.capacity = fields.capacity;
    }
}

// ==========================================
// NewRunInstance - 创建/更新载荷
// ==========================================
// 除 id 以外的全部字段，id 由服务端分配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRunInstance {
    pub run_number: i64,
    pub source: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub capacity: i32,
}

// ==========================================
// RouteTemplate - 路线模板
// ==========================================
// 与日期无关的蓝图，每次生成都是新值，不落库
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTemplate {
    pub run_number: i64,
    pub source: String,
    pub destination: String,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub capacity: i32,
}

// ==========================================
// RunSearchFilter - 查询条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSearchFilter {
    pub run_number: Option<i64>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub departure_date: Option<NaiveDate>,
}
