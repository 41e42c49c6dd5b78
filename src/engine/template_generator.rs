// ==========================================
// 滚动班次目录 - 路线模板生成
// ==========================================
// 职责: 由有序地点列表生成确定性的每日路线模板
// 红线: 纯函数，无共享状态，相同参数多次调用结果完全一致
// ==========================================
// 规则:
// - N 个地点 → N×(N−1) 个有序对（排除自身对）
// - 外层遍历出发地，内层遍历目的地
// - run_number = 基准号 + 生成序号
// - 发车 = 基准发车 + 间隔 × 生成序号；到达 = 发车 + 行程时长（跨零点按时钟回绕）
// ==========================================

use crate::domain::run::RouteTemplate;
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

/// 一天的分钟数
const MINUTES_PER_DAY: i64 = 24 * 60;

/// 默认地点列表（20 个城市，380 条线路/天）
pub const DEFAULT_LOCATIONS: [&str; 20] = [
    "Mumbai",
    "Delhi",
    "Bangalore",
    "Chennai",
    "Kolkata",
    "Hyderabad",
    "Ahmedabad",
    "Pune",
    "Jaipur",
    "Lucknow",
    "Nagpur",
    "Surat",
    "Kanpur",
    "Indore",
    "Thane",
    "Bhopal",
    "Visakhapatnam",
    "Patna",
    "Vadodara",
    "Ghaziabad",
];

pub const DEFAULT_BASE_RUN_NUMBER: i64 = 13000;
pub const DEFAULT_DEPARTURE_INCREMENT_MINUTES: i64 = 4;
pub const DEFAULT_JOURNEY_DURATION_MINUTES: i64 = 210;
pub const DEFAULT_RUN_CAPACITY: i32 = 320;

// ==========================================
// TemplateParams - 模板生成参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateParams {
    pub locations: Vec<String>,
    pub base_run_number: i64,
    pub base_departure_time: NaiveTime,
    pub departure_increment_minutes: i64, // 0..=1440
    pub journey_duration_minutes: i64,    // 0..=1440
    pub capacity: i32,
}

impl Default for TemplateParams {
    fn default() -> Self {
        Self {
            locations: DEFAULT_LOCATIONS.iter().map(|s| s.to_string()).collect(),
            base_run_number: DEFAULT_BASE_RUN_NUMBER,
            base_departure_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN),
            departure_increment_minutes: DEFAULT_DEPARTURE_INCREMENT_MINUTES,
            journey_duration_minutes: DEFAULT_JOURNEY_DURATION_MINUTES,
            capacity: DEFAULT_RUN_CAPACITY,
        }
    }
}

impl TemplateParams {
    /// 每日模板数 N×(N−1)
    pub fn expected_template_count(&self) -> usize {
        let n = self.locations.len();
        n.saturating_mul(n.saturating_sub(1))
    }
}

/// 生成路线模板
///
/// # 参数
/// - params: 模板生成参数
///
/// # 返回
/// 按生成顺序排列的模板；地点数 ≤ 1 时为空
pub fn generate_route_templates(params: &TemplateParams) -> Vec<RouteTemplate> {
    let locations = &params.locations;
    if locations.len() <= 1 {
        return Vec::new();
    }

    let mut templates = Vec::with_capacity(params.expected_template_count());
    let mut index: i64 = 0;

    for source in locations {
        for destination in locations {
            if source == destination {
                continue;
            }

            let departure_time = add_minutes_wrapping(
                params.base_departure_time,
                params.departure_increment_minutes.saturating_mul(index),
            );
            let arrival_time =
                add_minutes_wrapping(departure_time, params.journey_duration_minutes);

            templates.push(RouteTemplate {
                run_number: params.base_run_number + index,
                source: source.clone(),
                destination: destination.clone(),
                departure_time,
                arrival_time,
                capacity: params.capacity,
            });

            index += 1;
        }
    }

    templates
}

/// 时钟加法（跨零点回绕）
fn add_minutes_wrapping(time: NaiveTime, minutes: i64) -> NaiveTime {
    time + Duration::minutes(minutes.rem_euclid(MINUTES_PER_DAY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn abc_params() -> TemplateParams {
        TemplateParams {
            locations: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            base_run_number: 1000,
            base_departure_time: hm(6, 0),
            departure_increment_minutes: 5,
            journey_duration_minutes: 30,
            capacity: 100,
        }
    }

    #[test]
    fn test_three_locations_example() {
        let templates = generate_route_templates(&abc_params());

        let expected = [
            ("A", "B", 1000, hm(6, 0), hm(6, 30)),
            ("A", "C", 1001, hm(6, 5), hm(6, 35)),
            ("B", "A", 1002, hm(6, 10), hm(6, 40)),
            ("B", "C", 1003, hm(6, 15), hm(6, 45)),
            ("C", "A", 1004, hm(6, 20), hm(6, 50)),
            ("C", "B", 1005, hm(6, 25), hm(6, 55)),
        ];

        assert_eq!(templates.len(), expected.len());
        for (t, (src, dst, no, dep, arr)) in templates.iter().zip(expected.iter()) {
            assert_eq!(t.source, *src);
            assert_eq!(t.destination, *dst);
            assert_eq!(t.run_number, *no);
            assert_eq!(t.departure_time, *dep);
            assert_eq!(t.arrival_time, *arr);
            assert_eq!(t.capacity, 100);
        }
    }

    #[test]
    fn test_deterministic() {
        let params = TemplateParams::default();
        assert_eq!(generate_route_templates(&params), generate_route_templates(&params));
    }

    #[test]
    fn test_default_count_is_380() {
        let params = TemplateParams::default();
        let templates = generate_route_templates(&params);
        assert_eq!(templates.len(), 380);
        assert_eq!(templates.len(), params.expected_template_count());
        assert_eq!(templates.first().unwrap().run_number, 13000);
        assert_eq!(templates.last().unwrap().run_number, 13379);
    }

    #[test]
    fn test_no_self_pairs_and_unique_numbers() {
        let templates = generate_route_templates(&TemplateParams::default());
        assert!(templates.iter().all(|t| t.source != t.destination));

        let numbers: HashSet<i64> = templates.iter().map(|t| t.run_number).collect();
        assert_eq!(numbers.len(), templates.len());

        let routes: HashSet<(&str, &str)> = templates
            .iter()
            .map(|t| (t.source.as_str(), t.destination.as_str()))
            .collect();
        assert_eq!(routes.len(), templates.len());
    }

    #[test]
    fn test_one_or_zero_locations_empty() {
        let mut params = abc_params();
        params.locations = vec!["A".to_string()];
        assert!(generate_route_templates(&params).is_empty());

        params.locations.clear();
        assert!(generate_route_templates(&params).is_empty());
    }

    #[test]
    fn test_times_wrap_past_midnight() {
        let params = TemplateParams {
            base_departure_time: hm(23, 50),
            ..abc_params()
        };
        let templates = generate_route_templates(&params);

        // 序号 2: 23:50 + 10min = 00:00
        assert_eq!(templates[2].departure_time, hm(0, 0));
        // 序号 0: 23:50 + 30min = 00:20
        assert_eq!(templates[0].arrival_time, hm(0, 20));
    }
}
