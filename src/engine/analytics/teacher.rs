// tutorchat Engine — Teacher dashboard view

use super::{base_options, ChartKind, ChartSlot, ChartSpec, Dataset, StatCard, NO_VALUE};
use crate::atoms::constants::{CARD_LABEL_MAX_CHARS, CHART_LABEL_MAX_CHARS, UNIT_CHART_TOP_N};
use crate::atoms::types::{stat_text, OrderedMap, StudentRow, TeacherAnalytics, TeacherStats};
use crate::engine::dates::relative_date;
use crate::engine::format::truncate_label;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

pub const CANVAS_SCAFFOLDING: &str = "scaffoldingChart";
pub const CANVAS_UNITS: &str = "unitsChart";
pub const CANVAS_LEVELS: &str = "levelsChart";
pub const CANVAS_DAILY: &str = "dailyChart";

pub const NO_DATA: &str = "暫無數據";
pub const NO_STUDENTS: &str = "暫無學生數據";

const DOUGHNUT_COLORS: [&str; 4] = ["#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0"];
const PIE_COLORS: [&str; 4] = ["#FF6384", "#FFCE56", "#4BC0C0", "#36A2EB"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentLine {
    pub username: String,
    pub conversations: u64,
    pub main_scaffolding: String,
    pub current_level: String,
    pub favorite_unit: String,
    pub last_activity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeacherView {
    pub cards: Vec<StatCard>,
    pub charts: Vec<ChartSlot>,
    /// Empty means the table shows `暫無學生數據`.
    pub students: Vec<StudentLine>,
}

pub fn build(data: &TeacherAnalytics, now: DateTime<Utc>) -> TeacherView {
    TeacherView {
        cards: cards(&data.stats),
        charts: vec![
            scaffolding_chart(&data.scaffolding_stats),
            units_chart(&data.unit_stats),
            levels_chart(&data.level_stats),
            daily_chart(&data.daily_activity),
        ],
        students: data.students.iter().map(|s| student_line(s, now)).collect(),
    }
}

pub fn cards(stats: &TeacherStats) -> Vec<StatCard> {
    let popular = stats
        .popular_unit
        .as_deref()
        .filter(|u| !u.is_empty())
        .unwrap_or(NO_VALUE);
    vec![
        StatCard::new(
            "activeStudents",
            "活躍學生",
            stat_text(stats.active_students.as_ref()).unwrap_or_else(|| "0".into()),
        ),
        StatCard::new(
            "totalConversations",
            "總對話數",
            stat_text(stats.total_conversations.as_ref()).unwrap_or_else(|| "0".into()),
        ),
        StatCard::new(
            "avgLevel",
            "平均理解程度",
            stat_text(stats.avg_level.as_ref()).unwrap_or_else(|| "-".into()),
        ),
        StatCard::new("popularUnit", "熱門單元", truncate_label(popular, CARD_LABEL_MAX_CHARS)),
    ]
}

fn share_chart(canvas: &str, kind: ChartKind, data: &OrderedMap<f64>, colors: [&str; 4]) -> ChartSlot {
    if data.is_empty() {
        return ChartSlot::no_data(canvas, NO_DATA);
    }
    ChartSlot::Chart(ChartSpec {
        canvas: canvas.into(),
        kind,
        labels: data.keys().map(String::from).collect(),
        datasets: vec![Dataset::new(
            None,
            data.values().copied().collect(),
            json!({ "backgroundColor": colors, "borderWidth": 2, "borderColor": "#fff" }),
        )],
        options: base_options(json!({
            "plugins": {
                "legend": { "position": "bottom", "labels": { "padding": 20, "usePointStyle": true } }
            }
        })),
        tooltips: vec![],
    })
}

pub fn scaffolding_chart(data: &OrderedMap<f64>) -> ChartSlot {
    share_chart(CANVAS_SCAFFOLDING, ChartKind::Doughnut, data, DOUGHNUT_COLORS)
}

pub fn levels_chart(data: &OrderedMap<f64>) -> ChartSlot {
    share_chart(CANVAS_LEVELS, ChartKind::Pie, data, PIE_COLORS)
}

/// Most discussed units first; ties keep server order.
pub fn units_chart(data: &OrderedMap<f64>) -> ChartSlot {
    if data.is_empty() {
        return ChartSlot::no_data(CANVAS_UNITS, NO_DATA);
    }
    let mut sorted: Vec<(&str, f64)> = data.iter().map(|(k, v)| (k, *v)).collect();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
    sorted.truncate(UNIT_CHART_TOP_N);

    ChartSlot::Chart(ChartSpec {
        canvas: CANVAS_UNITS.into(),
        kind: ChartKind::Bar,
        labels: sorted
            .iter()
            .map(|(label, _)| truncate_label(label, CHART_LABEL_MAX_CHARS))
            .collect(),
        datasets: vec![Dataset::new(
            Some("討論次數"),
            sorted.iter().map(|(_, v)| *v).collect(),
            json!({
                "backgroundColor": "rgba(102, 126, 234, 0.8)",
                "borderColor": "rgba(102, 126, 234, 1)",
                "borderWidth": 1
            }),
        )],
        options: base_options(json!({
            "scales": {
                "y": { "beginAtZero": true, "ticks": { "stepSize": 1 } },
                "x": { "ticks": { "maxRotation": 45, "minRotation": 0 } }
            },
            "plugins": { "legend": { "display": false } }
        })),
        tooltips: vec![],
    })
}

pub fn daily_chart(data: &OrderedMap<f64>) -> ChartSlot {
    if data.is_empty() {
        return ChartSlot::no_data(CANVAS_DAILY, NO_DATA);
    }
    ChartSlot::Chart(ChartSpec {
        canvas: CANVAS_DAILY.into(),
        kind: ChartKind::Line,
        labels: data.keys().map(String::from).collect(),
        datasets: vec![Dataset::new(
            Some("對話次數"),
            data.values().copied().collect(),
            json!({
                "borderColor": "rgba(118, 75, 162, 1)",
                "backgroundColor": "rgba(118, 75, 162, 0.1)",
                "tension": 0.4,
                "fill": true,
                "pointBackgroundColor": "rgba(118, 75, 162, 1)",
                "pointBorderColor": "#fff",
                "pointBorderWidth": 2,
                "pointRadius": 6
            }),
        )],
        options: base_options(json!({
            "scales": { "y": { "beginAtZero": true, "ticks": { "stepSize": 1 } } },
            "plugins": { "legend": { "display": false } }
        })),
        tooltips: vec![],
    })
}

fn student_line(row: &StudentRow, now: DateTime<Utc>) -> StudentLine {
    StudentLine {
        username: row.username.clone(),
        conversations: row.total_conversations.unwrap_or(0),
        main_scaffolding: row.main_scaffolding.clone(),
        current_level: row.current_level.clone(),
        favorite_unit: row.favorite_unit.clone(),
        last_activity: relative_date(&row.last_activity, now),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
