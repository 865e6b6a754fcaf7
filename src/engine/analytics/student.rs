// tutorchat Engine — Student learning dashboard view

use super::{base_options, ChartKind, ChartSlot, ChartSpec, Dataset, StatCard, NO_VALUE};
use crate::atoms::constants::{CARD_LABEL_MAX_CHARS, CHART_LABEL_MAX_CHARS, LEVEL_AXIS_MAX};
use crate::atoms::types::{
    stat_text, OrderedMap, OverallStats, ScaffoldingShare, StudentAnalytics, TimelineEntry, UnitProgress, Weakness,
};
use crate::engine::dates::relative_date;
use crate::engine::format::truncate_label;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

pub const CANVAS_PROGRESS: &str = "unitProgressChart";
pub const CANVAS_SCAFFOLDING: &str = "scaffoldingChart";

pub const NO_LEARNING: &str = "暫無學習數據";
pub const NO_SCAFFOLDING: &str = "暫無鷹架數據";
pub const NO_TIMELINE: &str = "暫無學習軌跡";

pub const WEAKNESS_PENDING: &str = "分析中...";
pub const CONFIDENCE_LOW: &str = "低";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeaknessCard {
    pub unit: String,
    pub current_level: String,
    pub trend: String,
    pub conversations: u64,
    pub weakness: String,
    pub suggestions: Vec<String>,
    pub confidence: String,
    pub last_studied: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineItem {
    pub unit: String,
    pub level: String,
    pub when: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentView {
    pub cards: Vec<StatCard>,
    pub charts: Vec<ChartSlot>,
    /// One card per studied unit; empty shows `暫無學習數據`.
    pub weaknesses: Vec<WeaknessCard>,
    /// Empty shows `暫無學習軌跡`.
    pub timeline: Vec<TimelineItem>,
}

pub fn build(data: &StudentAnalytics, now: DateTime<Utc>) -> StudentView {
    StudentView {
        cards: cards(&data.overall_stats),
        charts: vec![
            progress_chart(&data.unit_progress),
            scaffolding_chart(&data.scaffolding_stats),
        ],
        weaknesses: weakness_cards(&data.unit_progress, &data.weakness_analysis, now),
        timeline: data.timeline.iter().map(|e| timeline_item(e, now)).collect(),
    }
}

pub fn cards(stats: &OverallStats) -> Vec<StatCard> {
    let or_none = |v: Option<&str>| v.filter(|s| !s.is_empty()).unwrap_or(NO_VALUE).to_string();
    vec![
        StatCard::new(
            "unitsStudied",
            "已學習單元",
            stat_text(stats.units_studied.as_ref()).unwrap_or_else(|| "0".into()),
        ),
        StatCard::new(
            "avgLevel",
            "平均理解程度",
            stat_text(stats.avg_level.as_ref()).unwrap_or_else(|| "-".into()),
        ),
        StatCard::new(
            "mostDiscussed",
            "最常討論單元",
            truncate_label(&or_none(stats.most_discussed_unit.as_deref()), CARD_LABEL_MAX_CHARS),
        ),
        StatCard::new(
            "mainScaffolding",
            "主要鷹架類型",
            or_none(stats.main_scaffolding.as_deref()),
        ),
    ]
}

/// Average level (left axis, 0–3) and conversation count (right axis) per unit.
pub fn progress_chart(progress: &OrderedMap<UnitProgress>) -> ChartSlot {
    if progress.is_empty() {
        return ChartSlot::no_data(CANVAS_PROGRESS, NO_LEARNING);
    }
    ChartSlot::Chart(ChartSpec {
        canvas: CANVAS_PROGRESS.into(),
        kind: ChartKind::Bar,
        labels: progress.keys().map(|k| truncate_label(k, CHART_LABEL_MAX_CHARS)).collect(),
        datasets: vec![
            Dataset::new(
                Some("平均理解程度"),
                progress.values().map(|p| p.avg_level).collect(),
                json!({
                    "backgroundColor": "rgba(102, 126, 234, 0.8)",
                    "borderColor": "rgba(102, 126, 234, 1)",
                    "borderWidth": 1,
                    "yAxisID": "y"
                }),
            ),
            Dataset::new(
                Some("對話次數"),
                progress.values().map(|p| p.conversations as f64).collect(),
                json!({
                    "backgroundColor": "rgba(118, 75, 162, 0.6)",
                    "borderColor": "rgba(118, 75, 162, 1)",
                    "borderWidth": 1,
                    "yAxisID": "y1"
                }),
            ),
        ],
        options: base_options(json!({
            "scales": {
                "y": {
                    "type": "linear",
                    "position": "left",
                    "beginAtZero": true,
                    "max": LEVEL_AXIS_MAX,
                    "title": { "display": true, "text": "理解程度 (1-3)" },
                    "ticks": { "stepSize": 0.5 }
                },
                "y1": {
                    "type": "linear",
                    "position": "right",
                    "beginAtZero": true,
                    "title": { "display": true, "text": "對話次數" },
                    "grid": { "drawOnChartArea": false }
                },
                "x": { "ticks": { "maxRotation": 45, "minRotation": 0 } }
            },
            "plugins": { "legend": { "display": true, "position": "top" } }
        })),
        tooltips: vec![],
    })
}

/// Tooltip text for one scaffolding slice.
pub fn scaffolding_tooltip(label: &str, share: &ScaffoldingShare) -> String {
    format!("{}: {} 次 ({}%)", label, share.count, share.percentage)
}

pub fn scaffolding_chart(stats: &OrderedMap<ScaffoldingShare>) -> ChartSlot {
    if stats.is_empty() {
        return ChartSlot::no_data(CANVAS_SCAFFOLDING, NO_SCAFFOLDING);
    }
    ChartSlot::Chart(ChartSpec {
        canvas: CANVAS_SCAFFOLDING.into(),
        kind: ChartKind::Doughnut,
        labels: stats.keys().map(String::from).collect(),
        datasets: vec![Dataset::new(
            None,
            stats.values().map(|s| s.count).collect(),
            json!({
                "backgroundColor": [
                    "rgba(141, 225, 141, 0.8)",
                    "rgba(255, 206, 86, 0.8)",
                    "rgba(255, 99, 132, 0.8)"
                ],
                "borderColor": [
                    "rgba(141, 225, 141, 1)",
                    "rgba(255, 206, 86, 1)",
                    "rgba(255, 99, 132, 1)"
                ],
                "borderWidth": 2
            }),
        )],
        options: base_options(json!({
            "plugins": {
                "legend": {
                    "position": "bottom",
                    "labels": { "padding": 20, "usePointStyle": true, "font": { "size": 13 } }
                }
            }
        })),
        tooltips: stats.iter().map(|(label, share)| scaffolding_tooltip(label, share)).collect(),
    })
}

/// A card for every unit with progress; units the server has not analysed
/// yet get the pending placeholder.
pub fn weakness_cards(
    progress: &OrderedMap<UnitProgress>,
    analysis: &OrderedMap<Weakness>,
    now: DateTime<Utc>,
) -> Vec<WeaknessCard> {
    progress
        .iter()
        .map(|(unit, p)| {
            let (weakness, suggestions, confidence) = match analysis.get(unit) {
                Some(w) => (w.weakness.clone(), w.suggestions.clone(), w.confidence.clone()),
                None => (WEAKNESS_PENDING.to_string(), Vec::new(), CONFIDENCE_LOW.to_string()),
            };
            WeaknessCard {
                unit: unit.to_string(),
                current_level: p.current_level.clone(),
                trend: p.trend.clone(),
                conversations: p.conversations,
                weakness,
                suggestions,
                confidence,
                last_studied: relative_date(&p.last_studied, now),
            }
        })
        .collect()
}

fn timeline_item(entry: &TimelineEntry, now: DateTime<Utc>) -> TimelineItem {
    TimelineItem {
        unit: entry.unit.clone(),
        level: entry.level.clone(),
        when: relative_date(&entry.timestamp, now),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
