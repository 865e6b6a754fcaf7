// Analytics dashboards in the terminal. Charts become one summary line each.

use super::print_json;
use crate::Format;
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tutorchat::atoms::constants::DASHBOARD_REFRESH_SECS;
use tutorchat::engine::analytics::{ChartSpec, ChartSurface, DashboardContent, StatCard};
use tutorchat::engine::analytics::student::{NO_LEARNING, NO_TIMELINE};
use tutorchat::engine::analytics::teacher::NO_STUDENTS;
use tutorchat::engine::render;
use tutorchat::{Dashboard, DashboardKind, EngineError, EngineResult, HttpBackend};

/// Chart surface that records a text line per canvas.
#[derive(Clone, Default)]
pub struct TextChartSurface {
    lines: Arc<Mutex<Vec<String>>>,
}

impl TextChartSurface {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl ChartSurface for TextChartSurface {
    fn draw(&mut self, spec: &ChartSpec) {
        let series: Vec<String> = spec
            .datasets
            .iter()
            .map(|d| {
                let points: Vec<String> = spec
                    .labels
                    .iter()
                    .zip(&d.data)
                    .map(|(label, v)| format!("{label}={v}"))
                    .collect();
                match &d.label {
                    Some(name) => format!("{name}: {}", points.join(", ")),
                    None => points.join(", "),
                }
            })
            .collect();
        self.lines
            .lock()
            .push(format!("[{}] {:?}: {}", spec.canvas, spec.kind, series.join(" | ")));
    }

    fn placeholder(&mut self, canvas: &str, text: &str) {
        self.lines.lock().push(format!("[{canvas}] {text}"));
    }

    fn destroy(&mut self, canvas: &str) {
        self.lines.lock().retain(|l| !l.starts_with(&format!("[{canvas}]")));
    }
}

pub async fn show(backend: Arc<HttpBackend>, kind: DashboardKind, format: Format) -> EngineResult<()> {
    let surface = TextChartSurface::default();
    let dashboard = Dashboard::new(backend, kind, Box::new(surface.clone()));
    dashboard.load().await;
    let snap = dashboard.snapshot();
    if let Some(err) = snap.error {
        return Err(EngineError::Other(err));
    }
    match snap.content {
        Some(content) => print_content(&content, &surface, format),
        None => Ok(()),
    }
}

/// Teacher dashboard reprinted at the standard refresh period. A failed
/// reload prints the banner and keeps going.
pub async fn watch(backend: Arc<HttpBackend>, format: Format) -> EngineResult<()> {
    let surface = TextChartSurface::default();
    let dashboard = Dashboard::new(backend, DashboardKind::Teacher, Box::new(surface.clone()));
    let mut interval = tokio::time::interval(Duration::from_secs(DASHBOARD_REFRESH_SECS));
    info!("[cli] Watching teacher dashboard every {}s", DASHBOARD_REFRESH_SECS);
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
        dashboard.load().await;
        let snap = dashboard.snapshot();
        if let Some(err) = &snap.error {
            warn!("[cli] {err}");
            eprintln!("{err}");
        }
        if let Some(content) = &snap.content {
            print_content(content, &surface, format)?;
        }
    }
}

fn print_content(content: &DashboardContent, surface: &TextChartSurface, format: Format) -> EngineResult<()> {
    match format {
        Format::Json => print_json(content),
        Format::Html => {
            print_html(content);
            Ok(())
        }
        Format::Text => {
            print_text(content, &surface.lines());
            Ok(())
        }
    }
}

fn print_cards(cards: &[StatCard]) {
    for c in cards {
        println!("{}: {}", c.label, c.value);
    }
}

fn print_text(content: &DashboardContent, chart_lines: &[String]) {
    match content {
        DashboardContent::Teacher(v) => {
            print_cards(&v.cards);
            println!();
            chart_lines.iter().for_each(|l| println!("{l}"));
            println!();
            if v.students.is_empty() {
                println!("{NO_STUDENTS}");
            }
            for s in &v.students {
                println!(
                    "{} │ {} 次 │ {} │ {} │ {} │ {}",
                    s.username, s.conversations, s.main_scaffolding, s.current_level, s.favorite_unit, s.last_activity
                );
            }
        }
        DashboardContent::Student(v) => {
            print_cards(&v.cards);
            println!();
            chart_lines.iter().for_each(|l| println!("{l}"));
            println!();
            if v.weaknesses.is_empty() {
                println!("{NO_LEARNING}");
            }
            for w in &v.weaknesses {
                println!(
                    "{} ({} / {}, 對話 {} 次, 最後學習：{})",
                    w.unit, w.current_level, w.trend, w.conversations, w.last_studied
                );
                println!("  ⚠️ {} (信心度: {})", w.weakness, w.confidence);
                for s in &w.suggestions {
                    println!("  💡 {s}");
                }
            }
            println!();
            if v.timeline.is_empty() {
                println!("{NO_TIMELINE}");
            }
            for t in &v.timeline {
                println!("{} │ {} │ {}", t.when, t.unit, t.level);
            }
        }
    }
}

fn print_html(content: &DashboardContent) {
    match content {
        DashboardContent::Teacher(v) => {
            println!("{}", render::stat_cards(&v.cards));
            println!("{}", render::student_table(&v.students));
        }
        DashboardContent::Student(v) => {
            println!("{}", render::stat_cards(&v.cards));
            println!("{}", render::weakness_cards(&v.weaknesses));
            println!("{}", render::timeline(&v.timeline));
        }
    }
    for slot in content.charts() {
        if let tutorchat::engine::analytics::ChartSlot::Chart(spec) = slot {
            println!("<script type=\"application/json\" data-canvas=\"{}\">{}</script>", spec.canvas, spec.to_config());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tutorchat::engine::analytics::{ChartKind, Dataset};

    #[test]
    fn text_surface_replaces_destroyed_canvas() {
        let mut surface = TextChartSurface::default();
        let spec = ChartSpec {
            canvas: "unitsChart".into(),
            kind: ChartKind::Bar,
            labels: vec!["回歸".into(), "分類".into()],
            datasets: vec![Dataset::new(Some("討論次數"), vec![3.0, 1.0], json!({}))],
            options: json!({}),
            tooltips: vec![],
        };
        surface.draw(&spec);
        surface.placeholder("levelsChart", "暫無數據");
        assert_eq!(
            surface.lines(),
            ["[unitsChart] Bar: 討論次數: 回歸=3, 分類=1", "[levelsChart] 暫無數據"]
        );
        surface.destroy("unitsChart");
        assert_eq!(surface.lines(), ["[levelsChart] 暫無數據"]);
    }
}
