// tutorchat Engine — Analytics dashboards
//
// Turns the analytics documents into stat cards, chart configurations and
// list view models. Drawing is left to a `ChartSurface` (the charting
// library boundary); this module only decides what is drawn where.
//
// Module layout:
//   mod.rs    : chart model, ChartBoard, Dashboard (loading guard, refresh)
//   teacher.rs: /teacher_analytics view
//   student.rs: /my_learning_analytics view

pub mod student;
pub mod teacher;

use crate::atoms::constants::DASHBOARD_REFRESH_SECS;
use crate::atoms::error::{EngineError, EngineResult};
use crate::engine::backend::TutorBackend;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use student::StudentView;
pub use teacher::TeacherView;

pub const REFRESH_LOADING: &str = "載入中...";
pub const ERROR_PREFIX: &str = "載入數據時發生錯誤：";

// ── Chart model ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
    Line,
    Doughnut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<f64>,
    /// Styling keys passed through to the library (`backgroundColor`,
    /// `yAxisID`, …).
    #[serde(flatten)]
    pub style: Map<String, Value>,
}

impl Dataset {
    pub fn new(label: Option<&str>, data: Vec<f64>, style: Value) -> Self {
        Dataset {
            label: label.map(Into::into),
            data,
            style: match style {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// Id of the canvas element the chart is drawn on.
    pub canvas: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub options: Value,
    /// Per-point tooltip text, when the default tooltip is replaced.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tooltips: Vec<String>,
}

impl ChartSpec {
    /// Configuration object for the charting library.
    pub fn to_config(&self) -> Value {
        json!({
            "type": self.kind,
            "data": {
                "labels": self.labels,
                "datasets": self.datasets,
            },
            "options": self.options,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum ChartSlot {
    Chart(ChartSpec),
    NoData { canvas: String, text: String },
}

impl ChartSlot {
    pub fn canvas(&self) -> &str {
        match self {
            ChartSlot::Chart(spec) => &spec.canvas,
            ChartSlot::NoData { canvas, .. } => canvas,
        }
    }

    fn no_data(canvas: &str, text: &str) -> Self {
        ChartSlot::NoData {
            canvas: canvas.into(),
            text: text.into(),
        }
    }
}

/// Shared chart options: responsive, fixed aspect off.
fn base_options(extra: Value) -> Value {
    let mut options = json!({ "responsive": true, "maintainAspectRatio": false });
    if let (Value::Object(base), Value::Object(extra)) = (&mut options, extra) {
        base.extend(extra);
    }
    options
}

// ── Surface ────────────────────────────────────────────────────────────

/// Where charts end up. Implemented by the host (canvas bindings, a
/// terminal renderer, a recorder in tests).
pub trait ChartSurface: Send {
    fn draw(&mut self, spec: &ChartSpec);
    /// Clear the canvas and paint centered placeholder text.
    fn placeholder(&mut self, canvas: &str, text: &str);
    fn destroy(&mut self, canvas: &str);
}

/// Tracks live charts so every redraw starts from a clean set of canvases.
#[derive(Debug, Default)]
pub struct ChartBoard {
    drawn: Vec<String>,
}

impl ChartBoard {
    pub fn drawn(&self) -> &[String] {
        &self.drawn
    }

    pub fn redraw(&mut self, slots: &[ChartSlot], surface: &mut dyn ChartSurface) {
        for canvas in self.drawn.drain(..) {
            surface.destroy(&canvas);
        }
        for slot in slots {
            match slot {
                ChartSlot::Chart(spec) => {
                    surface.draw(spec);
                    self.drawn.push(spec.canvas.clone());
                }
                ChartSlot::NoData { canvas, text } => surface.placeholder(canvas, text),
            }
        }
        debug!("[analytics] Redrew {} slots ({} charts)", slots.len(), self.drawn.len());
    }
}

// ── Cards ──────────────────────────────────────────────────────────────

/// Card value shown when a text stat is missing.
pub const NO_VALUE: &str = "無";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    /// Element id of the card's value.
    pub id: &'static str,
    pub label: &'static str,
    pub value: String,
}

impl StatCard {
    fn new(id: &'static str, label: &'static str, value: impl Into<String>) -> Self {
        StatCard {
            id,
            label,
            value: value.into(),
        }
    }
}

// ── Dashboard ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardKind {
    Teacher,
    Student,
}

impl DashboardKind {
    /// Refresh button label while idle.
    pub fn idle_label(&self) -> &'static str {
        match self {
            DashboardKind::Teacher => "重新載入",
            DashboardKind::Student => "重新整理",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardContent {
    Teacher(TeacherView),
    Student(StudentView),
}

impl DashboardContent {
    pub fn charts(&self) -> &[ChartSlot] {
        match self {
            DashboardContent::Teacher(v) => &v.charts,
            DashboardContent::Student(v) => &v.charts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub kind: DashboardKind,
    pub loading: bool,
    pub refresh_label: String,
    pub error: Option<String>,
    /// Last successfully loaded content. Survives a failed reload.
    pub content: Option<DashboardContent>,
}

struct DashboardState {
    refresh_label: String,
    error: Option<String>,
    content: Option<DashboardContent>,
    board: ChartBoard,
}

pub struct Dashboard<B: TutorBackend> {
    backend: B,
    kind: DashboardKind,
    loading: AtomicBool,
    state: Mutex<DashboardState>,
    surface: Mutex<Box<dyn ChartSurface>>,
}

impl<B: TutorBackend> Dashboard<B> {
    pub fn new(backend: B, kind: DashboardKind, surface: Box<dyn ChartSurface>) -> Self {
        Dashboard {
            backend,
            kind,
            loading: AtomicBool::new(false),
            state: Mutex::new(DashboardState {
                refresh_label: kind.idle_label().to_string(),
                error: None,
                content: None,
                board: ChartBoard::default(),
            }),
            surface: Mutex::new(surface),
        }
    }

    pub fn kind(&self) -> DashboardKind {
        self.kind
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let state = self.state.lock();
        DashboardSnapshot {
            kind: self.kind,
            loading: self.is_loading(),
            refresh_label: state.refresh_label.clone(),
            error: state.error.clone(),
            content: state.content.clone(),
        }
    }

    /// Fetch and redraw. Returns `false` when skipped because another load
    /// is still in flight. Dropping the future mid-fetch releases the guard.
    pub async fn load(&self) -> bool {
        if self
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("[analytics] Load already in flight, skipping");
            return false;
        }
        let _guard = LoadGuard { dashboard: self };
        {
            let mut state = self.state.lock();
            state.refresh_label = REFRESH_LOADING.to_string();
            state.error = None;
        }

        let result = self.fetch().await;

        let mut state = self.state.lock();
        match result {
            Ok(content) => {
                let mut surface = self.surface.lock();
                state.board.redraw(content.charts(), surface.as_mut());
                state.content = Some(content);
                info!("[analytics] {:?} dashboard loaded", self.kind);
            }
            Err(e) => {
                warn!("[analytics] {:?} dashboard failed: {}", self.kind, e);
                state.error = Some(format!("{ERROR_PREFIX}{e}"));
            }
        }
        true
    }

    async fn fetch(&self) -> EngineResult<DashboardContent> {
        let now = chrono::Utc::now();
        match self.kind {
            DashboardKind::Teacher => {
                let data = self.backend.teacher_analytics().await?;
                Ok(DashboardContent::Teacher(teacher::build(&data, now)))
            }
            DashboardKind::Student => {
                let data = self.backend.student_analytics().await?;
                Ok(DashboardContent::Student(student::build(&data, now)))
            }
        }
    }
}

/// Restores the idle label and clears the loading flag, on completion or
/// cancellation.
struct LoadGuard<'a, B: TutorBackend> {
    dashboard: &'a Dashboard<B>,
}

impl<B: TutorBackend> Drop for LoadGuard<'_, B> {
    fn drop(&mut self) {
        let d = self.dashboard;
        d.state.lock().refresh_label = d.kind.idle_label().to_string();
        d.loading.store(false, Ordering::SeqCst);
    }
}

impl<B: TutorBackend + 'static> Dashboard<B> {
    /// Auto refresh at the dashboard's standard period (5 minutes).
    pub fn spawn_default_refresh(self: &Arc<Self>) -> EngineResult<tokio::task::JoinHandle<()>> {
        self.spawn_auto_refresh(Duration::from_secs(DASHBOARD_REFRESH_SECS))
    }

    /// Reload every `period` until the handle is aborted. The first reload
    /// happens one period after the call.
    pub fn spawn_auto_refresh(self: &Arc<Self>, period: Duration) -> EngineResult<tokio::task::JoinHandle<()>> {
        if period.is_zero() {
            return Err(EngineError::Config("refresh period must be positive".into()));
        }
        let dashboard = Arc::clone(self);
        info!("[analytics] Auto refresh every {}s", period.as_secs());
        Ok(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                dashboard.load().await;
            }
        }))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::atoms::types::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Event {
        Draw(String),
        Placeholder(String, String),
        Destroy(String),
    }

    #[derive(Clone, Default)]
    pub(crate) struct Recorder(pub Arc<Mutex<Vec<Event>>>);

    impl Recorder {
        pub(crate) fn take(&self) -> Vec<Event> {
            std::mem::take(&mut *self.0.lock())
        }
    }

    impl ChartSurface for Recorder {
        fn draw(&mut self, spec: &ChartSpec) {
            self.0.lock().push(Event::Draw(spec.canvas.clone()));
        }
        fn placeholder(&mut self, canvas: &str, text: &str) {
            self.0.lock().push(Event::Placeholder(canvas.into(), text.into()));
        }
        fn destroy(&mut self, canvas: &str) {
            self.0.lock().push(Event::Destroy(canvas.into()));
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        teacher: Mutex<Option<TeacherAnalytics>>,
        gate: Option<Arc<Notify>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TutorBackend for FakeBackend {
        async fn send_chat(&self, _message: &str) -> EngineResult<ChatResponse> {
            Err(EngineError::Other("unused".into()))
        }
        async fn history(&self) -> EngineResult<HistoryPayload> {
            Err(EngineError::Other("unused".into()))
        }
        async fn clear_history(&self) -> EngineResult<ClearResponse> {
            Err(EngineError::Other("unused".into()))
        }
        async fn book_recommendations(&self, _message: &str) -> EngineResult<BookRecommendations> {
            Err(EngineError::Other("unused".into()))
        }
        async fn teacher_analytics(&self) -> EngineResult<TeacherAnalytics> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.teacher.lock().clone().ok_or(EngineError::Http {
                status: 500,
                reason: "INTERNAL SERVER ERROR".into(),
            })
        }
        async fn student_analytics(&self) -> EngineResult<StudentAnalytics> {
            Err(EngineError::Server("僅限學生".into()))
        }
    }

    fn sample_teacher() -> TeacherAnalytics {
        serde_json::from_str(
            r#"{
                "stats": {"activeStudents": 3, "totalConversations": 42, "avgLevel": 2.1, "popularUnit": "線性回歸"},
                "scaffolding_stats": {"差異鷹架": 5, "重複鷹架": 2},
                "unit_stats": {"線性回歸": 10},
                "level_stats": {},
                "daily_activity": {"2026-10-13": 4, "2026-10-14": 6},
                "students": []
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn chart_config_shape() {
        let spec = ChartSpec {
            canvas: "c".into(),
            kind: ChartKind::Doughnut,
            labels: vec!["a".into()],
            datasets: vec![Dataset::new(Some("n"), vec![1.0], json!({"borderWidth": 2}))],
            options: base_options(json!({"cutout": "50%"})),
            tooltips: vec![],
        };
        let cfg = spec.to_config();
        assert_eq!(cfg["type"], "doughnut");
        assert_eq!(cfg["data"]["labels"][0], "a");
        assert_eq!(cfg["data"]["datasets"][0]["label"], "n");
        assert_eq!(cfg["data"]["datasets"][0]["borderWidth"], 2);
        assert_eq!(cfg["options"]["responsive"], true);
        assert_eq!(cfg["options"]["cutout"], "50%");
    }

    #[test]
    fn board_destroys_before_redraw() {
        let recorder = Recorder::default();
        let mut surface = recorder.clone();
        let mut board = ChartBoard::default();
        let spec = |canvas: &str| {
            ChartSlot::Chart(ChartSpec {
                canvas: canvas.into(),
                kind: ChartKind::Bar,
                labels: vec![],
                datasets: vec![],
                options: json!({}),
                tooltips: vec![],
            })
        };
        board.redraw(&[spec("a"), ChartSlot::no_data("b", "暫無數據")], &mut surface);
        assert_eq!(board.drawn(), ["a".to_string()]);
        recorder.take();
        board.redraw(&[spec("a"), spec("b")], &mut surface);
        assert_eq!(
            recorder.take(),
            vec![
                Event::Destroy("a".into()),
                Event::Draw("a".into()),
                Event::Draw("b".into())
            ]
        );
    }

    #[tokio::test]
    async fn load_draws_and_resets_label() {
        let recorder = Recorder::default();
        let backend = FakeBackend {
            teacher: Mutex::new(Some(sample_teacher())),
            ..Default::default()
        };
        let dash = Dashboard::new(backend, DashboardKind::Teacher, Box::new(recorder.clone()));
        assert!(dash.load().await);
        let snap = dash.snapshot();
        assert_eq!(snap.refresh_label, "重新載入");
        assert!(!snap.loading);
        assert_eq!(snap.error, None);
        assert!(matches!(snap.content, Some(DashboardContent::Teacher(_))));
        let events = recorder.take();
        assert!(events.contains(&Event::Draw("scaffoldingChart".into())));
        assert!(events.contains(&Event::Placeholder("levelsChart".into(), "暫無數據".into())));

        // Reload destroys every chart drawn last time.
        dash.load().await;
        let events = recorder.take();
        let destroyed: Vec<_> = events.iter().filter(|e| matches!(e, Event::Destroy(_))).collect();
        assert_eq!(destroyed.len(), 3);
        assert!(matches!(events[0], Event::Destroy(_)));
    }

    #[tokio::test]
    async fn failure_sets_banner_and_keeps_content() {
        let backend = FakeBackend {
            teacher: Mutex::new(Some(sample_teacher())),
            ..Default::default()
        };
        let dash = Dashboard::new(backend, DashboardKind::Teacher, Box::new(Recorder::default()));
        dash.load().await;
        *dash.backend().teacher.lock() = None;
        dash.load().await;
        let snap = dash.snapshot();
        assert_eq!(
            snap.error.as_deref(),
            Some("載入數據時發生錯誤：HTTP 500: INTERNAL SERVER ERROR")
        );
        assert!(snap.content.is_some());
        assert_eq!(snap.refresh_label, "重新載入");
    }

    #[tokio::test]
    async fn student_server_error() {
        let dash = Dashboard::new(FakeBackend::default(), DashboardKind::Student, Box::new(Recorder::default()));
        dash.load().await;
        let snap = dash.snapshot();
        assert_eq!(snap.error.as_deref(), Some("載入數據時發生錯誤：僅限學生"));
        assert_eq!(snap.refresh_label, "重新整理");
        assert!(snap.content.is_none());
    }

    #[tokio::test]
    async fn concurrent_load_is_skipped() {
        let gate = Arc::new(Notify::new());
        let backend = FakeBackend {
            teacher: Mutex::new(Some(sample_teacher())),
            gate: Some(gate.clone()),
            ..Default::default()
        };
        let dash = Arc::new(Dashboard::new(backend, DashboardKind::Teacher, Box::new(Recorder::default())));
        let first = tokio::spawn({
            let dash = dash.clone();
            async move { dash.load().await }
        });
        while dash.backend().calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(dash.is_loading());
        assert_eq!(dash.snapshot().refresh_label, "載入中...");
        assert!(!dash.load().await);
        gate.notify_one();
        assert!(first.await.unwrap());
        assert_eq!(dash.backend().calls.load(Ordering::SeqCst), 1);
        assert!(!dash.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_load_releases_guard() {
        let backend = FakeBackend {
            teacher: Mutex::new(Some(sample_teacher())),
            gate: Some(Arc::new(Notify::new())),
            ..Default::default()
        };
        let dash = Dashboard::new(backend, DashboardKind::Teacher, Box::new(Recorder::default()));
        let timed_out = tokio::time::timeout(Duration::from_millis(50), dash.load()).await;
        assert!(timed_out.is_err());
        let snap = dash.snapshot();
        assert!(!snap.loading);
        assert_eq!(snap.refresh_label, "重新載入");
        assert!(snap.content.is_none());

        // The gate never opens, so the next load stalls too, but it does run.
        let _ = tokio::time::timeout(Duration::from_millis(50), dash.load()).await;
        assert_eq!(dash.backend().calls.load(Ordering::SeqCst), 2);
        assert!(!dash.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn default_refresh_period_is_five_minutes() {
        let backend = FakeBackend {
            teacher: Mutex::new(Some(sample_teacher())),
            ..Default::default()
        };
        let dash = Arc::new(Dashboard::new(backend, DashboardKind::Teacher, Box::new(Recorder::default())));
        let handle = dash.spawn_default_refresh().unwrap();
        tokio::time::sleep(Duration::from_secs(DASHBOARD_REFRESH_SECS - 1)).await;
        assert_eq!(dash.backend().calls.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(dash.backend().calls.load(Ordering::SeqCst), 1);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn auto_refresh_reloads_each_period() {
        let backend = FakeBackend {
            teacher: Mutex::new(Some(sample_teacher())),
            ..Default::default()
        };
        let dash = Arc::new(Dashboard::new(backend, DashboardKind::Teacher, Box::new(Recorder::default())));
        let handle = dash.spawn_auto_refresh(Duration::from_secs(300)).unwrap();
        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(dash.backend().calls.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(302)).await;
        assert_eq!(dash.backend().calls.load(Ordering::SeqCst), 2);
        handle.abort();
        assert!(dash.spawn_auto_refresh(Duration::ZERO).is_err());
    }
}
