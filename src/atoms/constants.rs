// ── tutorchat Atoms: Constants ─────────────────────────────────────────────
// All named constants for the crate live here.

// ── Panel geometry ─────────────────────────────────────────────────────────
// The chat panel may never shrink below the minimum size, and may never grow
// past a fraction of the viewport.
pub const PANEL_MIN_WIDTH: f64 = 320.0;
pub const PANEL_MIN_HEIGHT: f64 = 400.0;
pub const PANEL_MAX_WIDTH_RATIO: f64 = 0.9;
pub const PANEL_MAX_HEIGHT_RATIO: f64 = 0.85;

// Initial corner-anchored layout, before the first drag or resize.
pub const PANEL_DEFAULT_WIDTH: f64 = 380.0;
pub const PANEL_DEFAULT_HEIGHT: f64 = 520.0;
pub const PANEL_DEFAULT_RIGHT: f64 = 24.0;
pub const PANEL_DEFAULT_BOTTOM: f64 = 24.0;

// ── Chat history ───────────────────────────────────────────────────────────
/// Content stored by the server in place of a removed turn.
pub const CLEARED_MARKER: &str = "[已清除]";

// ── Analytics ──────────────────────────────────────────────────────────────
pub const UNIT_CHART_TOP_N: usize = 8;
pub const CHART_LABEL_MAX_CHARS: usize = 8;
pub const CARD_LABEL_MAX_CHARS: usize = 10;
/// Teacher dashboard reload period (5 minutes).
pub const DASHBOARD_REFRESH_SECS: u64 = 300;
/// Maximum value of the understanding-level axis on the unit progress chart.
pub const LEVEL_AXIS_MAX: f64 = 3.0;

// ── Endpoints ──────────────────────────────────────────────────────────────
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/";
pub const PATH_CHAT: &str = "/chat";
pub const PATH_HISTORY: &str = "/chat/history";
pub const PATH_CLEAR: &str = "/chat/clear";
pub const PATH_BOOKS: &str = "/get_book_recommendations";
pub const PATH_TEACHER_ANALYTICS: &str = "/teacher_analytics";
pub const PATH_STUDENT_ANALYTICS: &str = "/my_learning_analytics";
pub const PATH_LOGIN: &str = "/login";
pub const PATH_REGISTER: &str = "/register";
pub const PATH_LOGOUT: &str = "/logout";
/// Page the server redirects to after a successful login.
pub const PATH_AFTER_LOGIN: &str = "/video";

// ── Configuration ──────────────────────────────────────────────────────────
pub const CONFIG_DIR_NAME: &str = "tutorchat";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const ENV_BASE_URL: &str = "TUTORCHAT_BASE_URL";
