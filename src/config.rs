// tutorchat — Client configuration
//
// Loaded from `<config_dir>/tutorchat/config.toml`. Every field has a
// default, so a missing file (or a partial one) is fine. The base URL can be
// overridden with `TUTORCHAT_BASE_URL`.

use crate::atoms::constants::*;
use crate::atoms::error::{EngineError, EngineResult};
use crate::engine::format::ContentMode;
use crate::engine::panel::PanelConfig;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

// ── Endpoints ──────────────────────────────────────────────────────────

/// Paths of every backend route, joined onto `base_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub chat: String,
    pub history: String,
    pub clear: String,
    pub books: String,
    pub teacher_analytics: String,
    pub student_analytics: String,
    pub login: String,
    pub register: String,
    pub logout: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            chat: PATH_CHAT.into(),
            history: PATH_HISTORY.into(),
            clear: PATH_CLEAR.into(),
            books: PATH_BOOKS.into(),
            teacher_analytics: PATH_TEACHER_ANALYTICS.into(),
            student_analytics: PATH_STUDENT_ANALYTICS.into(),
            login: PATH_LOGIN.into(),
            register: PATH_REGISTER.into(),
            logout: PATH_LOGOUT.into(),
        }
    }
}

impl Endpoints {
    fn all(&self) -> [(&'static str, &str); 9] {
        [
            ("chat", &self.chat),
            ("history", &self.history),
            ("clear", &self.clear),
            ("books", &self.books),
            ("teacher_analytics", &self.teacher_analytics),
            ("student_analytics", &self.student_analytics),
            ("login", &self.login),
            ("register", &self.register),
            ("logout", &self.logout),
        ]
    }
}

// ── Widget settings ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetSettings {
    pub content_mode: ContentMode,
    /// Fetch book recommendations alongside every chat message.
    pub recommendations: bool,
    /// Hide history turns whose content is the cleared marker.
    pub skip_cleared_marker: bool,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        WidgetSettings {
            content_mode: ContentMode::Html,
            recommendations: true,
            skip_cleared_marker: true,
        }
    }
}

// ── Client config ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// No timeout unless set; a hung request keeps the typing indicator up.
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub endpoints: Endpoints,
    pub panel: PanelConfig,
    pub widget: WidgetSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.into(),
            connect_timeout_secs: None,
            request_timeout_secs: None,
            endpoints: Endpoints::default(),
            panel: PanelConfig::default(),
            widget: WidgetSettings::default(),
        }
    }
}

impl ClientConfig {
    /// `<config_dir>/tutorchat/config.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> EngineResult<Self> {
        let cfg: ClientConfig = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `path`, or from the default location when `None`.
    /// An explicit path must exist; a missing default file yields defaults.
    /// The environment override is applied last.
    pub fn load(path: Option<&Path>) -> EngineResult<Self> {
        let mut cfg = match path {
            Some(p) => {
                info!("[config] Loading {}", p.display());
                Self::from_toml(&std::fs::read_to_string(p)?)?
            }
            None => match Self::default_path() {
                Some(p) if p.exists() => {
                    info!("[config] Loading {}", p.display());
                    Self::from_toml(&std::fs::read_to_string(&p)?)?
                }
                _ => {
                    debug!("[config] No config file, using defaults");
                    ClientConfig::default()
                }
            },
        };
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                debug!("[config] {} overrides base_url", ENV_BASE_URL);
                cfg.base_url = url.trim().to_string();
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml(&self) -> EngineResult<String> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(format!("cannot serialize config: {e}")))
    }

    /// Parsed base URL. A trailing slash is added so relative joins keep
    /// any path prefix.
    pub fn base_url(&self) -> EngineResult<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let base = self.base_url()?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(EngineError::Config(format!("base_url must be http(s), got {}", base.scheme())));
        }
        for (name, path) in self.endpoints.all() {
            if path.trim().is_empty() {
                return Err(EngineError::Config(format!("endpoint '{name}' is empty")));
            }
        }
        let p = &self.panel;
        for (name, v) in [
            ("panel.min_width", p.min_width),
            ("panel.min_height", p.min_height),
            ("panel.width", p.width),
            ("panel.height", p.height),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(EngineError::Config(format!("{name} must be positive, got {v}")));
            }
        }
        for (name, v) in [("panel.right", p.right), ("panel.bottom", p.bottom)] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(EngineError::Config(format!("{name} must not be negative, got {v}")));
            }
        }
        for (name, v) in [
            ("panel.max_width_ratio", p.max_width_ratio),
            ("panel.max_height_ratio", p.max_height_ratio),
        ] {
            if !(v > 0.0 && v <= 1.0) {
                return Err(EngineError::Config(format!("{name} must be in (0, 1], got {v}")));
            }
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ClientConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.endpoints.books, "/get_book_recommendations");
        assert_eq!(cfg.panel.min_width, 320.0);
        assert!(cfg.connect_timeout_secs.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = ClientConfig::from_toml(
            r#"
            base_url = "https://tutor.example.edu/app"

            [endpoints]
            chat = "/api/chat"

            [widget]
            content_mode = "plain_text"
            recommendations = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.endpoints.chat, "/api/chat");
        assert_eq!(cfg.endpoints.history, "/chat/history");
        assert_eq!(cfg.widget.content_mode, ContentMode::PlainText);
        assert!(!cfg.widget.recommendations);
        assert!(cfg.widget.skip_cleared_marker);
        assert_eq!(cfg.base_url().unwrap().as_str(), "https://tutor.example.edu/app/");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ClientConfig::from_toml(r#"base_url = "ftp://x""#),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            ClientConfig::from_toml("[panel]\nmax_width_ratio = 1.5"),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            ClientConfig::from_toml("[panel]\nmin_width = -1.0"),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(ClientConfig::from_toml("base_url = ["), Err(EngineError::Toml(_))));
        assert!(matches!(ClientConfig::from_toml(r#"base_url = "not a url""#), Err(EngineError::Url(_))));
    }

    #[test]
    fn toml_round_trip() {
        let cfg = ClientConfig {
            request_timeout_secs: Some(30),
            ..ClientConfig::default()
        };
        let text = cfg.to_toml().unwrap();
        assert_eq!(ClientConfig::from_toml(&text).unwrap(), cfg);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = ClientConfig::load(Some(Path::new("/nonexistent/tutorchat.toml"))).unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
