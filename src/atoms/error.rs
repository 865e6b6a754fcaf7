// ── tutorchat Atoms: Error Types ───────────────────────────────────────────
// Single canonical error enum for the client, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (I/O, network, server, config…).
//   • The `#[from]` attribute wires std/external error conversions automatically.
//   • Transport failures are rendered as a fixed localized message; only
//     `Server` carries text meant for the user.
//   • No variant carries a password in its message.

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP / network failure (reqwest layer).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Base URL or endpoint path could not be parsed.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Config file is not valid TOML for `ClientConfig`.
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Non-2xx response on an endpoint that treats status as failure.
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    /// `error` field of an otherwise well-formed JSON response.
    #[error("{0}")]
    Server(String),

    /// Login or registration was rejected.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catch-all for errors that do not yet have a dedicated variant.
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Build an `Http` error from a response status.
    pub fn http(status: reqwest::StatusCode) -> Self {
        Self::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    /// True for failures the UI reports with a fixed fallback string
    /// (no detail surfaced).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Serialization(_) | Self::Network(_) | Self::Http { .. }
        )
    }
}

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::Other(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        EngineError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All engine operations return this type.
pub type EngineResult<T> = Result<T, EngineError>;

impl From<EngineError> for String {
    fn from(e: EngineError) -> Self {
        e.to_string()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display() {
        let e = EngineError::http(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.to_string(), "HTTP 500: Internal Server Error");
        assert!(e.is_transport());
    }

    #[test]
    fn server_error_is_not_transport() {
        let e = EngineError::Server("未登入".into());
        assert_eq!(e.to_string(), "未登入");
        assert!(!e.is_transport());
    }

    #[test]
    fn serde_error_converts() {
        let err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let e: EngineError = err.into();
        assert!(e.is_transport());
        assert!(e.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn string_round_trip() {
        let e: EngineError = "boom".into();
        let s: String = e.into();
        assert_eq!(s, "boom");
    }
}
