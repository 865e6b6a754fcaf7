// tutorchat Engine — Backend transport
//
// Every call the client makes to the tutoring server goes through the
// `TutorBackend` trait. `HttpBackend` is the real implementation; widgets and
// dashboards only see the trait, so tests drive them with in-memory fakes.
//
// One request per user action: no retry, no backoff. Chat endpoints answer
// `{error}` bodies with 401/500, so their JSON is parsed regardless of
// status. The analytics endpoints treat a non-2xx status as failure.

use crate::atoms::constants::PATH_AFTER_LOGIN;
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::*;
use crate::config::{ClientConfig, Endpoints};
use crate::engine::http::build_client;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

// ── Trait seam ─────────────────────────────────────────────────────────

#[async_trait]
pub trait TutorBackend: Send + Sync {
    /// POST `/chat`.
    async fn send_chat(&self, message: &str) -> EngineResult<ChatResponse>;

    /// GET `/chat/history`.
    async fn history(&self) -> EngineResult<HistoryPayload>;

    /// POST `/chat/clear`.
    async fn clear_history(&self) -> EngineResult<ClearResponse>;

    /// POST `/get_book_recommendations`.
    async fn book_recommendations(&self, message: &str) -> EngineResult<BookRecommendations>;

    /// GET `/teacher_analytics`.
    async fn teacher_analytics(&self) -> EngineResult<TeacherAnalytics>;

    /// GET `/my_learning_analytics`.
    async fn student_analytics(&self) -> EngineResult<StudentAnalytics>;
}

// ── HTTP implementation ────────────────────────────────────────────────

pub struct HttpBackend {
    client: Client,
    base: Url,
    endpoints: Endpoints,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> EngineResult<Self> {
        Ok(HttpBackend {
            client: build_client(config)?,
            base: config.base_url()?,
            endpoints: config.endpoints.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve an endpoint path against the base URL, keeping any base
    /// path prefix (`/app/` + `/chat` → `/app/chat`).
    pub fn url_for(&self, path: &str) -> EngineResult<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: Option<&ChatRequest>) -> EngineResult<T> {
        let url = self.url_for(path)?;
        debug!("[backend] POST {}", url);
        let mut req = self.client.post(url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        parse_body(resp).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> EngineResult<T> {
        let url = self.url_for(path)?;
        debug!("[backend] GET {}", url);
        let resp = self.client.get(url).send().await?;
        parse_body(resp).await
    }

    /// GET an analytics document: non-2xx is an HTTP error and a top-level
    /// `error` field is a server error.
    async fn get_analytics<T: DeserializeOwned + HasError>(&self, path: &str) -> EngineResult<T> {
        let url = self.url_for(path)?;
        debug!("[backend] GET {}", url);
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            warn!("[backend] {} answered {}", path, status);
            return Err(EngineError::http(status));
        }
        let doc: T = parse_body(resp).await?;
        match doc.error_text() {
            Some(e) => Err(EngineError::Server(e.to_string())),
            None => Ok(doc),
        }
    }

    // ── Session ────────────────────────────────────────────────────────

    /// Log in with the site's form endpoint. The server redirects to the
    /// video page on success and back home on failure; the session cookie
    /// stays in this backend's cookie store.
    pub async fn login(&self, username: &str, password: &str) -> EngineResult<()> {
        let url = self.url_for(&self.endpoints.login)?;
        info!("[backend] Logging in as {}", username);
        let resp = self
            .client
            .post(url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        let landed = resp.url().path().to_string();
        if resp.status().is_success() && landed.ends_with(PATH_AFTER_LOGIN) {
            Ok(())
        } else {
            warn!("[backend] Login for {} rejected (landed on {})", username, landed);
            Err(EngineError::Auth(format!("login rejected for user '{username}'")))
        }
    }

    /// Create an account. The server answers 200 with its home page either
    /// way, so only transport failures are reported.
    pub async fn register(&self, username: &str, password: &str) -> EngineResult<()> {
        let url = self.url_for(&self.endpoints.register)?;
        info!("[backend] Registering {}", username);
        let resp = self
            .client
            .post(url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(EngineError::http(resp.status()));
        }
        Ok(())
    }

    pub async fn logout(&self) -> EngineResult<()> {
        let url = self.url_for(&self.endpoints.logout)?;
        info!("[backend] Logging out");
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(EngineError::http(resp.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl TutorBackend for HttpBackend {
    async fn send_chat(&self, message: &str) -> EngineResult<ChatResponse> {
        let body = ChatRequest { message: message.to_string() };
        self.post_json(&self.endpoints.chat, Some(&body)).await
    }

    async fn history(&self) -> EngineResult<HistoryPayload> {
        self.get_json(&self.endpoints.history).await
    }

    async fn clear_history(&self) -> EngineResult<ClearResponse> {
        self.post_json(&self.endpoints.clear, None).await
    }

    async fn book_recommendations(&self, message: &str) -> EngineResult<BookRecommendations> {
        let body = ChatRequest { message: message.to_string() };
        self.post_json(&self.endpoints.books, Some(&body)).await
    }

    async fn teacher_analytics(&self) -> EngineResult<TeacherAnalytics> {
        self.get_analytics(&self.endpoints.teacher_analytics).await
    }

    async fn student_analytics(&self) -> EngineResult<StudentAnalytics> {
        self.get_analytics(&self.endpoints.student_analytics).await
    }
}

/// Widgets and dashboards can share one session (one cookie store).
#[async_trait]
impl<T: TutorBackend + ?Sized> TutorBackend for Arc<T> {
    async fn send_chat(&self, message: &str) -> EngineResult<ChatResponse> {
        (**self).send_chat(message).await
    }

    async fn history(&self) -> EngineResult<HistoryPayload> {
        (**self).history().await
    }

    async fn clear_history(&self) -> EngineResult<ClearResponse> {
        (**self).clear_history().await
    }

    async fn book_recommendations(&self, message: &str) -> EngineResult<BookRecommendations> {
        (**self).book_recommendations(message).await
    }

    async fn teacher_analytics(&self) -> EngineResult<TeacherAnalytics> {
        (**self).teacher_analytics().await
    }

    async fn student_analytics(&self) -> EngineResult<StudentAnalytics> {
        (**self).student_analytics().await
    }
}

// ── Helpers ────────────────────────────────────────────────────────────

/// Documents that may carry a top-level `error` field.
trait HasError {
    fn error_text(&self) -> Option<&str>;
}

impl HasError for TeacherAnalytics {
    fn error_text(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

impl HasError for StudentAnalytics {
    fn error_text(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

async fn parse_body<T: DeserializeOwned>(resp: Response) -> EngineResult<T> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        warn!("[backend] Unparsable {} response ({} bytes): {}", status, bytes.len(), e);
        EngineError::Serialization(e)
    })
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_keeps_base_prefix() {
        let cfg = ClientConfig {
            base_url: "https://tutor.example.edu/app".into(),
            ..ClientConfig::default()
        };
        let backend = HttpBackend::new(&cfg).unwrap();
        assert_eq!(backend.url_for("/chat").unwrap().as_str(), "https://tutor.example.edu/app/chat");
        assert_eq!(
            backend.url_for("chat/history").unwrap().as_str(),
            "https://tutor.example.edu/app/chat/history"
        );
    }

    #[test]
    fn analytics_error_field() {
        let doc = TeacherAnalytics {
            error: Some("權限不足".into()),
            ..Default::default()
        };
        assert_eq!(doc.error_text(), Some("權限不足"));
        let doc = StudentAnalytics {
            error: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(doc.error_text(), None);
    }
}
