// tutorchat Engine — Chat widget
//
// One widget drives every chat surface (video page assistant, dashboard
// robot). The differences between surfaces live in `WidgetConfig`; the
// request flow is shared.
//
// State sits behind a mutex so a renderer can snapshot `view()` while a
// request is in flight (typing indicator, books loading state). The lock is
// never held across an await.

use crate::atoms::constants::CLEARED_MARKER;
use crate::atoms::error::EngineResult;
use crate::atoms::types::{BookRecommendations, ChatResponse, ClearResponse, HistoryPayload, Role};
use crate::config::WidgetSettings;
use crate::engine::backend::TutorBackend;
use crate::engine::books::BookPanel;
use crate::engine::format::{format_message, ContentMode};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

// ── Configuration ──────────────────────────────────────────────────────

/// User-visible messages. Defaults are the video page's zh-TW strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetStrings {
    pub greeting: String,
    pub history_failed_prefix: String,
    pub history_error: String,
    pub chat_error_prefix: String,
    pub server_error: String,
    pub clear_failed_prefix: String,
    pub clear_error: String,
    pub unknown_error: String,
}

impl Default for WidgetStrings {
    fn default() -> Self {
        WidgetStrings {
            greeting: "你好！有什麼我可以幫忙的嗎？".into(),
            history_failed_prefix: "⚠️ 無法載入歷史紀錄：".into(),
            history_error: "⚠️ 載入紀錄時出錯。".into(),
            chat_error_prefix: "錯誤：".into(),
            server_error: "伺服器錯誤，請稍後再試。".into(),
            clear_failed_prefix: "清除記錄失敗：".into(),
            clear_error: "清除時發生錯誤".into(),
            unknown_error: "未知錯誤".into(),
        }
    }
}

impl WidgetStrings {
    /// Wording used by the floating dashboard robot.
    pub fn dashboard() -> Self {
        WidgetStrings {
            clear_failed_prefix: "清除紀錄失敗：".into(),
            clear_error: "清除伺服器紀錄時發生錯誤".into(),
            ..WidgetStrings::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetConfig {
    pub content_mode: ContentMode,
    pub recommendations: bool,
    pub skip_cleared_marker: bool,
    pub strings: WidgetStrings,
}

impl WidgetConfig {
    /// Video page: HTML bubbles with copy buttons, book sidebar, cleared
    /// marker hidden.
    pub fn video_page() -> Self {
        WidgetConfig {
            content_mode: ContentMode::Html,
            recommendations: true,
            skip_cleared_marker: true,
            strings: WidgetStrings::default(),
        }
    }

    /// Dashboard robot: plain-text bubbles, no recommendations.
    pub fn dashboard() -> Self {
        WidgetConfig {
            content_mode: ContentMode::PlainText,
            recommendations: false,
            skip_cleared_marker: false,
            strings: WidgetStrings::dashboard(),
        }
    }

    pub fn from_settings(settings: &WidgetSettings) -> Self {
        WidgetConfig {
            content_mode: settings.content_mode,
            recommendations: settings.recommendations,
            skip_cleared_marker: settings.skip_cleared_marker,
            strings: WidgetStrings::default(),
        }
    }
}

// ── View model ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatBubble {
    pub id: Uuid,
    pub role: Role,
    /// Already formatted for the widget's content mode.
    pub html: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcript {
    pub bubbles: Vec<ChatBubble>,
    pub typing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WidgetView {
    pub transcript: Transcript,
    pub books: BookPanel,
    pub draft: String,
}

#[derive(Debug, Default)]
struct WidgetState {
    view: WidgetView,
    /// Requests currently awaiting a reply; the typing indicator shows while
    /// any is outstanding.
    pending: usize,
}

// ── Widget ─────────────────────────────────────────────────────────────

pub struct ChatWidget<B: TutorBackend> {
    backend: B,
    config: WidgetConfig,
    state: Mutex<WidgetState>,
}

impl<B: TutorBackend> ChatWidget<B> {
    pub fn new(backend: B, config: WidgetConfig) -> Self {
        ChatWidget {
            backend,
            config,
            state: Mutex::new(WidgetState::default()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn view(&self) -> WidgetView {
        self.state.lock().view.clone()
    }

    pub fn set_draft(&self, text: &str) {
        self.state.lock().view.draft = text.to_string();
    }

    fn push(&self, role: Role, text: &str) {
        let bubble = ChatBubble {
            id: Uuid::new_v4(),
            role,
            html: format_message(text, self.config.content_mode),
        };
        self.state.lock().view.transcript.bubbles.push(bubble);
    }

    // ── Open ───────────────────────────────────────────────────────────

    /// Greeting first, then the stored conversation.
    pub async fn open(&self) {
        self.push(Role::Ai, &self.config.strings.greeting);
        match self.backend.history().await {
            Ok(HistoryPayload::Turns(turns)) => {
                debug!("[widget] History loaded ({} turns)", turns.len());
                for turn in turns {
                    if self.config.skip_cleared_marker && turn.content == CLEARED_MARKER {
                        continue;
                    }
                    self.push(turn.role, &turn.content);
                }
            }
            Ok(HistoryPayload::Failure { error: Some(e) }) if !e.is_empty() => {
                warn!("[widget] History refused: {}", e);
                self.push(Role::Ai, &format!("{}{}", self.config.strings.history_failed_prefix, e));
            }
            Ok(HistoryPayload::Failure { .. }) => {
                warn!("[widget] History answered an object without turns");
                self.push(Role::Ai, &self.config.strings.history_error);
            }
            Err(e) => {
                warn!("[widget] History request failed: {}", e);
                self.push(Role::Ai, &self.config.strings.history_error);
            }
        }
    }

    // ── Submit ─────────────────────────────────────────────────────────

    /// Send the current draft.
    pub async fn submit_draft(&self) {
        let draft = self.state.lock().view.draft.clone();
        self.submit(&draft).await;
    }

    /// Send one message. Whitespace-only input does nothing.
    pub async fn submit(&self, text: &str) {
        let message = text.trim();
        if message.is_empty() {
            return;
        }
        self.push(Role::User, message);
        {
            let mut state = self.state.lock();
            state.view.draft.clear();
            state.pending += 1;
            state.view.transcript.typing = true;
            if self.config.recommendations {
                state.view.books = BookPanel::Loading;
            }
        }

        let (chat, books) = if self.config.recommendations {
            let (chat, books) = futures::join!(
                self.backend.send_chat(message),
                self.backend.book_recommendations(message)
            );
            (chat, Some(books))
        } else {
            (self.backend.send_chat(message).await, None)
        };

        {
            let mut state = self.state.lock();
            state.pending = state.pending.saturating_sub(1);
            state.view.transcript.typing = state.pending > 0;
        }

        let chat_failed = chat.is_err();
        self.apply_reply(chat);
        if let Some(books) = books {
            self.apply_books(books, chat_failed);
        }
    }

    fn apply_reply(&self, result: EngineResult<ChatResponse>) {
        let strings = &self.config.strings;
        match result {
            Ok(resp) => match (resp.reply_text(), resp.error_text()) {
                (Some(reply), _) => self.push(Role::Ai, reply),
                (None, Some(err)) => {
                    warn!("[widget] Chat refused: {}", err);
                    self.push(Role::Ai, &format!("{}{}", strings.chat_error_prefix, err));
                }
                (None, None) => debug!("[widget] Chat response carried neither reply nor error"),
            },
            Err(e) => {
                warn!("[widget] Chat request failed: {}", e);
                self.push(Role::Ai, &strings.server_error);
            }
        }
    }

    fn apply_books(&self, result: EngineResult<BookRecommendations>, chat_failed: bool) {
        let panel = match result {
            _ if chat_failed => BookPanel::Failed,
            Ok(recs) => {
                debug!("[widget] {} book recommendations", recs.books.len());
                BookPanel::from_recommendations(&recs)
            }
            Err(e) => {
                warn!("[widget] Book recommendations failed: {}", e);
                BookPanel::Failed
            }
        };
        self.state.lock().view.books = panel;
    }

    // ── Clear ──────────────────────────────────────────────────────────

    /// Wipe the local transcript immediately, then ask the server to forget
    /// the conversation.
    pub async fn clear(&self) {
        {
            let mut state = self.state.lock();
            state.view.transcript.bubbles.clear();
            state.view.draft.clear();
            state.view.books = BookPanel::Prompt;
        }
        let strings = &self.config.strings;
        match self.backend.clear_history().await {
            Ok(ClearResponse { success: true, .. }) => {
                info!("[widget] Conversation cleared");
                self.push(Role::Ai, &strings.greeting);
            }
            Ok(ClearResponse { error, .. }) => {
                let err = error.filter(|e| !e.is_empty()).unwrap_or_else(|| strings.unknown_error.clone());
                warn!("[widget] Clear refused: {}", err);
                self.push(Role::Ai, &format!("{}{}", strings.clear_failed_prefix, err));
            }
            Err(e) => {
                warn!("[widget] Clear request failed: {}", e);
                self.push(Role::Ai, &strings.clear_error);
            }
        }
    }
}

/// Flatten a bubble back to the plain text a terminal shows.
pub fn bubble_text(bubble: &ChatBubble) -> String {
    crate::engine::format::text_content(&bubble.html)
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::error::EngineError;
    use crate::atoms::types::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeBackend {
        history: Option<HistoryPayload>,
        reply: Option<ChatResponse>,
        books: Option<BookRecommendations>,
        clear: Option<ClearResponse>,
        gate: Option<Arc<Notify>>,
        chat_calls: AtomicUsize,
        book_calls: AtomicUsize,
    }

    fn down() -> EngineError {
        EngineError::Other("connection refused".into())
    }

    #[async_trait]
    impl TutorBackend for FakeBackend {
        async fn send_chat(&self, _message: &str) -> EngineResult<ChatResponse> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.reply.clone().ok_or_else(down)
        }
        async fn history(&self) -> EngineResult<HistoryPayload> {
            self.history.clone().ok_or_else(down)
        }
        async fn clear_history(&self) -> EngineResult<ClearResponse> {
            self.clear.clone().ok_or_else(down)
        }
        async fn book_recommendations(&self, _message: &str) -> EngineResult<BookRecommendations> {
            self.book_calls.fetch_add(1, Ordering::SeqCst);
            self.books.clone().ok_or_else(down)
        }
        async fn teacher_analytics(&self) -> EngineResult<TeacherAnalytics> {
            Err(down())
        }
        async fn student_analytics(&self) -> EngineResult<StudentAnalytics> {
            Err(down())
        }
    }

    fn texts(widget: &ChatWidget<FakeBackend>) -> Vec<(Role, String)> {
        widget
            .view()
            .transcript
            .bubbles
            .iter()
            .map(|b| (b.role, bubble_text(b)))
            .collect()
    }

    fn turn(role: Role, content: &str) -> HistoryTurn {
        HistoryTurn { role, content: content.into() }
    }

    fn reply(text: &str) -> Option<ChatResponse> {
        Some(ChatResponse { reply: Some(text.into()), error: None })
    }

    #[tokio::test]
    async fn open_shows_greeting_then_history() {
        let backend = FakeBackend {
            history: Some(HistoryPayload::Turns(vec![
                turn(Role::User, "什麼是梯度下降？"),
                turn(Role::Ai, "[已清除]"),
                turn(Role::Ai, "一種最佳化方法。"),
            ])),
            ..Default::default()
        };
        let widget = ChatWidget::new(backend, WidgetConfig::video_page());
        widget.open().await;
        assert_eq!(
            texts(&widget),
            vec![
                (Role::Ai, "你好！有什麼我可以幫忙的嗎？".to_string()),
                (Role::User, "什麼是梯度下降？".to_string()),
                (Role::Ai, "一種最佳化方法。".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn dashboard_keeps_cleared_marker() {
        let backend = FakeBackend {
            history: Some(HistoryPayload::Turns(vec![turn(Role::Ai, "[已清除]")])),
            ..Default::default()
        };
        let widget = ChatWidget::new(backend, WidgetConfig::dashboard());
        widget.open().await;
        assert_eq!(texts(&widget)[1].1, "[已清除]");
    }

    #[tokio::test]
    async fn history_errors() {
        let backend = FakeBackend {
            history: Some(HistoryPayload::Failure { error: Some("未登入".into()) }),
            ..Default::default()
        };
        let widget = ChatWidget::new(backend, WidgetConfig::video_page());
        widget.open().await;
        assert_eq!(texts(&widget)[1].1, "⚠️ 無法載入歷史紀錄：未登入");

        let widget = ChatWidget::new(FakeBackend::default(), WidgetConfig::video_page());
        widget.open().await;
        assert_eq!(texts(&widget)[1].1, "⚠️ 載入紀錄時出錯。");
    }

    #[tokio::test]
    async fn empty_chat_response_adds_no_bubble() {
        let backend = FakeBackend {
            reply: Some(ChatResponse::default()),
            ..Default::default()
        };
        let widget = ChatWidget::new(backend, WidgetConfig::dashboard());
        widget.submit("hi").await;
        assert_eq!(texts(&widget), vec![(Role::User, "hi".to_string())]);
        assert!(!widget.view().transcript.typing);
    }

    #[tokio::test]
    async fn blank_submit_is_a_no_op() {
        let widget = ChatWidget::new(FakeBackend::default(), WidgetConfig::video_page());
        widget.submit("   \n").await;
        assert!(widget.view().transcript.bubbles.is_empty());
        assert_eq!(widget.backend().chat_calls.load(Ordering::SeqCst), 0);
        assert_eq!(widget.view().books, BookPanel::Prompt);
    }

    #[tokio::test]
    async fn submit_success_with_books() {
        let backend = FakeBackend {
            reply: reply("<p>請看範例</p><pre><code>x = 1</code></pre>"),
            books: Some(BookRecommendations {
                books: vec![Book {
                    title: "機器學習".into(),
                    ..Default::default()
                }],
                keywords: Some("機器學習".into()),
            }),
            ..Default::default()
        };
        let widget = ChatWidget::new(backend, WidgetConfig::video_page());
        widget.set_draft("  什麼是過擬合？ ");
        widget.submit_draft().await;
        let view = widget.view();
        assert_eq!(view.draft, "");
        assert!(!view.transcript.typing);
        assert_eq!(view.transcript.bubbles.len(), 2);
        assert_eq!(bubble_text(&view.transcript.bubbles[0]), "什麼是過擬合？");
        assert!(view.transcript.bubbles[1].html.contains("copy-code-btn"));
        assert!(matches!(view.books, BookPanel::Ready { ref books, .. } if books.len() == 1));
        assert_eq!(widget.backend().book_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn submit_error_reply() {
        let backend = FakeBackend {
            reply: Some(ChatResponse { reply: None, error: Some("未登入".into()) }),
            books: Some(BookRecommendations::default()),
            ..Default::default()
        };
        let widget = ChatWidget::new(backend, WidgetConfig::video_page());
        widget.submit("hi").await;
        assert_eq!(texts(&widget)[1].1, "錯誤：未登入");
        assert_eq!(widget.view().books, BookPanel::Empty);
    }

    #[tokio::test]
    async fn transport_failure_fails_both_panels() {
        let backend = FakeBackend {
            books: Some(BookRecommendations::default()),
            ..Default::default()
        };
        let widget = ChatWidget::new(backend, WidgetConfig::video_page());
        widget.submit("hi").await;
        assert_eq!(texts(&widget)[1].1, "伺服器錯誤，請稍後再試。");
        assert_eq!(widget.view().books, BookPanel::Failed);
        assert!(!widget.view().transcript.typing);
    }

    #[tokio::test]
    async fn book_failure_alone() {
        let backend = FakeBackend {
            reply: reply("好的"),
            ..Default::default()
        };
        let widget = ChatWidget::new(backend, WidgetConfig::video_page());
        widget.submit("hi").await;
        assert_eq!(texts(&widget)[1].1, "好的");
        assert_eq!(widget.view().books, BookPanel::Failed);
    }

    #[tokio::test]
    async fn dashboard_skips_recommendations_and_escapes() {
        let backend = FakeBackend {
            reply: reply("<b>bold</b>"),
            ..Default::default()
        };
        let widget = ChatWidget::new(backend, WidgetConfig::dashboard());
        widget.submit("hi").await;
        assert_eq!(widget.backend().book_calls.load(Ordering::SeqCst), 0);
        assert_eq!(widget.view().books, BookPanel::Prompt);
        assert_eq!(widget.view().transcript.bubbles[1].html, "&lt;b&gt;bold&lt;/b&gt;");
    }

    #[tokio::test]
    async fn typing_indicator_while_in_flight() {
        let gate = Arc::new(Notify::new());
        let backend = FakeBackend {
            reply: reply("done"),
            books: Some(BookRecommendations::default()),
            gate: Some(gate.clone()),
            ..Default::default()
        };
        let widget = Arc::new(ChatWidget::new(backend, WidgetConfig::video_page()));
        let task = tokio::spawn({
            let widget = widget.clone();
            async move { widget.submit("hi").await }
        });
        while widget.backend().chat_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        let view = widget.view();
        assert!(view.transcript.typing);
        assert_eq!(view.books, BookPanel::Loading);
        gate.notify_one();
        task.await.unwrap();
        assert!(!widget.view().transcript.typing);
        assert_eq!(texts(&widget)[1].1, "done");
    }

    #[tokio::test]
    async fn clear_flows() {
        let backend = FakeBackend {
            reply: reply("ok"),
            books: Some(BookRecommendations::default()),
            clear: Some(ClearResponse { success: true, error: None }),
            ..Default::default()
        };
        let widget = ChatWidget::new(backend, WidgetConfig::video_page());
        widget.submit("hi").await;
        widget.set_draft("half typed");
        widget.clear().await;
        let view = widget.view();
        assert_eq!(view.draft, "");
        assert_eq!(view.books, BookPanel::Prompt);
        assert_eq!(texts(&widget), vec![(Role::Ai, "你好！有什麼我可以幫忙的嗎？".to_string())]);

        let backend = FakeBackend {
            clear: Some(ClearResponse { success: false, error: None }),
            ..Default::default()
        };
        let widget = ChatWidget::new(backend, WidgetConfig::dashboard());
        widget.clear().await;
        assert_eq!(texts(&widget)[0].1, "清除紀錄失敗：未知錯誤");

        let widget = ChatWidget::new(FakeBackend::default(), WidgetConfig::video_page());
        widget.clear().await;
        assert_eq!(texts(&widget)[0].1, "清除時發生錯誤");
    }
}
