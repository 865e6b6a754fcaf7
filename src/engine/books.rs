// tutorchat Engine — Book recommendation panel
// View model for the sidebar that lists books related to the latest question.

use crate::atoms::types::{Book, BookRecommendations};
use serde::Serialize;

pub const BOOKS_PROMPT: &str = "開始對話即可獲得書籍推薦 ✨";
pub const BOOKS_LOADING: &str = "🔍 正在搜尋相關書籍...";
pub const BOOKS_EMPTY: &str = "暫無相關書籍推薦";
pub const BOOKS_FAILED: &str = "獲取推薦失敗，請稍後再試";
pub const DEFAULT_SOURCE: &str = "推薦書籍";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookCard {
    pub title: String,
    pub author: String,
    pub link: String,
    pub image: String,
    pub source: String,
}

impl From<&Book> for BookCard {
    fn from(book: &Book) -> Self {
        BookCard {
            title: book.title.clone(),
            author: book.author.clone(),
            link: book.link.clone(),
            image: book.image.clone(),
            source: book
                .source
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_SOURCE)
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BookPanel {
    /// Nothing asked yet (initial state and after clearing the chat).
    #[default]
    Prompt,
    Loading,
    Empty,
    Failed,
    Ready {
        /// Shown above the list only when non-empty.
        keywords: Option<String>,
        books: Vec<BookCard>,
    },
}

impl BookPanel {
    pub fn from_recommendations(recs: &BookRecommendations) -> Self {
        if recs.books.is_empty() {
            return BookPanel::Empty;
        }
        BookPanel::Ready {
            keywords: recs.keywords.clone().filter(|k| !k.trim().is_empty()),
            books: recs.books.iter().map(BookCard::from).collect(),
        }
    }

    /// Placeholder text for the non-list states.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            BookPanel::Prompt => Some(BOOKS_PROMPT),
            BookPanel::Loading => Some(BOOKS_LOADING),
            BookPanel::Empty => Some(BOOKS_EMPTY),
            BookPanel::Failed => Some(BOOKS_FAILED),
            BookPanel::Ready { .. } => None,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
