// Chat, history, clear and book commands. Each one drives a ChatWidget so
// the terminal shows exactly what the page would.

use super::print_json;
use crate::Format;
use std::sync::Arc;
use tutorchat::atoms::types::Role;
use tutorchat::engine::books::BookPanel;
use tutorchat::engine::render;
use tutorchat::engine::widget::{bubble_text, WidgetView};
use tutorchat::{ChatWidget, ClientConfig, EngineResult, HttpBackend, TutorBackend, WidgetConfig};

type Backend = Arc<HttpBackend>;

fn widget(backend: Backend, cfg: &ClientConfig) -> ChatWidget<Backend> {
    ChatWidget::new(backend, WidgetConfig::from_settings(&cfg.widget))
}

pub async fn chat(backend: Backend, cfg: &ClientConfig, message: &str, format: Format) -> EngineResult<()> {
    let widget = widget(backend, cfg);
    widget.submit(message).await;
    let view = widget.view();
    match format {
        Format::Json => print_json(&view),
        Format::Html => {
            println!("{}", render::transcript(&view.transcript));
            if widget.config().recommendations {
                println!("{}", render::book_panel(&view.books));
            }
            Ok(())
        }
        Format::Text => {
            if let Some(reply) = view.transcript.bubbles.iter().rev().find(|b| b.role == Role::Ai) {
                println!("{}", bubble_text(reply));
            }
            if widget.config().recommendations {
                println!();
                print_books(&view.books);
            }
            Ok(())
        }
    }
}

pub async fn history(backend: Backend, cfg: &ClientConfig, format: Format) -> EngineResult<()> {
    let widget = widget(backend, cfg);
    widget.open().await;
    print_transcript(&widget.view(), format)
}

pub async fn clear(backend: Backend, cfg: &ClientConfig, format: Format) -> EngineResult<()> {
    let widget = widget(backend, cfg);
    widget.clear().await;
    print_transcript(&widget.view(), format)
}

pub async fn books(backend: Backend, message: &str, format: Format) -> EngineResult<()> {
    let recs = backend.book_recommendations(message.trim()).await?;
    let panel = BookPanel::from_recommendations(&recs);
    match format {
        Format::Json => print_json(&panel),
        Format::Html => {
            println!("{}", render::book_panel(&panel));
            Ok(())
        }
        Format::Text => {
            print_books(&panel);
            Ok(())
        }
    }
}

fn print_transcript(view: &WidgetView, format: Format) -> EngineResult<()> {
    match format {
        Format::Json => print_json(&view.transcript),
        Format::Html => {
            println!("{}", render::transcript(&view.transcript));
            Ok(())
        }
        Format::Text => {
            for bubble in &view.transcript.bubbles {
                println!("{:>4} │ {}", bubble.role.as_str(), bubble_text(bubble));
            }
            Ok(())
        }
    }
}

fn print_books(panel: &BookPanel) {
    match panel {
        BookPanel::Ready { keywords, books } => {
            if let Some(k) = keywords {
                println!("關鍵詞: {k}");
            }
            for b in books {
                println!("📘 {} · 作者: {} [{}]", b.title, b.author, b.source);
                if !b.link.is_empty() {
                    println!("   {}", b.link);
                }
            }
        }
        other => println!("{}", other.placeholder().unwrap_or_default()),
    }
}
