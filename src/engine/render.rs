// tutorchat Engine — HTML rendering
//
// View models → HTML fragments using the page's class names. Everything
// that did not come out of `format_message` is escaped here.

use crate::engine::analytics::student::{WeaknessCard, TimelineItem, NO_LEARNING, NO_TIMELINE};
use crate::engine::analytics::teacher::{StudentLine, NO_STUDENTS};
use crate::engine::analytics::StatCard;
use crate::engine::books::BookPanel;
use crate::engine::format::escape_html;
use crate::engine::panel::{Handle, PanelView};
use crate::engine::widget::Transcript;

pub const TYPING_DOTS: &str = "<span></span><span></span><span></span>";

// ── Chat ───────────────────────────────────────────────────────────────

pub fn transcript(t: &Transcript) -> String {
    let mut out = String::new();
    for bubble in &t.bubbles {
        let role = bubble.role.as_str();
        out.push_str(&format!(
            "<div class=\"message-row {role}\" data-id=\"{}\"><div class=\"bubble {role}\">{}</div></div>",
            bubble.id, bubble.html
        ));
    }
    if t.typing {
        out.push_str(&format!(
            "<div class=\"message-row ai\" id=\"typingIndicator\"><div class=\"bubble ai typing\">{TYPING_DOTS}</div></div>"
        ));
    }
    out
}

pub fn book_panel(panel: &BookPanel) -> String {
    match panel {
        BookPanel::Loading => format!("<div class=\"loading-books\">{}</div>", escape_html(panel_text(panel))),
        BookPanel::Ready { keywords, books } => {
            let mut out = String::new();
            if let Some(k) = keywords {
                out.push_str(&format!(
                    "<div class=\"keywords-display\"><strong>關鍵詞:</strong> {}</div>",
                    escape_html(k)
                ));
            }
            for book in books {
                out.push_str(&format!(
                    concat!(
                        "<a class=\"bookstore\" href=\"{link}\"><div class=\"book-item\">",
                        "<img class=\"book-cover\" src=\"{image}\" alt=\"{title}\">",
                        "<div class=\"book-info\"><div class=\"book-title\">{title}</div>",
                        "<div class=\"book-author\">作者: {author}</div>",
                        "<div class=\"book-source\">{source}</div></div></div></a>"
                    ),
                    link = escape_html(&book.link),
                    image = escape_html(&book.image),
                    title = escape_html(&book.title),
                    author = escape_html(&book.author),
                    source = escape_html(&book.source),
                ));
            }
            out
        }
        _ => format!("<div class=\"no-books\">{}</div>", escape_html(panel_text(panel))),
    }
}

fn panel_text(panel: &BookPanel) -> &'static str {
    panel.placeholder().unwrap_or_default()
}

// ── Panel ──────────────────────────────────────────────────────────────

/// `style` attribute of the chat window.
pub fn panel_style(view: &PanelView) -> String {
    let mut css = view.style.to_css();
    if view.hidden {
        css.push_str(" display: none;");
    }
    format!("style=\"{}\"", escape_html(&css))
}

/// Resize grips, one element per handle.
pub fn resize_handles() -> String {
    Handle::ALL
        .iter()
        .map(|h| {
            format!(
                "<div class=\"resize-handle {}\" style=\"cursor: {};\"></div>",
                h.css_class(),
                h.cursor()
            )
        })
        .collect()
}

// ── Dashboards ─────────────────────────────────────────────────────────

pub fn error_banner(message: Option<&str>) -> String {
    match message {
        Some(m) => format!("<div class=\"error-message\">{}</div>", escape_html(m)),
        None => String::new(),
    }
}

pub fn stat_cards(cards: &[StatCard]) -> String {
    cards
        .iter()
        .map(|c| {
            format!(
                "<div class=\"stat-card\"><div class=\"stat-number\" id=\"{}\">{}</div><div class=\"stat-label\">{}</div></div>",
                c.id,
                escape_html(&c.value),
                escape_html(c.label)
            )
        })
        .collect()
}

/// Body of the teacher's student table (6 columns).
pub fn student_table(rows: &[StudentLine]) -> String {
    if rows.is_empty() {
        return format!("<tr><td colspan=\"6\" class=\"no-data\">{NO_STUDENTS}</td></tr>");
    }
    rows.iter()
        .map(|s| {
            let scaffolding = escape_html(&s.main_scaffolding);
            let level = escape_html(&s.current_level);
            format!(
                concat!(
                    "<tr><td><strong>{}</strong></td><td>{}</td>",
                    "<td><span class=\"scaffolding-badge {sc}\">{sc}</span></td>",
                    "<td><span class=\"level-badge {lv}\">{lv}</span></td>",
                    "<td>{}</td><td>{}</td></tr>"
                ),
                escape_html(&s.username),
                s.conversations,
                escape_html(&s.favorite_unit),
                escape_html(&s.last_activity),
                sc = scaffolding,
                lv = level,
            )
        })
        .collect()
}

/// Table body shown while a load is in flight.
pub fn student_table_loading() -> String {
    "<tr><td colspan=\"6\" class=\"loading\"><span class=\"loading-spinner\"></span> 載入中...</td></tr>".into()
}

pub fn weakness_cards(cards: &[WeaknessCard]) -> String {
    if cards.is_empty() {
        return format!("<div class=\"loading\">{NO_LEARNING}</div>");
    }
    let mut out = String::new();
    for c in cards {
        let level = escape_html(&c.current_level);
        let trend = escape_html(&c.trend);
        let confidence = escape_html(&c.confidence);
        let suggestions: String = c
            .suggestions
            .iter()
            .map(|s| format!("<li>{}</li>", escape_html(s)))
            .collect();
        out.push_str(&format!(
            concat!(
                "<div class=\"weakness-card\"><div class=\"unit-name\">{unit}</div>",
                "<div class=\"progress-info\"><span>",
                "<span class=\"level-badge {level}\">{level}</span>",
                "<span class=\"trend-badge {trend}\">{trend}</span></span>",
                "<span class=\"conversations\">對話 {conversations} 次</span></div>",
                "<div class=\"weakness-text\"><strong>⚠️ 主要弱點：</strong>{weakness}",
                "<span class=\"confidence-badge {confidence}\">信心度: {confidence}</span></div>",
                "<div class=\"suggestions\"><h4>💡 改善建議</h4><ul>{suggestions}</ul></div>",
                "<div class=\"last-studied\">最後學習：{last}</div></div>"
            ),
            unit = escape_html(&c.unit),
            level = level,
            trend = trend,
            conversations = c.conversations,
            weakness = escape_html(&c.weakness),
            confidence = confidence,
            suggestions = suggestions,
            last = escape_html(&c.last_studied),
        ));
    }
    out
}

pub fn timeline(items: &[TimelineItem]) -> String {
    if items.is_empty() {
        return format!("<div class=\"loading\">{NO_TIMELINE}</div>");
    }
    items
        .iter()
        .map(|item| {
            let level = escape_html(&item.level);
            format!(
                concat!(
                    "<div class=\"timeline-item\"><div class=\"timeline-content\">",
                    "<div class=\"unit-title\">{}</div><div class=\"timeline-meta\">",
                    "<span class=\"level-badge {lv}\">{lv}</span><span class=\"timeline-date\">{}</span>",
                    "</div></div></div>"
                ),
                escape_html(&item.unit),
                escape_html(&item.when),
                lv = level,
            )
        })
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::types::Role;
    use crate::engine::books::BookCard;
    use crate::engine::geometry::Viewport;
    use crate::engine::panel::{PanelConfig, PanelController};
    use crate::engine::widget::ChatBubble;
    use uuid::Uuid;

    #[test]
    fn transcript_with_typing_indicator() {
        let t = Transcript {
            bubbles: vec![ChatBubble {
                id: Uuid::nil(),
                role: Role::User,
                html: "嗨".into(),
            }],
            typing: true,
        };
        let html = transcript(&t);
        assert!(html.starts_with("<div class=\"message-row user\""));
        assert!(html.contains("<div class=\"bubble user\">嗨</div>"));
        assert!(html.ends_with(&format!("<div class=\"bubble ai typing\">{TYPING_DOTS}</div></div>")));
    }

    #[test]
    fn books_are_escaped() {
        let panel = BookPanel::Ready {
            keywords: Some("<b>回歸</b>".into()),
            books: vec![BookCard {
                title: "A \"quoted\" title".into(),
                author: "林".into(),
                link: "https://books.example/?a=1&b=2".into(),
                image: String::new(),
                source: "推薦書籍".into(),
            }],
        };
        let html = book_panel(&panel);
        assert!(html.contains("&lt;b&gt;回歸&lt;/b&gt;"));
        assert!(html.contains("href=\"https://books.example/?a=1&amp;b=2\""));
        assert!(html.contains("alt=\"A &quot;quoted&quot; title\""));
        assert_eq!(book_panel(&BookPanel::Loading), "<div class=\"loading-books\">🔍 正在搜尋相關書籍...</div>");
        assert_eq!(book_panel(&BookPanel::Empty), "<div class=\"no-books\">暫無相關書籍推薦</div>");
    }

    #[test]
    fn panel_style_attribute() {
        let mut panel = PanelController::new(PanelConfig::default(), Viewport::new(1280.0, 800.0));
        assert!(panel_style(&panel.view()).contains("right: 24px"));
        panel.toggle_visibility();
        assert!(panel_style(&panel.view()).ends_with("display: none;\""));
        assert_eq!(resize_handles().matches("resize-handle").count(), 8);
    }

    #[test]
    fn empty_dashboards() {
        assert!(student_table(&[]).contains("暫無學生數據"));
        assert!(weakness_cards(&[]).contains("暫無學習數據"));
        assert!(timeline(&[]).contains("暫無學習軌跡"));
        assert_eq!(error_banner(None), "");
        assert_eq!(
            error_banner(Some("載入數據時發生錯誤：<x>")),
            "<div class=\"error-message\">載入數據時發生錯誤：&lt;x&gt;</div>"
        );
    }

    #[test]
    fn student_rows_escape_badges() {
        let row = StudentLine {
            username: "<s1>".into(),
            conversations: 3,
            main_scaffolding: "差異鷹架".into(),
            current_level: "高".into(),
            favorite_unit: "決策樹".into(),
            last_activity: "今天".into(),
        };
        let html = student_table(&[row]);
        assert!(html.contains("<strong>&lt;s1&gt;</strong>"));
        assert!(html.contains("<span class=\"scaffolding-badge 差異鷹架\">差異鷹架</span>"));
        assert!(html.contains("<td>3</td>"));
    }
}
