// tutorchat Engine — Message formatting
//
// AI replies may contain HTML (the tutor answers with <pre><code> blocks).
// Bubbles either escape everything or keep the HTML and attach a copy
// button to every code block.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Label of the copy button attached to code blocks.
pub const COPY_LABEL: &str = "複製";

/// How bubble content is turned into markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    /// Escape all content (bubbles show text only).
    #[default]
    PlainText,
    /// Trust server HTML, decorate code blocks with copy buttons.
    Html,
}

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<pre\b[^>]*>\s*<code\b[^>]*>(.*?)</code>\s*</pre>")
        .unwrap_or_else(|e| panic!("code block pattern: {e}"))
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap_or_else(|e| panic!("tag pattern: {e}")));

/// Escape text for element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decode the handful of entities servers emit inside code blocks.
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

/// Plain text of an HTML fragment: tags removed, entities decoded.
pub fn text_content(html: &str) -> String {
    decode_entities(&TAG.replace_all(html, ""))
}

/// Text of each `<pre><code>` block, in order.
pub fn code_blocks(html: &str) -> Vec<String> {
    CODE_BLOCK
        .captures_iter(html)
        .map(|c| text_content(c.get(1).map_or("", |m| m.as_str())))
        .collect()
}

/// Turn raw bubble content into markup.
pub fn format_message(text: &str, mode: ContentMode) -> String {
    if text.is_empty() {
        return String::new();
    }
    match mode {
        ContentMode::PlainText => escape_html(text),
        ContentMode::Html => CODE_BLOCK
            .replace_all(text, |caps: &regex::Captures| {
                let block = &caps[0];
                let code = text_content(caps.get(1).map_or("", |m| m.as_str()));
                format!(
                    "<div class=\"code-block-wrapper\">{}<button class=\"copy-code-btn\" type=\"button\" data-code=\"{}\">{}</button></div>",
                    block,
                    escape_html(&code),
                    COPY_LABEL
                )
            })
            .into_owned(),
    }
}

/// First `max` characters of `label`, with `...` appended when cut.
pub fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() > max {
        let mut s: String = label.chars().take(max).collect();
        s.push_str("...");
        s
    } else {
        label.to_string()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
