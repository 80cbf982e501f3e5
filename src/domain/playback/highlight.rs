//! 高亮视图
//!
//! 给展示层的两种只读形态：带高亮标记的词列表，以及 `<span>` 片段。

use serde::Serialize;

use super::Cursor;
use crate::domain::timing::TimingTable;

/// 带高亮状态的词
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordStatus {
    pub index: usize,
    pub word: String,
    pub start_ms: f64,
    pub end_ms: f64,
    pub is_highlighted: bool,
}

pub fn words_with_status(table: &TimingTable, cursor: Cursor) -> Vec<WordStatus> {
    table
        .iter()
        .map(|w| WordStatus {
            index: w.index,
            word: w.word.clone(),
            start_ms: w.start_ms,
            end_ms: w.end_ms,
            is_highlighted: cursor == Some(w.index),
        })
        .collect()
}

/// 渲染为以空格分隔的 `<span class="word">`，当前词附加 `highlighted`
pub fn render_highlighted_html(table: &TimingTable, cursor: Cursor) -> String {
    table
        .iter()
        .map(|w| {
            let class = if cursor == Some(w.index) {
                "word highlighted"
            } else {
                "word"
            };
            format!(
                "<span class=\"{}\" data-index=\"{}\">{}</span>",
                class,
                w.index,
                escape_html(&w.word)
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
