//! Cleanup of reply text before it is shown.
//!
//! Servers tend to send markdown and double-escaped strings. The pipeline
//! strips emphasis markers first, then unescapes, then tidies lists and blank
//! lines. Order matters: unescaping runs before newline collapsing so the
//! newlines it produces are collapsed too.

use std::sync::OnceLock;

use regex::{Captures, Regex};

struct Patterns {
    bold: Regex,
    italic: Regex,
    escaped_quote: Regex,
    escaped_newline: Regex,
    escaped_tab: Regex,
    escaped_backslash: Regex,
    bullet: Regex,
    numbered: Regex,
    blank_run: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("static reply-format pattern");
        Patterns {
            bold: re(r"\*\*(.*?)\*\*"),
            italic: re(r"\*(.*?)\*"),
            escaped_quote: re(r#"\\""#),
            escaped_newline: re(r"\\n"),
            escaped_tab: re(r"\\t"),
            escaped_backslash: re(r"\\\\"),
            bullet: re(r"(?m)^\s*[-*+]\s+"),
            numbered: re(r"(?m)^\s*\d+\.\s+"),
            blank_run: re(r"\n\s*\n\s*\n"),
        }
    })
}

/// Normalize raw reply text for display.
pub fn format_reply_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let p = patterns();
    let mut result = text.to_string();

    result = p.bold.replace_all(&result, "$1").into_owned();
    result = p.italic.replace_all(&result, "$1").into_owned();

    result = p.escaped_quote.replace_all(&result, "\"").into_owned();
    result = p.escaped_newline.replace_all(&result, "\n").into_owned();
    result = p.escaped_tab.replace_all(&result, "\t").into_owned();
    result = p.escaped_backslash.replace_all(&result, r"\").into_owned();

    result = p.bullet.replace_all(&result, "• ").into_owned();
    result = p
        .numbered
        .replace_all(&result, |caps: &Captures| format!("{} ", caps[0].trim()))
        .into_owned();

    result = p.blank_run.replace_all(&result, "\n\n").into_owned();

    result.trim().to_string()
}
