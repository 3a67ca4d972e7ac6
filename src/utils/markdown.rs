//! Helpers for Telegram MarkdownV2 text.

/// Characters with special meaning in MarkdownV2.
const SPECIAL_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Escapes text so Telegram renders it literally in MarkdownV2 mode.
///
/// # Example
/// ```
/// use keeper_bot::utils::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown("city=Berlin (DE)"), "city\\=Berlin \\(DE\\)");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL_CHARS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Wraps already-escaped text in bold markers.
pub fn bold(escaped: &str) -> String {
    format!("*{escaped}*")
}
