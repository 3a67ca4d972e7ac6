//! Inline keyboard construction. Everything here is pure.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::database::store::Record;

pub const DEFAULT_ROW_WIDTH: usize = 2;

/// Telegram rejects callback data longer than this many bytes.
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

/// Lays `(label, callback token)` pairs out in rows of `row_width` buttons.
///
/// `None` uses [`DEFAULT_ROW_WIDTH`]; a width of zero is treated as one.
/// The last row holds whatever is left over.
pub fn inline_keyboard<L, T>(
    buttons: impl IntoIterator<Item = (L, T)>,
    row_width: Option<usize>,
) -> InlineKeyboardMarkup
where
    L: Into<String>,
    T: Into<String>,
{
    let width = row_width.unwrap_or(DEFAULT_ROW_WIDTH).max(1);

    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for (label, token) in buttons {
        let button = InlineKeyboardButton::callback(label.into(), token.into());
        match rows.last_mut() {
            Some(row) if row.len() < width => row.push(button),
            _ => rows.push(vec![button]),
        }
    }

    InlineKeyboardMarkup::new(rows)
}

/// Joins token parts with `:`, e.g. `callback_token(&["record", "del", "x"])`.
pub fn callback_token(parts: &[&str]) -> String {
    parts.join(":")
}

pub fn main_menu() -> InlineKeyboardMarkup {
    inline_keyboard(
        [
            ("📋 My records", "menu:list"),
            ("➕ Add record", "menu:add"),
            ("🗑 Clear all", "menu:clear"),
            ("✖️ Close", "menu:close"),
        ],
        None,
    )
}

/// One row per record: show and delete buttons.
pub fn record_list(records: &[Record]) -> InlineKeyboardMarkup {
    let buttons = records.iter().flat_map(|record| {
        [
            (format!("🔎 {}", record.name), callback_token(&["record", "show", record.name.as_str()])),
            ("🗑".to_string(), callback_token(&["record", "del", record.name.as_str()])),
        ]
    });
    let mut keyboard = inline_keyboard(buttons, Some(2));
    keyboard
        .inline_keyboard
        .push(vec![InlineKeyboardButton::callback("⬅️ Menu", "menu:open")]);
    keyboard
}

pub fn confirm_clear() -> InlineKeyboardMarkup {
    inline_keyboard([("✅ Yes, delete all", "menu:clear_yes"), ("↩️ Keep", "menu:open")], None)
}
