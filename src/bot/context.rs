use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use teloxide::types::{ChatId, InlineKeyboardMarkup};

use crate::bot::dispatcher::DispatchStats;
use crate::bot::reply::{OutboxClosed, ReplySender};
use crate::bot::update::{InboundKind, InboundUpdate};
use crate::database::models::{User, UserMode};
use crate::database::store::Store;
use crate::utils::feedback::CommandFeedback;

/// Everything a handler needs to process one update.
#[derive(Clone)]
pub struct HandlerContext {
    pub update: InboundUpdate,
    pub user: User,
    /// Pending interaction at the time the update arrived.
    pub mode: UserMode,
    pub store: Store,
    pub replies: ReplySender,
    pub is_admin: bool,
    pub stats: Arc<DispatchStats>,
    /// Set once the callback query has been answered; Telegram accepts one answer per query.
    pub(crate) answered: Arc<AtomicBool>,
}

impl HandlerContext {
    pub fn chat_id(&self) -> ChatId {
        self.update.chat_id
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    /// Command arguments, empty for other kinds of updates.
    pub fn args(&self) -> &str {
        match &self.update.kind {
            InboundKind::Command { args, .. } => args,
            _ => "",
        }
    }

    /// Callback data, empty for other kinds of updates.
    pub fn callback_data(&self) -> &str {
        match &self.update.kind {
            InboundKind::Callback { data, .. } => data.as_deref().unwrap_or(""),
            _ => "",
        }
    }

    /// Message text, empty for other kinds of updates.
    pub fn text(&self) -> &str {
        match &self.update.kind {
            InboundKind::Text { text, .. } => text,
            _ => "",
        }
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        self.store.pool()
    }

    pub fn reply(&self, text: impl Into<String>) -> Result<(), OutboxClosed> {
        self.replies.text(self.chat_id(), text)
    }

    pub fn reply_markdown(&self, text: impl Into<String>) -> Result<(), OutboxClosed> {
        self.replies.markdown(self.chat_id(), text)
    }

    pub fn reply_keyboard(
        &self,
        text: impl Into<String>,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), OutboxClosed> {
        self.replies.keyboard(self.chat_id(), text, keyboard)
    }

    /// Stops the client's spinner. No-op unless the update is a callback query
    /// that has not been answered yet.
    pub fn answer(&self, text: Option<&str>) -> Result<(), OutboxClosed> {
        match &self.update.kind {
            InboundKind::Callback { query_id, .. } if !self.answered.swap(true, Ordering::SeqCst) => {
                self.replies.answer_callback(query_id.as_str(), text)
            }
            _ => Ok(()),
        }
    }

    /// Whether [`HandlerContext::answer`] already answered the callback query.
    pub fn answered(&self) -> bool {
        self.answered.load(Ordering::SeqCst)
    }

    /// Rewrites the message the pressed button belongs to. Falls back to a new
    /// message when the original is not available.
    pub fn edit_origin(
        &self,
        text: impl Into<String>,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), OutboxClosed> {
        match &self.update.kind {
            InboundKind::Callback { message_id: Some(message_id), .. } => {
                self.replies.edit(self.chat_id(), *message_id, text, keyboard)
            }
            _ => match keyboard {
                Some(keyboard) => self.reply_keyboard(text, keyboard),
                None => self.reply(text),
            },
        }
    }

    pub fn feedback(&self) -> CommandFeedback {
        CommandFeedback::new(self.replies.clone(), self.chat_id())
    }

    pub async fn set_mode(&self, mode: &UserMode) -> Result<(), sqlx::Error> {
        User::set_mode(self.pool(), self.user_id(), mode).await?;
        Ok(())
    }
}
