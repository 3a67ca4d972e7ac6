//! Outbound side of the bot: handlers enqueue [`Reply`] values through a
//! [`ReplySender`], and the [`Outbox`] turns them into Bot API requests.

use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::RequestError;
use thiserror::Error;
use tokio::sync::mpsc;

/// Attempts per reply when Telegram asks us to slow down or the network drops.
pub const MAX_DELIVERY_ATTEMPTS: u32 = 3;

/// Telegram rejects message texts longer than this many characters.
pub const MAX_MESSAGE_LEN: usize = 4096;

const NETWORK_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Message {
        chat_id: ChatId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
        markdown: bool,
    },
    Edit {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
        markdown: bool,
    },
    AnswerCallback {
        query_id: String,
        text: Option<String>,
    },
}

impl Reply {
    pub fn chat_id(&self) -> Option<ChatId> {
        match self {
            Reply::Message { chat_id, .. } | Reply::Edit { chat_id, .. } => Some(*chat_id),
            Reply::AnswerCallback { .. } => None,
        }
    }

    /// Text shown to the user, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Message { text, .. } | Reply::Edit { text, .. } => Some(text),
            Reply::AnswerCallback { text, .. } => text.as_deref(),
        }
    }

    /// Sends this reply as the matching Bot API request.
    pub async fn send(&self, bot: &Bot) -> ResponseResult<()> {
        match self {
            Reply::Message { chat_id, text, keyboard, markdown } => {
                let mut request = bot.send_message(*chat_id, text.clone());
                if let Some(keyboard) = keyboard {
                    request = request.reply_markup(keyboard.clone());
                }
                if *markdown {
                    request = request.parse_mode(ParseMode::MarkdownV2);
                }
                request.await?;
            }
            Reply::Edit { chat_id, message_id, text, keyboard, markdown } => {
                let mut request = bot.edit_message_text(*chat_id, *message_id, text.clone());
                if let Some(keyboard) = keyboard {
                    request = request.reply_markup(keyboard.clone());
                }
                if *markdown {
                    request = request.parse_mode(ParseMode::MarkdownV2);
                }
                request.await?;
            }
            Reply::AnswerCallback { query_id, text } => {
                let mut request = bot.answer_callback_query(query_id.clone());
                if let Some(text) = text {
                    request = request.text(text.clone());
                }
                request.await?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("outbox is closed, reply was not sent")]
pub struct OutboxClosed;

/// Cloneable handle handlers use to emit replies.
#[derive(Debug, Clone)]
pub struct ReplySender {
    tx: mpsc::UnboundedSender<Reply>,
}

impl ReplySender {
    pub fn push(&self, reply: Reply) -> Result<(), OutboxClosed> {
        self.tx.send(reply).map_err(|_| OutboxClosed)
    }

    pub fn text(&self, chat_id: ChatId, text: impl Into<String>) -> Result<(), OutboxClosed> {
        self.push(Reply::Message { chat_id, text: text.into(), keyboard: None, markdown: false })
    }

    /// Text that is already valid MarkdownV2.
    pub fn markdown(&self, chat_id: ChatId, text: impl Into<String>) -> Result<(), OutboxClosed> {
        self.push(Reply::Message { chat_id, text: text.into(), keyboard: None, markdown: true })
    }

    pub fn keyboard(
        &self,
        chat_id: ChatId,
        text: impl Into<String>,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), OutboxClosed> {
        self.push(Reply::Message {
            chat_id,
            text: text.into(),
            keyboard: Some(keyboard),
            markdown: false,
        })
    }

    pub fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: impl Into<String>,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), OutboxClosed> {
        self.push(Reply::Edit { chat_id, message_id, text: text.into(), keyboard, markdown: false })
    }

    pub fn answer_callback(
        &self,
        query_id: impl Into<String>,
        text: Option<&str>,
    ) -> Result<(), OutboxClosed> {
        self.push(Reply::AnswerCallback {
            query_id: query_id.into(),
            text: text.map(str::to_string),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving end of the reply queue.
#[derive(Debug)]
pub struct Outbox {
    rx: mpsc::UnboundedReceiver<Reply>,
}

/// Creates a connected sender/outbox pair.
pub fn outbox() -> (ReplySender, Outbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ReplySender { tx }, Outbox { rx })
}

impl Outbox {
    pub async fn recv(&mut self) -> Option<Reply> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Reply> {
        self.rx.try_recv().ok()
    }

    /// Everything currently queued, without waiting.
    pub fn drain(&mut self) -> Vec<Reply> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Refuses new replies; already queued ones can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Delivers replies until every sender is gone and the queue is empty.
    ///
    /// Returns the number of replies Telegram accepted.
    pub async fn deliver(mut self, bot: Bot) -> u64 {
        let mut delivered = 0;
        while let Some(reply) = self.rx.recv().await {
            match send_with_retry(&bot, &reply).await {
                Ok(()) => delivered += 1,
                Err(e) => tracing::error!(
                    "Failed to deliver reply to chat {:?}: {}",
                    reply.chat_id().map(|c| c.0),
                    e
                ),
            }
        }
        tracing::info!("Outbox drained after {} delivered replies", delivered);
        delivered
    }
}

async fn send_with_retry(bot: &Bot, reply: &Reply) -> ResponseResult<()> {
    let mut attempt = 1;
    loop {
        match reply.send(bot).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < MAX_DELIVERY_ATTEMPTS => match retry_delay(&e) {
                Some(delay) => {
                    tracing::warn!(
                        "Transient delivery error (attempt {}/{}), retrying in {:?}: {}",
                        attempt,
                        MAX_DELIVERY_ATTEMPTS,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => return Err(e),
            },
            Err(e) => return Err(e),
        }
    }
}

/// How long to wait before retrying, or `None` when the error is permanent.
fn retry_delay(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(delay) => Some(*delay),
        RequestError::Network(_) | RequestError::Io(_) => Some(NETWORK_RETRY_DELAY),
        _ => None,
    }
}
