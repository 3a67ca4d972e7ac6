//! Routes classified updates to registered handlers.
//!
//! Updates of one chat are handled one at a time in arrival order; each chat
//! has its own FIFO lock, so different chats never wait on each other.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use teloxide::types::ChatId;
use tokio::sync::Notify;

use crate::bot::context::HandlerContext;
use crate::bot::registry::HandlerRegistry;
use crate::bot::reply::ReplySender;
use crate::bot::update::{InboundKind, InboundUpdate};
use crate::database::models::User;
use crate::database::store::Store;
use crate::utils::logging::{log_handler_error, log_update_done, log_update_start};

pub const GENERIC_APOLOGY: &str =
    "❌ Sorry, something went wrong while handling that. Please try again.";
pub const UNKNOWN_COMMAND_REPLY: &str = "🤔 I don't know that command. Send /help to see what I can do.";
pub const UNKNOWN_ACTION: &str = "Unknown action";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// A registered handler ran to completion.
    Handled,
    /// No handler matched; the fallback reply was sent.
    Fallback,
    /// Nothing to do (unmatched text, or the bot is shutting down).
    Ignored,
    /// The handler, or the work before it, failed. The user got an apology.
    Failed,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Handled => "handled",
            DispatchOutcome::Fallback => "fallback",
            DispatchOutcome::Ignored => "ignored",
            DispatchOutcome::Failed => "failed",
        }
    }
}

/// Running counters, shared with the health endpoint and `/stats`.
#[derive(Debug, Default)]
pub struct DispatchStats {
    received: AtomicU64,
    handled: AtomicU64,
    fallbacks: AtomicU64,
    ignored: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub received: u64,
    pub handled: u64,
    pub fallbacks: u64,
    pub ignored: u64,
    pub failed: u64,
}

impl DispatchStats {
    fn record(&self, outcome: DispatchOutcome) {
        let counter = match outcome {
            DispatchOutcome::Handled => &self.handled,
            DispatchOutcome::Fallback => &self.fallbacks,
            DispatchOutcome::Ignored => &self.ignored,
            DispatchOutcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            handled: self.handled.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

type ChatLock = Arc<tokio::sync::Mutex<()>>;

pub struct UpdateDispatcher {
    registry: HandlerRegistry,
    store: Store,
    replies: Mutex<Option<ReplySender>>,
    admins: HashSet<i64>,
    bot_username: String,
    stats: Arc<DispatchStats>,
    chat_locks: Mutex<HashMap<ChatId, ChatLock>>,
    in_flight: AtomicUsize,
    idle: Notify,
}

impl UpdateDispatcher {
    pub fn new(
        registry: HandlerRegistry,
        store: Store,
        replies: ReplySender,
        admins: impl IntoIterator<Item = i64>,
        bot_username: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            store,
            replies: Mutex::new(Some(replies)),
            admins: admins.into_iter().collect(),
            bot_username: bot_username.into(),
            stats: Arc::new(DispatchStats::default()),
            chat_locks: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            idle: Notify::new(),
        }
    }

    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    pub fn stats(&self) -> Arc<DispatchStats> {
        Arc::clone(&self.stats)
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admins.contains(&user_id)
    }

    /// Number of updates currently being processed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Handles one update and reports what happened to it.
    pub async fn dispatch(&self, update: InboundUpdate) -> DispatchOutcome {
        self.stats.received.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let chat_id = update.chat_id;
        let lock = self.chat_lock(chat_id);
        let outcome = {
            let _turn = lock.lock().await;
            self.process(update).await
        };
        drop(lock);
        self.release_chat_lock(chat_id);

        self.stats.record(outcome);
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
        outcome
    }

    /// Drops the reply sender so the outbox can drain. Updates arriving
    /// afterwards are ignored.
    pub fn close(&self) {
        let sender = self.replies.lock().unwrap_or_else(PoisonError::into_inner).take();
        if sender.is_some() {
            tracing::info!("Dispatcher closed, no more replies will be queued");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }

    /// Resolves once no update is being processed.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    async fn process(&self, update: InboundUpdate) -> DispatchOutcome {
        let Some(replies) = self.reply_sender() else {
            tracing::warn!(
                "Dropping {} '{}' from chat {}: dispatcher is closed",
                update.kind.label(),
                update.kind.key(),
                update.chat_id.0
            );
            return DispatchOutcome::Ignored;
        };

        let kind = update.kind.label();
        let key = update.kind.key().to_string();
        let user_id = update.sender.id;
        let chat_id = update.chat_id.0;
        log_update_start(kind, &key, &update.sender.display_name(), user_id, chat_id);

        let outcome = self.route(update, replies).await;
        log_update_done(kind, &key, user_id, chat_id, outcome.as_str());
        outcome
    }

    async fn route(&self, update: InboundUpdate, replies: ReplySender) -> DispatchOutcome {
        let kind = update.kind.label();
        let key = update.kind.key().to_string();
        let user_id = update.sender.id;
        let chat_id = update.chat_id;

        let user = match User::touch(self.store.pool(), &update.sender).await {
            Ok(user) => user,
            Err(e) => {
                log_handler_error(kind, &key, user_id, chat_id.0, &format!("loading user: {e}"));
                apologize(&replies, &update, false);
                return DispatchOutcome::Failed;
            }
        };
        let mode = user.current_mode();

        let handler = match &update.kind {
            InboundKind::Command { name, .. } => match self.registry.command(name) {
                Some(handler) => Arc::clone(handler),
                None => {
                    send_or_warn(replies.text(chat_id, UNKNOWN_COMMAND_REPLY));
                    return DispatchOutcome::Fallback;
                }
            },
            InboundKind::Callback { query_id, data, .. } => {
                match data.as_deref().and_then(|data| self.registry.callback(data)) {
                    Some(handler) => Arc::clone(handler),
                    None => {
                        send_or_warn(replies.answer_callback(query_id.as_str(), Some(UNKNOWN_ACTION)));
                        return DispatchOutcome::Fallback;
                    }
                }
            }
            InboundKind::Text { text, .. } => match self.registry.message(text, &mode) {
                Some((route, handler)) => {
                    tracing::debug!("Text from user {} matched message route '{}'", user_id, route);
                    Arc::clone(handler)
                }
                None => return DispatchOutcome::Ignored,
            },
        };

        let ctx = HandlerContext {
            update: update.clone(),
            user,
            mode,
            store: self.store.clone(),
            replies: replies.clone(),
            is_admin: self.is_admin(user_id),
            stats: self.stats(),
            answered: Arc::default(),
        };
        let answered = Arc::clone(&ctx.answered);

        // A panicking handler surfaces as a JoinError instead of unwinding through the dispatcher.
        let error = match tokio::spawn(handler(ctx)).await {
            Ok(Ok(())) => return DispatchOutcome::Handled,
            Ok(Err(e)) => format!("{e:#}"),
            Err(join_error) => format!("handler panicked: {join_error}"),
        };

        log_handler_error(kind, &key, user_id, chat_id.0, &error);
        apologize(&replies, &update, answered.load(Ordering::SeqCst));
        DispatchOutcome::Failed
    }

    fn reply_sender(&self) -> Option<ReplySender> {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn chat_lock(&self, chat_id: ChatId) -> ChatLock {
        let mut locks = self.chat_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(chat_id).or_default())
    }

    fn release_chat_lock(&self, chat_id: ChatId) {
        let mut locks = self.chat_locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(&chat_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&chat_id);
        }
    }

    #[cfg(test)]
    fn tracked_chats(&self) -> usize {
        self.chat_locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Sends the generic apology. A callback query is answered first unless the
/// handler already did.
fn apologize(replies: &ReplySender, update: &InboundUpdate, answered: bool) {
    if let InboundKind::Callback { query_id, .. } = &update.kind {
        if !answered {
            send_or_warn(replies.answer_callback(query_id.as_str(), None));
        }
    }
    send_or_warn(replies.text(update.chat_id, GENERIC_APOLOGY));
}

fn send_or_warn(result: Result<(), crate::bot::reply::OutboxClosed>) {
    if let Err(e) = result {
        tracing::warn!("Reply dropped: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_snapshot_counts_outcomes() {
        let stats = DispatchStats::default();
        stats.record(DispatchOutcome::Handled);
        stats.record(DispatchOutcome::Handled);
        stats.record(DispatchOutcome::Failed);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.handled, 2);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.fallbacks, 0);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(DispatchOutcome::Fallback.as_str(), "fallback");
        assert_eq!(serde_json::to_string(&DispatchOutcome::Ignored).unwrap(), "\"ignored\"");
    }

    #[tokio::test]
    async fn test_chat_locks_are_released() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        let registry = HandlerRegistry::builder().build().unwrap();
        let (sender, _outbox) = crate::bot::reply::outbox();
        let dispatcher = UpdateDispatcher::new(registry, Store::new(pool), sender, [], "keeperbot");

        let lock = dispatcher.chat_lock(ChatId(5));
        assert_eq!(dispatcher.tracked_chats(), 1);
        drop(lock);
        dispatcher.release_chat_lock(ChatId(5));
        assert_eq!(dispatcher.tracked_chats(), 0);
        dispatcher.wait_idle().await;
    }
}
