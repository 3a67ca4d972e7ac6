use teloxide::types::ChatId;
use crate::bot::reply::{OutboxClosed, ReplySender};

/// Feedback types for different command outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackType {
    Success,
    Warning,
    Error,
    Info,
}

impl FeedbackType {
    pub fn emoji(&self) -> &'static str {
        match self {
            FeedbackType::Success => "✅",
            FeedbackType::Warning => "⚠️",
            FeedbackType::Error => "❌",
            FeedbackType::Info => "ℹ️",
        }
    }
}

/// Prefixes a plain-text message with the emoji of its feedback type.
pub fn format_feedback(feedback_type: FeedbackType, message: &str) -> String {
    format!("{} {}", feedback_type.emoji(), message)
}

/// Error text followed by a hint on how to fix the input.
pub fn format_validation_error(error: &str, suggestion: &str) -> String {
    format_feedback(FeedbackType::Error, &format!("{error}\n\n💡 Suggestion: {suggestion}"))
}

/// Consistent user-facing feedback for one chat
pub struct CommandFeedback {
    replies: ReplySender,
    chat_id: ChatId,
}

impl CommandFeedback {
    pub fn new(replies: ReplySender, chat_id: ChatId) -> Self {
        Self { replies, chat_id }
    }

    pub fn send(&self, feedback_type: FeedbackType, message: &str) -> Result<(), OutboxClosed> {
        self.replies.text(self.chat_id, format_feedback(feedback_type, message))
    }

    pub fn success(&self, message: &str) -> Result<(), OutboxClosed> {
        self.send(FeedbackType::Success, message)
    }

    pub fn error(&self, message: &str) -> Result<(), OutboxClosed> {
        self.send(FeedbackType::Error, message)
    }

    pub fn warning(&self, message: &str) -> Result<(), OutboxClosed> {
        self.send(FeedbackType::Warning, message)
    }

    pub fn info(&self, message: &str) -> Result<(), OutboxClosed> {
        self.send(FeedbackType::Info, message)
    }

    /// Send validation error with helpful suggestion
    pub fn validation_error(&self, error: &str, suggestion: &str) -> Result<(), OutboxClosed> {
        self.replies.text(self.chat_id, format_validation_error(error, suggestion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::reply::outbox;

    #[test]
    fn test_feedback_type_emojis() {
        assert_eq!(FeedbackType::Success.emoji(), "✅");
        assert_eq!(FeedbackType::Warning.emoji(), "⚠️");
        assert_eq!(FeedbackType::Error.emoji(), "❌");
        assert_eq!(FeedbackType::Info.emoji(), "ℹ️");
    }

    #[test]
    fn test_validation_error_format() {
        let text = format_validation_error("Record name cannot be empty", "Try /set note hello");
        assert_eq!(
            text,
            "❌ Record name cannot be empty\n\n💡 Suggestion: Try /set note hello"
        );
    }

    #[test]
    fn test_command_feedback_targets_chat() {
        let (sender, mut outbox) = outbox();
        let feedback = CommandFeedback::new(sender, ChatId(-100));
        feedback.success("Saved").unwrap();

        let reply = outbox.try_recv().unwrap();
        assert_eq!(reply.chat_id(), Some(ChatId(-100)));
        assert_eq!(reply.text(), Some("✅ Saved"));
    }
}
