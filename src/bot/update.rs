//! Classification of raw Telegram updates into the shapes the dispatcher routes on.

use teloxide::types::{CallbackQuery, ChatId, Message, MessageId, Update, UpdateKind, User};

use crate::database::models::Sender;

/// An update the bot knows how to route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundUpdate {
    pub chat_id: ChatId,
    pub sender: Sender,
    pub kind: InboundKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// `/name args`; `name` is lowercase and stripped of any `@bot` suffix.
    Command {
        name: String,
        args: String,
        message_id: MessageId,
    },
    /// Inline button press. `data` is `None` for game buttons.
    Callback {
        query_id: String,
        data: Option<String>,
        message_id: Option<MessageId>,
    },
    /// Any other text message.
    Text { text: String, message_id: MessageId },
}

impl InboundKind {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            InboundKind::Command { .. } => "command",
            InboundKind::Callback { .. } => "callback",
            InboundKind::Text { .. } => "message",
        }
    }

    /// The routing key: command name, callback data or message text.
    pub fn key(&self) -> &str {
        match self {
            InboundKind::Command { name, .. } => name,
            InboundKind::Callback { data, .. } => data.as_deref().unwrap_or(""),
            InboundKind::Text { text, .. } => text,
        }
    }
}

/// Result of looking at a `/`-prefixed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand<'a> {
    /// A command for this bot.
    Ours { name: String, args: &'a str },
    /// `/cmd@otherbot` in a group.
    ForAnotherBot,
    /// Not a command at all (no `/`, or nothing after it).
    NotACommand,
}

/// Splits `/name@bot args` into its parts.
///
/// The `@bot` suffix is compared case-insensitively with `bot_username`;
/// commands without a suffix are always ours.
pub fn parse_command<'a>(text: &'a str, bot_username: &str) -> ParsedCommand<'a> {
    let Some(rest) = text.strip_prefix('/') else {
        return ParsedCommand::NotACommand;
    };

    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };

    let (name, mention) = match head.split_once('@') {
        Some((name, mention)) => (name, Some(mention)),
        None => (head, None),
    };

    if name.is_empty() {
        return ParsedCommand::NotACommand;
    }

    if let Some(mention) = mention {
        if !mention.eq_ignore_ascii_case(bot_username) {
            return ParsedCommand::ForAnotherBot;
        }
    }

    ParsedCommand::Ours { name: name.to_lowercase(), args }
}

impl InboundUpdate {
    /// Classifies a Telegram update. Returns `None` for updates the bot ignores.
    pub fn from_telegram(update: &Update, bot_username: &str) -> Option<Self> {
        match &update.kind {
            UpdateKind::Message(message) => Self::from_message(message, bot_username),
            UpdateKind::CallbackQuery(query) => Some(Self::from_callback(query)),
            _ => None,
        }
    }

    fn from_message(message: &Message, bot_username: &str) -> Option<Self> {
        let from = message.from()?;
        if from.is_bot {
            return None;
        }
        let text = message.text()?;

        let kind = match parse_command(text, bot_username) {
            ParsedCommand::Ours { name, args } => InboundKind::Command {
                name,
                args: args.to_string(),
                message_id: message.id,
            },
            ParsedCommand::ForAnotherBot => return None,
            ParsedCommand::NotACommand => InboundKind::Text {
                text: text.to_string(),
                message_id: message.id,
            },
        };

        Some(Self { chat_id: message.chat.id, sender: sender_of(from), kind })
    }

    fn from_callback(query: &CallbackQuery) -> Self {
        // Private chats share the user's id, which covers inline-mode messages.
        let chat_id = query
            .message
            .as_ref()
            .map(|m| m.chat.id)
            .unwrap_or(ChatId(query.from.id.0 as i64));

        Self {
            chat_id,
            sender: sender_of(&query.from),
            kind: InboundKind::Callback {
                query_id: query.id.clone(),
                data: query.data.clone(),
                message_id: query.message.as_ref().map(|m| m.id),
            },
        }
    }
}

fn sender_of(user: &User) -> Sender {
    Sender {
        id: user.id.0 as i64,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_command() {
        assert_eq!(
            parse_command("/start", "keeperbot"),
            ParsedCommand::Ours { name: "start".into(), args: "" }
        );
    }

    #[test]
    fn test_parse_command_with_args_and_case() {
        assert_eq!(
            parse_command("/SET note  buy milk ", "keeperbot"),
            ParsedCommand::Ours { name: "set".into(), args: "note  buy milk" }
        );
    }

    #[test]
    fn test_parse_command_mentions() {
        assert_eq!(
            parse_command("/help@KeeperBot", "keeperbot"),
            ParsedCommand::Ours { name: "help".into(), args: "" }
        );
        assert_eq!(parse_command("/help@otherbot", "keeperbot"), ParsedCommand::ForAnotherBot);
    }

    #[test]
    fn test_parse_not_a_command() {
        assert_eq!(parse_command("hello", "keeperbot"), ParsedCommand::NotACommand);
        assert_eq!(parse_command("/", "keeperbot"), ParsedCommand::NotACommand);
        assert_eq!(parse_command("/ start", "keeperbot"), ParsedCommand::NotACommand);
    }

    #[test]
    fn test_kind_labels_and_keys() {
        let callback = InboundKind::Callback {
            query_id: "q".into(),
            data: Some("menu:list".into()),
            message_id: None,
        };
        assert_eq!(callback.label(), "callback");
        assert_eq!(callback.key(), "menu:list");

        let empty = InboundKind::Callback { query_id: "q".into(), data: None, message_id: None };
        assert_eq!(empty.key(), "");
    }
}
