use keeper_bot::bot::update::{InboundKind, InboundUpdate};
use serde_json::{json, Value};
use teloxide::types::{ChatId, MessageId, Update};

const BOT: &str = "keeperbot";

fn alice() -> Value {
    json!({ "id": 42, "is_bot": false, "first_name": "Alice", "username": "alice" })
}

fn private_chat() -> Value {
    json!({ "id": 42, "type": "private", "first_name": "Alice" })
}

fn message(text: &str) -> Value {
    json!({
        "message_id": 10,
        "date": 1_700_000_000,
        "chat": private_chat(),
        "from": alice(),
        "text": text
    })
}

fn update(body: Value) -> Update {
    serde_json::from_str(&body.to_string()).expect("valid update json")
}

#[test]
fn test_command_message_is_classified() {
    let update = update(json!({ "update_id": 1, "message": message("/set note buy milk") }));
    let inbound = InboundUpdate::from_telegram(&update, BOT).unwrap();

    assert_eq!(inbound.chat_id, ChatId(42));
    assert_eq!(inbound.sender.id, 42);
    assert_eq!(inbound.sender.username.as_deref(), Some("alice"));
    assert_eq!(
        inbound.kind,
        InboundKind::Command {
            name: "set".into(),
            args: "note buy milk".into(),
            message_id: MessageId(10),
        }
    );
}

#[test]
fn test_plain_text_is_classified() {
    let update = update(json!({ "update_id": 2, "message": message("hello there") }));
    let inbound = InboundUpdate::from_telegram(&update, BOT).unwrap();

    assert_eq!(
        inbound.kind,
        InboundKind::Text { text: "hello there".into(), message_id: MessageId(10) }
    );
    assert_eq!(inbound.kind.label(), "message");
}

#[test]
fn test_command_for_another_bot_is_ignored() {
    let update = update(json!({ "update_id": 3, "message": message("/start@otherbot") }));
    assert!(InboundUpdate::from_telegram(&update, BOT).is_none());

    let update_ours = update_with_text("/start@KeeperBot");
    assert!(matches!(
        InboundUpdate::from_telegram(&update_ours, BOT).unwrap().kind,
        InboundKind::Command { ref name, .. } if name == "start"
    ));
}

fn update_with_text(text: &str) -> Update {
    update(json!({ "update_id": 4, "message": message(text) }))
}

#[test]
fn test_callback_query_is_classified() {
    let update = update(json!({
        "update_id": 5,
        "callback_query": {
            "id": "cbq-1",
            "from": alice(),
            "chat_instance": "instance",
            "data": "menu:list",
            "message": {
                "message_id": 77,
                "date": 1_700_000_000,
                "chat": { "id": -100500, "type": "supergroup", "title": "Team" },
                "from": { "id": 999, "is_bot": true, "first_name": "Keeper", "username": "keeperbot" },
                "text": "📒 Main menu"
            }
        }
    }));
    let inbound = InboundUpdate::from_telegram(&update, BOT).unwrap();

    assert_eq!(inbound.chat_id, ChatId(-100500));
    assert_eq!(inbound.sender.id, 42);
    assert_eq!(
        inbound.kind,
        InboundKind::Callback {
            query_id: "cbq-1".into(),
            data: Some("menu:list".into()),
            message_id: Some(MessageId(77)),
        }
    );
    assert_eq!(inbound.kind.key(), "menu:list");
}

#[test]
fn test_callback_without_message_uses_sender_chat() {
    let update = update(json!({
        "update_id": 6,
        "callback_query": {
            "id": "cbq-2",
            "from": alice(),
            "chat_instance": "instance",
            "inline_message_id": "inline-1",
            "data": "record:show:note"
        }
    }));
    let inbound = InboundUpdate::from_telegram(&update, BOT).unwrap();

    assert_eq!(inbound.chat_id, ChatId(42));
    assert!(matches!(inbound.kind, InboundKind::Callback { message_id: None, .. }));
}

#[test]
fn test_messages_from_bots_are_ignored() {
    let mut body = message("/start");
    body["from"] = json!({ "id": 7, "is_bot": true, "first_name": "Other" });
    let update = update(json!({ "update_id": 7, "message": body }));

    assert!(InboundUpdate::from_telegram(&update, BOT).is_none());
}

#[test]
fn test_non_text_messages_are_ignored() {
    let update = update(json!({
        "update_id": 8,
        "message": {
            "message_id": 11,
            "date": 1_700_000_000,
            "chat": private_chat(),
            "from": alice(),
            "location": { "latitude": 52.52, "longitude": 13.40 }
        }
    }));

    assert!(InboundUpdate::from_telegram(&update, BOT).is_none());
}

#[test]
fn test_edited_messages_are_ignored() {
    let mut body = message("/start");
    body["edit_date"] = json!(1_700_000_100);
    let update = update(json!({ "update_id": 9, "edited_message": body }));

    assert!(InboundUpdate::from_telegram(&update, BOT).is_none());
}
