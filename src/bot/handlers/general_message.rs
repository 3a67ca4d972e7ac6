use crate::bot::context::HandlerContext;
use crate::bot::registry::HandlerResult;
use crate::database::models::UserMode;

const HINT_WORDS: [&str; 3] = ["help", "menu", "record"];

/// Route predicate: an idle user wrote something that looks like a request for help.
pub fn is_hint_text(text: &str, mode: &UserMode) -> bool {
    if mode.is_pending() {
        return false;
    }
    let text = text.to_lowercase();
    HINT_WORDS.iter().any(|word| text.contains(word))
}

pub async fn handle_general_message(ctx: HandlerContext) -> HandlerResult {
    // Other idle chatter gets no answer, to avoid spamming groups.
    ctx.feedback()
        .info("Use /menu for buttons, /set name value to save a record, or /help for all commands.")?;
    Ok(())
}
