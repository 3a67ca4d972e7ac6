//! Free-text steps of the add-record conversation started from the menu.

use crate::bot::commands::records::SUMMARY_PREVIEW_LEN;
use crate::bot::context::HandlerContext;
use crate::bot::registry::HandlerResult;
use crate::database::models::UserMode;
use crate::database::store::RecordKey;
use crate::utils::logging::log_validation_error;
use crate::utils::validation::{parse_fields, validate_record_name};

/// Route predicate: the user is in the middle of a conversation.
pub fn is_pending_input(_text: &str, mode: &UserMode) -> bool {
    mode.is_pending()
}

pub async fn handle_pending_input(ctx: HandlerContext) -> HandlerResult {
    let text = ctx.text().trim().to_string();

    match ctx.mode.clone() {
        UserMode::AwaitingRecordName => match validate_record_name(&text) {
            Ok(name) => {
                let next = UserMode::AwaitingRecordValue { name: name.clone() };
                ctx.set_mode(&next).await?;
                ctx.reply(format!(
                    "👍 Now send the value for '{name}'. Plain text, or key=value pairs separated by spaces."
                ))?;
            }
            Err(e) => {
                log_validation_error("add", "name", &text, &e.to_string(), ctx.user_id());
                ctx.feedback()
                    .validation_error(&e.to_string(), "Send a short name like shopping_list, or /cancel")?;
            }
        },
        UserMode::AwaitingRecordValue { name } => match parse_fields(&text) {
            Ok(fields) => {
                let record = ctx.store.put(&RecordKey::new(ctx.user_id(), &name), &fields).await?;
                ctx.set_mode(&UserMode::Idle).await?;
                tracing::info!("User {} added record '{}' from the menu", ctx.user_id(), name);
                ctx.feedback()
                    .success(&format!("Saved '{}': {}", record.name, record.preview(SUMMARY_PREVIEW_LEN)))?;
            }
            Err(e) => {
                log_validation_error("add", "value", &text, &e.to_string(), ctx.user_id());
                ctx.feedback()
                    .validation_error(&e.to_string(), "Send some text like buy milk, or /cancel")?;
            }
        },
        UserMode::Idle => {}
    }
    Ok(())
}
