use crate::bot::commands::records::{fetch_record_page, format_record, format_record_list, NO_RECORDS_TEXT};
use crate::bot::commands::start::MENU_TEXT;
use crate::bot::context::HandlerContext;
use crate::bot::dispatcher::UNKNOWN_ACTION;
use crate::bot::keyboard::{confirm_clear, main_menu, record_list};
use crate::bot::registry::HandlerResult;
use crate::database::models::UserMode;
use crate::database::store::{RecordFilter, RecordKey};

pub const MENU_PREFIX: &str = "menu:";
pub const RECORD_PREFIX: &str = "record:";

/// Buttons of the main menu: `menu:<action>`.
pub async fn handle_menu_callback(ctx: HandlerContext) -> HandlerResult {
    let action = ctx.callback_data().strip_prefix(MENU_PREFIX).unwrap_or_default().to_string();

    match action.as_str() {
        "list" => {
            ctx.answer(None)?;
            show_record_list(&ctx).await?;
        }
        "add" => {
            ctx.set_mode(&UserMode::AwaitingRecordName).await?;
            ctx.answer(None)?;
            ctx.reply("✏️ Send me the name of the new record (letters, numbers, '_' or '-'). /cancel to stop.")?;
        }
        "clear" => {
            let count = ctx.store.query(&RecordFilter::for_user(ctx.user_id())).await?.len();
            ctx.answer(None)?;
            if count == 0 {
                ctx.edit_origin(NO_RECORDS_TEXT, Some(main_menu()))?;
            } else {
                ctx.edit_origin(format!("🗑 Delete all {count} of your records?"), Some(confirm_clear()))?;
            }
        }
        "clear_yes" => {
            let records = ctx.store.query(&RecordFilter::for_user(ctx.user_id())).await?;
            let mut deleted = 0;
            for record in &records {
                if ctx.store.delete(&RecordKey::new(ctx.user_id(), &record.name)).await? {
                    deleted += 1;
                }
            }
            tracing::info!("User {} cleared {} records", ctx.user_id(), deleted);
            ctx.answer(Some("Deleted"))?;
            ctx.edit_origin(format!("✅ Deleted {deleted} record(s)."), Some(main_menu()))?;
        }
        "open" => {
            ctx.answer(None)?;
            ctx.edit_origin(MENU_TEXT, Some(main_menu()))?;
        }
        "close" => {
            ctx.answer(None)?;
            ctx.edit_origin("Menu closed. Send /menu to open it again.", None)?;
        }
        _ => {
            tracing::warn!("Unknown menu action '{}' from user {}", action, ctx.user_id());
            ctx.answer(Some(UNKNOWN_ACTION))?;
        }
    }
    Ok(())
}

/// Per-record buttons: `record:show:<name>` and `record:del:<name>`.
pub async fn handle_record_callback(ctx: HandlerContext) -> HandlerResult {
    let rest = ctx.callback_data().strip_prefix(RECORD_PREFIX).unwrap_or_default();
    let Some((action, name)) = rest.split_once(':').filter(|(_, name)| !name.is_empty()) else {
        ctx.answer(Some(UNKNOWN_ACTION))?;
        return Ok(());
    };
    let (action, key) = (action.to_string(), RecordKey::new(ctx.user_id(), name));

    match action.as_str() {
        "show" => match ctx.store.get(&key).await? {
            Some(record) => {
                ctx.answer(None)?;
                ctx.reply_markdown(format_record(&record))?;
            }
            None => ctx.answer(Some("Record not found"))?,
        },
        "del" => {
            let existed = ctx.store.delete(&key).await?;
            ctx.answer(Some(if existed { "Deleted" } else { "Record not found" }))?;
            show_record_list(&ctx).await?;
        }
        _ => ctx.answer(Some(UNKNOWN_ACTION))?,
    }
    Ok(())
}

async fn show_record_list(ctx: &HandlerContext) -> HandlerResult {
    let (records, has_more) = fetch_record_page(&ctx.store, ctx.user_id()).await?;

    if records.is_empty() {
        ctx.edit_origin(NO_RECORDS_TEXT, Some(main_menu()))?;
    } else {
        ctx.edit_origin(format_record_list(&records, has_more), Some(record_list(&records)))?;
    }
    Ok(())
}
