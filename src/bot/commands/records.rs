use crate::bot::context::HandlerContext;
use crate::bot::keyboard::record_list;
use crate::bot::registry::HandlerResult;
use crate::bot::reply::MAX_MESSAGE_LEN;
use crate::database::store::{Record, RecordFilter, RecordKey, Store, StoreError};
use crate::utils::datetime::display_timestamp;
use crate::utils::logging::log_validation_error;
use crate::utils::markdown::{bold, escape_markdown};
use crate::utils::validation::{parse_fields, split_first_word, validate_record_name};

/// Records shown by `/list` before the keyboard gets unwieldy.
pub const LIST_LIMIT: u32 = 20;

/// Characters of a record summary shown in listings and confirmations.
pub const SUMMARY_PREVIEW_LEN: usize = 80;

/// MarkdownV2 rendering of a whole record.
pub fn format_record(record: &Record) -> String {
    let mut text = format!("📄 {}\n\n", bold(&escape_markdown(&record.name)));
    match record.plain_value() {
        Some(value) => text.push_str(&escape_markdown(value)),
        None => {
            for (key, value) in &record.fields {
                text.push_str(&format!("• {}: {}\n", bold(&escape_markdown(key)), escape_markdown(value)));
            }
        }
    }
    text.push_str(&format!(
        "\n\n_{}_",
        escape_markdown(&format!("Updated {}", display_timestamp(&record.updated_at)))
    ));
    text
}

/// Validates a record name argument, replying with a suggestion when it is bad.
fn record_name(ctx: &HandlerContext, command: &str, raw: &str) -> anyhow::Result<Option<String>> {
    match validate_record_name(raw) {
        Ok(name) => Ok(Some(name)),
        Err(e) => {
            log_validation_error(command, "name", raw, &e.to_string(), ctx.user_id());
            ctx.feedback()
                .validation_error(&e.to_string(), &format!("Try /{command} note"))?;
            Ok(None)
        }
    }
}

pub async fn handle_set(ctx: HandlerContext) -> HandlerResult {
    let (raw_name, value) = split_first_word(ctx.args());
    let Some(name) = record_name(&ctx, "set", raw_name)? else {
        return Ok(());
    };

    let fields = match parse_fields(value) {
        Ok(fields) => fields,
        Err(e) => {
            log_validation_error("set", "value", value, &e.to_string(), ctx.user_id());
            ctx.feedback().validation_error(
                &e.to_string(),
                "Try /set note buy milk or /set profile city=Berlin lang=de",
            )?;
            return Ok(());
        }
    };

    let record = ctx.store.put(&RecordKey::new(ctx.user_id(), &name), &fields).await?;
    tracing::info!("User {} saved record '{}' ({} fields)", ctx.user_id(), name, record.fields.len());
    ctx.feedback()
        .success(&format!("Saved '{}': {}", record.name, record.preview(SUMMARY_PREVIEW_LEN)))?;
    Ok(())
}

pub async fn handle_get(ctx: HandlerContext) -> HandlerResult {
    let Some(name) = record_name(&ctx, "get", ctx.args())? else {
        return Ok(());
    };

    match ctx.store.get(&RecordKey::new(ctx.user_id(), &name)).await? {
        Some(record) => ctx.reply_markdown(format_record(&record))?,
        None => ctx
            .feedback()
            .warning(&format!("No record named '{name}'. Use /list to see your records."))?,
    }
    Ok(())
}

pub async fn handle_del(ctx: HandlerContext) -> HandlerResult {
    let Some(name) = record_name(&ctx, "del", ctx.args())? else {
        return Ok(());
    };

    if ctx.store.delete(&RecordKey::new(ctx.user_id(), &name)).await? {
        tracing::info!("User {} deleted record '{}'", ctx.user_id(), name);
        ctx.feedback().success(&format!("Deleted '{name}'."))?;
    } else {
        ctx.feedback().warning(&format!("No record named '{name}'."))?;
    }
    Ok(())
}

/// First [`LIST_LIMIT`] records of a user, and whether more exist.
pub async fn fetch_record_page(store: &Store, user_id: i64) -> Result<(Vec<Record>, bool), StoreError> {
    let mut records = store
        .query(&RecordFilter::for_user(user_id).limit(LIST_LIMIT + 1))
        .await?;
    let has_more = records.len() > LIST_LIMIT as usize;
    records.truncate(LIST_LIMIT as usize);
    Ok((records, has_more))
}

const MORE_RECORDS_HINT: &str = "\n\nMore records are not shown here. Open any of them with /get <name>.";

/// Plain-text listing used by `/list` and the `menu:list` button.
///
/// Lines that would push the text past [`MAX_MESSAGE_LEN`] are replaced by
/// an "…and N more" tail.
pub fn format_record_list(records: &[Record], has_more: bool) -> String {
    let mut text = if has_more {
        format!("📋 Your first {} records:\n", records.len())
    } else {
        format!("📋 Your records ({}):\n", records.len())
    };
    // Room for the tail and the hint.
    let budget = MAX_MESSAGE_LEN - MORE_RECORDS_HINT.chars().count() - 32;

    let mut length = text.chars().count();
    let mut shown = 0;
    for record in records {
        let line = format!("\n• {}: {}", record.name, record.preview(SUMMARY_PREVIEW_LEN));
        let line_length = line.chars().count();
        if length + line_length > budget {
            break;
        }
        text.push_str(&line);
        length += line_length;
        shown += 1;
    }

    let hidden = records.len() - shown;
    if hidden > 0 {
        text.push_str(&format!("\n…and {hidden} more"));
    }
    if has_more {
        text.push_str(MORE_RECORDS_HINT);
    }
    text
}

pub const NO_RECORDS_TEXT: &str =
    "You have no records yet. Save one with /set note buy milk or press ➕ Add record in /menu.";

pub async fn handle_list(ctx: HandlerContext) -> HandlerResult {
    let (records, has_more) = fetch_record_page(&ctx.store, ctx.user_id()).await?;

    if records.is_empty() {
        ctx.feedback().info(NO_RECORDS_TEXT)?;
    } else {
        ctx.reply_keyboard(format_record_list(&records, has_more), record_list(&records))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::Fields;
    use crate::utils::validation::{MAX_FIELDS, MAX_RECORD_NAME_LEN};

    fn record(fields: &[(&str, &str)]) -> Record {
        Record {
            id: "id".into(),
            user_id: 1,
            name: "my_note".into(),
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<Fields>(),
            created_at: "2024-01-01T10:00:00.000Z".into(),
            updated_at: "2024-01-01T10:00:00.000Z".into(),
        }
    }

    #[test]
    fn test_format_record_escapes_markdown() {
        let text = format_record(&record(&[("value", "buy milk!")]));
        assert!(text.starts_with("📄 *my\\_note*"));
        assert!(text.contains("buy milk\\!"));
        assert!(text.contains("Monday, January 01 at 10:00 UTC"));
    }

    #[test]
    fn test_format_record_lists_fields() {
        let text = format_record(&record(&[("city", "Berlin"), ("lang", "de")]));
        assert!(text.contains("• *city*: Berlin\n"));
        assert!(text.contains("• *lang*: de\n"));
    }

    #[test]
    fn test_format_record_list() {
        let records = vec![record(&[("value", "x")])];
        assert_eq!(format_record_list(&records, false), "📋 Your records (1):\n\n• my_note: x");
    }

    #[test]
    fn test_format_record_list_mentions_hidden_records() {
        let records = vec![record(&[("value", "x")])];
        let text = format_record_list(&records, true);
        assert!(text.starts_with("📋 Your first 1 records:"));
        assert!(text.ends_with("Open any of them with /get <name>."));
    }

    #[test]
    fn test_format_record_list_previews_long_values() {
        let records = vec![record(&[("value", "y".repeat(500).as_str())])];
        let text = format_record_list(&records, false);
        assert!(text.contains(&format!("• my_note: {}…", "y".repeat(SUMMARY_PREVIEW_LEN - 1))));
        assert!(!text.contains(&"y".repeat(SUMMARY_PREVIEW_LEN)));
    }

    #[test]
    fn test_format_record_list_fits_one_message() {
        let records: Vec<Record> = (0..200).map(|_| record(&[("value", "z".repeat(500).as_str())])).collect();
        let text = format_record_list(&records, true);
        assert!(text.chars().count() <= MAX_MESSAGE_LEN);
        assert!(text.contains("more"));
    }

    #[test]
    fn test_largest_record_fits_one_message() {
        let input = (0..MAX_FIELDS)
            .map(|i| format!("k{i:02}={}", "!".repeat(70)))
            .collect::<Vec<_>>()
            .join(" ");
        let fields = parse_fields(&input).unwrap();
        let mut largest = record(&[]);
        largest.name = "_".repeat(MAX_RECORD_NAME_LEN);
        largest.fields = fields;

        assert!(format_record(&largest).chars().count() <= MAX_MESSAGE_LEN);
        assert!(largest.preview(SUMMARY_PREVIEW_LEN).chars().count() <= SUMMARY_PREVIEW_LEN);
    }
}
