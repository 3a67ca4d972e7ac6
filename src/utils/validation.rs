use anyhow::{anyhow, Result};
use crate::database::store::Fields;

pub const MAX_RECORD_NAME_LEN: usize = 32;
pub const MAX_VALUE_LEN: usize = 500;
pub const MAX_FIELDS: usize = 20;
/// Upper bound on all field names and values of one record together, so a
/// record still fits in a single message once escaped for MarkdownV2.
pub const MAX_RECORD_CHARS: usize = 1500;

/// Field used when a record is set from free text rather than `key=value` pairs.
pub const DEFAULT_FIELD: &str = "value";

/// Validates a record name and returns its normalized (trimmed, lowercase) form.
pub fn validate_record_name(name: &str) -> Result<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(anyhow!("Record name cannot be empty"));
    }

    if name.len() > MAX_RECORD_NAME_LEN {
        return Err(anyhow!(
            "Record name cannot be longer than {} characters",
            MAX_RECORD_NAME_LEN
        ));
    }

    // Names end up inside callback tokens, which are `:`-separated and capped at 64 bytes.
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(anyhow!(
            "Record name can only contain letters, numbers, '_' and '-'"
        ));
    }

    Ok(name.to_ascii_lowercase())
}

pub fn validate_field_value(value: &str) -> Result<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(anyhow!("Value cannot be empty"));
    }

    if value.chars().count() > MAX_VALUE_LEN {
        return Err(anyhow!(
            "Value cannot be longer than {} characters",
            MAX_VALUE_LEN
        ));
    }

    Ok(())
}

/// Parses the value part of `/set`.
///
/// When every word is a `key=value` pair the words become separate fields,
/// otherwise the whole text is stored under [`DEFAULT_FIELD`].
pub fn parse_fields(input: &str) -> Result<Fields> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("Record value cannot be empty"));
    }

    let pairs: Option<Vec<(&str, &str)>> = input
        .split_whitespace()
        .map(|token| token.split_once('=').filter(|(key, _)| !key.is_empty()))
        .collect();

    let mut fields = Fields::new();
    match pairs {
        Some(pairs) => {
            for (key, value) in pairs {
                let key = validate_record_name(key)
                    .map_err(|e| anyhow!("Invalid field name '{}': {}", key, e))?;
                validate_field_value(value)
                    .map_err(|e| anyhow!("Invalid value for field '{}': {}", key, e))?;
                fields.insert(key, value.to_string());
            }
            if fields.len() > MAX_FIELDS {
                return Err(anyhow!("Cannot have more than {} fields", MAX_FIELDS));
            }
            let total: usize = fields.iter().map(|(k, v)| k.chars().count() + v.chars().count()).sum();
            if total > MAX_RECORD_CHARS {
                return Err(anyhow!(
                    "Record cannot hold more than {} characters in total",
                    MAX_RECORD_CHARS
                ));
            }
        }
        None => {
            validate_field_value(input)?;
            fields.insert(DEFAULT_FIELD.to_string(), input.to_string());
        }
    }

    Ok(fields)
}

pub fn parse_user_id(input: &str) -> Result<i64> {
    let user_id: i64 = input
        .trim()
        .parse()
        .map_err(|_| anyhow!("User ID must be a number"))?;

    if user_id <= 0 {
        return Err(anyhow!("User ID must be positive"));
    }

    Ok(user_id)
}

/// Splits command arguments into the first word and the remaining text.
pub fn split_first_word(args: &str) -> (&str, &str) {
    let args = args.trim();
    match args.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (args, ""),
    }
}
