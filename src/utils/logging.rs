use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor `LOG_LEVEL` is set.
pub const DEFAULT_LOG_FILTER: &str = "keeper_bot=info,tower_http=info";

/// Picks the tracing filter: `RUST_LOG` first, then `LOG_LEVEL`, then the default.
pub fn log_filter() -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    std::env::var("LOG_LEVEL")
        .ok()
        .filter(|level| !level.trim().is_empty())
        .and_then(|level| EnvFilter::try_new(level.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global tracing subscriber.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(log_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Logs the start of update handling with consistent format
pub fn log_update_start(kind: &str, key: &str, user: &str, user_id: i64, chat_id: i64) {
    info!(
        "UPDATE_START: {} '{}' by {}({}) in chat {}",
        kind, key, user, user_id, chat_id
    );
}

/// Logs the end of update handling with consistent format
pub fn log_update_done(kind: &str, key: &str, user_id: i64, chat_id: i64, outcome: &str) {
    info!(
        "UPDATE_DONE: {} '{}' for user {} in chat {} - {}",
        kind, key, user_id, chat_id, outcome
    );
}

/// Logs handler failures; `error` should carry the whole chain (`{:#}`)
pub fn log_handler_error(kind: &str, key: &str, user_id: i64, chat_id: i64, error: &str) {
    error!(
        "HANDLER_ERROR: {} '{}' for user {} in chat {} - {}",
        kind, key, user_id, chat_id, error
    );
}

/// Logs validation errors with consistent format
pub fn log_validation_error(command: &str, field: &str, value: &str, error: &str, user_id: i64) {
    warn!(
        "VALIDATION_ERROR: {} - {} '{}' invalid: {} - user {}",
        command, field, value, error, user_id
    );
}

/// Logs database operations with consistent format
pub fn log_database_operation(operation: &str, table: &str, details: Option<&str>) {
    match details {
        Some(d) => debug!("DB_OP: {} on {} - {}", operation, table, d),
        None => debug!("DB_OP: {} on {}", operation, table),
    }
}

/// Logs database errors with consistent format
pub fn log_database_error(operation: &str, table: &str, error: &str, details: Option<&str>) {
    match details {
        Some(d) => error!("DB_ERROR: {} on {} failed: {} - {}", operation, table, error, d),
        None => error!("DB_ERROR: {} on {} failed: {}", operation, table, error),
    }
}

/// Logs system events with consistent format
pub fn log_system_event(event: &str, details: Option<&str>) {
    match details {
        Some(d) => info!("SYSTEM: {} - {}", event, d),
        None => info!("SYSTEM: {}", event),
    }
}
