use anyhow::{anyhow, Result};
use std::env;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/keeper.db";
pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_PENDING_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub database_url: String,
    pub http_port: u16,
    pub admin_user_ids: Vec<i64>,
    /// Pending menu conversations older than this are reset to idle.
    pub pending_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        if token.trim().is_empty() {
            return Err(anyhow!("TELEGRAM_BOT_TOKEN must be set"));
        }

        let database_url = database_url_from_env();

        let http_port = match env::var("HTTP_PORT") {
            Ok(port) => port
                .trim()
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT '{}'", port))?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        let admin_user_ids = match env::var("ADMIN_USER_IDS") {
            Ok(ids) => parse_admin_ids(&ids)?,
            Err(_) => Vec::new(),
        };

        let pending_ttl_minutes = match env::var("PENDING_TTL_MINUTES") {
            Ok(minutes) => {
                let minutes: i64 = minutes
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("Invalid PENDING_TTL_MINUTES '{}'", minutes))?;
                if minutes <= 0 {
                    return Err(anyhow!("PENDING_TTL_MINUTES must be greater than zero"));
                }
                minutes
            }
            Err(_) => DEFAULT_PENDING_TTL_MINUTES,
        };

        Ok(Config {
            telegram_bot_token: token,
            database_url,
            http_port,
            admin_user_ids,
            pending_ttl_minutes,
        })
    }
}

/// `DATABASE_URL`, or the default when it is unset or blank.
pub fn database_url_from_env() -> String {
    env::var("DATABASE_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Comma-separated Telegram user ids; blanks between commas are skipped.
pub fn parse_admin_ids(input: &str) -> Result<Vec<i64>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<i64>()
                .map_err(|_| anyhow!("Invalid ADMIN_USER_IDS entry '{}'", id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_ids() {
        assert_eq!(parse_admin_ids("1, 2,,3 ").unwrap(), vec![1, 2, 3]);
        assert!(parse_admin_ids("").unwrap().is_empty());
        assert!(parse_admin_ids("12,abc").is_err());
    }
}
